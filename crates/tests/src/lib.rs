//! # Integration Tests
//!
//! 集成测试与端到端测试。
//!
//! 负责：
//! - 合约快照测试
//! - 模拟 e2e 测试（配置文件 → 适配器 → 引擎 → sinks，无需真实设备）

#[cfg(test)]
mod contract_tests {
    use contracts::{MetricPoint, PowerFields, VendorKind, POWER_MEASUREMENT};

    #[test]
    fn test_vendor_kind_tags() {
        let kind: VendorKind = serde_json::from_str("\"cloud_session\"").unwrap();
        assert_eq!(kind, VendorKind::CloudSession);
        assert_eq!(VendorKind::LocalProtocol.as_str(), "local_protocol");
    }

    #[test]
    fn test_metric_point_shape() {
        let point = MetricPoint::power(
            "washer",
            PowerFields {
                consumption_watts: 1.0,
                watts_today: None,
            },
            chrono::Utc::now(),
        );
        assert_eq!(point.measurement, POWER_MEASUREMENT);
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::path::Path;
    use std::time::Duration;

    use collector::{CollectionEngine, EngineConfig, FailureStage};
    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::{
        AcquisitionCause, CloudEnergyPayload, CollectorBlueprint, ContractError,
        LocalEnergyPayload,
    };
    use tokio::sync::watch;
    use vendors::mock::{MockCloudApi, MockEmeterTransport};
    use vendors::{CloudApiError, VendorAdapters};

    type MockAdapters = VendorAdapters<MockCloudApi, MockEmeterTransport>;

    fn config(persist: bool, sink_path: &Path, extra_sinks: &str) -> String {
        format!(
            r#"
            [schedule]
            persist = {persist}
            interval_seconds = 20

            [polling]
            timeout_secs = 10

            [cloud]
            base_url = "https://cloud.example.com"

            [[devices]]
            name = "washer"
            vendor_kind = "local_protocol"
            address = "192.168.1.40"

            [[devices]]
            name = "fridge"
            vendor_kind = "cloud_session"
            address = "80123ABC"
            credentials = {{ username = "me@example.com", password = "secret" }}

            [[sinks]]
            name = "archive"
            kind = "file"
            params = {{ path = "{}" }}
            {extra_sinks}
            "#,
            sink_path.display()
        )
    }

    fn load(content: &str) -> CollectorBlueprint {
        ConfigLoader::load_from_str(content, ConfigFormat::Toml).unwrap()
    }

    /// Washer answers locally, fridge through the cloud
    fn adapters() -> (MockAdapters, MockCloudApi, MockEmeterTransport) {
        let api = MockCloudApi::new();
        api.steady_reading(Ok(CloudEnergyPayload {
            current_power: Some(38_000.0),
            today_energy: None,
        }));

        let transport = MockEmeterTransport::new();
        transport.set_reading(
            "192.168.1.40",
            LocalEnergyPayload {
                power: Some(45.2),
                today_wh: Some(180.0),
                ..Default::default()
            },
        );

        (
            VendorAdapters::new(api.clone(), transport.clone()),
            api,
            transport,
        )
    }

    async fn engine(
        blueprint: &CollectorBlueprint,
        adapters: MockAdapters,
    ) -> CollectionEngine<MockAdapters> {
        let dispatcher = dispatcher::create_dispatcher(&blueprint.sinks)
            .await
            .unwrap();
        CollectionEngine::new(
            EngineConfig::from_blueprint(blueprint),
            blueprint.devices.clone(),
            adapters,
            dispatcher,
        )
    }

    fn lines(path: &Path) -> Vec<String> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    /// Config file → adapters → engine → file sink, one cycle
    #[tokio::test]
    async fn test_e2e_single_cycle() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("power.lp");
        let blueprint = load(&config(false, &out, ""));

        let (adapters, api, transport) = adapters();
        let (_tx, rx) = watch::channel(false);
        let summary = engine(&blueprint, adapters).await.run(rx).await;

        assert_eq!(summary.cycles, 1);
        let report = summary.last_report.unwrap();
        assert_eq!(report.devices_ok, 2);
        assert_eq!(report.sinks_ok(), 1);
        assert_eq!(api.login_calls(), 1);
        assert_eq!(transport.calls(), 1);

        let written = lines(&out);
        assert_eq!(written.len(), 2);
        assert!(written[0]
            .starts_with("power_watts,host=washer consumption_watts=45.2,watts_today=180 "));
        assert!(written[1].starts_with("power_watts,host=fridge consumption_watts=38 "));
    }

    /// Expired session: one re-login, then the reading goes through
    #[tokio::test]
    async fn test_e2e_session_refresh() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("power.lp");
        let blueprint = load(&config(false, &out, ""));

        let (adapters, api, _) = adapters();
        api.push_reading(Err(CloudApiError::AuthExpired));

        let mut engine = engine(&blueprint, adapters).await;
        let report = engine.run_cycle().await;

        assert_eq!(report.devices_ok, 2);
        assert_eq!(api.login_calls(), 2);
        assert_eq!(api.last_token().as_deref(), Some("token-2"));
    }

    /// Session stays expired: only the cloud device is skipped
    #[tokio::test]
    async fn test_e2e_session_expired_twice() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("power.lp");
        let blueprint = load(&config(false, &out, ""));

        let (adapters, api, _) = adapters();
        api.always_expired();

        let mut engine = engine(&blueprint, adapters).await;
        let report = engine.run_cycle().await;

        assert_eq!(report.devices_ok, 1);
        assert_eq!(report.devices_failed(), 1);
        let failure = &report.device_failures[0];
        assert_eq!(failure.device, "fridge");
        assert_eq!(failure.stage, FailureStage::Acquisition);
        assert_eq!(failure.cause, AcquisitionCause::SessionExpired.to_string());

        drop(engine);
        let written = lines(&out);
        assert_eq!(written.len(), 1);
        assert!(written[0].contains("host=washer"));
    }

    fn second_file_sink(path: &Path) -> String {
        format!(
            r#"
            [[sinks]]
            name = "local"
            kind = "file"
            params = {{ path = "{}" }}
            "#,
            path.display()
        )
    }

    /// Two sinks each get the full point set
    #[tokio::test]
    async fn test_e2e_two_sinks_same_points() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("archive.lp");
        let local = dir.path().join("local.lp");
        let blueprint = load(&config(false, &archive, &second_file_sink(&local)));

        let (adapters, _, _) = adapters();
        let (_tx, rx) = watch::channel(false);
        let summary = engine(&blueprint, adapters).await.run(rx).await;

        let report = summary.last_report.unwrap();
        assert_eq!(report.devices_ok, 2);
        assert_eq!(report.sinks_ok(), 2);
        assert!(report.sink_outcomes.iter().all(|o| o.points == 2));

        let archived = lines(&archive);
        assert_eq!(archived.len(), 2);
        assert_eq!(archived, lines(&local));
    }

    /// Session stays expired with two sinks: both get only the washer point
    #[tokio::test]
    async fn test_e2e_two_sinks_session_expired_twice() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("archive.lp");
        let local = dir.path().join("local.lp");
        let blueprint = load(&config(false, &archive, &second_file_sink(&local)));

        let (adapters, api, _) = adapters();
        api.always_expired();

        let (_tx, rx) = watch::channel(false);
        let summary = engine(&blueprint, adapters).await.run(rx).await;

        let report = summary.last_report.unwrap();
        assert_eq!(report.devices_ok, 1);
        assert_eq!(report.devices_total(), 2);
        assert_eq!(report.sinks_ok(), 2);

        let archived = lines(&archive);
        assert_eq!(archived.len(), 1);
        assert!(archived[0].contains("host=washer"));
        assert_eq!(archived, lines(&local));
    }

    /// Unreachable InfluxDB does not stop the file sink
    #[tokio::test]
    async fn test_e2e_sink_failure_isolated() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("power.lp");
        let influx = r#"
            [[sinks]]
            name = "influx"
            endpoint = "http://127.0.0.1:9"
            auth_token = "token"
            organization = "home"
            bucket = "power"
            timeout_secs = 2
        "#;
        let blueprint = load(&config(false, &out, influx));

        let (adapters, _, _) = adapters();
        let mut engine = engine(&blueprint, adapters).await;
        let report = engine.run_cycle().await;

        assert_eq!(report.sinks_total(), 2);
        assert_eq!(report.sinks_ok(), 1);
        assert!(report.sink_outcomes[0].is_success());
        assert_eq!(report.sink_outcomes[1].sink, "influx");
        assert!(!report.sink_outcomes[1].is_success());
        assert_eq!(lines(&out).len(), 2);
    }

    /// Persistent mode reuses the cloud session across cycles
    #[tokio::test(start_paused = true)]
    async fn test_e2e_persistent_run() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("power.lp");
        let blueprint = load(&config(true, &out, ""));

        let (adapters, api, transport) = adapters();
        let engine = engine(&blueprint, adapters).await;

        let (tx, rx) = watch::channel(false);
        let task = tokio::spawn(engine.run(rx));

        // Cycles at t=0, 20, 40
        tokio::time::sleep(Duration::from_secs(50)).await;
        tx.send(true).unwrap();
        let summary = task.await.unwrap();

        assert_eq!(summary.cycles, 3);
        assert!(summary.stopped_by_signal);
        assert_eq!(summary.stats.device_successes, 6);
        assert_eq!(api.login_calls(), 1);
        assert_eq!(api.energy_calls(), 3);
        assert_eq!(transport.calls(), 3);
        assert_eq!(lines(&out).len(), 6);
    }

    #[test]
    fn test_e2e_invalid_config_is_fatal() {
        let err = ConfigLoader::load_from_str(
            r#"
            [[devices]]
            name = "fridge"
            vendor_kind = "cloud_session"
            address = "80123ABC"
            "#,
            ConfigFormat::Toml,
        )
        .unwrap_err();
        assert!(matches!(err, ContractError::ConfigValidation { .. }));
    }
}
