//! Pipeline orchestrator - builds adapters, sinks and the engine from a blueprint.

use std::time::Instant;

use anyhow::{Context, Result};
use collector::{CollectionEngine, EngineConfig};
use contracts::{CollectorBlueprint, VendorAdapter};
use tokio::sync::watch;
use tracing::{info, warn};

use super::PipelineStats;

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Validated collector configuration (CLI overrides applied)
    pub blueprint: CollectorBlueprint,

    /// Metrics server port (None = disabled)
    pub metrics_port: Option<u16>,
}

/// Main pipeline orchestrator
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Run against the real vendor APIs until done or shut down
    pub async fn run(self, shutdown: watch::Receiver<bool>) -> Result<PipelineStats> {
        if let Some(port) = self.config.metrics_port {
            observability::init_metrics_only(port)?;
        }

        let adapters = vendors::http_adapters(&self.config.blueprint)
            .context("Failed to create vendor HTTP clients")?;

        self.run_with_adapters(adapters, shutdown).await
    }

    /// Run with caller-supplied adapters
    pub async fn run_with_adapters<A: VendorAdapter>(
        self,
        adapters: A,
        shutdown: watch::Receiver<bool>,
    ) -> Result<PipelineStats> {
        let start_time = Instant::now();
        let blueprint = self.config.blueprint;

        if blueprint.sinks.is_empty() {
            warn!("No sinks configured - readings will only be logged in cycle summaries");
        }

        let dispatcher = dispatcher::create_dispatcher(&blueprint.sinks)
            .await
            .context("Failed to create dispatcher")?;

        let engine_config = EngineConfig::from_blueprint(&blueprint);
        info!(
            devices = blueprint.devices.len(),
            sinks = dispatcher.sink_count(),
            persist = engine_config.persist,
            interval_secs = engine_config.interval.as_secs(),
            timeout_secs = engine_config.poll_timeout.as_secs(),
            "Collector configured"
        );

        let devices = blueprint.devices.len();
        let sinks = dispatcher.sink_count();
        let engine = CollectionEngine::new(engine_config, blueprint.devices, adapters, dispatcher);
        let summary = engine.run(shutdown).await;

        Ok(PipelineStats {
            cycles: summary.cycles,
            stopped_by_signal: summary.stopped_by_signal,
            duration: start_time.elapsed(),
            devices,
            sinks,
            cycle_stats: summary.stats,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{LocalEnergyPayload, SinkDescriptor, SinkKind, VendorPayload};
    use vendors::mock::MockVendorAdapter;

    const CONFIG: &str = r#"
        [[devices]]
        name = "washer"
        vendor_kind = "local_protocol"
        address = "192.168.1.40"

        [[devices]]
        name = "dryer"
        vendor_kind = "local_protocol"
        address = "192.168.1.41"
    "#;

    #[tokio::test]
    async fn test_single_cycle_to_file_sink() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("points.lp");

        let mut blueprint =
            config_loader::ConfigLoader::load_from_str(CONFIG, config_loader::ConfigFormat::Toml)
                .unwrap();
        let mut file = SinkDescriptor::log("file");
        file.kind = SinkKind::File;
        file.params
            .insert("path".to_string(), out.display().to_string());
        blueprint.sinks.push(file);

        let adapter = MockVendorAdapter::new();
        adapter.set_reading(
            "washer",
            VendorPayload::LocalProtocol(LocalEnergyPayload {
                power: Some(45.2),
                ..Default::default()
            }),
        );

        let (_tx, rx) = watch::channel(false);
        let stats = Pipeline::new(PipelineConfig {
            blueprint,
            metrics_port: None,
        })
        .run_with_adapters(adapter, rx)
        .await
        .unwrap();

        assert_eq!(stats.cycles, 1);
        assert_eq!(stats.devices, 2);
        assert_eq!(stats.cycle_stats.device_successes, 1);
        assert_eq!(stats.cycle_stats.failures_by_device.get("dryer"), Some(&1));

        let written = std::fs::read_to_string(&out).unwrap();
        assert_eq!(written.lines().count(), 1);
        assert!(written.starts_with("power_watts,host=washer consumption_watts=45.2 "));
    }
}
