//! `info` command implementation.

use anyhow::{Context, Result};
use contracts::{CollectorBlueprint, DeviceDescriptor, SinkDescriptor};
use serde::Serialize;
use tracing::info;

use crate::cli::InfoArgs;

const REDACTED: &str = "<redacted>";

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    schedule: ScheduleInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    cloud_base_url: Option<String>,
    device_count: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    devices: Vec<DeviceInfo>,
    sink_count: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    sinks: Vec<SinkInfo>,
}

#[derive(Serialize)]
struct ScheduleInfo {
    persist: bool,
    interval_seconds: u64,
    timeout_secs: u64,
}

#[derive(Serialize)]
struct DeviceInfo {
    name: String,
    vendor_kind: String,
    address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    password: Option<&'static str>,
}

#[derive(Serialize)]
struct SinkInfo {
    name: String,
    kind: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    endpoint: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    organization: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    bucket: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    auth_token: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    path: Option<String>,
}

impl From<&DeviceDescriptor> for DeviceInfo {
    fn from(device: &DeviceDescriptor) -> Self {
        Self {
            name: device.name.clone(),
            vendor_kind: device.vendor_kind.to_string(),
            address: device.address.clone(),
            username: device.credentials.as_ref().map(|c| c.username.clone()),
            password: device.credentials.as_ref().map(|_| REDACTED),
        }
    }
}

impl From<&SinkDescriptor> for SinkInfo {
    fn from(sink: &SinkDescriptor) -> Self {
        Self {
            name: sink.name.clone(),
            kind: format!("{:?}", sink.kind).to_lowercase(),
            endpoint: sink.endpoint.clone(),
            organization: sink.organization.clone(),
            bucket: sink.bucket.clone(),
            auth_token: (!sink.auth_token.is_empty()).then_some(REDACTED),
            path: sink.params.get("path").cloned(),
        }
    }
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    let blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    if args.json {
        let info = build_config_info(&blueprint, args);
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&blueprint, args);
    }

    Ok(())
}

fn build_config_info(blueprint: &CollectorBlueprint, args: &InfoArgs) -> ConfigInfo {
    let devices = if args.devices {
        blueprint.devices.iter().map(DeviceInfo::from).collect()
    } else {
        Vec::new()
    };

    let sinks = if args.sinks {
        blueprint.sinks.iter().map(SinkInfo::from).collect()
    } else {
        Vec::new()
    };

    ConfigInfo {
        version: format!("{:?}", blueprint.version),
        schedule: ScheduleInfo {
            persist: blueprint.schedule.persist,
            interval_seconds: blueprint.schedule.interval_seconds,
            timeout_secs: blueprint.polling.timeout_secs,
        },
        cloud_base_url: (!blueprint.cloud.base_url.is_empty())
            .then(|| blueprint.cloud.base_url.clone()),
        device_count: blueprint.devices.len(),
        devices,
        sink_count: blueprint.sinks.len(),
        sinks,
    }
}

fn print_config_info(blueprint: &CollectorBlueprint, args: &InfoArgs) {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║                  plugwatch Configuration                     ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    println!("⏱  Schedule");
    println!("   ├─ Version: {:?}", blueprint.version);
    if blueprint.schedule.persist {
        println!("   ├─ Mode: every {}s", blueprint.schedule.interval_seconds);
    } else {
        println!("   ├─ Mode: single cycle");
    }
    println!("   └─ Poll timeout: {}s", blueprint.polling.timeout_secs);

    println!("\n🔌 Devices ({})", blueprint.devices.len());
    for (i, device) in blueprint.devices.iter().enumerate() {
        let is_last = i == blueprint.devices.len() - 1;
        let prefix = if is_last { "└─" } else { "├─" };
        let child_prefix = if is_last { "   " } else { "│  " };

        println!("   {} {} ({})", prefix, device.name, device.vendor_kind);

        if args.devices {
            println!("   {}  ├─ Address: {}", child_prefix, device.address);
            match &device.credentials {
                Some(credentials) => println!(
                    "   {}  └─ Login: {} / {}",
                    child_prefix, credentials.username, REDACTED
                ),
                None => println!("   {}  └─ Login: none", child_prefix),
            }
        }
    }

    if !blueprint.sinks.is_empty() {
        println!("\n📤 Sinks ({})", blueprint.sinks.len());
        for (i, sink) in blueprint.sinks.iter().enumerate() {
            let is_last = i == blueprint.sinks.len() - 1;
            let prefix = if is_last { "└─" } else { "├─" };
            let info = SinkInfo::from(sink);
            if args.sinks && !info.endpoint.is_empty() {
                println!(
                    "   {} {} ({}) → {} [{}/{}]",
                    prefix, info.name, info.kind, info.endpoint, info.organization, info.bucket
                );
            } else {
                println!("   {} {} ({})", prefix, info.name, info.kind);
            }
        }
    }

    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{Credentials, VendorKind};

    #[test]
    fn test_secrets_redacted() {
        let mut blueprint = config_loader::ConfigLoader::load_from_str(
            r#"
            [cloud]
            base_url = "https://cloud.example.com"

            [[devices]]
            name = "fridge"
            vendor_kind = "cloud_session"
            address = "80123ABC"
            credentials = { username = "me@example.com", password = "hunter2" }

            [[sinks]]
            name = "influx"
            endpoint = "https://influx.example.com"
            auth_token = "very-secret-token"
            organization = "home"
            bucket = "power"
            "#,
            config_loader::ConfigFormat::Toml,
        )
        .unwrap();
        blueprint.devices.push(
            DeviceDescriptor::new("kettle", VendorKind::LocalProtocol, "10.0.0.9")
                .with_credentials(Credentials::new("admin", "pw")),
        );

        let args = InfoArgs {
            config: "unused.toml".into(),
            json: true,
            devices: true,
            sinks: true,
        };
        let json = serde_json::to_string(&build_config_info(&blueprint, &args)).unwrap();

        assert!(!json.contains("hunter2"));
        assert!(!json.contains("very-secret-token"));
        assert!(json.contains("me@example.com"));
        assert!(json.contains(REDACTED));
        assert!(json.contains("\"kind\":\"influxdb\""));
    }

    #[test]
    fn test_details_hidden_by_default() {
        let blueprint = config_loader::ConfigLoader::load_from_str(
            r#"
            [[devices]]
            name = "washer"
            vendor_kind = "local_protocol"
            address = "192.168.1.40"
            "#,
            config_loader::ConfigFormat::Toml,
        )
        .unwrap();
        let args = InfoArgs {
            config: "unused.toml".into(),
            json: true,
            devices: false,
            sinks: false,
        };

        let info = build_config_info(&blueprint, &args);
        assert_eq!(info.device_count, 1);
        assert!(info.devices.is_empty());
        assert!(info.cloud_base_url.is_none());
    }
}
