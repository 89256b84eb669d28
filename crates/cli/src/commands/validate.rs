//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::{CollectorBlueprint, VendorKind};
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    persist: bool,
    interval_seconds: u64,
    device_count: usize,
    cloud_device_count: usize,
    local_device_count: usize,
    sink_count: usize,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(blueprint) => {
            let warnings = collect_warnings(&blueprint);
            let cloud_device_count = blueprint
                .devices
                .iter()
                .filter(|d| d.vendor_kind == VendorKind::CloudSession)
                .count();

            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: (!warnings.is_empty()).then_some(warnings),
                summary: Some(ConfigSummary {
                    version: format!("{:?}", blueprint.version),
                    persist: blueprint.schedule.persist,
                    interval_seconds: blueprint.schedule.interval_seconds,
                    device_count: blueprint.devices.len(),
                    cloud_device_count,
                    local_device_count: blueprint.devices.len() - cloud_device_count,
                    sink_count: blueprint.sinks.len(),
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(blueprint: &CollectorBlueprint) -> Vec<String> {
    let mut warnings = Vec::new();

    if blueprint.sinks.is_empty() {
        warnings.push("No sinks configured - readings will not be stored".to_string());
    }

    if !blueprint.schedule.persist {
        warnings.push("schedule.persist is false - a single cycle will run".to_string());
    }

    for sink in &blueprint.sinks {
        if sink.endpoint.starts_with("http://") && !sink.auth_token.is_empty() {
            warnings.push(format!(
                "Sink '{}' sends its token over plain http",
                sink.name
            ));
        }
    }

    if blueprint.schedule.persist
        && blueprint.schedule.interval_seconds < blueprint.polling.timeout_secs
    {
        warnings.push(
            "schedule.interval_seconds is shorter than polling.timeout_secs".to_string(),
        );
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            if summary.persist {
                println!("  Schedule: every {}s", summary.interval_seconds);
            } else {
                println!("  Schedule: single cycle");
            }
            println!(
                "  Devices: {} ({} cloud, {} local)",
                summary.device_count, summary.cloud_device_count, summary.local_device_count
            );
            println!("  Sinks: {}", summary.sink_count);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}
