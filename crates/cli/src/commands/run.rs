//! `run` command implementation.

use anyhow::{Context, Result};
use contracts::CollectorBlueprint;
use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::cli::RunArgs;
use crate::pipeline::{Pipeline, PipelineConfig};

/// Execute the `run` command
pub async fn run_collector(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");

    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    let mut blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    apply_overrides(&mut blueprint, args)?;

    info!(
        devices = blueprint.devices.len(),
        sinks = blueprint.sinks.len(),
        persist = blueprint.schedule.persist,
        interval_secs = blueprint.schedule.interval_seconds,
        "Configuration loaded"
    );

    // Dry run - just validate and exit
    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_config_summary(&blueprint);
        return Ok(());
    }

    let pipeline = Pipeline::new(PipelineConfig {
        blueprint,
        metrics_port: (args.metrics_port != 0).then_some(args.metrics_port),
    });

    // Shutdown is only observed between cycles
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        shutdown_signal().await;
        warn!("Received shutdown signal, stopping after the current cycle...");
        let _ = shutdown_tx.send(true);
    });

    info!("Starting collector...");
    let stats = pipeline
        .run(shutdown_rx)
        .await
        .context("Collector execution failed")?;

    info!(
        cycles = stats.cycles,
        stopped_by_signal = stats.stopped_by_signal,
        duration_secs = stats.duration.as_secs_f64(),
        "Collector finished"
    );
    stats.print_summary();

    Ok(())
}

/// Apply `--once`/`--persist`/`--interval` and re-check the result
fn apply_overrides(blueprint: &mut CollectorBlueprint, args: &RunArgs) -> Result<()> {
    if let Some(persist) = args.persist_override() {
        info!(persist, "Overriding schedule.persist from CLI");
        blueprint.schedule.persist = persist;
    }
    if let Some(interval) = args.interval {
        info!(interval_secs = interval, "Overriding schedule.interval_seconds from CLI");
        blueprint.schedule.interval_seconds = interval;
    }

    config_loader::ConfigLoader::validate(blueprint)
        .context("Configuration invalid after CLI overrides")
}

/// Resolve on Ctrl+C or SIGTERM
///
/// A handler that cannot be installed never fires.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Print configuration summary for dry-run mode
fn print_config_summary(blueprint: &CollectorBlueprint) {
    println!("\n=== Configuration Summary ===\n");
    println!("Schedule:");
    if blueprint.schedule.persist {
        println!(
            "  Persistent, {}s between cycles",
            blueprint.schedule.interval_seconds
        );
    } else {
        println!("  Single cycle");
    }
    println!("  Poll timeout: {}s", blueprint.polling.timeout_secs);

    println!("\nDevices ({}):", blueprint.devices.len());
    for device in &blueprint.devices {
        println!(
            "  - {} ({}) @ {}",
            device.name, device.vendor_kind, device.address
        );
    }

    if !blueprint.sinks.is_empty() {
        println!("\nSinks ({}):", blueprint.sinks.len());
        for sink in &blueprint.sinks {
            println!("  - {} ({:?})", sink.name, sink.kind);
        }
    }

    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use clap::Parser;

    const CONFIG: &str = r#"
        [[devices]]
        name = "washer"
        vendor_kind = "local_protocol"
        address = "192.168.1.40"
    "#;

    fn args(argv: &[&str]) -> RunArgs {
        match Cli::try_parse_from(argv).unwrap().command {
            Commands::Run(args) => args,
            _ => unreachable!(),
        }
    }

    fn blueprint() -> CollectorBlueprint {
        config_loader::ConfigLoader::load_from_str(CONFIG, config_loader::ConfigFormat::Toml)
            .unwrap()
    }

    #[test]
    fn test_overrides_applied() {
        let mut bp = blueprint();
        assert!(!bp.schedule.persist);

        apply_overrides(&mut bp, &args(&["plugwatch", "run", "--persist", "--interval", "20"]))
            .unwrap();
        assert!(bp.schedule.persist);
        assert_eq!(bp.schedule.interval_seconds, 20);
    }

    #[test]
    fn test_zero_interval_rejected_when_persistent() {
        let mut bp = blueprint();
        let result = apply_overrides(
            &mut bp,
            &args(&["plugwatch", "run", "--persist", "--interval", "0"]),
        );
        assert!(result.is_err());
    }
}
