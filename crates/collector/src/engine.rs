//! Collection engine: poll → normalize → fan-out, once or on a fixed interval.

use std::time::Duration;

use contracts::{
    AcquisitionCause, CollectorBlueprint, CycleReport, DeviceDescriptor, DeviceFailure,
    FailureStage, MetricPoint, VendorAdapter,
};
use dispatcher::Dispatcher;
use observability::CycleStatsAggregator;
use tokio::sync::watch;
use tokio::time::{timeout, Instant};
use tracing::{debug, info, instrument, warn};

/// Engine state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EngineState {
    /// Between cycles (or not started)
    #[default]
    Idle,
    /// Polling devices
    Collecting,
    /// Waiting for every sink's reply
    Writing,
    /// Waiting out the interval in persistent mode
    Sleeping,
}

/// Schedule and per-call limits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Keep cycling until shut down
    pub persist: bool,
    /// Pause between the end of one cycle and the start of the next
    pub interval: Duration,
    /// Upper bound on a single device fetch
    pub poll_timeout: Duration,
}

impl EngineConfig {
    pub fn from_blueprint(blueprint: &CollectorBlueprint) -> Self {
        Self {
            persist: blueprint.schedule.persist,
            interval: blueprint.schedule.interval(),
            poll_timeout: blueprint.polling.timeout(),
        }
    }

    /// One cycle, then stop
    pub fn once(poll_timeout: Duration) -> Self {
        Self {
            persist: false,
            interval: Duration::ZERO,
            poll_timeout,
        }
    }
}

/// What a finished `run` leaves behind
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    /// Cycles completed
    pub cycles: u64,
    /// Stopped because the shutdown signal fired
    pub stopped_by_signal: bool,
    /// Aggregated cycle statistics
    pub stats: CycleStatsAggregator,
    pub last_report: Option<CycleReport>,
}

/// Drives collection cycles over a fixed device inventory
pub struct CollectionEngine<A> {
    config: EngineConfig,
    devices: Vec<DeviceDescriptor>,
    adapters: A,
    dispatcher: Dispatcher,
    state: EngineState,
    cycles: u64,
}

impl<A: VendorAdapter> CollectionEngine<A> {
    pub fn new(
        config: EngineConfig,
        devices: Vec<DeviceDescriptor>,
        adapters: A,
        dispatcher: Dispatcher,
    ) -> Self {
        Self {
            config,
            devices,
            adapters,
            dispatcher,
            state: EngineState::Idle,
            cycles: 0,
        }
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn adapters(&self) -> &A {
        &self.adapters
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Cycles completed so far
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Run one full cycle
    ///
    /// Never fails: device and sink failures are recorded in the report.
    #[instrument(name = "collection_cycle", skip(self), fields(cycle = self.cycles + 1))]
    pub async fn run_cycle(&mut self) -> CycleReport {
        let started = Instant::now();
        self.cycles += 1;
        let cycle = self.cycles;

        self.state = EngineState::Collecting;
        let mut points = Vec::with_capacity(self.devices.len());
        let mut device_failures = Vec::new();

        for device in &self.devices {
            let result = poll_device(&mut self.adapters, device, self.config.poll_timeout).await;
            observability::record_device_poll(&device.name, device.vendor_kind, result.is_ok());
            match result {
                Ok(point) => points.push(point),
                Err(failure) => {
                    warn!(
                        device = %failure.device,
                        vendor_kind = %failure.vendor_kind,
                        stage = %failure.stage,
                        cause = %failure.cause,
                        "Device skipped this cycle"
                    );
                    device_failures.push(failure);
                }
            }
        }

        self.state = EngineState::Writing;
        let sink_outcomes = self.dispatcher.dispatch(&points).await;

        let report = CycleReport {
            cycle,
            devices_ok: points.len(),
            device_failures,
            sink_outcomes,
            duration: started.elapsed(),
        };
        observability::record_cycle_metrics(&report);

        info!(
            cycle,
            devices_ok = report.devices_ok,
            devices_failed = report.devices_failed(),
            sinks_ok = report.sinks_ok(),
            sinks_failed = report.sinks_failed(),
            points = points.len(),
            duration_ms = report.duration.as_millis() as u64,
            "Cycle complete"
        );

        self.state = EngineState::Idle;
        report
    }

    /// Run until done, then drain and close every sink
    ///
    /// Non-persistent mode stops after one cycle. Persistent mode sleeps
    /// `interval` after each cycle ends. `shutdown` is honored before a
    /// cycle starts and during the sleep, never in the middle of a cycle.
    /// A dropped sender never triggers shutdown.
    #[instrument(name = "collection_engine_run", skip(self, shutdown))]
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> RunSummary {
        info!(
            devices = self.devices.len(),
            sinks = self.dispatcher.sink_count(),
            persist = self.config.persist,
            interval_secs = self.config.interval.as_secs(),
            "Collection engine started"
        );

        let mut summary = RunSummary::default();

        loop {
            if *shutdown.borrow() {
                summary.stopped_by_signal = true;
                break;
            }

            let report = self.run_cycle().await;
            summary.stats.update(&report);
            summary.cycles += 1;
            summary.last_report = Some(report);

            if !self.config.persist {
                break;
            }

            self.state = EngineState::Sleeping;
            debug!(interval_secs = self.config.interval.as_secs(), "Sleeping until next cycle");
            tokio::select! {
                _ = tokio::time::sleep(self.config.interval) => {}
                _ = shutdown_requested(&mut shutdown) => {
                    summary.stopped_by_signal = true;
                    break;
                }
            }
            self.state = EngineState::Idle;
        }

        self.state = EngineState::Idle;
        info!(
            cycles = summary.cycles,
            stopped_by_signal = summary.stopped_by_signal,
            "Collection engine stopping"
        );
        self.dispatcher.shutdown().await;
        summary
    }
}

/// Fetch and normalize one device, bounded by `limit`
async fn poll_device<A: VendorAdapter>(
    adapters: &mut A,
    device: &DeviceDescriptor,
    limit: Duration,
) -> Result<MetricPoint, DeviceFailure> {
    let reading = match timeout(limit, adapters.fetch(device)).await {
        Ok(Ok(reading)) => reading,
        Ok(Err(failure)) => {
            return Err(device_failure(
                device,
                FailureStage::Acquisition,
                failure.cause.to_string(),
            ))
        }
        Err(_) => {
            return Err(device_failure(
                device,
                FailureStage::Acquisition,
                AcquisitionCause::Timeout(limit).to_string(),
            ))
        }
    };

    vendors::normalize(device, &reading)
        .map_err(|e| device_failure(device, FailureStage::Normalization, e.reason))
}

fn device_failure(device: &DeviceDescriptor, stage: FailureStage, cause: String) -> DeviceFailure {
    DeviceFailure {
        device: device.name.clone(),
        vendor_kind: device.vendor_kind,
        stage,
        cause,
    }
}

/// Resolves once shutdown is requested; pends forever if the sender is gone
async fn shutdown_requested(shutdown: &mut watch::Receiver<bool>) {
    if shutdown.wait_for(|stop| *stop).await.is_err() {
        std::future::pending::<()>().await;
    }
}
