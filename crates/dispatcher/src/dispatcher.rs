//! Dispatcher - fan-out of one cycle's points to every sink

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use contracts::{MetricPoint, SinkDescriptor, SinkKind, SinkOutcome};

use crate::error::DispatcherError;
use crate::handle::{SinkHandle, DEFAULT_QUEUE_CAPACITY};
use crate::metrics::MetricsSnapshot;
use crate::sinks::{FileSink, InfluxSink, LogSink};

/// Create a SinkHandle from configuration
#[instrument(
    name = "dispatcher_create_sink_handle",
    skip(descriptor),
    fields(sink = %descriptor.name, sink_kind = ?descriptor.kind)
)]
fn create_sink_handle(descriptor: &SinkDescriptor) -> Result<SinkHandle, DispatcherError> {
    match descriptor.kind {
        SinkKind::Influxdb => {
            let sink = InfluxSink::from_descriptor(descriptor)?;
            Ok(SinkHandle::spawn(sink, DEFAULT_QUEUE_CAPACITY))
        }
        SinkKind::Log => {
            let sink = LogSink::new(&descriptor.name);
            Ok(SinkHandle::spawn(sink, DEFAULT_QUEUE_CAPACITY))
        }
        SinkKind::File => {
            let sink = FileSink::from_params(&descriptor.name, &descriptor.params)
                .map_err(|e| DispatcherError::sink_creation(&descriptor.name, e.to_string()))?;
            Ok(SinkHandle::spawn(sink, DEFAULT_QUEUE_CAPACITY))
        }
    }
}

/// Owns one worker per sink and hands each of them every batch
pub struct Dispatcher {
    handles: Vec<SinkHandle>,
}

impl Dispatcher {
    /// Spawn a worker for every configured sink
    ///
    /// Must run inside a tokio runtime. Already spawned workers are shut
    /// down if a later sink fails to build.
    #[instrument(
        name = "dispatcher_from_descriptors",
        skip(descriptors),
        fields(sink_count = descriptors.len())
    )]
    pub async fn from_descriptors(descriptors: &[SinkDescriptor]) -> Result<Self, DispatcherError> {
        let mut handles = Vec::with_capacity(descriptors.len());
        for descriptor in descriptors {
            match create_sink_handle(descriptor) {
                Ok(handle) => handles.push(handle),
                Err(e) => {
                    Self::shutdown_handles(handles).await;
                    return Err(e);
                }
            }
        }
        info!(sinks = handles.len(), "Dispatcher started");
        Ok(Self { handles })
    }

    /// Create a dispatcher with custom sink handles (for testing)
    pub fn with_handles(handles: Vec<SinkHandle>) -> Self {
        Self { handles }
    }

    pub fn sink_count(&self) -> usize {
        self.handles.len()
    }

    pub fn sink_names(&self) -> Vec<&str> {
        self.handles.iter().map(SinkHandle::name).collect()
    }

    /// Get metrics for all sinks
    pub fn metrics(&self) -> Vec<(String, MetricsSnapshot)> {
        self.handles
            .iter()
            .map(|h| (h.name().to_string(), h.metrics().snapshot()))
            .collect()
    }

    /// Write the same points to every sink and collect one outcome per sink
    ///
    /// All sinks are handed the batch before any reply is awaited, so the
    /// writes overlap. Outcomes come back in sink configuration order.
    #[instrument(name = "dispatcher_dispatch", skip(self, points), fields(points = points.len()))]
    pub async fn dispatch(&self, points: &[MetricPoint]) -> Vec<SinkOutcome> {
        let batch = Arc::new(points.to_vec());

        let mut pending = Vec::with_capacity(self.handles.len());
        for handle in &self.handles {
            pending.push(handle.submit(Arc::clone(&batch)).await);
        }

        let mut outcomes = Vec::with_capacity(pending.len());
        for write in pending {
            let outcome = write.outcome().await;
            match &outcome.result {
                Ok(()) => debug!(sink = %outcome.sink, points = outcome.points, "Sink write ok"),
                Err(e) => warn!(sink = %outcome.sink, error = %e, "Sink write failed"),
            }
            outcomes.push(outcome);
        }
        outcomes
    }

    /// Drain every worker, then flush and close its sink
    #[instrument(name = "dispatcher_shutdown", skip(self))]
    pub async fn shutdown(self) {
        Self::shutdown_handles(self.handles).await;
        info!("Dispatcher shutdown complete");
    }

    async fn shutdown_handles(handles: Vec<SinkHandle>) {
        for handle in handles {
            handle.shutdown().await;
        }
    }
}

/// Convenience function to create a dispatcher from sink configs
pub async fn create_dispatcher(
    descriptors: &[SinkDescriptor],
) -> Result<Dispatcher, DispatcherError> {
    Dispatcher::from_descriptors(descriptors).await
}
