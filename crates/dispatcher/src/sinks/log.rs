//! LogSink - logs every point via tracing

use contracts::{ContractError, MetricPoint, MetricSink};
use tracing::{info, instrument};

/// Sink that logs each point, for debugging and dry runs
pub struct LogSink {
    name: String,
}

impl LogSink {
    /// Create a new LogSink with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    fn log_point(&self, point: &MetricPoint) {
        info!(
            sink = %self.name,
            measurement = %point.measurement,
            host = %point.host,
            consumption_watts = point.fields.consumption_watts,
            watts_today = ?point.fields.watts_today,
            timestamp = %point.timestamp.to_rfc3339(),
            "MetricPoint"
        );
    }
}

impl MetricSink for LogSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "log_sink_write",
        skip(self, points),
        fields(sink = %self.name, points = points.len())
    )]
    async fn write(&mut self, points: &[MetricPoint]) -> Result<(), ContractError> {
        for point in points {
            self.log_point(point);
        }
        Ok(())
    }

    #[instrument(name = "log_sink_flush", skip(self))]
    async fn flush(&mut self) -> Result<(), ContractError> {
        // Nothing to flush for log sink
        Ok(())
    }

    #[instrument(name = "log_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        info!(sink = %self.name, "LogSink closed");
        Ok(())
    }
}
