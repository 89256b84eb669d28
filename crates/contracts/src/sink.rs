//! Sink inventory and the MetricSink trait - Dispatcher output interface

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use validator::Validate;

use crate::{ContractError, MetricPoint};

/// Sink implementation selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkKind {
    /// InfluxDB v2 HTTP write API
    #[default]
    Influxdb,
    /// Log every point through tracing
    Log,
    /// Append line protocol to a local file
    File,
}

/// One configured time-series write target
#[derive(Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct SinkDescriptor {
    /// Unique name (used for logging/metrics)
    #[validate(length(min = 1, message = "sink name cannot be empty"))]
    pub name: String,

    #[serde(default)]
    pub kind: SinkKind,

    /// Base URL of the database
    #[serde(default)]
    pub endpoint: String,

    #[serde(default)]
    pub auth_token: String,

    #[serde(default)]
    pub organization: String,

    #[serde(default)]
    pub bucket: String,

    /// Request timeout in seconds
    #[serde(default = "default_sink_timeout_secs")]
    #[validate(range(min = 1))]
    pub timeout_secs: u64,

    /// Kind-specific parameters (e.g. `path` for file sinks)
    #[serde(default)]
    pub params: HashMap<String, String>,
}

fn default_sink_timeout_secs() -> u64 {
    10
}

impl SinkDescriptor {
    /// InfluxDB sink descriptor
    pub fn influxdb(
        name: impl Into<String>,
        endpoint: impl Into<String>,
        auth_token: impl Into<String>,
        organization: impl Into<String>,
        bucket: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            kind: SinkKind::Influxdb,
            endpoint: endpoint.into(),
            auth_token: auth_token.into(),
            organization: organization.into(),
            bucket: bucket.into(),
            timeout_secs: default_sink_timeout_secs(),
            params: HashMap::new(),
        }
    }

    /// Log sink descriptor
    pub fn log(name: impl Into<String>) -> Self {
        Self {
            kind: SinkKind::Log,
            ..Self::influxdb(name, "", "", "", "")
        }
    }
}

impl fmt::Debug for SinkDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SinkDescriptor")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("endpoint", &self.endpoint)
            .field("auth_token", &"<redacted>")
            .field("organization", &self.organization)
            .field("bucket", &self.bucket)
            .field("timeout_secs", &self.timeout_secs)
            .field("params", &self.params)
            .finish()
    }
}

/// Data output trait
///
/// All sink implementations must implement this trait.
#[trait_variant::make(MetricSink: Send)]
pub trait LocalMetricSink {
    /// Sink name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Write one cycle's points in a single attempt
    ///
    /// An empty slice must succeed without touching the target.
    ///
    /// # Errors
    /// Returns write error (should include context)
    async fn write(&mut self, points: &[MetricPoint]) -> Result<(), ContractError>;

    /// Flush buffer (if any)
    async fn flush(&mut self) -> Result<(), ContractError>;

    /// Close sink
    async fn close(&mut self) -> Result<(), ContractError>;
}
