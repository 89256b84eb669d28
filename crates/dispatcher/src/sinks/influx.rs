//! InfluxSink - InfluxDB v2 HTTP write API
//!
//! One POST per batch, no retry. Anything but a 2xx is a failed write.

use std::time::Duration;

use contracts::{ContractError, MetricPoint, MetricSink, SinkDescriptor};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Url};
use tracing::{debug, instrument, warn};

use crate::error::DispatcherError;
use crate::line_protocol;

/// Sink that writes line protocol to `/api/v2/write`
pub struct InfluxSink {
    name: String,
    client: Client,
    write_url: Url,
    auth_token: String,
}

impl InfluxSink {
    /// Build the sink from its inventory entry
    pub fn from_descriptor(descriptor: &SinkDescriptor) -> Result<Self, DispatcherError> {
        let write_url = Self::write_url(descriptor)
            .map_err(|e| DispatcherError::sink_creation(&descriptor.name, e))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(descriptor.timeout_secs))
            .build()
            .map_err(|e| DispatcherError::sink_creation(&descriptor.name, e.to_string()))?;

        Ok(Self {
            name: descriptor.name.clone(),
            client,
            write_url,
            auth_token: descriptor.auth_token.clone(),
        })
    }

    /// `{endpoint}/api/v2/write?org=..&bucket=..&precision=ns`
    fn write_url(descriptor: &SinkDescriptor) -> Result<Url, String> {
        let base = descriptor.endpoint.trim_end_matches('/');
        Url::parse_with_params(
            &format!("{base}/api/v2/write"),
            &[
                ("org", descriptor.organization.as_str()),
                ("bucket", descriptor.bucket.as_str()),
                ("precision", "ns"),
            ],
        )
        .map_err(|e| format!("invalid endpoint '{}': {e}", descriptor.endpoint))
    }

    pub fn url(&self) -> &Url {
        &self.write_url
    }
}

impl MetricSink for InfluxSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "influx_sink_write",
        skip(self, points),
        fields(sink = %self.name, points = points.len())
    )]
    async fn write(&mut self, points: &[MetricPoint]) -> Result<(), ContractError> {
        if points.is_empty() {
            return Ok(());
        }

        let body = line_protocol::encode_batch(points);
        let response = self
            .client
            .post(self.write_url.clone())
            .header(AUTHORIZATION, format!("Token {}", self.auth_token))
            .header(CONTENT_TYPE, "text/plain; charset=utf-8")
            .body(body)
            .send()
            .await
            .map_err(|e| {
                warn!(sink = %self.name, error = %e, "InfluxDB request failed");
                ContractError::sink_connection(&self.name, e.to_string())
            })?;

        let status = response.status();
        if status.is_success() {
            debug!(sink = %self.name, status = status.as_u16(), "Batch accepted");
            return Ok(());
        }

        let detail = response.text().await.unwrap_or_default();
        Err(ContractError::sink_write(
            &self.name,
            format!("status {}: {}", status.as_u16(), detail.trim()),
        ))
    }

    #[instrument(name = "influx_sink_flush", skip(self))]
    async fn flush(&mut self) -> Result<(), ContractError> {
        // Every write is sent immediately
        Ok(())
    }

    #[instrument(name = "influx_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        debug!(sink = %self.name, "InfluxSink closed");
        Ok(())
    }
}
