//! Local-protocol vendor adapter
//!
//! Plugs answer energy queries directly on the local network. The protocol
//! is stateless per call, so nothing is cached between fetches.

mod http;

pub use self::http::HttpEmeterTransport;

use std::future::Future;

use contracts::{
    AcquisitionCause, AcquisitionFailure, DeviceDescriptor, LocalEnergyPayload, RawReading,
    VendorAdapter, VendorKind, VendorPayload,
};
use thiserror::Error;
use tracing::instrument;

/// Errors reported by a local transport
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransportError {
    /// Device unreachable / connection dropped
    #[error("connection error: {0}")]
    Connection(String),

    /// Device answered with a non-success status
    #[error("device returned status {0}")]
    Status(u16),

    /// Reply could not be decoded
    #[error("decode error: {0}")]
    Decode(String),
}

impl From<TransportError> for AcquisitionCause {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Connection(msg) => AcquisitionCause::Connection(msg),
            other => AcquisitionCause::Protocol(other.to_string()),
        }
    }
}

/// Transport that queries a plug's energy meter
pub trait EmeterTransport: Send + Sync {
    /// Request one energy meter reading from the device
    fn read_emeter(
        &self,
        device: &DeviceDescriptor,
    ) -> impl Future<Output = Result<LocalEnergyPayload, TransportError>> + Send;
}

/// Adapter for local-protocol devices
pub struct LocalProtocolAdapter<T> {
    transport: T,
}

impl<T: EmeterTransport> LocalProtocolAdapter<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }
}

impl<T: EmeterTransport> VendorAdapter for LocalProtocolAdapter<T> {
    #[instrument(
        name = "local_adapter_fetch",
        skip(self, device),
        fields(device = %device.name, address = %device.address)
    )]
    async fn fetch(&mut self, device: &DeviceDescriptor) -> Result<RawReading, AcquisitionFailure> {
        let payload = self.transport.read_emeter(device).await.map_err(|e| {
            AcquisitionFailure::new(&device.name, VendorKind::LocalProtocol, e.into())
        })?;
        Ok(RawReading::now(VendorPayload::LocalProtocol(payload)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockEmeterTransport;

    fn washer() -> DeviceDescriptor {
        DeviceDescriptor::new("washer", VendorKind::LocalProtocol, "192.168.1.40")
    }

    #[tokio::test]
    async fn test_fetch_wraps_payload() {
        let transport = MockEmeterTransport::new();
        let payload = LocalEnergyPayload {
            power: Some(45.2),
            today_wh: Some(180.0),
            ..Default::default()
        };
        transport.set_reading("192.168.1.40", payload.clone());
        let mut adapter = LocalProtocolAdapter::new(transport.clone());

        let reading = adapter.fetch(&washer()).await.unwrap();
        assert_eq!(reading.payload, VendorPayload::LocalProtocol(payload));
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn test_unreachable_device_is_failure() {
        let transport = MockEmeterTransport::new();
        let mut adapter = LocalProtocolAdapter::new(transport);

        let err = adapter.fetch(&washer()).await.unwrap_err();
        assert_eq!(err.device, "washer");
        assert_eq!(err.vendor_kind, VendorKind::LocalProtocol);
        assert!(matches!(err.cause, AcquisitionCause::Connection(_)));
    }

    #[tokio::test]
    async fn test_decode_error_is_protocol_failure() {
        let transport = MockEmeterTransport::new();
        transport.set_error("192.168.1.40", TransportError::Decode("expected value".into()));
        let mut adapter = LocalProtocolAdapter::new(transport);

        let err = adapter.fetch(&washer()).await.unwrap_err();
        assert!(matches!(err.cause, AcquisitionCause::Protocol(_)));
    }

    #[tokio::test]
    async fn test_stateless_between_calls() {
        let transport = MockEmeterTransport::new();
        transport.set_error("192.168.1.40", TransportError::Status(503));
        let mut adapter = LocalProtocolAdapter::new(transport.clone());
        assert!(adapter.fetch(&washer()).await.is_err());

        transport.set_reading(
            "192.168.1.40",
            LocalEnergyPayload {
                power_mw: Some(12_000.0),
                ..Default::default()
            },
        );
        assert!(adapter.fetch(&washer()).await.is_ok());
    }
}
