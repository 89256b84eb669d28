//! HttpEmeterTransport - `GET http://{address}/emeter`

use std::time::Duration;

use contracts::{DeviceDescriptor, LocalEnergyPayload};
use tracing::{debug, instrument};

use super::{EmeterTransport, TransportError};
use crate::error::VendorError;

/// Plain HTTP energy meter transport
#[derive(Debug, Clone)]
pub struct HttpEmeterTransport {
    client: reqwest::Client,
}

impl HttpEmeterTransport {
    /// Create a transport with a per-request timeout
    pub fn new(timeout: Duration) -> Result<Self, VendorError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| VendorError::HttpClient {
                vendor: "local_protocol",
                source,
            })?;
        Ok(Self { client })
    }

    /// Address may be a bare host[:port] or a full URL
    fn emeter_url(address: &str) -> String {
        let base = if address.starts_with("http://") || address.starts_with("https://") {
            address.trim_end_matches('/').to_string()
        } else {
            format!("http://{}", address.trim_end_matches('/'))
        };
        format!("{base}/emeter")
    }
}

impl EmeterTransport for HttpEmeterTransport {
    #[instrument(name = "emeter_read", skip(self, device), fields(device = %device.name))]
    async fn read_emeter(
        &self,
        device: &DeviceDescriptor,
    ) -> Result<LocalEnergyPayload, TransportError> {
        let mut request = self.client.get(Self::emeter_url(&device.address));
        if let Some(credentials) = &device.credentials {
            request = request.basic_auth(&credentials.username, Some(&credentials.password));
        }

        let response = request
            .send()
            .await
            .map_err(|e| TransportError::Connection(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status(status.as_u16()));
        }

        let payload = response
            .json::<LocalEnergyPayload>()
            .await
            .map_err(|e| TransportError::Decode(e.to_string()))?;
        debug!(?payload, "Emeter reading received");
        Ok(payload)
    }
}
