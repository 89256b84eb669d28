//! VendorAdapters - tag-dispatched adapter set
//!
//! Holds one adapter per vendor kind and routes each device by its
//! `vendor_kind`. Adding a vendor means a new variant and a new field here;
//! the engine only sees `VendorAdapter`.

use contracts::{
    AcquisitionFailure, CollectorBlueprint, DeviceDescriptor, RawReading, VendorAdapter,
    VendorKind,
};

use tracing::instrument;

use crate::cloud::{CloudApi, CloudSessionAdapter, HttpCloudApi};
use crate::error::VendorError;
use crate::local::{EmeterTransport, HttpEmeterTransport, LocalProtocolAdapter};

/// One adapter per vendor kind
pub struct VendorAdapters<C, T> {
    cloud: CloudSessionAdapter<C>,
    local: LocalProtocolAdapter<T>,
}

/// Adapters backed by the HTTP transports
pub type HttpVendorAdapters = VendorAdapters<HttpCloudApi, HttpEmeterTransport>;

impl<C: CloudApi, T: EmeterTransport> VendorAdapters<C, T> {
    pub fn new(cloud_api: C, local_transport: T) -> Self {
        Self {
            cloud: CloudSessionAdapter::new(cloud_api),
            local: LocalProtocolAdapter::new(local_transport),
        }
    }

    pub fn cloud(&self) -> &CloudSessionAdapter<C> {
        &self.cloud
    }

    pub fn local(&self) -> &LocalProtocolAdapter<T> {
        &self.local
    }
}

impl<C: CloudApi, T: EmeterTransport> VendorAdapter for VendorAdapters<C, T> {
    #[instrument(
        name = "vendor_fetch",
        skip(self, device),
        fields(device = %device.name, vendor_kind = %device.vendor_kind)
    )]
    async fn fetch(&mut self, device: &DeviceDescriptor) -> Result<RawReading, AcquisitionFailure> {
        match device.vendor_kind {
            VendorKind::CloudSession => self.cloud.fetch(device).await,
            VendorKind::LocalProtocol => self.local.fetch(device).await,
        }
    }
}

/// Build HTTP-backed adapters from the configuration
///
/// # Errors
/// Fails only if an HTTP client cannot be constructed.
pub fn http_adapters(blueprint: &CollectorBlueprint) -> Result<HttpVendorAdapters, VendorError> {
    let timeout = blueprint.polling.timeout();
    let cloud_api = HttpCloudApi::new(&blueprint.cloud.base_url, timeout)?;
    let local_transport = HttpEmeterTransport::new(timeout)?;
    Ok(VendorAdapters::new(cloud_api, local_transport))
}
