//! VendorAdapter trait - acquisition capability
//!
//! The engine calls `fetch` and nothing else on a vendor integration.

use crate::{AcquisitionFailure, DeviceDescriptor, RawReading};

/// Uniform acquisition capability
///
/// Takes `&mut self` so an adapter can own per-device state (sessions)
/// without any locking; the engine drives adapters from a single task.
#[trait_variant::make(VendorAdapter: Send)]
pub trait LocalVendorAdapter {
    /// Take one reading from `device`
    ///
    /// # Errors
    /// Returns an [`AcquisitionFailure`] naming the device, vendor kind and cause.
    /// Failures are never process-fatal.
    async fn fetch(&mut self, device: &DeviceDescriptor) -> Result<RawReading, AcquisitionFailure>;
}
