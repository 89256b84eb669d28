//! # Vendors
//!
//! Vendor acquisition and normalization.
//!
//! Responsibilities:
//! - One adapter per vendor kind behind `contracts::VendorAdapter`
//! - Per-device session caching for cloud-session vendors (re-authenticate once on expiry)
//! - HTTP transports for the cloud API and for plugs on the local network
//! - Normalizing vendor payloads into `MetricPoint`
//!
//! ## Usage Example
//!
//! ```ignore
//! use contracts::VendorAdapter;
//! use vendors::{http_adapters, normalize};
//!
//! let mut adapters = http_adapters(&blueprint)?;
//! for device in &blueprint.devices {
//!     let reading = adapters.fetch(device).await?;
//!     let point = normalize(device, &reading)?;
//! }
//! ```
//!
//! ## Mock Testing
//!
//! ```ignore
//! use vendors::mock::{MockCloudApi, MockEmeterTransport};
//!
//! let api = MockCloudApi::new();
//! api.always_expired();
//! let adapter = vendors::CloudSessionAdapter::new(api.clone());
//! ```

mod cloud;
mod error;
mod local;
pub mod mock;
mod normalizer;
mod registry;
mod session;

// Re-exports
pub use cloud::{CloudApi, CloudApiError, CloudSessionAdapter, HttpCloudApi};
pub use contracts::{RawReading, VendorAdapter};
pub use error::{Result, VendorError};
pub use local::{EmeterTransport, HttpEmeterTransport, LocalProtocolAdapter, TransportError};
pub use normalizer::normalize;
pub use registry::{http_adapters, HttpVendorAdapters, VendorAdapters};
pub use session::{SessionState, SessionStore, SessionToken};
