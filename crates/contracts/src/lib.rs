//! # Contracts
//!
//! Frozen interface contracts shared by every plugwatch crate: the device and
//! sink inventory, the canonical metric point, raw vendor readings, cycle
//! reports and the two capability traits (`VendorAdapter`, `MetricSink`).
//! All business crates can only depend on this crate, reverse dependencies are prohibited.
//!
//! ## Time Model
//! - Readings are stamped with a UTC capture instant by the adapter that took them
//! - The same instant becomes the metric point timestamp

mod blueprint;
mod cycle;
mod device;
mod error;
mod metric;
mod reading;
mod sink;
mod vendor;

pub use blueprint::*;
pub use cycle::*;
pub use device::*;
pub use error::*;
pub use metric::*;
pub use reading::*;
pub use sink::*;
pub use vendor::{LocalVendorAdapter, VendorAdapter};
