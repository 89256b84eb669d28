//! Vendor setup errors
//!
//! Runtime acquisition problems are `contracts::AcquisitionFailure` values;
//! this type only covers building the adapters at startup.

use thiserror::Error;

/// Vendor setup error
#[derive(Debug, Error)]
pub enum VendorError {
    /// HTTP client could not be built
    #[error("failed to build HTTP client for {vendor}: {source}")]
    HttpClient {
        /// Vendor kind label
        vendor: &'static str,
        #[source]
        source: reqwest::Error,
    },
}

/// Vendors Result 类型别名
pub type Result<T> = std::result::Result<T, VendorError>;
