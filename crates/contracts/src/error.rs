//! Layered error definitions
//!
//! Categorized by source: config / acquisition / normalization / sink

use std::time::Duration;

use thiserror::Error;

use crate::VendorKind;

/// Unified error type for configuration and sinks
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Sink Errors =====
    /// Sink write error
    #[error("sink '{sink_name}' write error: {message}")]
    SinkWrite { sink_name: String, message: String },

    /// Sink connection error
    #[error("sink '{sink_name}' connection error: {message}")]
    SinkConnection { sink_name: String, message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create sink write error
    pub fn sink_write(sink_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SinkWrite {
            sink_name: sink_name.into(),
            message: message.into(),
        }
    }

    /// Create sink connection error
    pub fn sink_connection(sink_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SinkConnection {
            sink_name: sink_name.into(),
            message: message.into(),
        }
    }
}

/// Why a device could not be read
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AcquisitionCause {
    /// Login refused by the vendor
    #[error("authentication rejected: {0}")]
    AuthenticationRejected(String),

    /// Session still reported expired after one re-authentication
    #[error("session expired again after re-authentication")]
    SessionExpired,

    /// Device needs credentials but none are configured
    #[error("no credentials configured")]
    MissingCredentials,

    /// Network failure
    #[error("connection error: {0}")]
    Connection(String),

    /// Unexpected status, body or decode failure
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Per-call timeout elapsed
    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

/// Device Acquisition Failure
///
/// Recovered locally: the device is skipped for the current cycle.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{vendor_kind} device '{device}': {cause}")]
pub struct AcquisitionFailure {
    pub device: String,
    pub vendor_kind: VendorKind,
    #[source]
    pub cause: AcquisitionCause,
}

impl AcquisitionFailure {
    pub fn new(device: impl Into<String>, vendor_kind: VendorKind, cause: AcquisitionCause) -> Self {
        Self {
            device: device.into(),
            vendor_kind,
            cause,
        }
    }
}

/// Normalization Failure: the reading cannot become a valid point
#[derive(Debug, Clone, PartialEq, Error)]
#[error("cannot normalize reading of {vendor_kind} device '{device}': {reason}")]
pub struct NormalizeError {
    pub device: String,
    pub vendor_kind: VendorKind,
    pub reason: String,
}

impl NormalizeError {
    pub fn new(device: impl Into<String>, vendor_kind: VendorKind, reason: impl Into<String>) -> Self {
        Self {
            device: device.into(),
            vendor_kind,
            reason: reason.into(),
        }
    }
}
