//! Device inventory types

use serde::{Deserialize, Serialize};
use std::fmt;
use validator::Validate;

/// Protocol / authentication family a device belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VendorKind {
    /// Readings go through a vendor cloud that requires a session token
    CloudSession,
    /// Readings are requested directly from the device on the local network
    LocalProtocol,
}

impl VendorKind {
    /// Stable label used in logs and metric labels
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CloudSession => "cloud_session",
            Self::LocalProtocol => "local_protocol",
        }
    }
}

impl fmt::Display for VendorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Account credentials for a device
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct Credentials {
    #[validate(length(min = 1))]
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

// Never print the password
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// One smart plug in the inventory
///
/// Immutable for the lifetime of the process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct DeviceDescriptor {
    /// Unique name, becomes the `host` tag of every metric point
    #[validate(length(min = 1, message = "device name cannot be empty"))]
    pub name: String,

    /// Which adapter polls this device
    pub vendor_kind: VendorKind,

    /// Local network address (local devices) or cloud device id (cloud devices)
    #[validate(length(min = 1, message = "device address cannot be empty"))]
    pub address: String,

    /// Credentials, required for cloud devices
    #[serde(default)]
    #[validate(nested)]
    pub credentials: Option<Credentials>,
}

impl DeviceDescriptor {
    /// Create a device without credentials
    pub fn new(
        name: impl Into<String>,
        vendor_kind: VendorKind,
        address: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            vendor_kind,
            address: address.into(),
            credentials: None,
        }
    }

    /// Attach credentials
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }
}
