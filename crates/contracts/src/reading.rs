//! RawReading - vendor payloads as returned by adapters
//!
//! Only the adapter and the normalizer look inside these.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::VendorKind;

/// Energy payload returned by the cloud API
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CloudEnergyPayload {
    /// Current draw in milliwatts
    #[serde(default)]
    pub current_power: Option<f64>,

    /// Energy used today in watt-hours
    #[serde(default)]
    pub today_energy: Option<f64>,
}

/// Energy payload returned by a plug on the local network
///
/// Older firmware reports `power` (W) and `today_kwh`, newer firmware
/// `power_mw` and `today_wh`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocalEnergyPayload {
    #[serde(default)]
    pub power: Option<f64>,

    #[serde(default)]
    pub power_mw: Option<f64>,

    #[serde(default)]
    pub today_wh: Option<f64>,

    #[serde(default)]
    pub today_kwh: Option<f64>,
}

/// Vendor-specific payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "vendor_kind", rename_all = "snake_case")]
pub enum VendorPayload {
    CloudSession(CloudEnergyPayload),
    LocalProtocol(LocalEnergyPayload),
}

impl VendorPayload {
    /// Vendor kind that produced this payload
    pub fn vendor_kind(&self) -> VendorKind {
        match self {
            Self::CloudSession(_) => VendorKind::CloudSession,
            Self::LocalProtocol(_) => VendorKind::LocalProtocol,
        }
    }
}

/// One adapter call's result, stamped with the capture instant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawReading {
    pub captured_at: DateTime<Utc>,
    pub payload: VendorPayload,
}

impl RawReading {
    /// Stamp a payload with the current instant
    pub fn now(payload: VendorPayload) -> Self {
        Self {
            captured_at: Utc::now(),
            payload,
        }
    }
}
