//! MetricPoint - canonical normalized reading
//!
//! Every vendor payload ends up as one of these, whatever protocol produced it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Measurement name shared by every point
pub const POWER_MEASUREMENT: &str = "power_watts";

/// Field values carried by a power point
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PowerFields {
    /// Instantaneous draw in watts (mandatory)
    pub consumption_watts: f64,

    /// Energy used since local midnight in watt-hours.
    /// `None` means the vendor does not report it, never zero.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub watts_today: Option<f64>,
}

/// One normalized reading of one device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricPoint {
    /// Always [`POWER_MEASUREMENT`]
    pub measurement: String,

    /// Device descriptor name
    pub host: String,

    pub fields: PowerFields,

    /// Capture instant
    pub timestamp: DateTime<Utc>,
}

impl MetricPoint {
    /// Create a `power_watts` point for a device
    pub fn power(host: impl Into<String>, fields: PowerFields, timestamp: DateTime<Utc>) -> Self {
        Self {
            measurement: POWER_MEASUREMENT.to_string(),
            host: host.into(),
            fields,
            timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_power_point_uses_fixed_measurement() {
        let point = MetricPoint::power(
            "washer",
            PowerFields {
                consumption_watts: 45.2,
                watts_today: Some(180.0),
            },
            Utc::now(),
        );
        assert_eq!(point.measurement, "power_watts");
        assert_eq!(point.host, "washer");
    }

    #[test]
    fn test_missing_daily_counter_not_serialized() {
        let fields = PowerFields {
            consumption_watts: 38.0,
            watts_today: None,
        };
        let json = serde_json::to_string(&fields).unwrap();
        assert!(!json.contains("watts_today"));
    }
}
