//! Reading normalizer
//!
//! Maps vendor payloads onto the canonical `power_watts` point:
//! - power in watts (milliwatts are divided by 1000)
//! - daily energy in watt-hours (kWh are multiplied by 1000)
//!
//! A field the vendor does not report is left out, never defaulted to zero.

use contracts::{
    CloudEnergyPayload, DeviceDescriptor, LocalEnergyPayload, MetricPoint, NormalizeError,
    PowerFields, RawReading, VendorPayload,
};

/// Normalize one raw reading into a metric point
///
/// Pure: the timestamp comes from the reading, so the same input always
/// yields the same point.
///
/// # Errors
/// - payload vendor kind differs from the device's
/// - instantaneous power missing or not a finite number
pub fn normalize(
    device: &DeviceDescriptor,
    reading: &RawReading,
) -> Result<MetricPoint, NormalizeError> {
    let payload_kind = reading.payload.vendor_kind();
    if payload_kind != device.vendor_kind {
        return Err(NormalizeError::new(
            &device.name,
            device.vendor_kind,
            format!("payload came from a {payload_kind} adapter"),
        ));
    }

    let fields = match &reading.payload {
        VendorPayload::CloudSession(payload) => cloud_fields(payload),
        VendorPayload::LocalProtocol(payload) => local_fields(payload),
    }
    .ok_or_else(|| {
        NormalizeError::new(
            &device.name,
            device.vendor_kind,
            "reading has no usable consumption_watts",
        )
    })?;

    Ok(MetricPoint::power(&device.name, fields, reading.captured_at))
}

fn cloud_fields(payload: &CloudEnergyPayload) -> Option<PowerFields> {
    let consumption_watts = finite(payload.current_power.map(|mw| mw / 1000.0))?;
    Some(PowerFields {
        consumption_watts,
        watts_today: finite(payload.today_energy),
    })
}

fn local_fields(payload: &LocalEnergyPayload) -> Option<PowerFields> {
    let consumption_watts =
        finite(payload.power).or_else(|| finite(payload.power_mw.map(|mw| mw / 1000.0)))?;
    let watts_today =
        finite(payload.today_wh).or_else(|| finite(payload.today_kwh.map(|kwh| kwh * 1000.0)));
    Some(PowerFields {
        consumption_watts,
        watts_today,
    })
}

/// Checked after unit conversion: scaling can overflow to infinity
fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use contracts::{Credentials, VendorKind};

    fn washer() -> DeviceDescriptor {
        DeviceDescriptor::new("washer", VendorKind::LocalProtocol, "192.168.1.40")
    }

    fn fridge() -> DeviceDescriptor {
        DeviceDescriptor::new("fridge", VendorKind::CloudSession, "80123ABC")
            .with_credentials(Credentials::new("me@example.com", "secret"))
    }

    fn reading(payload: VendorPayload) -> RawReading {
        RawReading {
            captured_at: Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0).unwrap(),
            payload,
        }
    }

    #[test]
    fn test_local_reading_with_daily_counter() {
        let raw = reading(VendorPayload::LocalProtocol(LocalEnergyPayload {
            power: Some(45.2),
            today_wh: Some(180.0),
            ..Default::default()
        }));

        let point = normalize(&washer(), &raw).unwrap();
        assert_eq!(point.measurement, "power_watts");
        assert_eq!(point.host, "washer");
        assert_eq!(point.fields.consumption_watts, 45.2);
        assert_eq!(point.fields.watts_today, Some(180.0));
        assert_eq!(point.timestamp, raw.captured_at);
    }

    #[test]
    fn test_cloud_reading_without_daily_counter() {
        let raw = reading(VendorPayload::CloudSession(CloudEnergyPayload {
            current_power: Some(38_000.0),
            today_energy: None,
        }));

        let point = normalize(&fridge(), &raw).unwrap();
        assert_eq!(point.host, "fridge");
        assert_eq!(point.fields.consumption_watts, 38.0);
        assert_eq!(point.fields.watts_today, None);
    }

    #[test]
    fn test_local_milliwatt_and_kwh_units() {
        let raw = reading(VendorPayload::LocalProtocol(LocalEnergyPayload {
            power_mw: Some(1_500.0),
            today_kwh: Some(0.25),
            ..Default::default()
        }));

        let point = normalize(&washer(), &raw).unwrap();
        assert_eq!(point.fields.consumption_watts, 1.5);
        assert_eq!(point.fields.watts_today, Some(250.0));
    }

    #[test]
    fn test_watts_preferred_over_milliwatts() {
        let raw = reading(VendorPayload::LocalProtocol(LocalEnergyPayload {
            power: Some(10.0),
            power_mw: Some(99_000.0),
            ..Default::default()
        }));

        let point = normalize(&washer(), &raw).unwrap();
        assert_eq!(point.fields.consumption_watts, 10.0);
    }

    #[test]
    fn test_missing_power_fails() {
        let raw = reading(VendorPayload::LocalProtocol(LocalEnergyPayload {
            today_wh: Some(180.0),
            ..Default::default()
        }));

        let err = normalize(&washer(), &raw).unwrap_err();
        assert_eq!(err.device, "washer");
        assert!(err.reason.contains("consumption_watts"));
    }

    #[test]
    fn test_non_finite_power_fails() {
        let raw = reading(VendorPayload::CloudSession(CloudEnergyPayload {
            current_power: Some(f64::NAN),
            today_energy: Some(10.0),
        }));
        assert!(normalize(&fridge(), &raw).is_err());
    }

    #[test]
    fn test_overflowing_kwh_counter_is_omitted() {
        let raw = reading(VendorPayload::LocalProtocol(LocalEnergyPayload {
            power: Some(1.0),
            today_kwh: Some(1e306),
            ..Default::default()
        }));

        let point = normalize(&washer(), &raw).unwrap();
        assert_eq!(point.fields.consumption_watts, 1.0);
        assert_eq!(point.fields.watts_today, None);
    }

    #[test]
    fn test_vendor_kind_mismatch_fails() {
        let raw = reading(VendorPayload::CloudSession(CloudEnergyPayload {
            current_power: Some(38_000.0),
            today_energy: None,
        }));
        let err = normalize(&washer(), &raw).unwrap_err();
        assert!(err.reason.contains("cloud_session"));
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let raw = reading(VendorPayload::LocalProtocol(LocalEnergyPayload {
            power: Some(45.2),
            today_wh: Some(180.0),
            ..Default::default()
        }));

        let first = normalize(&washer(), &raw).unwrap();
        let second = normalize(&washer(), &raw).unwrap();
        assert_eq!(first, second);
    }
}
