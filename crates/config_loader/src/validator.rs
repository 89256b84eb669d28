//! 配置校验模块
//!
//! 校验规则：
//! - 字段级规则 (validator derive)：名称/地址非空、超时 >= 1
//! - 至少一个设备
//! - device name 唯一
//! - cloud_session 设备必须配置凭据，且 cloud.base_url 合法
//! - sink name 唯一，influxdb / file sink 必填字段齐全
//! - 常驻模式下 interval_seconds >= 1

use std::collections::HashSet;

use contracts::{CollectorBlueprint, ContractError, SinkKind, VendorKind};
use validator::Validate;

/// 校验 CollectorBlueprint 配置
///
/// 返回第一个遇到的错误，或 Ok(())。
pub fn validate(blueprint: &CollectorBlueprint) -> Result<(), ContractError> {
    validate_fields(blueprint)?;
    validate_device_inventory(blueprint)?;
    validate_cloud_devices(blueprint)?;
    validate_sinks(blueprint)?;
    validate_schedule(blueprint)?;
    Ok(())
}

/// 字段级校验
fn validate_fields(blueprint: &CollectorBlueprint) -> Result<(), ContractError> {
    blueprint
        .validate()
        .map_err(|e| ContractError::config_validation("fields", e.to_string()))
}

/// 校验设备清单非空且名称唯一
fn validate_device_inventory(blueprint: &CollectorBlueprint) -> Result<(), ContractError> {
    if blueprint.devices.is_empty() {
        return Err(ContractError::config_validation(
            "devices",
            "at least one device must be configured",
        ));
    }

    let mut seen = HashSet::new();
    for device in &blueprint.devices {
        if !seen.insert(device.name.as_str()) {
            return Err(ContractError::config_validation(
                format!("devices[name={}]", device.name),
                "duplicate device name",
            ));
        }
    }
    Ok(())
}

/// 校验云端设备凭据与 API 地址
fn validate_cloud_devices(blueprint: &CollectorBlueprint) -> Result<(), ContractError> {
    let mut has_cloud_device = false;
    for device in &blueprint.devices {
        if device.vendor_kind != VendorKind::CloudSession {
            continue;
        }
        has_cloud_device = true;
        if device.credentials.is_none() {
            return Err(ContractError::config_validation(
                format!("devices[{}].credentials", device.name),
                "cloud_session devices require credentials",
            ));
        }
    }

    if has_cloud_device && !is_http_url(&blueprint.cloud.base_url) {
        return Err(ContractError::config_validation(
            "cloud.base_url",
            format!(
                "cloud.base_url must be an http(s) URL, got '{}'",
                blueprint.cloud.base_url
            ),
        ));
    }
    Ok(())
}

/// 校验 sink 配置
fn validate_sinks(blueprint: &CollectorBlueprint) -> Result<(), ContractError> {
    let mut seen = HashSet::new();
    for (idx, sink) in blueprint.sinks.iter().enumerate() {
        if !seen.insert(sink.name.as_str()) {
            return Err(ContractError::config_validation(
                format!("sinks[{}].name", idx),
                format!("duplicate sink name '{}'", sink.name),
            ));
        }

        match sink.kind {
            SinkKind::Influxdb => {
                if !is_http_url(&sink.endpoint) {
                    return Err(ContractError::config_validation(
                        format!("sinks[{}].endpoint", sink.name),
                        format!("endpoint must be an http(s) URL, got '{}'", sink.endpoint),
                    ));
                }
                if sink.organization.is_empty() {
                    return Err(ContractError::config_validation(
                        format!("sinks[{}].organization", sink.name),
                        "organization cannot be empty",
                    ));
                }
                if sink.bucket.is_empty() {
                    return Err(ContractError::config_validation(
                        format!("sinks[{}].bucket", sink.name),
                        "bucket cannot be empty",
                    ));
                }
            }
            SinkKind::File => {
                if sink.params.get("path").is_none_or(|p| p.is_empty()) {
                    return Err(ContractError::config_validation(
                        format!("sinks[{}].params.path", sink.name),
                        "file sinks require a 'path' parameter",
                    ));
                }
            }
            SinkKind::Log => {}
        }
    }
    Ok(())
}

/// 校验调度配置
fn validate_schedule(blueprint: &CollectorBlueprint) -> Result<(), ContractError> {
    let schedule = &blueprint.schedule;
    if schedule.persist && schedule.interval_seconds == 0 {
        return Err(ContractError::config_validation(
            "schedule.interval_seconds",
            "interval_seconds must be >= 1 when persist is enabled",
        ));
    }
    Ok(())
}

fn is_http_url(value: &str) -> bool {
    let rest = value
        .strip_prefix("https://")
        .or_else(|| value.strip_prefix("http://"));
    matches!(rest, Some(host) if !host.is_empty())
}
