//! CollectorBlueprint - Config Loader output
//!
//! 描述完整的采集配置：调度、轮询、云端 API、设备清单、输出路由。

use serde::{Deserialize, Serialize};
use std::time::Duration;
use validator::Validate;

use crate::{DeviceDescriptor, SinkDescriptor};

/// 配置版本
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// 完整的采集配置蓝图
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CollectorBlueprint {
    /// 配置版本
    #[serde(default)]
    pub version: ConfigVersion,

    /// 单次 / 常驻调度
    #[serde(default)]
    pub schedule: ScheduleConfig,

    /// 轮询参数
    #[serde(default)]
    #[validate(nested)]
    pub polling: PollingConfig,

    /// 云端会话 API
    #[serde(default)]
    pub cloud: CloudApiConfig,

    /// 设备清单 (按顺序轮询)
    #[validate(nested)]
    pub devices: Vec<DeviceDescriptor>,

    /// 输出路由配置
    #[serde(default)]
    #[validate(nested)]
    pub sinks: Vec<SinkDescriptor>,
}

/// 调度配置
///
/// `persist = false` 时只运行一个周期。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// 是否常驻循环
    #[serde(default)]
    pub persist: bool,

    /// 两个周期之间的空闲秒数 (从上一周期结束开始计算)
    #[serde(default = "default_interval_seconds")]
    pub interval_seconds: u64,
}

fn default_interval_seconds() -> u64 {
    60
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            persist: false,
            interval_seconds: default_interval_seconds(),
        }
    }
}

impl ScheduleConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_seconds)
    }
}

/// 轮询配置
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct PollingConfig {
    /// 单个设备调用超时 (秒)
    #[serde(default = "default_poll_timeout_secs")]
    #[validate(range(min = 1, message = "timeout_secs must be >= 1"))]
    pub timeout_secs: u64,
}

fn default_poll_timeout_secs() -> u64 {
    10
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_poll_timeout_secs(),
        }
    }
}

impl PollingConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// 云端会话 API 配置
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloudApiConfig {
    /// API 根地址，存在云端设备时必填
    #[serde(default)]
    pub base_url: String,
}
