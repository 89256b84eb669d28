//! # Collector
//!
//! 采集引擎：按周期轮询设备、归一化读数、分发到所有 sinks。
//!
//! 负责：
//! - 按 inventory 顺序逐个轮询设备（每次调用带超时）
//! - 失败隔离：单个设备或 sink 失败不影响其他
//! - 持续模式下按固定间隔循环，周期之间响应关闭信号
//!
//! ## 使用示例
//!
//! ```ignore
//! use collector::{CollectionEngine, EngineConfig};
//!
//! let adapters = vendors::http_adapters(&blueprint)?;
//! let dispatcher = dispatcher::create_dispatcher(&blueprint.sinks).await?;
//! let engine = CollectionEngine::new(
//!     EngineConfig::from_blueprint(&blueprint),
//!     blueprint.devices.clone(),
//!     adapters,
//!     dispatcher,
//! );
//!
//! let (_tx, rx) = tokio::sync::watch::channel(false);
//! let summary = engine.run(rx).await;
//! ```

mod engine;

pub use engine::{CollectionEngine, EngineConfig, EngineState, RunSummary};

// Re-export contracts types
pub use contracts::{CycleReport, DeviceFailure, FailureStage, SinkOutcome};
