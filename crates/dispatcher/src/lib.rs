//! # Dispatcher
//!
//! 数据分发模块。
//!
//! 负责：
//! - 接收每个周期的 `MetricPoint` 批次
//! - Fan-out 到所有 sinks，并等待每个 sink 的结果
//! - 隔离失败的 sink，不影响其他 sink

pub mod dispatcher;
pub mod error;
pub mod handle;
pub mod line_protocol;
pub mod metrics;
pub mod sinks;

pub use contracts::{MetricPoint, MetricSink, SinkOutcome};
pub use dispatcher::{create_dispatcher, Dispatcher};
pub use error::DispatcherError;
pub use handle::{SinkHandle, DEFAULT_QUEUE_CAPACITY};
pub use metrics::{MetricsSnapshot, SinkMetrics};
pub use sinks::{FileSink, InfluxSink, LogSink};
