//! CycleReport - outcome of one collection cycle
//!
//! Not persisted; handed to logging/metrics and then dropped.

use std::fmt;
use std::time::Duration;

use crate::VendorKind;

/// Stage at which a device dropped out of a cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureStage {
    Acquisition,
    Normalization,
}

impl fmt::Display for FailureStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Acquisition => f.write_str("acquisition"),
            Self::Normalization => f.write_str("normalization"),
        }
    }
}

/// A device that contributed no point this cycle
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceFailure {
    pub device: String,
    pub vendor_kind: VendorKind,
    pub stage: FailureStage,
    pub cause: String,
}

/// Result of handing the cycle's points to one sink
#[derive(Debug, Clone, PartialEq)]
pub struct SinkOutcome {
    pub sink: String,
    /// Number of points the sink was asked to write
    pub points: usize,
    /// `Err` holds the failure message
    pub result: Result<(), String>,
}

impl SinkOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Outcome of one collection cycle
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CycleReport {
    /// Cycle sequence number, starting at 1
    pub cycle: u64,

    /// Devices that produced a point
    pub devices_ok: usize,

    pub device_failures: Vec<DeviceFailure>,

    /// One entry per sink, in inventory order
    pub sink_outcomes: Vec<SinkOutcome>,

    pub duration: Duration,
}

impl CycleReport {
    pub fn devices_total(&self) -> usize {
        self.devices_ok + self.device_failures.len()
    }

    pub fn devices_failed(&self) -> usize {
        self.device_failures.len()
    }

    pub fn sinks_ok(&self) -> usize {
        self.sink_outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn sinks_failed(&self) -> usize {
        self.sink_outcomes.len() - self.sinks_ok()
    }

    pub fn sinks_total(&self) -> usize {
        self.sink_outcomes.len()
    }
}
