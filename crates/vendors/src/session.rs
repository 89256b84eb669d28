//! Per-device session cache for cloud-session vendors
//!
//! Owned by exactly one adapter instance and keyed by device name; sessions
//! are never shared between devices.

use std::collections::HashMap;
use std::fmt;

/// Opaque authentication token
#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Raw token for request headers
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionToken(<redacted>)")
    }
}

/// Lifecycle of one device's session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// Never authenticated
    Absent,
    /// Usable for the next call
    Valid(SessionToken),
    /// Must re-authenticate before next use
    Invalidated,
}

/// Session cache keyed by device name
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: HashMap<String, SessionState>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state for a device
    pub fn state(&self, device: &str) -> SessionState {
        self.sessions
            .get(device)
            .cloned()
            .unwrap_or(SessionState::Absent)
    }

    /// Token to use for the next call, if any
    pub fn valid_token(&self, device: &str) -> Option<&SessionToken> {
        match self.sessions.get(device) {
            Some(SessionState::Valid(token)) => Some(token),
            _ => None,
        }
    }

    /// Replace whatever the device had with a fresh token
    pub fn store(&mut self, device: &str, token: SessionToken) {
        self.sessions
            .insert(device.to_string(), SessionState::Valid(token));
    }

    /// Mark the device's session unusable
    ///
    /// Returns true if a valid session was dropped.
    pub fn invalidate(&mut self, device: &str) -> bool {
        let previous = self
            .sessions
            .insert(device.to_string(), SessionState::Invalidated);
        matches!(previous, Some(SessionState::Valid(_)))
    }

    /// Number of devices with a valid session
    pub fn valid_count(&self) -> usize {
        self.sessions
            .values()
            .filter(|s| matches!(s, SessionState::Valid(_)))
            .count()
    }
}
