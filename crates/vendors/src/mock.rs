//! Mock vendor implementations
//!
//! 用于单元测试和集成测试的 mock 实现，支持注入失败场景。
//! All mocks are cheap `Clone` handles over shared state, so a test can keep
//! a handle after moving the mock into an adapter or engine.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use contracts::{
    AcquisitionCause, AcquisitionFailure, CloudEnergyPayload, Credentials, DeviceDescriptor,
    LocalEnergyPayload, RawReading, VendorAdapter, VendorPayload,
};
use tracing::instrument;

use crate::cloud::{CloudApi, CloudApiError};
use crate::local::{EmeterTransport, TransportError};
use crate::session::SessionToken;

type LoginResult = Result<SessionToken, CloudApiError>;
type ReadingResult = Result<CloudEnergyPayload, CloudApiError>;

#[derive(Default)]
struct MockCloudState {
    /// One-shot login results, consumed before the steady one
    logins: Mutex<VecDeque<LoginResult>>,
    /// One-shot reading results, consumed before the steady one
    readings: Mutex<VecDeque<ReadingResult>>,
    steady_login: Mutex<Option<LoginResult>>,
    steady_reading: Mutex<Option<ReadingResult>>,
    login_calls: AtomicUsize,
    energy_calls: AtomicUsize,
    last_token: Mutex<Option<String>>,
}

/// Scripted cloud API
///
/// Logins succeed with `token-<n>` unless scripted otherwise; readings fail
/// with a protocol error until one is scripted.
#[derive(Clone, Default)]
pub struct MockCloudApi {
    state: Arc<MockCloudState>,
}

impl MockCloudApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a one-shot login result
    pub fn push_login(&self, result: LoginResult) {
        self.state.logins.lock().unwrap().push_back(result);
    }

    /// Queue a one-shot reading result
    pub fn push_reading(&self, result: ReadingResult) {
        self.state.readings.lock().unwrap().push_back(result);
    }

    /// Result returned by every login once the queue is empty
    pub fn steady_login(&self, result: LoginResult) {
        *self.state.steady_login.lock().unwrap() = Some(result);
    }

    /// Result returned by every reading once the queue is empty
    pub fn steady_reading(&self, result: ReadingResult) {
        *self.state.steady_reading.lock().unwrap() = Some(result);
    }

    /// Every reading reports an expired session
    pub fn always_expired(&self) {
        self.steady_reading(Err(CloudApiError::AuthExpired));
    }

    pub fn login_calls(&self) -> usize {
        self.state.login_calls.load(Ordering::SeqCst)
    }

    pub fn energy_calls(&self) -> usize {
        self.state.energy_calls.load(Ordering::SeqCst)
    }

    /// Token presented on the most recent reading
    pub fn last_token(&self) -> Option<String> {
        self.state.last_token.lock().unwrap().clone()
    }
}

impl CloudApi for MockCloudApi {
    async fn login(&self, _credentials: &Credentials) -> Result<SessionToken, CloudApiError> {
        let n = self.state.login_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(result) = self.state.logins.lock().unwrap().pop_front() {
            return result;
        }
        match self.state.steady_login.lock().unwrap().clone() {
            Some(result) => result,
            None => Ok(SessionToken::new(format!("token-{n}"))),
        }
    }

    async fn energy_usage(
        &self,
        _device_id: &str,
        token: &SessionToken,
    ) -> Result<CloudEnergyPayload, CloudApiError> {
        self.state.energy_calls.fetch_add(1, Ordering::SeqCst);
        *self.state.last_token.lock().unwrap() = Some(token.expose().to_string());
        if let Some(result) = self.state.readings.lock().unwrap().pop_front() {
            return result;
        }
        self.state
            .steady_reading
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| Err(CloudApiError::Protocol("no scripted reading".into())))
    }
}

/// Scripted local energy meter keyed by device address
///
/// Unknown addresses behave like an unreachable host.
#[derive(Clone, Default)]
pub struct MockEmeterTransport {
    replies: Arc<Mutex<HashMap<String, Result<LocalEnergyPayload, TransportError>>>>,
    calls: Arc<AtomicUsize>,
}

impl MockEmeterTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_reading(&self, address: impl Into<String>, payload: LocalEnergyPayload) {
        self.replies
            .lock()
            .unwrap()
            .insert(address.into(), Ok(payload));
    }

    pub fn set_error(&self, address: impl Into<String>, error: TransportError) {
        self.replies
            .lock()
            .unwrap()
            .insert(address.into(), Err(error));
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl EmeterTransport for MockEmeterTransport {
    async fn read_emeter(
        &self,
        device: &DeviceDescriptor,
    ) -> Result<LocalEnergyPayload, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.replies
            .lock()
            .unwrap()
            .get(&device.address)
            .cloned()
            .unwrap_or_else(|| Err(TransportError::Connection("no route to host".into())))
    }
}

/// Scripted whole-adapter mock keyed by device name
///
/// Skips the session/transport layers; used to drive the engine directly.
#[derive(Clone, Default)]
pub struct MockVendorAdapter {
    replies: Arc<Mutex<HashMap<String, Result<VendorPayload, AcquisitionCause>>>>,
    delay: Option<Duration>,
    fetch_log: Arc<Mutex<Vec<(String, tokio::time::Instant)>>>,
}

impl MockVendorAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every fetch sleeps this long first (tokio time, so pausable)
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn set_reading(&self, device: impl Into<String>, payload: VendorPayload) {
        self.replies
            .lock()
            .unwrap()
            .insert(device.into(), Ok(payload));
    }

    pub fn set_failure(&self, device: impl Into<String>, cause: AcquisitionCause) {
        self.replies
            .lock()
            .unwrap()
            .insert(device.into(), Err(cause));
    }

    /// (device, start instant) of every fetch so far
    pub fn fetch_log(&self) -> Vec<(String, tokio::time::Instant)> {
        self.fetch_log.lock().unwrap().clone()
    }

    pub fn fetch_count(&self) -> usize {
        self.fetch_log.lock().unwrap().len()
    }
}

impl VendorAdapter for MockVendorAdapter {
    #[instrument(name = "mock_adapter_fetch", skip(self, device), fields(device = %device.name))]
    async fn fetch(&mut self, device: &DeviceDescriptor) -> Result<RawReading, AcquisitionFailure> {
        self.fetch_log
            .lock()
            .unwrap()
            .push((device.name.clone(), tokio::time::Instant::now()));

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let reply = self.replies.lock().unwrap().get(&device.name).cloned();
        match reply {
            Some(Ok(payload)) => Ok(RawReading::now(payload)),
            Some(Err(cause)) => Err(AcquisitionFailure::new(
                &device.name,
                device.vendor_kind,
                cause,
            )),
            None => Err(AcquisitionFailure::new(
                &device.name,
                device.vendor_kind,
                AcquisitionCause::Connection("device not scripted".into()),
            )),
        }
    }
}
