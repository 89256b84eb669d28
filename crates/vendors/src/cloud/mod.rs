//! Cloud-session vendor adapter
//!
//! Readings go through a vendor cloud that hands out session tokens. The
//! adapter caches one session per device and, when the cloud reports the
//! session expired, re-authenticates exactly once within the same call.

mod http;

pub use self::http::HttpCloudApi;

use std::future::Future;

use contracts::{
    AcquisitionCause, AcquisitionFailure, CloudEnergyPayload, Credentials, DeviceDescriptor,
    RawReading, VendorAdapter, VendorKind, VendorPayload,
};
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::session::{SessionStore, SessionToken};

/// Errors reported by a cloud API implementation
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CloudApiError {
    /// The session token is no longer accepted
    #[error("session expired")]
    AuthExpired,

    /// Login refused
    #[error("login rejected: {0}")]
    LoginRejected(String),

    #[error("connection error: {0}")]
    Connection(String),

    #[error("protocol error: {0}")]
    Protocol(String),
}

impl From<CloudApiError> for AcquisitionCause {
    fn from(err: CloudApiError) -> Self {
        match err {
            CloudApiError::AuthExpired => AcquisitionCause::SessionExpired,
            CloudApiError::LoginRejected(msg) => AcquisitionCause::AuthenticationRejected(msg),
            CloudApiError::Connection(msg) => AcquisitionCause::Connection(msg),
            CloudApiError::Protocol(msg) => AcquisitionCause::Protocol(msg),
        }
    }
}

/// Cloud API abstraction
///
/// Separates the session policy (in [`CloudSessionAdapter`]) from the wire
/// protocol, so the policy can be tested against a mock.
pub trait CloudApi: Send + Sync {
    /// Authenticate and obtain a session token
    fn login(
        &self,
        credentials: &Credentials,
    ) -> impl Future<Output = Result<SessionToken, CloudApiError>> + Send;

    /// Read the current energy usage of a cloud device
    ///
    /// Must return [`CloudApiError::AuthExpired`] when the token is refused.
    fn energy_usage(
        &self,
        device_id: &str,
        token: &SessionToken,
    ) -> impl Future<Output = Result<CloudEnergyPayload, CloudApiError>> + Send;
}

/// Adapter for cloud-session devices
pub struct CloudSessionAdapter<A> {
    api: A,
    sessions: SessionStore,
}

impl<A: CloudApi> CloudSessionAdapter<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            sessions: SessionStore::new(),
        }
    }

    /// Session cache (read-only)
    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Log in and cache the new session; a refused login clears the cache entry
    async fn authenticate(
        &mut self,
        device: &DeviceDescriptor,
        credentials: &Credentials,
    ) -> Result<SessionToken, AcquisitionFailure> {
        match self.api.login(credentials).await {
            Ok(token) => {
                debug!(device = %device.name, "Cloud session established");
                self.sessions.store(&device.name, token.clone());
                Ok(token)
            }
            Err(e) => {
                self.sessions.invalidate(&device.name);
                Err(failure(device, e))
            }
        }
    }

    async fn read_with(
        &self,
        device: &DeviceDescriptor,
        token: &SessionToken,
    ) -> Result<RawReading, CloudApiError> {
        let payload = self.api.energy_usage(&device.address, token).await?;
        Ok(RawReading::now(VendorPayload::CloudSession(payload)))
    }
}

impl<A: CloudApi> VendorAdapter for CloudSessionAdapter<A> {
    #[instrument(
        name = "cloud_adapter_fetch",
        skip(self, device),
        fields(device = %device.name)
    )]
    async fn fetch(&mut self, device: &DeviceDescriptor) -> Result<RawReading, AcquisitionFailure> {
        let credentials = device.credentials.as_ref().ok_or_else(|| {
            AcquisitionFailure::new(
                &device.name,
                VendorKind::CloudSession,
                AcquisitionCause::MissingCredentials,
            )
        })?;

        let cached = self.sessions.valid_token(&device.name).cloned();
        let token = match cached {
            Some(token) => token,
            None => self.authenticate(device, credentials).await?,
        };

        match self.read_with(device, &token).await {
            Ok(reading) => return Ok(reading),
            Err(CloudApiError::AuthExpired) => {
                warn!(device = %device.name, "Cloud session expired, re-authenticating");
                self.sessions.invalidate(&device.name);
            }
            Err(e) => return Err(failure(device, e)),
        }

        // Exactly one re-authentication per call
        let token = self.authenticate(device, credentials).await?;
        match self.read_with(device, &token).await {
            Ok(reading) => Ok(reading),
            Err(e) => {
                if e == CloudApiError::AuthExpired {
                    self.sessions.invalidate(&device.name);
                }
                Err(failure(device, e))
            }
        }
    }
}

fn failure(device: &DeviceDescriptor, err: CloudApiError) -> AcquisitionFailure {
    AcquisitionFailure::new(&device.name, VendorKind::CloudSession, err.into())
}
