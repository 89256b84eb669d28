//! HttpCloudApi - JSON-over-HTTPS cloud session API
//!
//! - `POST {base}/api/v1/login` with `{username, password}`
//! - `POST {base}/api/v1/devices/{id}/energy` with a bearer token
//!
//! Both reply with an `{error_code, msg, result}` envelope.

use std::time::Duration;

use contracts::{CloudEnergyPayload, Credentials};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::{CloudApi, CloudApiError};
use crate::error::VendorError;
use crate::session::SessionToken;

/// Token expired
const ERR_TOKEN_EXPIRED: i64 = -20651;
/// Session no longer known to the cloud
const ERR_SESSION_INVALID: i64 = -20675;

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    error_code: i64,
    #[serde(default)]
    msg: Option<String>,
    result: Option<T>,
}

impl<T> Envelope<T> {
    fn describe(&self) -> String {
        match &self.msg {
            Some(msg) => format!("error_code {}: {}", self.error_code, msg),
            None => format!("error_code {}", self.error_code),
        }
    }
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct LoginResult {
    token: String,
}

/// Cloud API client over HTTPS
#[derive(Debug, Clone)]
pub struct HttpCloudApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpCloudApi {
    /// Create a client with a per-request timeout
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, VendorError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| VendorError::HttpClient {
                vendor: "cloud_session",
                source,
            })?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn login_url(&self) -> String {
        format!("{}/api/v1/login", self.base_url)
    }

    fn energy_url(&self, device_id: &str) -> String {
        format!("{}/api/v1/devices/{}/energy", self.base_url, device_id)
    }

    async fn decode<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<Envelope<T>, CloudApiError> {
        response
            .json::<Envelope<T>>()
            .await
            .map_err(|e| CloudApiError::Protocol(format!("invalid response body: {e}")))
    }
}

fn connection_error(err: reqwest::Error) -> CloudApiError {
    if err.is_timeout() {
        CloudApiError::Connection(format!("request timed out: {err}"))
    } else {
        CloudApiError::Connection(err.to_string())
    }
}

impl CloudApi for HttpCloudApi {
    #[instrument(name = "cloud_api_login", skip(self, credentials))]
    async fn login(&self, credentials: &Credentials) -> Result<SessionToken, CloudApiError> {
        let response = self
            .client
            .post(self.login_url())
            .json(&LoginRequest {
                username: &credentials.username,
                password: &credentials.password,
            })
            .send()
            .await
            .map_err(connection_error)?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(CloudApiError::LoginRejected(format!("HTTP {status}")));
        }
        if !status.is_success() {
            return Err(CloudApiError::Protocol(format!(
                "login returned HTTP {status}"
            )));
        }

        let envelope: Envelope<LoginResult> = Self::decode(response).await?;
        if envelope.error_code != 0 {
            return Err(CloudApiError::LoginRejected(envelope.describe()));
        }

        let result = envelope
            .result
            .ok_or_else(|| CloudApiError::Protocol("login response has no token".into()))?;
        debug!("Cloud login succeeded");
        Ok(SessionToken::new(result.token))
    }

    #[instrument(name = "cloud_api_energy_usage", skip(self, token))]
    async fn energy_usage(
        &self,
        device_id: &str,
        token: &SessionToken,
    ) -> Result<CloudEnergyPayload, CloudApiError> {
        let response = self
            .client
            .post(self.energy_url(device_id))
            .bearer_auth(token.expose())
            .send()
            .await
            .map_err(connection_error)?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(CloudApiError::AuthExpired);
        }
        if !status.is_success() {
            return Err(CloudApiError::Protocol(format!(
                "energy query returned HTTP {status}"
            )));
        }

        let envelope: Envelope<CloudEnergyPayload> = Self::decode(response).await?;
        match envelope.error_code {
            0 => envelope
                .result
                .ok_or_else(|| CloudApiError::Protocol("energy response has no result".into())),
            ERR_TOKEN_EXPIRED | ERR_SESSION_INVALID => Err(CloudApiError::AuthExpired),
            _ => Err(CloudApiError::Protocol(envelope.describe())),
        }
    }
}
