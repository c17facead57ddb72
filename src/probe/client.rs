//! HTTP probe client for the integration API site resource.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::debug;

use super::{ProbeClient, ProbeError};
use crate::config::{defaults, ApiConfig};
use crate::types::SiteStatus;

/// Site payload inside the response envelope.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteData {
    pub online: bool,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub nice_id: Option<String>,
    #[serde(default)]
    pub org_id: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Response envelope returned by the integration API.
#[derive(Debug, Clone, Deserialize)]
pub struct SiteResponse {
    pub data: SiteData,
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub error: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub status: u16,
}

/// Validate an HTTP status and body into a site status.
///
/// Order matters: the HTTP status is checked before the body is parsed, and
/// the envelope is checked before the payload is trusted.
pub fn evaluate_response(status: StatusCode, body: &[u8]) -> Result<SiteStatus, ProbeError> {
    if status != StatusCode::OK {
        return Err(ProbeError::Status(status));
    }

    let envelope: SiteResponse = serde_json::from_slice(body)?;
    if !envelope.success || envelope.status != defaults::EXPECTED_ENVELOPE_STATUS {
        return Err(ProbeError::Rejected {
            success: envelope.success,
            status: envelope.status,
            message: envelope.message.unwrap_or_default(),
        });
    }

    Ok(SiteStatus {
        online: envelope.data.online,
        name: envelope.data.name,
        message: envelope.data.message,
    })
}

/// Probe client backed by `reqwest`.
#[derive(Clone)]
pub struct HttpProbeClient {
    http: reqwest::Client,
    endpoint: String,
    token: String,
}

impl HttpProbeClient {
    pub fn new(api: &ApiConfig, timeout: Duration) -> Result<Self, ProbeError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http,
            endpoint: api.endpoint(),
            token: api.token.expose().to_string(),
        })
    }
}

#[async_trait]
impl ProbeClient for HttpProbeClient {
    async fn probe(&self) -> Result<SiteStatus, ProbeError> {
        let resp = self
            .http
            .get(&self.endpoint)
            .header(ACCEPT, "application/json")
            .bearer_auth(&self.token)
            .send()
            .await?;

        let status = resp.status();
        let body = resp.bytes().await?;
        debug!(status = %status, bytes = body.len(), "Probe response received");

        evaluate_response(status, &body)
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }
}
