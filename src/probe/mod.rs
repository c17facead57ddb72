//! Site status probe
//!
//! One GET against the integration API per check cycle. The probe either
//! yields a [`SiteStatus`] or a [`ProbeError`]; it never retries.

mod client;

pub use client::{evaluate_response, HttpProbeClient, SiteData, SiteResponse};

use async_trait::async_trait;

use crate::types::SiteStatus;

/// Probe errors. All of them classify the cycle as an API error.
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected status: {0}")]
    Status(reqwest::StatusCode),
    #[error("malformed response body: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("api indicated failure: success={success} status={status} message={message}")]
    Rejected {
        success: bool,
        status: u16,
        message: String,
    },
}

/// Anything that can report the current status of the monitored site.
#[async_trait]
pub trait ProbeClient: Send + Sync {
    /// Perform one status request.
    async fn probe(&self) -> Result<SiteStatus, ProbeError>;

    /// Endpoint identity for logs and message bodies.
    fn endpoint(&self) -> &str;
}
