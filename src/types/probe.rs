//! Probe result types

use serde::{Deserialize, Serialize};

/// Site status as reported by a successful probe.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteStatus {
    /// Whether the site's tunnel is connected
    pub online: bool,
    /// Display name, if the API supplied one
    pub name: Option<String>,
    /// Free-text message from the API
    pub message: Option<String>,
}

/// Outcome of a single check cycle.
///
/// Exactly one shape per cycle: either the probe produced a status, or it
/// failed somewhere between connecting and validating the envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    Success {
        online: bool,
        name: Option<String>,
        message: Option<String>,
    },
    Failure {
        description: String,
    },
}

impl ProbeOutcome {
    pub fn failure(description: impl Into<String>) -> Self {
        ProbeOutcome::Failure {
            description: description.into(),
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, ProbeOutcome::Failure { .. })
    }

    /// Display name reported by the probe, ignoring blank values.
    pub fn reported_name(&self) -> Option<&str> {
        match self {
            ProbeOutcome::Success { name, .. } => {
                name.as_deref().map(str::trim).filter(|n| !n.is_empty())
            }
            ProbeOutcome::Failure { .. } => None,
        }
    }
}

impl From<SiteStatus> for ProbeOutcome {
    fn from(status: SiteStatus) -> Self {
        ProbeOutcome::Success {
            online: status.online,
            name: status.name,
            message: status.message,
        }
    }
}

impl<E: std::fmt::Display> From<Result<SiteStatus, E>> for ProbeOutcome {
    fn from(result: Result<SiteStatus, E>) -> Self {
        match result {
            Ok(status) => status.into(),
            Err(e) => ProbeOutcome::failure(e.to_string()),
        }
    }
}

impl std::fmt::Display for ProbeOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProbeOutcome::Success { online, .. } => write!(f, "success (online={})", online),
            ProbeOutcome::Failure { description } => write!(f, "failure: {}", description),
        }
    }
}
