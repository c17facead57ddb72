//! Decision engine: classification, the notification policy table, and
//! message composition.
//!
//! ## Policy
//!
//! | current  | previous            | action             |
//! |----------|---------------------|--------------------|
//! | ApiError | ApiError            | suppress           |
//! | ApiError | anything else       | API failure alert  |
//! | Offline  | Offline             | suppress           |
//! | Offline  | anything else       | offline alert      |
//! | Online   | Offline or ApiError | recovery notice    |
//! | Online   | Online or Unknown   | suppress           |
//!
//! `Unknown` as the previous state makes the first problem classification
//! alert while the first healthy one stays silent.

use chrono::{DateTime, SecondsFormat, Utc};
use tracing::{error, info, warn};

use crate::config::defaults::SUBJECT_PREFIX;
use crate::types::{Action, NotificationIntent, ObservedState, ProbeOutcome, TransitionEvent};

/// Identity of the monitored site, used in subjects and bodies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageContext {
    pub endpoint: String,
    pub org_id: String,
    pub site_id: String,
}

/// Classify a probe outcome. Any failure is an API error, whatever partial
/// payload it may have seen.
pub fn classify(outcome: &ProbeOutcome) -> ObservedState {
    match outcome {
        ProbeOutcome::Failure { .. } => ObservedState::ApiError,
        ProbeOutcome::Success { online: false, .. } => ObservedState::Offline,
        ProbeOutcome::Success { online: true, .. } => ObservedState::Online,
    }
}

/// Apply the policy table to a transition.
pub fn decide(event: TransitionEvent) -> Action {
    use ObservedState::{ApiError, Offline, Online, Unknown};

    match (event.current, event.previous) {
        (ApiError, ApiError) => Action::Suppress,
        (ApiError, _) => Action::AlertApiError,
        (Offline, Offline) => Action::Suppress,
        (Offline, _) => Action::AlertOffline,
        (Online, Offline | ApiError) => Action::AnnounceRecovery,
        (Online, Online | Unknown) => Action::Suppress,
        // Classification never yields Unknown.
        (Unknown, _) => Action::Suppress,
    }
}

/// Timestamp format used in message bodies (RFC 3339, UTC, whole seconds).
pub fn format_timestamp(now: DateTime<Utc>) -> String {
    now.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Builds notification content for one monitored site.
#[derive(Debug, Clone)]
pub struct DecisionEngine {
    context: MessageContext,
}

impl DecisionEngine {
    pub fn new(context: MessageContext) -> Self {
        Self { context }
    }

    pub fn context(&self) -> &MessageContext {
        &self.context
    }

    /// Probe-supplied display name, or the configured site identifier.
    pub fn display_name<'a>(&'a self, outcome: &'a ProbeOutcome) -> &'a str {
        outcome.reported_name().unwrap_or(&self.context.site_id)
    }

    /// Compose the message for `action`. Suppressed actions yield an intent
    /// with `should_send == false`.
    pub fn compose(
        &self,
        action: Action,
        event: TransitionEvent,
        outcome: &ProbeOutcome,
        now: DateTime<Utc>,
    ) -> NotificationIntent {
        let ctx = &self.context;
        let time = format_timestamp(now);

        match action {
            Action::Suppress => NotificationIntent::suppressed(),
            Action::AlertApiError => {
                let description = match outcome {
                    ProbeOutcome::Failure { description } => description.as_str(),
                    ProbeOutcome::Success { .. } => "unknown error",
                };
                NotificationIntent::send(
                    format!("{SUBJECT_PREFIX} API check FAILED"),
                    format!(
                        "Time (UTC): {time}\nEndpoint: {}\nError: {description}\n",
                        ctx.endpoint
                    ),
                )
            }
            Action::AlertOffline => {
                let (online, message) = match outcome {
                    ProbeOutcome::Success {
                        online, message, ..
                    } => (*online, message.as_deref().unwrap_or_default()),
                    ProbeOutcome::Failure { .. } => (false, ""),
                };
                NotificationIntent::send(
                    format!(
                        "{SUBJECT_PREFIX} Site {} is OFFLINE",
                        self.display_name(outcome)
                    ),
                    format!(
                        "Time (UTC): {time}\nEndpoint: {}\nOrg: {}\nSite: {}\nOnline: {online}\nMessage: {message}\n",
                        ctx.endpoint, ctx.org_id, ctx.site_id
                    ),
                )
            }
            Action::AnnounceRecovery => NotificationIntent::send(
                format!(
                    "{SUBJECT_PREFIX} Site {} is ONLINE (recovered)",
                    self.display_name(outcome)
                ),
                format!(
                    "Time (UTC): {time}\nEndpoint: {}\nOrg: {}\nSite: {}\nPrevious state: {}\n",
                    ctx.endpoint, ctx.org_id, ctx.site_id, event.previous
                ),
            ),
        }
    }

    /// Log the decision for this cycle.
    pub fn log_decision(&self, action: Action, event: TransitionEvent, outcome: &ProbeOutcome) {
        let prev = event.previous.label();
        match (action, outcome) {
            (Action::AlertApiError, ProbeOutcome::Failure { description }) => {
                error!(prev, error = %description, "API CHECK FAILED (prev={})", prev);
            }
            (Action::AlertApiError, _) => error!(prev, "API CHECK FAILED (prev={})", prev),
            (Action::AlertOffline, _) => {
                let name = self.display_name(outcome);
                warn!(
                    prev,
                    site = %self.context.site_id,
                    "SITE OFFLINE: {} ({}) (prev={})",
                    name,
                    self.context.site_id,
                    prev
                );
            }
            (Action::AnnounceRecovery, _) => {
                info!(prev, "RECOVERY: site back ONLINE (prev={})", prev);
            }
            (Action::Suppress, _) if !event.current.is_problem() => {
                info!(prev, "OK: site online (no change)");
            }
            (Action::Suppress, ProbeOutcome::Failure { description }) => warn!(
                error = %description,
                "API CHECK FAILED (unchanged, suppressing repeat email)"
            ),
            (Action::Suppress, ProbeOutcome::Success { .. }) => {
                warn!("SITE OFFLINE (unchanged, suppressing repeat email)");
            }
        }
    }
}
