//! Decision and notification types

use super::TransitionEvent;

/// What the decision table says to do with a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// Log only
    Suppress,
    /// Entered the API error state
    AlertApiError,
    /// Entered the offline state
    AlertOffline,
    /// Returned to online from a problem state
    AnnounceRecovery,
}

impl Action {
    pub fn notifies(&self) -> bool {
        !matches!(self, Action::Suppress)
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Action::Suppress => write!(f, "suppress"),
            Action::AlertApiError => write!(f, "alert_api_error"),
            Action::AlertOffline => write!(f, "alert_offline"),
            Action::AnnounceRecovery => write!(f, "announce_recovery"),
        }
    }
}

/// Message content for one cycle. Built fresh and dropped after delivery.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotificationIntent {
    pub subject: String,
    pub body: String,
    pub should_send: bool,
}

impl NotificationIntent {
    pub fn send(subject: String, body: String) -> Self {
        Self {
            subject,
            body,
            should_send: true,
        }
    }

    pub fn suppressed() -> Self {
        Self::default()
    }
}

/// Result of handing an intent to the notifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    NotAttempted,
    Sent,
    Failed(String),
}

/// Summary of one completed check cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    pub transition: TransitionEvent,
    pub action: Action,
    pub delivery: Delivery,
}
