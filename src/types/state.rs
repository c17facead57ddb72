//! Core state types: ObservedState, TransitionEvent

use serde::{Deserialize, Serialize};

// ============================================================================
// Observed State
// ============================================================================

/// Last classified state of the monitored site.
///
/// `Unknown` only exists before the first completed check cycle. Every
/// classification yields one of the three real states, so the tracker never
/// returns to `Unknown` once a cycle has committed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ObservedState {
    #[default]
    Unknown,
    Online,
    Offline,
    ApiError,
}

impl ObservedState {
    /// Every variant, in declaration order. Used to walk the full transition table.
    pub const ALL: [Self; 4] = [Self::Unknown, Self::Online, Self::Offline, Self::ApiError];

    /// Stable lowercase label used in logs and message bodies.
    pub fn label(&self) -> &'static str {
        match self {
            ObservedState::Unknown => "unknown",
            ObservedState::Online => "online",
            ObservedState::Offline => "offline",
            ObservedState::ApiError => "api_error",
        }
    }

    /// True for the two states that warrant an operator alert.
    pub fn is_problem(&self) -> bool {
        matches!(self, ObservedState::Offline | ObservedState::ApiError)
    }
}

impl std::fmt::Display for ObservedState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

// ============================================================================
// Transition Event
// ============================================================================

/// The (previous, current) pair reported by the state tracker for one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionEvent {
    pub previous: ObservedState,
    pub current: ObservedState,
}

impl TransitionEvent {
    pub fn new(previous: ObservedState, current: ObservedState) -> Self {
        Self { previous, current }
    }

    /// Whether the classified state differs from the one committed before it.
    pub fn is_change(&self) -> bool {
        self.previous != self.current
    }
}

impl std::fmt::Display for TransitionEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} -> {}", self.previous, self.current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_are_snake_case() {
        assert_eq!(ObservedState::ApiError.label(), "api_error");
        assert_eq!(ObservedState::Unknown.to_string(), "unknown");
        let json = serde_json::to_string(&ObservedState::ApiError).unwrap();
        assert_eq!(json, "\"api_error\"");
    }

    #[test]
    fn default_is_unknown() {
        assert_eq!(ObservedState::default(), ObservedState::Unknown);
    }

    #[test]
    fn only_offline_and_api_error_are_problems() {
        let problems: Vec<_> = ObservedState::ALL
            .into_iter()
            .filter(ObservedState::is_problem)
            .collect();
        assert_eq!(problems, vec![ObservedState::Offline, ObservedState::ApiError]);
    }

    #[test]
    fn transition_change_detection() {
        let same = TransitionEvent::new(ObservedState::Offline, ObservedState::Offline);
        let moved = TransitionEvent::new(ObservedState::Offline, ObservedState::Online);
        assert!(!same.is_change());
        assert!(moved.is_change());
        assert_eq!(moved.to_string(), "offline -> online");
    }
}
