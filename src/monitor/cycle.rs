//! One check cycle: probe, classify, exchange, decide, notify.

use std::time::Duration;

use chrono::Utc;
use tracing::{debug, error, info};

use super::decision::{classify, decide, DecisionEngine, MessageContext};
use super::tracker::StateTracker;
use crate::notify::Notifier;
use crate::probe::ProbeClient;
use crate::types::{CycleReport, Delivery, ObservedState, ProbeOutcome, TransitionEvent};

/// Monitors one site: owns the probe, the notifier and the state tracker.
///
/// Share it behind an `Arc` to run overlapping cycles; the tracker keeps the
/// previous/current pairing consistent.
pub struct Monitor {
    probe: Box<dyn ProbeClient>,
    notifier: Box<dyn Notifier>,
    tracker: StateTracker,
    engine: DecisionEngine,
    cycle_deadline: Duration,
}

impl Monitor {
    pub fn new(
        probe: Box<dyn ProbeClient>,
        notifier: Box<dyn Notifier>,
        org_id: &str,
        site_id: &str,
        cycle_deadline: Duration,
    ) -> Self {
        let engine = DecisionEngine::new(MessageContext {
            endpoint: probe.endpoint().to_string(),
            org_id: org_id.to_string(),
            site_id: site_id.to_string(),
        });

        Self {
            probe,
            notifier,
            tracker: StateTracker::new(),
            engine,
            cycle_deadline,
        }
    }

    /// Last committed state.
    pub fn state(&self) -> ObservedState {
        self.tracker.current()
    }

    pub fn endpoint(&self) -> &str {
        &self.engine.context().endpoint
    }

    /// Run the probe under the cycle deadline. Expiry counts as a failure;
    /// the abandoned request is dropped.
    async fn observe(&self) -> ProbeOutcome {
        match tokio::time::timeout(self.cycle_deadline, self.probe.probe()).await {
            Ok(result) => ProbeOutcome::from(result),
            Err(_) => ProbeOutcome::failure(format!(
                "probe deadline of {}s exceeded",
                self.cycle_deadline.as_secs_f64()
            )),
        }
    }

    /// Run one full check cycle. Never fails; every problem ends up in the
    /// logs and in the returned report.
    pub async fn run_check(&self) -> CycleReport {
        let outcome = self.observe().await;
        let current = classify(&outcome);
        let previous = self.tracker.exchange(current);
        let transition = TransitionEvent::new(previous, current);
        debug!(transition = %transition, outcome = %outcome, "Check classified");

        let action = decide(transition);
        self.engine.log_decision(action, transition, &outcome);

        let intent = self.engine.compose(action, transition, &outcome, Utc::now());
        let delivery = if intent.should_send {
            match self.notifier.send(&intent.subject, &intent.body).await {
                Ok(()) => {
                    info!(subject = %intent.subject, "Notification sent");
                    Delivery::Sent
                }
                Err(e) => {
                    error!(subject = %intent.subject, error = %e, "Notification delivery failed");
                    Delivery::Failed(e.to_string())
                }
            }
        } else {
            Delivery::NotAttempted
        };

        CycleReport {
            transition,
            action,
            delivery,
        }
    }
}
