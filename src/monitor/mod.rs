//! Site monitor core
//!
//! - **StateTracker**: the single previous observed state, exchanged atomically
//! - **Decision engine**: classify outcome, apply the notification policy, compose messages
//! - **Monitor**: runs one check cycle end to end
//!
//! Duplicate notifications are suppressed while a state persists. There is no
//! re-alert heartbeat: a prolonged outage produces exactly one alert and one
//! recovery notice.

pub mod cycle;
pub mod decision;
pub mod tracker;

pub use cycle::Monitor;
pub use decision::{classify, decide, format_timestamp, DecisionEngine, MessageContext};
pub use tracker::StateTracker;
