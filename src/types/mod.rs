//! Shared data structures for the site monitor
//!
//! - ObservedState / TransitionEvent: what the state tracker holds and reports
//! - ProbeOutcome / SiteStatus: what one probe produced
//! - Action / NotificationIntent / CycleReport: what the decision engine made of it

mod state;
mod probe;
mod notification;

pub use state::*;
pub use probe::*;
pub use notification::*;
