//! Pangolin Monitor: site status alerting
//!
//! Probes a Pangolin integration API site resource on a cron schedule and
//! emails an operator when the site moves between online, offline and
//! unreachable, suppressing repeats while a state persists.
//!
//! ## Architecture
//!
//! - **Probe**: one timed GET per cycle, envelope validation
//! - **Monitor**: state tracker + decision engine + cycle glue
//! - **Notify**: SMTP delivery (implicit TLS on 465, opportunistic STARTTLS otherwise)
//! - **Scheduler**: five-field cron in UTC

pub mod config;
pub mod types;
pub mod probe;
pub mod notify;
pub mod monitor;
pub mod scheduler;

// Re-export configuration
pub use config::{ConfigError, MonitorConfig};

// Re-export commonly used types
pub use types::{
    Action, CycleReport, Delivery, NotificationIntent, ObservedState, ProbeOutcome, SiteStatus,
    TransitionEvent,
};

// Re-export collaborators
pub use monitor::{Monitor, StateTracker};
pub use notify::{Notifier, NotifyError, SmtpNotifier};
pub use probe::{HttpProbeClient, ProbeClient, ProbeError};
pub use scheduler::{CronSchedule, CronScheduler, FireTimes, ScheduleError};
