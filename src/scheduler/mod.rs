//! Cron-driven job runner
//!
//! Sleeps until the next matching instant of a [`CronSchedule`] (or any other
//! [`FireTimes`] source) and spawns the job as its own task, so a slow run
//! never delays the next fire time. Runs that overlap are the job's concern;
//! the monitor handles them through its state tracker.

pub mod cron_schedule;

pub use cron_schedule::{CronSchedule, ScheduleError};

use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Source of fire times for [`CronScheduler`].
pub trait FireTimes: std::fmt::Display {
    /// First fire time strictly after `after`, or `None` when exhausted.
    fn next_after(&self, after: DateTime<Utc>) -> Option<DateTime<Utc>>;
}

impl FireTimes for CronSchedule {
    fn next_after(&self, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
        CronSchedule::next_after(self, after)
    }
}

/// Fires a job on every match of a schedule until cancelled.
pub struct CronScheduler<S = CronSchedule> {
    schedule: S,
}

impl<S: FireTimes> CronScheduler<S> {
    pub fn new(schedule: S) -> Self {
        Self { schedule }
    }

    /// Run until `cancel` fires. Jobs still in flight at cancellation are
    /// awaited before returning. Returns the number of scheduled fires.
    pub async fn run<F, Fut>(&self, cancel: CancellationToken, mut job: F) -> u64
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        info!(schedule = %self.schedule, "Scheduler started (UTC)");

        let mut jobs = JoinSet::new();
        let mut cursor = Utc::now();
        let mut fired = 0u64;

        loop {
            let Some(next) = self.schedule.next_after(cursor) else {
                warn!(schedule = %self.schedule, "Schedule has no further fire times");
                break;
            };
            let wait = (next - Utc::now()).to_std().unwrap_or(Duration::ZERO);
            debug!(next = %next, wait_secs = wait.as_secs(), "Waiting for next fire time");

            tokio::select! {
                () = cancel.cancelled() => {
                    info!(fired, "Scheduler received shutdown signal");
                    break;
                }
                () = tokio::time::sleep(wait) => {
                    cursor = next;
                    fired += 1;
                    jobs.spawn(job());
                }
            }

            while let Some(result) = jobs.try_join_next() {
                if let Err(e) = result {
                    error!(error = %e, "Scheduled job panicked");
                }
            }
        }

        if !jobs.is_empty() {
            info!(in_flight = jobs.len(), "Waiting for in-flight jobs");
        }
        while let Some(result) = jobs.join_next().await {
            if let Err(e) = result {
                error!(error = %e, "Scheduled job panicked");
            }
        }

        fired
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::pin::Pin;
    use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
    use std::sync::Arc;

    /// A fixed list of fire times.
    struct Instants(Vec<DateTime<Utc>>);

    impl Instants {
        fn from_now(offsets_ms: &[i64]) -> Self {
            let now = Utc::now();
            Self(
                offsets_ms
                    .iter()
                    .map(|ms| now + chrono::Duration::milliseconds(*ms))
                    .collect(),
            )
        }
    }

    impl std::fmt::Display for Instants {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "{} instants", self.0.len())
        }
    }

    impl FireTimes for Instants {
        fn next_after(&self, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
            self.0.iter().copied().find(|at| *at > after)
        }
    }

    type Job = Pin<Box<dyn Future<Output = ()> + Send>>;

    fn counting_job(runs: &Arc<AtomicU64>) -> impl FnMut() -> Job {
        let runs = Arc::clone(runs);
        move || {
            let runs = Arc::clone(&runs);
            Box::pin(async move {
                runs.fetch_add(1, Ordering::SeqCst);
            }) as Job
        }
    }

    #[tokio::test]
    async fn cancelled_scheduler_returns_without_firing() {
        let scheduler = CronScheduler::new(CronSchedule::parse("0 0 1 1 *").unwrap());
        let cancel = CancellationToken::new();
        cancel.cancel();

        let runs = Arc::new(AtomicU64::new(0));
        let fired = scheduler.run(cancel, counting_job(&runs)).await;

        assert_eq!(fired, 0);
        assert_eq!(runs.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn cancellation_interrupts_long_wait() {
        let scheduler = CronScheduler::new(CronSchedule::parse("0 0 1 1 *").unwrap());
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let fired = tokio::time::timeout(
            Duration::from_secs(5),
            scheduler.run(cancel, || async {}),
        )
        .await
        .expect("scheduler should stop on cancel");
        assert_eq!(fired, 0);
    }

    #[tokio::test]
    async fn each_fire_time_runs_the_job_once() {
        let scheduler = CronScheduler::new(Instants::from_now(&[20, 40, 60]));
        let runs = Arc::new(AtomicU64::new(0));

        let fired = tokio::time::timeout(
            Duration::from_secs(5),
            scheduler.run(CancellationToken::new(), counting_job(&runs)),
        )
        .await
        .expect("scheduler should stop once the fire times run out");

        assert_eq!(fired, 3);
        assert_eq!(runs.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn panicking_job_does_not_stop_the_schedule() {
        let scheduler = CronScheduler::new(Instants::from_now(&[10, 30, 50]));
        let runs = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&runs);

        let fired = scheduler
            .run(CancellationToken::new(), move || {
                let counter = Arc::clone(&counter);
                async move {
                    if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                        panic!("first run fails");
                    }
                }
            })
            .await;

        assert_eq!(fired, 3);
        assert_eq!(runs.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn in_flight_job_completes_after_cancel() {
        // One near fire time, then a wait long enough to be cancelled.
        let scheduler = CronScheduler::new(Instants::from_now(&[10, 3_600_000]));
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        let finished = Arc::new(AtomicBool::new(false));
        let done = Arc::clone(&finished);

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let fired = tokio::time::timeout(
            Duration::from_secs(5),
            scheduler.run(cancel, move || {
                let done = Arc::clone(&done);
                async move {
                    tokio::time::sleep(Duration::from_millis(200)).await;
                    done.store(true, Ordering::SeqCst);
                }
            }),
        )
        .await
        .expect("scheduler should stop on cancel");

        assert_eq!(fired, 1);
        assert!(finished.load(Ordering::SeqCst), "in-flight job was not awaited");
    }
}
