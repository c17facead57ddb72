//! Pangolin Monitor - site status alerting
//!
//! Probes a Pangolin site on a cron schedule and emails on state changes.
//!
//! # Usage
//!
//! ```bash
//! # Run with configuration from the environment (and ./.env if present)
//! cargo run --release
//!
//! # Validate configuration and preview the schedule
//! ./pangolin-monitor --check-config
//!
//! # Single check, then exit
//! ./pangolin-monitor --once --env-file /etc/pangolin-monitor.env
//! ```
//!
//! # Environment Variables
//!
//! - `PANGOLIN_INT_API_PROTOCOL`, `PANGOLIN_INT_API_HOSTNAME`, `PANGOLIN_INT_API_PORT`
//! - `PANGOLIN_ORG_ID`, `PANGOLIN_SITE_NICE_ID`, `PANGOLIN_API_TOKEN`
//! - `CRON_SCHEDULE`: five fields, UTC
//! - `SMTP_USER`, `SMTP_PASSWORD`, `SMTP_SERVER`, `SMTP_PORT`, `RECIPIENT_EMAIL`
//! - `SMTP_FROM`, `PROBE_TIMEOUT_SECS`, `CYCLE_DEADLINE_SECS` (optional)
//! - `RUST_LOG`: Logging level (default: info)

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use pangolin_monitor::config::{self, defaults, MonitorConfig};
use pangolin_monitor::scheduler::CronScheduler;
use pangolin_monitor::{HttpProbeClient, Monitor, SmtpNotifier};

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "pangolin-monitor")]
#[command(about = "Emails an operator when a Pangolin site goes offline or comes back")]
#[command(version)]
struct CliArgs {
    /// Env file with configuration (default: ./.env if it exists).
    /// Real environment variables take precedence over file values.
    #[arg(long, value_name = "PATH")]
    env_file: Option<PathBuf>,

    /// Run a single check and exit
    #[arg(long)]
    once: bool,

    /// Validate configuration, print upcoming fire times, and exit
    #[arg(long, conflicts_with = "once")]
    check_config: bool,

    /// Emit logs as JSON lines
    #[arg(long, env = "MONITOR_LOG_JSON")]
    log_json: bool,
}

// ============================================================================
// Startup
// ============================================================================

fn init_logging(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    }
}

/// Values from the env file, or an empty map when none applies.
fn load_file_vars(explicit: Option<&Path>) -> Result<HashMap<String, String>> {
    if let Some(path) = explicit {
        return Ok(config::read_env_file(path)?);
    }

    let default_path = Path::new(defaults::DEFAULT_ENV_FILE);
    if default_path.exists() {
        info!(path = %default_path.display(), "Loading env file");
        return Ok(config::read_env_file(default_path)?);
    }
    Ok(HashMap::new())
}

fn build_monitor(config: &MonitorConfig) -> Result<Monitor> {
    let probe = HttpProbeClient::new(&config.api, config.probe_timeout)
        .context("Failed to build HTTP client")?;
    let notifier = SmtpNotifier::new(&config.smtp).context("Failed to build SMTP transport")?;
    info!(
        server = %config.smtp.server,
        port = config.smtp.port,
        security = %notifier.security(),
        recipient = %config.smtp.recipient,
        "Mail transport ready"
    );

    Ok(Monitor::new(
        Box::new(probe),
        Box::new(notifier),
        &config.api.org_id,
        &config.api.site_id,
        config.cycle_deadline,
    ))
}

fn print_schedule_preview(config: &MonitorConfig) {
    println!("Configuration OK");
    println!("  endpoint: {}", config.api.endpoint());
    println!("  schedule: {} (UTC)", config.schedule);
    println!("  next fire times:");
    for at in config.schedule.upcoming(defaults::PREVIEW_FIRE_TIMES) {
        println!("    {}", at.to_rfc3339());
    }
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();
    init_logging(args.log_json);

    let file_vars = load_file_vars(args.env_file.as_deref())?;
    let monitor_config = MonitorConfig::from_env_and_file(&file_vars).map_err(|e| {
        error!("config error: {}", e);
        anyhow::Error::new(e).context("config error")
    })?;

    if args.check_config {
        print_schedule_preview(&monitor_config);
        return Ok(());
    }

    info!(
        endpoint = %monitor_config.api.endpoint(),
        schedule = %monitor_config.schedule,
        "starting pangolin-monitor (schedule in UTC)"
    );

    let monitor = Arc::new(build_monitor(&monitor_config)?);

    // Immediate feedback instead of waiting for the first tick
    let report = monitor.run_check().await;
    info!(
        transition = %report.transition,
        action = %report.action,
        "Startup check complete"
    );
    if args.once {
        return Ok(());
    }

    // Graceful shutdown via Ctrl+C
    let cancel_token = CancellationToken::new();
    let shutdown_token = cancel_token.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("🛑 Received Ctrl+C, initiating shutdown...");
        shutdown_token.cancel();
    });

    let scheduler = CronScheduler::new(monitor_config.schedule.clone());
    let fired = scheduler
        .run(cancel_token, move || {
            let monitor = Arc::clone(&monitor);
            async move {
                monitor.run_check().await;
            }
        })
        .await;

    info!(scheduled_checks = fired, "✓ pangolin-monitor shutdown complete");
    Ok(())
}
