//! System-wide default constants.
//!
//! Grouped by subsystem for easy discovery.

// ============================================================================
// Probe
// ============================================================================

/// HTTP client timeout for one status request (seconds).
pub const PROBE_TIMEOUT_SECS: u64 = 10;

/// Overall deadline for the probe step of a check cycle (seconds).
///
/// Longer than the client timeout so the client's own error wins when both fire.
pub const CYCLE_DEADLINE_SECS: u64 = 15;

/// Status value the API envelope must carry on success.
pub const EXPECTED_ENVELOPE_STATUS: u16 = 200;

// ============================================================================
// Notifications
// ============================================================================

/// Prefix for every subject line.
pub const SUBJECT_PREFIX: &str = "[Pangolin Monitor]";

/// SMTP port that uses implicit TLS instead of STARTTLS.
pub const IMPLICIT_TLS_PORT: u16 = 465;

/// Connect and command timeout for one SMTP session (seconds).
pub const SMTP_TIMEOUT_SECS: u64 = 30;

// ============================================================================
// Startup
// ============================================================================

/// Default `.env` file read at startup when present.
pub const DEFAULT_ENV_FILE: &str = ".env";

/// Number of upcoming fire times printed by `--check-config`.
pub const PREVIEW_FIRE_TIMES: usize = 5;
