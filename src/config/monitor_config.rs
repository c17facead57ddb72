//! Monitor configuration loaded from environment variables.
//!
//! Every required parameter is read up front and all problems are reported
//! together, so an operator fixing a deployment sees the full list at once.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use lettre::message::Mailbox;

use super::defaults;
use crate::scheduler::CronSchedule;

// ============================================================================
// Parameter Names
// ============================================================================

/// Environment variable names, required ones first.
pub mod env {
    pub const API_PROTOCOL: &str = "PANGOLIN_INT_API_PROTOCOL";
    pub const API_HOSTNAME: &str = "PANGOLIN_INT_API_HOSTNAME";
    pub const API_PORT: &str = "PANGOLIN_INT_API_PORT";
    pub const ORG_ID: &str = "PANGOLIN_ORG_ID";
    pub const SITE_NICE_ID: &str = "PANGOLIN_SITE_NICE_ID";
    pub const API_TOKEN: &str = "PANGOLIN_API_TOKEN";
    pub const CRON_SCHEDULE: &str = "CRON_SCHEDULE";
    pub const SMTP_USER: &str = "SMTP_USER";
    pub const SMTP_PASSWORD: &str = "SMTP_PASSWORD";
    pub const SMTP_SERVER: &str = "SMTP_SERVER";
    pub const SMTP_PORT: &str = "SMTP_PORT";
    pub const RECIPIENT_EMAIL: &str = "RECIPIENT_EMAIL";

    pub const SMTP_FROM: &str = "SMTP_FROM";
    pub const PROBE_TIMEOUT_SECS: &str = "PROBE_TIMEOUT_SECS";
    pub const CYCLE_DEADLINE_SECS: &str = "CYCLE_DEADLINE_SECS";

    /// Required parameters in the order they are reported when missing.
    pub const REQUIRED: [&str; 12] = [
        API_PROTOCOL,
        API_HOSTNAME,
        API_PORT,
        ORG_ID,
        SITE_NICE_ID,
        API_TOKEN,
        CRON_SCHEDULE,
        SMTP_USER,
        SMTP_PASSWORD,
        SMTP_SERVER,
        SMTP_PORT,
        RECIPIENT_EMAIL,
    ];
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required env: {}", .0.join(", "))]
    Missing(Vec<&'static str>),

    #[error("invalid configuration: {}", .0.join("; "))]
    Invalid(Vec<String>),

    #[error("failed to read env file {}: {source}", .path.display())]
    EnvFile {
        path: PathBuf,
        #[source]
        source: dotenvy::Error,
    },
}

// ============================================================================
// Secret
// ============================================================================

/// String that never shows up in `Debug` output or logs.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Secret(***)")
    }
}

// ============================================================================
// Config Sections
// ============================================================================

/// Where the site status lives and how to authenticate against it.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub protocol: String,
    pub host: String,
    pub port: u16,
    pub org_id: String,
    pub site_id: String,
    pub token: Secret,
}

impl ApiConfig {
    /// Full URL of the site status resource.
    pub fn endpoint(&self) -> String {
        format!(
            "{}://{}:{}/v1/org/{}/{}",
            self.protocol, self.host, self.port, self.org_id, self.site_id
        )
    }
}

/// Mail transport credentials and addressing.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub server: String,
    pub port: u16,
    pub user: String,
    pub password: Secret,
    pub from: Mailbox,
    pub recipient: Mailbox,
}

/// Complete monitor configuration.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub api: ApiConfig,
    pub smtp: SmtpConfig,
    pub schedule: CronSchedule,
    /// HTTP client timeout for a single status request
    pub probe_timeout: Duration,
    /// Overall deadline for the probe step of one cycle
    pub cycle_deadline: Duration,
}

impl MonitorConfig {
    /// Load from the process environment, falling back to values from an
    /// env file. Real environment variables always win.
    pub fn from_env_and_file(file_vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        Self::from_lookup(|key| {
            std::env::var(key)
                .ok()
                .or_else(|| file_vars.get(key).cloned())
        })
    }

    /// Load from an arbitrary key lookup. Values are trimmed and blank values
    /// count as missing.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let missing: Vec<&'static str> = env::REQUIRED
            .iter()
            .copied()
            .filter(|key| get(*key).is_none())
            .collect();
        if !missing.is_empty() {
            return Err(ConfigError::Missing(missing));
        }

        // All required keys are present past this point.
        let required = |key: &str| get(key).unwrap_or_default();
        let mut errors = Vec::new();

        let protocol = required(env::API_PROTOCOL).to_lowercase();
        if protocol != "http" && protocol != "https" {
            errors.push(format!(
                "{}: expected \"http\" or \"https\", got {:?}",
                env::API_PROTOCOL,
                protocol
            ));
        }

        let api_port = parse_port(env::API_PORT, &required(env::API_PORT), &mut errors);
        let smtp_port = parse_port(env::SMTP_PORT, &required(env::SMTP_PORT), &mut errors);

        let user = required(env::SMTP_USER);
        let from = match get(env::SMTP_FROM) {
            Some(from) => parse_mailbox(env::SMTP_FROM, &from, &mut errors),
            None => parse_mailbox(env::SMTP_USER, &user, &mut errors),
        };
        let recipient = parse_mailbox(
            env::RECIPIENT_EMAIL,
            &required(env::RECIPIENT_EMAIL),
            &mut errors,
        );

        let schedule = match CronSchedule::parse(&required(env::CRON_SCHEDULE)) {
            Ok(schedule) => Some(schedule),
            Err(e) => {
                errors.push(format!("{}: {}", env::CRON_SCHEDULE, e));
                None
            }
        };

        let probe_timeout = parse_secs(
            env::PROBE_TIMEOUT_SECS,
            get(env::PROBE_TIMEOUT_SECS),
            defaults::PROBE_TIMEOUT_SECS,
            &mut errors,
        );
        let cycle_deadline = parse_secs(
            env::CYCLE_DEADLINE_SECS,
            get(env::CYCLE_DEADLINE_SECS),
            defaults::CYCLE_DEADLINE_SECS,
            &mut errors,
        );

        match (api_port, smtp_port, from, recipient, schedule) {
            (Some(api_port), Some(smtp_port), Some(from), Some(recipient), Some(schedule))
                if errors.is_empty() =>
            {
                Ok(Self {
                    api: ApiConfig {
                        protocol,
                        host: required(env::API_HOSTNAME),
                        port: api_port,
                        org_id: required(env::ORG_ID),
                        site_id: required(env::SITE_NICE_ID),
                        token: Secret::new(required(env::API_TOKEN)),
                    },
                    smtp: SmtpConfig {
                        server: required(env::SMTP_SERVER),
                        port: smtp_port,
                        user,
                        password: Secret::new(required(env::SMTP_PASSWORD)),
                        from,
                        recipient,
                    },
                    schedule,
                    probe_timeout,
                    cycle_deadline,
                })
            }
            _ => Err(ConfigError::Invalid(errors)),
        }
    }
}

/// Read `KEY=value` pairs from an env file without touching the process
/// environment.
pub fn read_env_file(path: &Path) -> Result<HashMap<String, String>, ConfigError> {
    let to_error = |source| ConfigError::EnvFile {
        path: path.to_path_buf(),
        source,
    };

    let mut vars = HashMap::new();
    for item in dotenvy::from_path_iter(path).map_err(to_error)? {
        let (key, value) = item.map_err(to_error)?;
        vars.insert(key, value);
    }
    Ok(vars)
}

fn parse_port(key: &str, raw: &str, errors: &mut Vec<String>) -> Option<u16> {
    match raw.parse::<u16>() {
        Ok(0) | Err(_) => {
            errors.push(format!("{key}: {raw:?} is not a valid port"));
            None
        }
        Ok(port) => Some(port),
    }
}

fn parse_mailbox(key: &str, raw: &str, errors: &mut Vec<String>) -> Option<Mailbox> {
    match raw.parse::<Mailbox>() {
        Ok(mailbox) => Some(mailbox),
        Err(e) => {
            errors.push(format!("{key}: {raw:?} is not a valid mail address ({e})"));
            None
        }
    }
}

fn parse_secs(key: &str, raw: Option<String>, default: u64, errors: &mut Vec<String>) -> Duration {
    let Some(raw) = raw else {
        return Duration::from_secs(default);
    };
    match raw.parse::<u64>() {
        Ok(secs) if secs > 0 => Duration::from_secs(secs),
        _ => {
            errors.push(format!("{key}: {raw:?} must be a positive number of seconds"));
            Duration::from_secs(default)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tokio_test::{assert_err, assert_ok};

    fn full_env() -> HashMap<String, String> {
        [
            (env::API_PROTOCOL, "https"),
            (env::API_HOSTNAME, "pangolin.internal"),
            (env::API_PORT, "3003"),
            (env::ORG_ID, "acme"),
            (env::SITE_NICE_ID, "home-lab"),
            (env::API_TOKEN, "tok-123"),
            (env::CRON_SCHEDULE, "*/5 * * * *"),
            (env::SMTP_USER, "monitor@example.com"),
            (env::SMTP_PASSWORD, "hunter2"),
            (env::SMTP_SERVER, "smtp.example.com"),
            (env::SMTP_PORT, "587"),
            (env::RECIPIENT_EMAIL, "ops@example.com"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    fn load(vars: &HashMap<String, String>) -> Result<MonitorConfig, ConfigError> {
        MonitorConfig::from_lookup(|k| vars.get(k).cloned())
    }

    #[test]
    fn complete_env_loads_with_defaults() {
        let config = assert_ok!(load(&full_env()));
        assert_eq!(
            config.api.endpoint(),
            "https://pangolin.internal:3003/v1/org/acme/home-lab"
        );
        assert_eq!(config.smtp.port, 587);
        assert_eq!(config.smtp.from.email.to_string(), "monitor@example.com");
        assert_eq!(config.probe_timeout, Duration::from_secs(defaults::PROBE_TIMEOUT_SECS));
        assert_eq!(config.cycle_deadline, Duration::from_secs(defaults::CYCLE_DEADLINE_SECS));
    }

    #[test]
    fn every_missing_parameter_is_reported() {
        let mut vars = full_env();
        vars.remove(env::API_TOKEN);
        vars.remove(env::SMTP_PORT);
        vars.insert(env::ORG_ID.to_string(), "   ".to_string());

        match assert_err!(load(&vars)) {
            ConfigError::Missing(keys) => {
                assert_eq!(keys, vec![env::ORG_ID, env::API_TOKEN, env::SMTP_PORT]);
            }
            other => panic!("expected Missing, got {other:?}"),
        }
    }

    #[test]
    fn empty_env_lists_all_required_parameters() {
        let err = assert_err!(MonitorConfig::from_lookup(|_| None));
        let message = err.to_string();
        for key in env::REQUIRED {
            assert!(message.contains(key), "{key} not in {message}");
        }
    }

    #[test]
    fn values_are_trimmed() {
        let mut vars = full_env();
        vars.insert(env::SITE_NICE_ID.to_string(), "  home-lab \n".to_string());
        let config = assert_ok!(load(&vars));
        assert_eq!(config.api.site_id, "home-lab");
    }

    #[test]
    fn invalid_values_are_collected() {
        let mut vars = full_env();
        vars.insert(env::API_PORT.to_string(), "not-a-port".to_string());
        vars.insert(env::CRON_SCHEDULE.to_string(), "every five minutes".to_string());
        vars.insert(env::PROBE_TIMEOUT_SECS.to_string(), "0".to_string());

        match assert_err!(load(&vars)) {
            ConfigError::Invalid(errors) => {
                assert_eq!(errors.len(), 3, "{errors:?}");
                assert!(errors.iter().any(|e| e.starts_with(env::API_PORT)));
                assert!(errors.iter().any(|e| e.starts_with(env::CRON_SCHEDULE)));
                assert!(errors.iter().any(|e| e.starts_with(env::PROBE_TIMEOUT_SECS)));
            }
            other => panic!("expected Invalid, got {other:?}"),
        }
    }

    #[test]
    fn unsupported_protocol_is_rejected() {
        let mut vars = full_env();
        vars.insert(env::API_PROTOCOL.to_string(), "ftp".to_string());
        assert!(matches!(load(&vars), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn smtp_from_overrides_user() {
        let mut vars = full_env();
        vars.insert(env::SMTP_USER.to_string(), "apikey".to_string());
        vars.insert(
            env::SMTP_FROM.to_string(),
            "Pangolin Monitor <alerts@example.com>".to_string(),
        );
        let config = assert_ok!(load(&vars));
        assert_eq!(config.smtp.user, "apikey");
        assert_eq!(config.smtp.from.email.to_string(), "alerts@example.com");
    }

    #[test]
    fn non_address_user_without_from_is_invalid() {
        let mut vars = full_env();
        vars.insert(env::SMTP_USER.to_string(), "apikey".to_string());

        match assert_err!(load(&vars)) {
            ConfigError::Invalid(errors) => {
                assert_eq!(errors.len(), 1, "{errors:?}");
                assert!(errors[0].starts_with(env::SMTP_USER), "{errors:?}");
                assert!(!errors[0].contains(env::SMTP_FROM), "{errors:?}");
            }
            other => panic!("expected Invalid, got {other:?}"),
        }
    }

    #[test]
    fn invalid_smtp_from_is_reported_under_its_own_name() {
        let mut vars = full_env();
        vars.insert(env::SMTP_FROM.to_string(), "not an address".to_string());

        match assert_err!(load(&vars)) {
            ConfigError::Invalid(errors) => {
                assert_eq!(errors.len(), 1, "{errors:?}");
                assert!(errors[0].starts_with(env::SMTP_FROM), "{errors:?}");
            }
            other => panic!("expected Invalid, got {other:?}"),
        }
    }

    #[test]
    fn secrets_are_redacted_in_debug() {
        let config = assert_ok!(load(&full_env()));
        let debug = format!("{config:?}");
        assert!(!debug.contains("tok-123"));
        assert!(!debug.contains("hunter2"));
        assert_eq!(config.api.token.expose(), "tok-123");
    }

    #[test]
    fn env_file_values_fill_gaps() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        for (key, value) in full_env() {
            writeln!(file, "{key}=\"{value}\"").expect("write");
        }
        let vars = assert_ok!(read_env_file(file.path()));
        assert_eq!(vars.get(env::ORG_ID).map(String::as_str), Some("acme"));

        let config = assert_ok!(MonitorConfig::from_lookup(|k| vars.get(k).cloned()));
        assert_eq!(config.api.org_id, "acme");
    }

    #[test]
    fn missing_env_file_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = assert_err!(read_env_file(&dir.path().join("absent.env")));
        assert!(matches!(err, ConfigError::EnvFile { .. }));
    }
}
