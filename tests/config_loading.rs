//! Config Loading Tests
//!
//! Exercises the configuration surface independently from the check cycle:
//! required parameters, schedule validation, and endpoint construction.

use std::collections::HashMap;

use pangolin_monitor::config::{env, ConfigError, MonitorConfig};
use pangolin_monitor::{HttpProbeClient, Monitor, SmtpNotifier};

fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect()
}

fn base() -> HashMap<String, String> {
    vars(&[
        (env::API_PROTOCOL, "http"),
        (env::API_HOSTNAME, "10.0.0.5"),
        (env::API_PORT, "3004"),
        (env::ORG_ID, "org_7"),
        (env::SITE_NICE_ID, "cabin"),
        (env::API_TOKEN, "abc"),
        (env::CRON_SCHEDULE, "0 * * * *"),
        (env::SMTP_USER, "alerts@example.org"),
        (env::SMTP_PASSWORD, "pw"),
        (env::SMTP_SERVER, "mail.example.org"),
        (env::SMTP_PORT, "465"),
        (env::RECIPIENT_EMAIL, "me@example.org"),
    ])
}

fn load(map: &HashMap<String, String>) -> Result<MonitorConfig, ConfigError> {
    MonitorConfig::from_lookup(|k| map.get(k).cloned())
}

#[test]
fn endpoint_follows_org_and_site() {
    let config = load(&base()).unwrap();
    assert_eq!(config.api.endpoint(), "http://10.0.0.5:3004/v1/org/org_7/cabin");

    let probe = HttpProbeClient::new(&config.api, config.probe_timeout).unwrap();
    let notifier = SmtpNotifier::new(&config.smtp).unwrap();
    let monitor = Monitor::new(
        Box::new(probe),
        Box::new(notifier),
        &config.api.org_id,
        &config.api.site_id,
        config.cycle_deadline,
    );
    assert_eq!(monitor.endpoint(), "http://10.0.0.5:3004/v1/org/org_7/cabin");
}

#[test]
fn missing_message_names_every_parameter() {
    let mut map = base();
    map.remove(env::SMTP_PASSWORD);
    map.remove(env::RECIPIENT_EMAIL);
    map.remove(env::CRON_SCHEDULE);

    let err = load(&map).unwrap_err();
    assert_eq!(
        err.to_string(),
        "missing required env: CRON_SCHEDULE, SMTP_PASSWORD, RECIPIENT_EMAIL"
    );
}

#[test]
fn missing_parameters_are_reported_before_invalid_ones() {
    let mut map = base();
    map.remove(env::ORG_ID);
    map.insert(env::SMTP_PORT.to_string(), "abc".to_string());

    assert!(matches!(load(&map), Err(ConfigError::Missing(keys)) if keys == vec![env::ORG_ID]));
}

#[test]
fn invalid_schedule_is_a_config_error() {
    let mut map = base();
    map.insert(env::CRON_SCHEDULE.to_string(), "*/5 * * *".to_string());

    let err = load(&map).unwrap_err();
    assert!(err.to_string().contains(env::CRON_SCHEDULE), "{err}");
}

#[test]
fn schedule_is_parsed_into_config() {
    let config = load(&base()).unwrap();
    assert_eq!(config.schedule.expression(), "0 * * * *");
    let upcoming = config.schedule.upcoming(2);
    assert_eq!(upcoming.len(), 2);
    assert_eq!((upcoming[1] - upcoming[0]).num_minutes(), 60);
}
