//! Five-field cron expressions evaluated in UTC.
//!
//! The `cron` crate expects a seconds field and numbers days of the week 1-7
//! starting at Sunday. Operators write classic crontab syntax (minute, hour,
//! day-of-month, month, day-of-week with 0 or 7 = Sunday), so expressions are
//! normalised before parsing: a `0` seconds field is prepended and numeric
//! days of the week are expanded to explicit day names.
//!
//! When both day-of-month and day-of-week are restricted, crontab fires on
//! either match while the `cron` crate requires both. Such expressions are
//! split into one schedule per day field and the earlier fire time wins.

use std::str::FromStr;

use chrono::{DateTime, Utc};

const DAY_NAMES: [&str; 8] = ["SUN", "MON", "TUE", "WED", "THU", "FRI", "SAT", "SUN"];

/// Highest day-of-week a bare `N/step` or `*/step` runs up to.
const LAST_WEEKDAY: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScheduleError {
    #[error("expected 5 fields (minute hour day-of-month month day-of-week), got {0}")]
    FieldCount(usize),

    #[error("day-of-week {0:?} is not a valid day, range or step (days are 0-7)")]
    DayOfWeek(String),

    #[error("invalid expression {expr:?}: {reason}")]
    Invalid { expr: String, reason: String },
}

/// A parsed five-field schedule.
#[derive(Debug, Clone)]
pub struct CronSchedule {
    expression: String,
    /// One schedule, or one per day field when either may match.
    schedules: Vec<cron::Schedule>,
}

impl CronSchedule {
    pub fn parse(expression: &str) -> Result<Self, ScheduleError> {
        let fields: Vec<&str> = expression.split_whitespace().collect();
        let [minute, hour, day_of_month, month, day_of_week] = fields[..] else {
            return Err(ScheduleError::FieldCount(fields.len()));
        };

        let weekdays = normalize_day_of_week(day_of_week)?;
        let build = |dom: &str, dow: &str| {
            let normalized = format!("0 {minute} {hour} {dom} {month} {dow}");
            cron::Schedule::from_str(&normalized).map_err(|e| ScheduleError::Invalid {
                expr: expression.to_string(),
                reason: e.to_string(),
            })
        };

        let schedules = if is_restricted(day_of_month) && is_restricted(day_of_week) {
            vec![build(day_of_month, "*")?, build("*", &weekdays)?]
        } else {
            vec![build(day_of_month, &weekdays)?]
        };

        Ok(Self {
            expression: fields.join(" "),
            schedules,
        })
    }

    /// The expression as the operator wrote it (whitespace collapsed).
    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// First fire time strictly after `after`.
    pub fn next_after(&self, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.schedules
            .iter()
            .filter_map(|schedule| schedule.after(&after).next())
            .min()
    }

    /// The next `count` fire times from now.
    pub fn upcoming(&self, count: usize) -> Vec<DateTime<Utc>> {
        let mut times = Vec::with_capacity(count);
        let mut cursor = Utc::now();
        while times.len() < count {
            let Some(next) = self.next_after(cursor) else {
                break;
            };
            times.push(next);
            cursor = next;
        }
        times
    }
}

impl FromStr for CronSchedule {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl std::fmt::Display for CronSchedule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.expression)
    }
}

/// A day field other than a bare wildcard narrows the days a schedule fires on.
fn is_restricted(field: &str) -> bool {
    !matches!(field, "*" | "?" | "*/1" | "?/1")
}

/// Rewrite numeric crontab days of the week as names.
fn normalize_day_of_week(field: &str) -> Result<String, ScheduleError> {
    let items = field
        .split(',')
        .map(normalize_day_item)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(items.join(","))
}

/// Numeric days, ranges and steps become an explicit name list. Names pass
/// through for the `cron` crate to validate.
fn normalize_day_item(item: &str) -> Result<String, ScheduleError> {
    let invalid = || ScheduleError::DayOfWeek(item.to_string());
    let (base, step) = match item.split_once('/') {
        Some((base, step)) => match step.trim().parse::<usize>() {
            Ok(step) if step > 0 => (base.trim(), Some(step)),
            _ => return Err(invalid()),
        },
        None => (item.trim(), None),
    };

    let bounds = if base == "*" || base == "?" {
        match step {
            Some(_) => (0, LAST_WEEKDAY),
            None => return Ok(base.to_string()),
        }
    } else if let Some((lo, hi)) = base.split_once('-') {
        match (day_number(lo)?, day_number(hi)?) {
            (Some(lo), Some(hi)) => (lo, hi),
            _ => {
                let range = format!("{}-{}", day_name(lo)?, day_name(hi)?);
                return Ok(match step {
                    Some(step) => format!("{range}/{step}"),
                    None => range,
                });
            }
        }
    } else {
        match day_number(base)? {
            Some(day) if step.is_some() => (day, LAST_WEEKDAY.max(day)),
            Some(day) => (day, day),
            None => return Ok(base.to_uppercase()),
        }
    };

    let (lo, hi) = bounds;
    if lo > hi {
        return Err(invalid());
    }
    let mut names: Vec<&str> = Vec::new();
    for day in (lo..=hi).step_by(step.unwrap_or(1)) {
        let name = DAY_NAMES[day];
        if !names.contains(&name) {
            names.push(name);
        }
    }
    Ok(names.join(","))
}

/// Numeric day in 0-7, or `None` for a name.
fn day_number(value: &str) -> Result<Option<usize>, ScheduleError> {
    let value = value.trim();
    if value.is_empty() || !value.chars().all(|c| c.is_ascii_digit()) {
        return Ok(None);
    }
    match value.parse::<usize>() {
        Ok(day) if day < DAY_NAMES.len() => Ok(Some(day)),
        _ => Err(ScheduleError::DayOfWeek(value.to_string())),
    }
}

/// Map a numeric day to its name; names are upper-cased.
fn day_name(value: &str) -> Result<String, ScheduleError> {
    Ok(match day_number(value)? {
        Some(day) => DAY_NAMES[day].to_string(),
        None => value.trim().to_uppercase(),
    })
}
