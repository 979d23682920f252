use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Local, TimeDelta, TimeZone};
use cron::Schedule;
use derive_more::{Display, Error};

const EVERY_PREFIX: &str = "@every ";

/// When backups are triggered.
#[derive(Debug, Clone)]
pub enum Interval {
    /// Cron expression with seconds field.
    Cron(Box<Schedule>),
    /// Fixed delay between two runs.
    Every(Duration),
}

#[derive(Debug, Display, Error)]
/// Errors on parsing an [Interval].
pub enum IntervalError {
    #[display("'{expression}' is no valid cron expression: {reason}")]
    Cron { expression: String, reason: String },
    #[display("'{_0}' is no valid duration, expected e.g. 1h30m")]
    Duration(#[error(ignore)] String),
    /// Parsed fine but has no trigger in the future.
    #[display("'{_0}' never triggers a backup")]
    NeverFires(#[error(ignore)] String),
}

impl Interval {
    /// Parses an interval expression.
    ///
    /// Accepted are
    /// - cron expressions with seconds (`0 30 2 * * *`) or without (`30 2 * * *`),
    /// - descriptors like `@daily` or `@hourly`,
    /// - fixed delays like `@every 6h` or `@every 1h 30m`.
    ///
    /// Expressions without any upcoming trigger are rejected.
    pub fn parse(expression: &str) -> Result<Self, IntervalError> {
        let expression = expression.trim();

        let interval = match expression.strip_prefix(EVERY_PREFIX) {
            Some(duration) => Self::Every(parse_delay(duration.trim())?),
            None => Self::Cron(Box::new(parse_cron(expression)?)),
        };

        if interval.next_after(&Local::now()).is_none() {
            return Err(IntervalError::NeverFires(expression.to_string()));
        }
        Ok(interval)
    }

    /// First trigger strictly after `now`.
    pub fn next_after<Z: TimeZone>(&self, now: &DateTime<Z>) -> Option<DateTime<Z>> {
        match self {
            Self::Cron(schedule) => schedule.after(now).next(),
            Self::Every(delay) => {
                let delay = TimeDelta::from_std(*delay).ok()?;
                now.clone().checked_add_signed(delay)
            }
        }
    }
}

fn parse_delay(duration: &str) -> Result<Duration, IntervalError> {
    humantime::parse_duration(duration)
        .ok()
        .filter(|delay| !delay.is_zero())
        .ok_or_else(|| IntervalError::Duration(duration.to_string()))
}

fn parse_cron(expression: &str) -> Result<Schedule, IntervalError> {
    // classic crontab lines lack the seconds field
    let normalized = if expression.split_whitespace().count() == 5 {
        format!("0 {expression}")
    } else {
        expression.to_string()
    };

    Schedule::from_str(&normalized).map_err(|e| IntervalError::Cron {
        expression: expression.to_string(),
        reason: e.to_string(),
    })
}
