//! Typed configuration from environment variables.
//!
//! Every value has a default, so an empty environment yields a working
//! configuration; malformed values fail fast.

use chrono::FixedOffset;
use std::time::Duration;
use thiserror::Error;

use crate::workload::domain::DayBoundary;

/// Seconds between allocation cycles.
pub const CYCLE_INTERVAL_VAR: &str = "ALLOTMENT_CYCLE_INTERVAL_SECS";
/// Offset from UTC, in minutes, at which calendar days roll over.
pub const UTC_OFFSET_VAR: &str = "ALLOTMENT_UTC_OFFSET_MINUTES";
/// Default tracing filter directive.
pub const LOG_LEVEL_VAR: &str = "LOG_LEVEL";

const DEFAULT_CYCLE_INTERVAL: Duration = Duration::from_secs(30);
const DEFAULT_LOG_LEVEL: &str = "info";
const MAX_OFFSET_MINUTES: i32 = 18 * 60;

/// Errors raised while reading configuration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A variable is present but cannot be parsed.
    #[error("{name} must be {expected}, got '{value}'")]
    Invalid {
        /// Variable name.
        name: &'static str,
        /// Raw value.
        value: String,
        /// Human-readable description of accepted values.
        expected: &'static str,
    },
}

/// Allocation service configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllotmentConfig {
    /// Interval between scheduled allocation cycles.
    pub cycle_interval: Duration,
    /// Calendar used for daily capacity rollover.
    pub day_boundary: DayBoundary,
    /// Default tracing filter when `RUST_LOG` is unset.
    pub log_level: String,
}

impl Default for AllotmentConfig {
    fn default() -> Self {
        Self {
            cycle_interval: DEFAULT_CYCLE_INTERVAL,
            day_boundary: DayBoundary::utc(),
            log_level: DEFAULT_LOG_LEVEL.to_owned(),
        }
    }
}

impl AllotmentConfig {
    /// Loads configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for malformed values.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Loads configuration from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for malformed values.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let cycle_interval = match lookup(CYCLE_INTERVAL_VAR) {
            Some(raw) => parse_interval(&raw)?,
            None => defaults.cycle_interval,
        };
        let day_boundary = match lookup(UTC_OFFSET_VAR) {
            Some(raw) => DayBoundary::new(parse_offset(&raw)?),
            None => defaults.day_boundary,
        };
        let log_level = lookup(LOG_LEVEL_VAR)
            .map(|raw| raw.trim().to_owned())
            .filter(|level| !level.is_empty())
            .unwrap_or(defaults.log_level);

        Ok(Self {
            cycle_interval,
            day_boundary,
            log_level,
        })
    }
}

fn parse_interval(raw: &str) -> Result<Duration, ConfigError> {
    let invalid = || ConfigError::Invalid {
        name: CYCLE_INTERVAL_VAR,
        value: raw.to_owned(),
        expected: "a positive number of seconds",
    };
    let seconds: u64 = raw.trim().parse().map_err(|_| invalid())?;
    if seconds == 0 {
        return Err(invalid());
    }
    Ok(Duration::from_secs(seconds))
}

fn parse_offset(raw: &str) -> Result<FixedOffset, ConfigError> {
    let invalid = || ConfigError::Invalid {
        name: UTC_OFFSET_VAR,
        value: raw.to_owned(),
        expected: "whole minutes between -1080 and 1080",
    };
    let minutes: i32 = raw.trim().parse().map_err(|_| invalid())?;
    if minutes.abs() > MAX_OFFSET_MINUTES {
        return Err(invalid());
    }
    FixedOffset::east_opt(minutes.saturating_mul(60)).ok_or_else(invalid)
}
