//! Deploy-time configuration read from the Lambda environment.
//!
//! Every builder takes a `lookup` function instead of reading the process
//! environment directly; binaries pass [`env_lookup`].

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::handlers::instance_schedule::{
    ScheduleConfig, DEFAULT_START_TAG_VALUE, DEFAULT_STOP_TAG_VALUE, DEFAULT_TAG_KEY,
};
use crate::handlers::object_expiry::ObjectExpiryConfig;
use crate::handlers::snapshot_lifecycle::SnapshotLifecycleConfig;

pub const DEFAULT_RETENTION_DAYS: i64 = 30;

pub const SCHEDULE_TAG_KEY_VAR: &str = "SCHEDULE_TAG_KEY";
pub const STOP_TAG_VALUE_VAR: &str = "STOP_TAG_VALUE";
pub const START_TAG_VALUE_VAR: &str = "START_TAG_VALUE";
pub const SNAPSHOT_VOLUME_ID_VAR: &str = "SNAPSHOT_VOLUME_ID";
pub const SNAPSHOT_RETENTION_DAYS_VAR: &str = "SNAPSHOT_RETENTION_DAYS";
pub const EXPIRY_BUCKET_NAME_VAR: &str = "EXPIRY_BUCKET_NAME";
pub const EXPIRY_RETENTION_DAYS_VAR: &str = "EXPIRY_RETENTION_DAYS";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{0} must be configured")]
    Missing(&'static str),
    #[error("{name} must be a positive whole number of days, got '{value}'")]
    InvalidRetention { name: &'static str, value: String },
}

/// Reads a variable from the process environment. Blank values count as unset.
pub fn env_lookup(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .filter(|value| !value.trim().is_empty())
}

pub fn required(
    lookup: impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<String, ConfigError> {
    lookup(name)
        .map(|value| value.trim().to_string())
        .ok_or(ConfigError::Missing(name))
}

pub fn optional(lookup: impl Fn(&str) -> Option<String>, name: &str, default: &str) -> String {
    lookup(name)
        .map(|value| value.trim().to_string())
        .unwrap_or_else(|| default.to_string())
}

pub fn retention_days(
    lookup: impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<i64, ConfigError> {
    let Some(raw) = lookup(name) else {
        return Ok(DEFAULT_RETENTION_DAYS);
    };
    match raw.trim().parse::<i64>() {
        Ok(days) if days > 0 => Ok(days),
        _ => Err(ConfigError::InvalidRetention { name, value: raw }),
    }
}

pub fn schedule_config(lookup: impl Fn(&str) -> Option<String>) -> ScheduleConfig {
    ScheduleConfig {
        tag_key: optional(&lookup, SCHEDULE_TAG_KEY_VAR, DEFAULT_TAG_KEY),
        stop_tag_value: optional(&lookup, STOP_TAG_VALUE_VAR, DEFAULT_STOP_TAG_VALUE),
        start_tag_value: optional(&lookup, START_TAG_VALUE_VAR, DEFAULT_START_TAG_VALUE),
    }
}

pub fn snapshot_lifecycle_config(
    lookup: impl Fn(&str) -> Option<String>,
    now: DateTime<Utc>,
) -> Result<SnapshotLifecycleConfig, ConfigError> {
    Ok(SnapshotLifecycleConfig {
        volume_id: required(&lookup, SNAPSHOT_VOLUME_ID_VAR)?,
        retention_days: retention_days(&lookup, SNAPSHOT_RETENTION_DAYS_VAR)?,
        now,
    })
}

pub fn object_expiry_config(
    lookup: impl Fn(&str) -> Option<String>,
    now: DateTime<Utc>,
) -> Result<ObjectExpiryConfig, ConfigError> {
    Ok(ObjectExpiryConfig {
        bucket: required(&lookup, EXPIRY_BUCKET_NAME_VAR)?,
        retention_days: retention_days(&lookup, EXPIRY_RETENTION_DAYS_VAR)?,
        now,
    })
}
