use chrono::{DateTime, Duration, Utc};

use crate::descriptor::{InstanceDescriptor, InstanceState, ObjectDescriptor, SnapshotDescriptor};
use crate::error::SweepError;

/// Decides whether a resource descriptor belongs to a sweep's candidate set.
pub trait Predicate<T: ?Sized> {
    fn matches(&self, item: &T) -> bool;
}

impl<T: ?Sized, F> Predicate<T> for F
where
    F: Fn(&T) -> bool,
{
    fn matches(&self, item: &T) -> bool {
        self(item)
    }
}

/// Tag equality combined with lifecycle state equality.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagStatePredicate {
    pub tag_key: String,
    pub tag_value: String,
    pub state: InstanceState,
}

impl TagStatePredicate {
    pub fn new(
        tag_key: impl Into<String>,
        tag_value: impl Into<String>,
        state: InstanceState,
    ) -> Self {
        Self {
            tag_key: tag_key.into(),
            tag_value: tag_value.into(),
            state,
        }
    }
}

impl Predicate<InstanceDescriptor> for TagStatePredicate {
    fn matches(&self, instance: &InstanceDescriptor) -> bool {
        instance.state == self.state && instance.tag(&self.tag_key) == Some(self.tag_value.as_str())
    }
}

/// Fixed point in time computed once per sweep. Anything strictly older
/// than the cutoff is expired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionCutoff {
    cutoff: DateTime<Utc>,
}

impl RetentionCutoff {
    pub fn compute(now: DateTime<Utc>, retention_days: i64) -> Result<Self, SweepError> {
        if retention_days <= 0 {
            return Err(SweepError::InvalidRetention(retention_days));
        }

        let cutoff = Duration::try_days(retention_days)
            .and_then(|window| now.checked_sub_signed(window))
            .ok_or(SweepError::InvalidRetention(retention_days))?;

        Ok(Self { cutoff })
    }

    pub fn cutoff(&self) -> DateTime<Utc> {
        self.cutoff
    }

    pub fn is_expired(&self, timestamp: DateTime<Utc>) -> bool {
        timestamp < self.cutoff
    }
}

impl Predicate<ObjectDescriptor> for RetentionCutoff {
    fn matches(&self, object: &ObjectDescriptor) -> bool {
        self.is_expired(object.last_modified)
    }
}

impl Predicate<SnapshotDescriptor> for RetentionCutoff {
    fn matches(&self, snapshot: &SnapshotDescriptor) -> bool {
        self.is_expired(snapshot.start_time)
    }
}
