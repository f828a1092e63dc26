use chrono::{DateTime, Utc};
use cloud_sweep_core::chunking::execute_each;
use cloud_sweep_core::descriptor::SnapshotDescriptor;
use cloud_sweep_core::pagination::drain;
use cloud_sweep_core::predicate::{Predicate, RetentionCutoff};
use cloud_sweep_core::report::SweepSummary;
use serde::Serialize;
use tracing::{error, info};

use crate::adapters::block_storage::{SnapshotRequest, SnapshotStore};
use crate::handlers::response::{report_response, HandlerResponse};

const COMPONENT: &str = "snapshot_lifecycle";

pub const BACKUP_TYPE_TAG: (&str, &str) = ("BackupType", "Automated");
pub const CREATED_BY_TAG: (&str, &str) = ("CreatedBy", "LambdaEBSBackup");
pub const SOURCE_VOLUME_TAG_KEY: &str = "SourceVolume";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotLifecycleConfig {
    pub volume_id: String,
    pub retention_days: i64,
    pub now: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PruneReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cutoff: Option<String>,
    pub candidates: usize,
    pub summary: SweepSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SnapshotLifecycleReport {
    pub volume_id: String,
    pub created_snapshot_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub create_error: Option<String>,
    pub prune: PruneReport,
}

impl SnapshotLifecycleReport {
    /// Both sub-steps failed outright; per-snapshot delete failures don't count.
    pub fn failed_entirely(&self) -> bool {
        self.create_error.is_some() && self.prune.error.is_some()
    }
}

pub fn snapshot_request(config: &SnapshotLifecycleConfig) -> SnapshotRequest {
    SnapshotRequest {
        volume_id: config.volume_id.clone(),
        description: format!(
            "Lambda_Snapshot_for_{}_{}",
            config.volume_id,
            config.now.format("%Y-%m-%d")
        ),
        tags: vec![
            (BACKUP_TYPE_TAG.0.to_string(), BACKUP_TYPE_TAG.1.to_string()),
            (CREATED_BY_TAG.0.to_string(), CREATED_BY_TAG.1.to_string()),
            (SOURCE_VOLUME_TAG_KEY.to_string(), config.volume_id.clone()),
        ],
    }
}

pub fn handle_snapshot_lifecycle_event(
    config: &SnapshotLifecycleConfig,
    store: &impl SnapshotStore,
) -> HandlerResponse {
    let report = run_snapshot_lifecycle(config, store);
    let message = format!(
        "Snapshot action complete. Created: {}. Deleted: {:?}",
        report.created_snapshot_id.as_deref().unwrap_or("None"),
        report.prune.summary.affected
    );
    let status_code = if report.failed_entirely() { 500 } else { 200 };
    report_response(status_code, &message, &report)
}

/// Creates a fresh snapshot, then prunes expired ones. Prune always runs,
/// whatever happened during creation.
pub fn run_snapshot_lifecycle(
    config: &SnapshotLifecycleConfig,
    store: &impl SnapshotStore,
) -> SnapshotLifecycleReport {
    info!(
        component = COMPONENT,
        event = "sweep_started",
        volume_id = %config.volume_id,
        retention_days = config.retention_days
    );

    let mut report = SnapshotLifecycleReport {
        volume_id: config.volume_id.clone(),
        created_snapshot_id: None,
        create_error: None,
        prune: PruneReport::default(),
    };

    match store.create_snapshot(&snapshot_request(config)) {
        Ok(snapshot_id) => {
            info!(
                component = COMPONENT,
                event = "snapshot_created",
                volume_id = %config.volume_id,
                snapshot_id = %snapshot_id
            );
            report.created_snapshot_id = Some(snapshot_id);
        }
        Err(create_error) => {
            error!(
                component = COMPONENT,
                event = "snapshot_create_failed",
                volume_id = %config.volume_id,
                error = %create_error
            );
            report.create_error = Some(create_error);
        }
    }

    report.prune = prune_expired(config, store);
    report
}

fn prune_expired(config: &SnapshotLifecycleConfig, store: &impl SnapshotStore) -> PruneReport {
    let mut prune = PruneReport::default();

    let cutoff = match RetentionCutoff::compute(config.now, config.retention_days) {
        Ok(value) => value,
        Err(cutoff_error) => {
            error!(
                component = COMPONENT,
                event = "prune_skipped",
                error = %cutoff_error
            );
            prune.error = Some(cutoff_error.to_string());
            return prune;
        }
    };
    prune.cutoff = Some(cutoff.cutoff().to_rfc3339());
    info!(
        component = COMPONENT,
        event = "prune_started",
        cutoff = %cutoff.cutoff().to_rfc3339()
    );

    let is_expired = |snapshot: &SnapshotDescriptor| {
        let expired = cutoff.matches(snapshot);
        if !expired {
            info!(
                component = COMPONENT,
                event = "snapshot_retained",
                snapshot_id = %snapshot.snapshot_id,
                start_time = %snapshot.start_time.to_rfc3339()
            );
        }
        expired
    };

    let expired = match drain(
        |token| store.describe_snapshots_page(&config.volume_id, token),
        &is_expired,
    ) {
        Ok(snapshots) => snapshots,
        Err(listing_error) => {
            error!(
                component = COMPONENT,
                event = "snapshot_listing_failed",
                volume_id = %config.volume_id,
                error = %listing_error
            );
            prune.error = Some(listing_error.to_string());
            return prune;
        }
    };

    let snapshot_ids: Vec<String> = expired
        .into_iter()
        .map(|snapshot| {
            info!(
                component = COMPONENT,
                event = "snapshot_expired",
                snapshot_id = %snapshot.snapshot_id,
                start_time = %snapshot.start_time.to_rfc3339()
            );
            snapshot.snapshot_id
        })
        .collect();
    prune.candidates = snapshot_ids.len();

    let outcomes = execute_each(&snapshot_ids, |snapshot_id| {
        let result = store.delete_snapshot(snapshot_id);
        match &result {
            Ok(()) => info!(
                component = COMPONENT,
                event = "snapshot_deleted",
                snapshot_id = %snapshot_id
            ),
            Err(delete_error) => error!(
                component = COMPONENT,
                event = "snapshot_delete_failed",
                snapshot_id = %snapshot_id,
                error = %delete_error
            ),
        }
        result
    });
    prune.summary = SweepSummary::from_outcomes(&outcomes);

    info!(
        component = COMPONENT,
        event = "prune_completed",
        deleted = prune.summary.succeeded,
        failed = prune.summary.failed
    );
    prune
}
