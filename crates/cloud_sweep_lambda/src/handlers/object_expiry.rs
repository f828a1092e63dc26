use chrono::{DateTime, Utc};
use cloud_sweep_core::chunking::{execute_batches, ChunkReport, MAX_BATCH_SIZE};
use cloud_sweep_core::error::SweepError;
use cloud_sweep_core::pagination::drain;
use cloud_sweep_core::predicate::RetentionCutoff;
use serde::Serialize;
use tracing::{error, info};

use crate::adapters::object_store::ObjectStore;
use crate::handlers::response::{error_response, report_response, HandlerResponse};

const COMPONENT: &str = "object_expiry";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectExpiryConfig {
    pub bucket: String,
    pub retention_days: i64,
    pub now: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObjectExpiryReport {
    pub bucket: String,
    pub cutoff: String,
    pub candidates: usize,
    pub deleted: usize,
    pub failed: usize,
    pub batches: Vec<ChunkReport>,
}

pub fn handle_object_expiry_event(
    config: &ObjectExpiryConfig,
    store: &impl ObjectStore,
) -> HandlerResponse {
    match run_object_expiry(config, store) {
        Ok(report) if report.candidates == 0 => {
            report_response(200, "No old files to delete.", &report)
        }
        Ok(report) => {
            let message = format!("Deleted {} objects.", report.deleted);
            report_response(200, &message, &report)
        }
        Err(sweep_error) => error_response(500, &sweep_error.to_string()),
    }
}

/// Deletes every object last modified before the retention cutoff, in
/// batches of at most [`MAX_BATCH_SIZE`] keys.
pub fn run_object_expiry(
    config: &ObjectExpiryConfig,
    store: &impl ObjectStore,
) -> Result<ObjectExpiryReport, SweepError> {
    let cutoff = RetentionCutoff::compute(config.now, config.retention_days)?;
    info!(
        component = COMPONENT,
        event = "sweep_started",
        bucket = %config.bucket,
        now = %config.now.to_rfc3339(),
        cutoff = %cutoff.cutoff().to_rfc3339()
    );

    let expired = drain(
        |token| store.list_objects_page(&config.bucket, token),
        &cutoff,
    )
    .inspect_err(|listing_error| {
        error!(
            component = COMPONENT,
            event = "object_listing_failed",
            bucket = %config.bucket,
            error = %listing_error
        );
    })?;

    let keys: Vec<String> = expired.into_iter().map(|object| object.key).collect();
    if keys.is_empty() {
        info!(
            component = COMPONENT,
            event = "no_candidates",
            bucket = %config.bucket,
            "No objects found older than {} days. No action taken.",
            config.retention_days
        );
    }

    let batches = execute_batches(&keys, MAX_BATCH_SIZE, |index, chunk| {
        info!(
            component = COMPONENT,
            event = "object_batch_started",
            batch = index,
            keys = chunk.len()
        );
        store.delete_objects(&config.bucket, chunk)
    });

    for chunk in &batches.chunks {
        if let Some(call_error) = &chunk.call_error {
            error!(
                component = COMPONENT,
                event = "object_batch_failed",
                batch = chunk.index,
                error = %call_error
            );
            continue;
        }
        info!(
            component = COMPONENT,
            event = "object_batch_deleted",
            batch = chunk.index,
            deleted = ?chunk.confirmed
        );
        for item_error in &chunk.errors {
            error!(
                component = COMPONENT,
                event = "object_delete_failed",
                key = %item_error.key,
                error = %item_error.message
            );
        }
    }

    let summary = batches.summary();
    Ok(ObjectExpiryReport {
        bucket: config.bucket.clone(),
        cutoff: cutoff.cutoff().to_rfc3339(),
        candidates: keys.len(),
        deleted: batches.confirmed_count(),
        failed: summary.failed,
        batches: batches.chunks,
    })
}
