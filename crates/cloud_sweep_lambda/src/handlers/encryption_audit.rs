use cloud_sweep_core::descriptor::BucketDescriptor;
use cloud_sweep_core::encryption::{classify, BucketAudit, EncryptionStatus};
use cloud_sweep_core::error::SweepError;
use cloud_sweep_core::pagination::drain;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::adapters::object_store::BucketEncryptionSource;
use crate::handlers::response::{error_response, report_response, HandlerResponse};

const COMPONENT: &str = "encryption_audit";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EncryptionAuditReport {
    pub buckets: Vec<BucketAudit>,
    /// Buckets with no default encryption configured. Buckets that could not
    /// be checked are never listed here.
    pub unencrypted: Vec<String>,
    pub indeterminate: Vec<String>,
}

pub fn handle_encryption_audit_event(source: &impl BucketEncryptionSource) -> HandlerResponse {
    match run_encryption_audit(source) {
        Ok(report) => {
            let message = format!(
                "Scan complete. Found {} unencrypted buckets.",
                report.unencrypted.len()
            );
            report_response(200, &message, &report)
        }
        Err(audit_error) => error_response(500, &audit_error.to_string()),
    }
}

pub fn run_encryption_audit(
    source: &impl BucketEncryptionSource,
) -> Result<EncryptionAuditReport, SweepError> {
    info!(component = COMPONENT, event = "scan_started");

    let buckets = drain(
        |token| source.list_buckets_page(token),
        &|_: &BucketDescriptor| true,
    )
    .inspect_err(|listing_error| {
        error!(
            component = COMPONENT,
            event = "bucket_listing_failed",
            error = %listing_error
        );
    })?;

    let mut report = EncryptionAuditReport::default();
    for bucket in buckets {
        let status = classify(source.get_bucket_encryption(&bucket.name));
        match &status {
            EncryptionStatus::Encrypted {
                algorithm,
                kms_master_key_id,
                ..
            } => {
                info!(
                    component = COMPONENT,
                    event = "bucket_encrypted",
                    bucket = %bucket.name,
                    algorithm = %algorithm,
                    kms_master_key_id = kms_master_key_id.as_deref()
                );
            }
            EncryptionStatus::Unencrypted => {
                warn!(
                    component = COMPONENT,
                    event = "bucket_unencrypted",
                    bucket = %bucket.name,
                    "No default encryption configured."
                );
                report.unencrypted.push(bucket.name.clone());
            }
            EncryptionStatus::Indeterminate { reason } => {
                error!(
                    component = COMPONENT,
                    event = "bucket_check_failed",
                    bucket = %bucket.name,
                    error = %reason
                );
                report.indeterminate.push(bucket.name.clone());
            }
        }
        report.buckets.push(BucketAudit {
            bucket: bucket.name,
            status,
        });
    }

    if report.unencrypted.is_empty() {
        info!(
            component = COMPONENT,
            event = "scan_completed",
            buckets = report.buckets.len(),
            "All checked buckets have server-side encryption configured."
        );
    } else {
        info!(
            component = COMPONENT,
            event = "scan_completed",
            buckets = report.buckets.len(),
            unencrypted = ?report.unencrypted
        );
    }

    Ok(report)
}
