use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::outcome::ItemOutcome;
use crate::report::SweepSummary;

/// Largest number of keys a bulk delete call accepts.
pub const MAX_BATCH_SIZE: usize = 1_000;

/// Splits `items` into consecutive batches of at most `size` items.
/// A size of zero is treated as one.
pub fn chunked<T>(items: &[T], size: usize) -> std::slice::Chunks<'_, T> {
    items.chunks(size.max(1))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchItemError {
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub message: String,
}

/// Per-item result array returned by a bulk-capable remote call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchResponse {
    pub confirmed: Vec<String>,
    pub errors: Vec<BatchItemError>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChunkReport {
    pub index: usize,
    pub requested: usize,
    pub confirmed: Vec<String>,
    pub errors: Vec<BatchItemError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub call_error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub chunks: Vec<ChunkReport>,
    outcomes: Vec<ItemOutcome>,
}

impl BatchReport {
    pub fn outcomes(&self) -> &[ItemOutcome] {
        &self.outcomes
    }

    pub fn call_count(&self) -> usize {
        self.chunks.len()
    }

    pub fn confirmed_count(&self) -> usize {
        self.chunks.iter().map(|chunk| chunk.confirmed.len()).sum()
    }

    pub fn summary(&self) -> SweepSummary {
        SweepSummary::from_outcomes(&self.outcomes)
    }
}

/// Issues one bulk call per chunk of `ids`.
///
/// A call-level failure marks every id of that chunk as failed and the next
/// chunk is still attempted. Ids the remote neither confirmed nor reported
/// an error for are recorded as skipped.
pub fn execute_batches<F>(ids: &[String], size: usize, mut call: F) -> BatchReport
where
    F: FnMut(usize, &[String]) -> Result<BatchResponse, String>,
{
    let mut report = BatchReport::default();

    for (index, chunk) in chunked(ids, size).enumerate() {
        match call(index, chunk) {
            Ok(response) => {
                let confirmed: HashSet<&str> =
                    response.confirmed.iter().map(String::as_str).collect();
                let errors: HashMap<&str, &str> = response
                    .errors
                    .iter()
                    .map(|error| (error.key.as_str(), error.message.as_str()))
                    .collect();

                for id in chunk {
                    let outcome = if confirmed.contains(id.as_str()) {
                        ItemOutcome::succeeded(id.as_str())
                    } else if let Some(message) = errors.get(id.as_str()) {
                        ItemOutcome::failed(id.as_str(), *message)
                    } else {
                        ItemOutcome::skipped(id.as_str())
                    };
                    report.outcomes.push(outcome);
                }

                report.chunks.push(ChunkReport {
                    index,
                    requested: chunk.len(),
                    confirmed: response.confirmed,
                    errors: response.errors,
                    call_error: None,
                });
            }
            Err(message) => {
                report.outcomes.extend(
                    chunk
                        .iter()
                        .map(|id| ItemOutcome::failed(id.as_str(), message.as_str())),
                );
                report.chunks.push(ChunkReport {
                    index,
                    requested: chunk.len(),
                    confirmed: Vec::new(),
                    errors: Vec::new(),
                    call_error: Some(message),
                });
            }
        }
    }

    report
}

/// Applies one call to a whole group of ids. The call succeeds or fails
/// atomically for every member. An empty group issues no call.
pub fn execute_group<F>(ids: &[String], call: F) -> Vec<ItemOutcome>
where
    F: FnOnce(&[String]) -> Result<(), String>,
{
    if ids.is_empty() {
        return Vec::new();
    }

    match call(ids) {
        Ok(()) => ids.iter().map(ItemOutcome::succeeded).collect(),
        Err(message) => ids
            .iter()
            .map(|id| ItemOutcome::failed(id.as_str(), message.as_str()))
            .collect(),
    }
}

/// Issues one call per id; a failure only affects that id.
pub fn execute_each<F>(ids: &[String], mut call: F) -> Vec<ItemOutcome>
where
    F: FnMut(&str) -> Result<(), String>,
{
    ids.iter()
        .map(|id| match call(id) {
            Ok(()) => ItemOutcome::succeeded(id.as_str()),
            Err(message) => ItemOutcome::failed(id.as_str(), message),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use crate::outcome::ActionOutcome;

    use super::*;

    fn keys(count: usize) -> Vec<String> {
        (0..count).map(|index| format!("logs/{index:05}.json")).collect()
    }

    #[test]
    fn chunked_respects_max_size_and_zero_guard() {
        let items: Vec<u32> = (0..2_500).collect();
        let sizes: Vec<usize> = chunked(&items, MAX_BATCH_SIZE).map(<[u32]>::len).collect();
        assert_eq!(sizes, vec![1_000, 1_000, 500]);

        assert_eq!(chunked(&items[..3], 0).count(), 3);
        assert_eq!(chunked::<u32>(&[], MAX_BATCH_SIZE).count(), 0);
    }

    #[test]
    fn batches_issue_ceil_n_over_size_calls_and_confirm_everything() {
        let ids = keys(2_001);
        let mut requested = Vec::new();

        let report = execute_batches(&ids, MAX_BATCH_SIZE, |_index, chunk| {
            requested.extend(chunk.iter().cloned());
            Ok(BatchResponse {
                confirmed: chunk.to_vec(),
                errors: Vec::new(),
            })
        });

        assert_eq!(report.call_count(), 3);
        assert_eq!(report.confirmed_count(), ids.len());
        assert_eq!(requested, ids);
        let confirmed: Vec<String> = report
            .chunks
            .iter()
            .flat_map(|chunk| chunk.confirmed.iter().cloned())
            .collect();
        assert_eq!(confirmed, ids);
    }

    #[test]
    fn failed_chunk_does_not_block_later_chunks() {
        let ids = keys(2_500);

        let report = execute_batches(&ids, MAX_BATCH_SIZE, |index, chunk| {
            if index == 0 {
                Err("SlowDown".to_string())
            } else {
                Ok(BatchResponse {
                    confirmed: chunk.to_vec(),
                    errors: Vec::new(),
                })
            }
        });

        assert_eq!(report.call_count(), 3);
        assert_eq!(report.chunks[0].call_error.as_deref(), Some("SlowDown"));
        assert_eq!(report.confirmed_count(), 1_500);
        let summary = report.summary();
        assert_eq!(summary.failed, 1_000);
        assert_eq!(summary.succeeded, 1_500);
    }

    #[test]
    fn per_item_errors_are_captured_individually() {
        let ids = keys(3);

        let report = execute_batches(&ids, MAX_BATCH_SIZE, |_index, chunk| {
            Ok(BatchResponse {
                confirmed: vec![chunk[0].clone()],
                errors: vec![BatchItemError {
                    key: chunk[1].clone(),
                    code: Some("AccessDenied".to_string()),
                    message: "Access Denied".to_string(),
                }],
            })
        });

        let outcomes = report.outcomes();
        assert_eq!(outcomes[0].outcome, ActionOutcome::Succeeded);
        assert_eq!(
            outcomes[1].outcome,
            ActionOutcome::Failed("Access Denied".to_string())
        );
        assert_eq!(outcomes[2].outcome, ActionOutcome::Skipped);
    }

    #[test]
    fn group_call_is_atomic_and_skipped_when_empty() {
        let ids = vec!["i-1".to_string(), "i-2".to_string()];

        let failed = execute_group(&ids, |_| Err("UnauthorizedOperation".to_string()));
        assert!(failed.iter().all(|item| item.failure_reason().is_some()));

        let succeeded = execute_group(&ids, |_| Ok(()));
        assert!(succeeded.iter().all(ItemOutcome::is_success));

        let mut called = false;
        let empty = execute_group(&[], |_| {
            called = true;
            Ok(())
        });
        assert!(empty.is_empty());
        assert!(!called);
    }

    #[test]
    fn each_call_failure_is_isolated() {
        let ids = vec!["snap-1".to_string(), "snap-2".to_string(), "snap-3".to_string()];

        let outcomes = execute_each(&ids, |id| {
            if id == "snap-2" {
                Err("InvalidSnapshot.InUse".to_string())
            } else {
                Ok(())
            }
        });

        let summary = SweepSummary::from_outcomes(&outcomes);
        assert_eq!(summary.succeeded, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.failures[0].resource_id, "snap-2");
    }
}
