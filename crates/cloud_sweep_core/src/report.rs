use serde::Serialize;

use crate::outcome::{ActionOutcome, ItemOutcome};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemFailure {
    pub resource_id: String,
    pub reason: String,
}

/// Aggregated outcomes of one sweep step. Built fresh per invocation and
/// never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepSummary {
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
    pub affected: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<ItemFailure>,
}

impl SweepSummary {
    pub fn from_outcomes<'a>(outcomes: impl IntoIterator<Item = &'a ItemOutcome>) -> Self {
        let mut summary = Self::default();
        for item in outcomes {
            summary.record(item);
        }
        summary
    }

    pub fn record(&mut self, item: &ItemOutcome) {
        match &item.outcome {
            ActionOutcome::Succeeded => {
                self.succeeded += 1;
                self.affected.push(item.resource_id.clone());
            }
            ActionOutcome::Failed(reason) => {
                self.failed += 1;
                self.failures.push(ItemFailure {
                    resource_id: item.resource_id.clone(),
                    reason: reason.clone(),
                });
            }
            ActionOutcome::Skipped => self.skipped += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.succeeded + self.failed + self.skipped
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }
}
