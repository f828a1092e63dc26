use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum ActionOutcome {
    Succeeded,
    Failed(String),
    Skipped,
}

/// Result of one remote mutation, keyed by the remote identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemOutcome {
    pub resource_id: String,
    pub outcome: ActionOutcome,
}

impl ItemOutcome {
    pub fn succeeded(resource_id: impl Into<String>) -> Self {
        Self {
            resource_id: resource_id.into(),
            outcome: ActionOutcome::Succeeded,
        }
    }

    pub fn failed(resource_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            resource_id: resource_id.into(),
            outcome: ActionOutcome::Failed(reason.into()),
        }
    }

    pub fn skipped(resource_id: impl Into<String>) -> Self {
        Self {
            resource_id: resource_id.into(),
            outcome: ActionOutcome::Skipped,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, ActionOutcome::Succeeded)
    }

    pub fn failure_reason(&self) -> Option<&str> {
        match &self.outcome {
            ActionOutcome::Failed(reason) => Some(reason),
            _ => None,
        }
    }
}
