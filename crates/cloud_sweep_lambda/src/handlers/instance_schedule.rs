use cloud_sweep_core::chunking::execute_group;
use cloud_sweep_core::descriptor::InstanceState;
use cloud_sweep_core::pagination::drain;
use cloud_sweep_core::predicate::TagStatePredicate;
use cloud_sweep_core::report::SweepSummary;
use serde::Serialize;
use tracing::{error, info};

use crate::adapters::compute::InstanceFleet;
use crate::handlers::response::{report_response, HandlerResponse};

const COMPONENT: &str = "instance_scheduler";

pub const DEFAULT_TAG_KEY: &str = "Action";
pub const DEFAULT_STOP_TAG_VALUE: &str = "Auto-Stop";
pub const DEFAULT_START_TAG_VALUE: &str = "Auto-Start";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleConfig {
    pub tag_key: String,
    pub stop_tag_value: String,
    pub start_tag_value: String,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            tag_key: DEFAULT_TAG_KEY.to_string(),
            stop_tag_value: DEFAULT_STOP_TAG_VALUE.to_string(),
            start_tag_value: DEFAULT_START_TAG_VALUE.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleAction {
    Stop,
    Start,
}

impl ScheduleAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Stop => "stop",
            Self::Start => "start",
        }
    }

    /// State an instance must already be in for the action to apply.
    pub fn precondition(self) -> InstanceState {
        match self {
            Self::Stop => InstanceState::Running,
            Self::Start => InstanceState::Stopped,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhaseReport {
    pub action: ScheduleAction,
    pub tag_value: String,
    pub candidates: usize,
    pub summary: SweepSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selection_error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduleReport {
    pub stop: PhaseReport,
    pub start: PhaseReport,
}

impl ScheduleReport {
    pub fn has_step_failure(&self) -> bool {
        self.stop.selection_error.is_some() || self.start.selection_error.is_some()
    }
}

pub fn handle_schedule_event(
    config: &ScheduleConfig,
    fleet: &impl InstanceFleet,
) -> HandlerResponse {
    let report = run_schedule_sweep(config, fleet);
    if report.has_step_failure() {
        report_response(
            500,
            "EC2 instance state management finished with errors.",
            &report,
        )
    } else {
        report_response(200, "EC2 instance state management complete.", &report)
    }
}

/// Stops tagged running instances, then starts tagged stopped ones. The two
/// phases are independent: a failure in one never prevents the other.
pub fn run_schedule_sweep(config: &ScheduleConfig, fleet: &impl InstanceFleet) -> ScheduleReport {
    let stop = run_phase(
        ScheduleAction::Stop,
        &TagStatePredicate::new(
            &config.tag_key,
            &config.stop_tag_value,
            ScheduleAction::Stop.precondition(),
        ),
        fleet,
    );
    let start = run_phase(
        ScheduleAction::Start,
        &TagStatePredicate::new(
            &config.tag_key,
            &config.start_tag_value,
            ScheduleAction::Start.precondition(),
        ),
        fleet,
    );

    ScheduleReport { stop, start }
}

fn run_phase(
    action: ScheduleAction,
    predicate: &TagStatePredicate,
    fleet: &impl InstanceFleet,
) -> PhaseReport {
    info!(
        component = COMPONENT,
        event = "phase_started",
        action = action.as_str(),
        tag_key = %predicate.tag_key,
        tag_value = %predicate.tag_value,
        state = %predicate.state
    );

    let mut report = PhaseReport {
        action,
        tag_value: predicate.tag_value.clone(),
        candidates: 0,
        summary: SweepSummary::default(),
        selection_error: None,
    };

    let candidates = match drain(
        |token| fleet.describe_instances_page(predicate, token),
        predicate,
    ) {
        Ok(instances) => instances,
        Err(selection_error) => {
            error!(
                component = COMPONENT,
                event = "phase_selection_failed",
                action = action.as_str(),
                error = %selection_error
            );
            report.selection_error = Some(selection_error.to_string());
            return report;
        }
    };

    let instance_ids: Vec<String> = candidates
        .into_iter()
        .map(|instance| instance.instance_id)
        .collect();
    report.candidates = instance_ids.len();

    if instance_ids.is_empty() {
        info!(
            component = COMPONENT,
            event = "no_candidates",
            action = action.as_str(),
            "No {} instances found with tag '{}'.",
            predicate.state,
            predicate.tag_value
        );
        return report;
    }

    info!(
        component = COMPONENT,
        event = "instances_transitioning",
        action = action.as_str(),
        instance_ids = ?instance_ids
    );

    let outcomes = execute_group(&instance_ids, |group| match action {
        ScheduleAction::Stop => fleet.stop_instances(group),
        ScheduleAction::Start => fleet.start_instances(group),
    });
    report.summary = SweepSummary::from_outcomes(&outcomes);

    for failure in &report.summary.failures {
        error!(
            component = COMPONENT,
            event = "instance_transition_failed",
            action = action.as_str(),
            instance_id = %failure.resource_id,
            error = %failure.reason
        );
    }

    report
}
