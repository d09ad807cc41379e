//! Run report for one teardown.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::orchestrator::{ResourceAction, ResourceKind};

/// How a single delete step resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CleanupOutcome {
    Succeeded,
    SkippedPlaceholder,
    SkippedAlreadyAbsent,
    Failed { error: String },
}

impl CleanupOutcome {
    /// Everything but `Failed` counts as success for the step.
    pub fn is_success(&self) -> bool {
        !matches!(self, CleanupOutcome::Failed { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepRecord {
    pub name: String,
    pub kind: ResourceKind,
    pub args: Vec<String>,
    pub critical: bool,
    pub outcome: CleanupOutcome,
}

impl StepRecord {
    pub fn new(action: &ResourceAction, outcome: CleanupOutcome) -> Self {
        Self {
            name: action.name.clone(),
            kind: action.target.kind(),
            args: action.target.args(),
            critical: action.critical,
            outcome,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunStatus {
    Running,
    Completed,
    AbortedCritical { action: String, error: String },
    PermissionDenied { error: String },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub succeeded: usize,
    pub skipped_placeholder: usize,
    pub already_absent: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleanupReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_reachable: Option<bool>,
    pub steps: Vec<StepRecord>,
    /// Bundle unbind result; `None` when the run stopped before reaching it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unbind: Option<CleanupOutcome>,
    pub status: RunStatus,
}

impl Default for CleanupReport {
    fn default() -> Self {
        Self::new()
    }
}

impl CleanupReport {
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            finished_at: None,
            identity: None,
            schema_reachable: None,
            steps: Vec::new(),
            unbind: None,
            status: RunStatus::Running,
        }
    }

    pub fn record(&mut self, step: StepRecord) {
        self.steps.push(step);
    }

    pub fn finish(&mut self, status: RunStatus) {
        self.status = status;
        self.finished_at = Some(Utc::now());
    }

    /// Process exit status: non-critical failures still exit 0.
    pub fn exit_code(&self) -> u8 {
        match self.status {
            RunStatus::Completed => 0,
            _ => 1,
        }
    }

    pub fn failed_steps(&self) -> impl Iterator<Item = &StepRecord> {
        self.steps.iter().filter(|s| !s.outcome.is_success())
    }

    pub fn summary(&self) -> ReportSummary {
        let mut summary = ReportSummary::default();
        for step in &self.steps {
            match step.outcome {
                CleanupOutcome::Succeeded => summary.succeeded += 1,
                CleanupOutcome::SkippedPlaceholder => summary.skipped_placeholder += 1,
                CleanupOutcome::SkippedAlreadyAbsent => summary.already_absent += 1,
                CleanupOutcome::Failed { .. } => summary.failed += 1,
            }
        }
        summary
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
