//! Runtime for ragops: the workspace collaborator boundary, the cleanup
//! orchestrator, and the provisioning operations built on the same boundary.

pub mod adapter;
pub mod orchestrator;
pub mod poll;
pub mod provision;
pub mod report;

pub use adapter::{ApiError, ApiErrorKind, BundleUnbinder, WorkspaceApi};
pub use orchestrator::{
    CleanupError, CleanupOrchestrator, PLACEHOLDER_VALUES, PermissionCheck, ResourceAction,
    ResourceKind, ResourceTarget, cleanup_plan, is_placeholder,
};
pub use poll::{PollError, PollPolicy, PollStatus, wait_until};
pub use provision::{
    IndexProvisioned, ProvisionError, RollbackOutcome, ensure_vector_index, rollback_alias,
};
pub use report::{CleanupOutcome, CleanupReport, ReportSummary, RunStatus, StepRecord};
