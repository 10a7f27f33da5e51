/// Workflow instance type definitions

use crate::{error::Result, submission::Submission, workflow::Task};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::{sqlite::SqliteRow, Row};

/// Lifecycle status of a workflow instance
///
/// The state machine implements only (start) → running and
/// running → completed. `failed` and `paused` are administrative states
/// reserved for external tooling; no engine operation sets them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstanceStatus {
    Running,
    Completed,
    Failed,
    Paused,
}

impl InstanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InstanceStatus::Running => "running",
            InstanceStatus::Completed => "completed",
            InstanceStatus::Failed => "failed",
            InstanceStatus::Paused => "paused",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "running" => Some(InstanceStatus::Running),
            "completed" => Some(InstanceStatus::Completed),
            "failed" => Some(InstanceStatus::Failed),
            "paused" => Some(InstanceStatus::Paused),
            _ => None,
        }
    }
}

/// One execution of a workflow template for a specific user
///
/// Invariants: a completed instance has a null current task key and a set
/// completion timestamp; a running instance's current task key resolves
/// within the owning workflow (or is null for a zero-task workflow).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowInstance {
    /// Unique instance identifier (UUID)
    pub id: String,
    /// The workflow template being executed
    pub workflow_id: String,
    /// Owning tenant
    pub tenant_id: String,
    /// User who started the instance
    pub user_id: String,
    pub status: InstanceStatus,
    /// Key of the task awaiting completion; null when the instance has no
    /// active task
    pub current_task_key: Option<String>,
    /// Free-form instance-scoped variables, never schema-validated
    pub variables: Value,
    pub started_at: String,
    pub completed_at: Option<String>,
}

impl WorkflowInstance {
    pub(crate) fn from_row(row: &SqliteRow) -> Result<Self> {
        let status: String = row.get("status");
        let variables: String = row.get("variables");
        Ok(Self {
            id: row.get("id"),
            workflow_id: row.get("workflow_id"),
            tenant_id: row.get("tenant_id"),
            user_id: row.get("user_id"),
            status: InstanceStatus::parse(&status).ok_or_else(|| {
                crate::error::EngineError::Internal(format!("unknown instance status '{}'", status))
            })?,
            current_task_key: row.get("current_task_key"),
            variables: serde_json::from_str(&variables)?,
            started_at: row.get("started_at"),
            completed_at: row.get("completed_at"),
        })
    }
}

/// Workflow identity joined onto instance views
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowSummary {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
}

/// An instance enriched with its workflow summary
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceView {
    #[serde(flatten)]
    pub instance: WorkflowInstance,
    pub workflow: Option<WorkflowSummary>,
}

/// An instance paired with one task of its workflow
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDetail {
    pub instance: WorkflowInstance,
    pub task: Task,
}

/// Result of completing the current task of an instance
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionOutcome {
    /// The submission recorded for the completed task
    pub submission: Submission,
    /// The instance after the transition
    pub instance: WorkflowInstance,
    /// The task now awaiting completion, or None when the workflow ended
    pub next_task: Option<Task>,
    /// Whether this completion finished the workflow
    pub completed: bool,
}
