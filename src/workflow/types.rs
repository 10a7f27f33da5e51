/// Workflow and task type definitions
///
/// A workflow is a tenant-scoped template describing an ordered sequence of
/// form-completion tasks. Ordering is driven entirely by the integer
/// `sequence` key on each task.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqliteRow, Row};

/// Lifecycle status of a workflow definition
///
/// Workflows are created in `draft` and must be explicitly activated
/// before instances can be started against them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowStatus {
    Draft,
    Active,
    Inactive,
}

impl WorkflowStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowStatus::Draft => "draft",
            WorkflowStatus::Active => "active",
            WorkflowStatus::Inactive => "inactive",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(WorkflowStatus::Draft),
            "active" => Some(WorkflowStatus::Active),
            "inactive" => Some(WorkflowStatus::Inactive),
            _ => None,
        }
    }
}

/// A workflow definition
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowDefinition {
    /// Unique workflow identifier (UUID)
    pub id: String,
    /// Owning tenant
    pub tenant_id: String,
    /// Human-readable workflow name
    pub name: String,
    pub description: Option<String>,
    /// Opaque process-diagram payload. Stored verbatim for external
    /// tooling; the engine never interprets it.
    pub diagram: Option<String>,
    pub status: WorkflowStatus,
    pub created_at: String,
    pub updated_at: String,
}

impl WorkflowDefinition {
    pub(crate) fn from_row(row: &SqliteRow) -> Result<Self> {
        let status: String = row.get("status");
        Ok(Self {
            id: row.get("id"),
            tenant_id: row.get("tenant_id"),
            name: row.get("name"),
            description: row.get("description"),
            diagram: row.get("diagram"),
            status: WorkflowStatus::parse(&status).ok_or_else(|| {
                crate::error::EngineError::Internal(format!("unknown workflow status '{}'", status))
            })?,
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        })
    }
}

/// One step in a workflow template
///
/// Each task points at the form to complete and carries the `sequence`
/// ordering key. The task key is caller-supplied and unique within its
/// workflow, not globally.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Unique task row identifier (UUID)
    pub id: String,
    /// Owning workflow
    pub workflow_id: String,
    /// Form the task asks the user to complete
    pub form_id: String,
    /// Caller-supplied key, unique within the workflow
    pub task_key: String,
    /// Optional display name
    pub task_name: Option<String>,
    /// Ordering key; need not be contiguous or unique
    pub sequence: i64,
    /// Informational flag; does not gate transitions
    pub is_required: bool,
    pub created_at: String,
}

impl Task {
    pub(crate) fn from_row(row: &SqliteRow) -> Result<Self> {
        Ok(Self {
            id: row.get("id"),
            workflow_id: row.get("workflow_id"),
            form_id: row.get("form_id"),
            task_key: row.get("task_key"),
            task_name: row.get("task_name"),
            sequence: row.get("sequence"),
            is_required: row.get("is_required"),
            created_at: row.get("created_at"),
        })
    }
}

/// Task fields supplied when creating a task, individually or inline with
/// a new workflow
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskSpec {
    #[serde(default)]
    pub form_id: String,
    #[serde(default)]
    pub task_key: String,
    pub task_name: Option<String>,
    /// Defaults to 0 when omitted
    pub sequence: Option<i64>,
    /// Defaults to true when omitted
    pub is_required: Option<bool>,
}

/// Fields for creating a workflow definition
#[derive(Debug, Clone)]
pub struct NewWorkflow {
    pub name: String,
    pub description: Option<String>,
    pub diagram: Option<String>,
    /// Tasks created together with the workflow
    pub tasks: Vec<TaskSpec>,
}

/// Partial update applied to a workflow definition
///
/// Provided fields replace the stored values; omitted fields are kept.
/// Setting status to `active` is the activation path.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub diagram: Option<String>,
    pub status: Option<WorkflowStatus>,
}
