/// Submission type definitions

use crate::error::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::{sqlite::SqliteRow, Row};

/// One persisted record of data entered against a form
///
/// Immutable once created. The instance and task references are null for
/// standalone submissions made outside any workflow context.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    /// Unique submission identifier (UUID)
    pub id: String,
    /// Form the data was entered against
    pub form_id: String,
    /// Owning tenant
    pub tenant_id: String,
    /// The submitted data bag, stored and returned unchanged
    pub data: Value,
    /// Workflow instance this submission completes a task for, if any
    pub workflow_instance_id: Option<String>,
    /// Task key within the instance's workflow, if any
    pub task_key: Option<String>,
    pub created_at: String,
}

impl Submission {
    pub(crate) fn from_row(row: &SqliteRow) -> Result<Self> {
        let data: String = row.get("data");
        Ok(Self {
            id: row.get("id"),
            form_id: row.get("form_id"),
            tenant_id: row.get("tenant_id"),
            data: serde_json::from_str(&data)?,
            workflow_instance_id: row.get("workflow_instance_id"),
            task_key: row.get("task_key"),
            created_at: row.get("created_at"),
        })
    }
}
