/// Read views over workflow instances
///
/// Combines instance rows with workflow summaries and task rows for
/// external callers. All lookups are tenant-checked; none of them are
/// restricted to the instance's current task.

use crate::{
    error::{EngineError, Result},
    instance::types::{InstanceView, TaskDetail, WorkflowInstance, WorkflowSummary},
    workflow::types::Task,
};
use sqlx::{sqlite::{SqlitePool, SqliteRow}, Row};

/// Tenant-scoped instance read service
#[derive(Debug, Clone)]
pub struct InstanceQueryService {
    pool: SqlitePool,
}

impl InstanceQueryService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// An instance joined with its workflow summary
    pub async fn get(&self, instance_id: &str, tenant_id: &str) -> Result<InstanceView> {
        let row = sqlx::query(
            r#"
            SELECT i.id, i.workflow_id, i.tenant_id, i.user_id, i.status, i.current_task_key,
                   i.variables, i.started_at, i.completed_at,
                   w.name AS workflow_name, w.description AS workflow_description
            FROM workflow_instances i
            LEFT JOIN workflows w ON w.id = i.workflow_id
            WHERE i.id = ? AND i.tenant_id = ?
            "#,
        )
        .bind(instance_id)
        .bind(tenant_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| EngineError::InstanceNotFound(instance_id.to_string()))?;

        view_from_row(&row)
    }

    /// An instance paired with one task of its workflow, looked up by key
    ///
    /// Read-only companion to the completion operation: it resolves any
    /// task of the workflow, current or not.
    pub async fn task_detail(
        &self,
        instance_id: &str,
        task_key: &str,
        tenant_id: &str,
    ) -> Result<TaskDetail> {
        let row = sqlx::query("SELECT * FROM workflow_instances WHERE id = ? AND tenant_id = ?")
            .bind(instance_id)
            .bind(tenant_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| EngineError::InstanceNotFound(instance_id.to_string()))?;
        let instance = WorkflowInstance::from_row(&row)?;

        let task_row = sqlx::query(
            "SELECT * FROM workflow_tasks WHERE workflow_id = ? AND task_key = ?",
        )
        .bind(&instance.workflow_id)
        .bind(task_key)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| EngineError::TaskNotFound(task_key.to_string()))?;
        let task = Task::from_row(&task_row)?;

        Ok(TaskDetail { instance, task })
    }

    /// All instances for a tenant, optionally filtered to one workflow
    ///
    /// No ordering is guaranteed; callers needing determinism sort
    /// client-side.
    pub async fn list_for_tenant(
        &self,
        tenant_id: &str,
        workflow_id: Option<&str>,
    ) -> Result<Vec<InstanceView>> {
        let base = r#"
            SELECT i.id, i.workflow_id, i.tenant_id, i.user_id, i.status, i.current_task_key,
                   i.variables, i.started_at, i.completed_at,
                   w.name AS workflow_name, w.description AS workflow_description
            FROM workflow_instances i
            LEFT JOIN workflows w ON w.id = i.workflow_id
            WHERE i.tenant_id = ?
        "#;

        let rows = match workflow_id {
            Some(workflow_id) => {
                sqlx::query(&format!("{} AND i.workflow_id = ?", base))
                    .bind(tenant_id)
                    .bind(workflow_id)
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                sqlx::query(base)
                    .bind(tenant_id)
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        rows.iter().map(view_from_row).collect()
    }
}

/// Build an InstanceView from a joined instance + workflow row
fn view_from_row(row: &SqliteRow) -> Result<InstanceView> {
    let instance = WorkflowInstance::from_row(row)?;
    let workflow_name: Option<String> = row.get("workflow_name");
    let workflow = workflow_name.map(|name| WorkflowSummary {
        id: instance.workflow_id.clone(),
        name,
        description: row.get("workflow_description"),
    });

    Ok(InstanceView { instance, workflow })
}
