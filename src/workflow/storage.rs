/// SQLite persistence for workflows and their task lists
///
/// Workflows and tasks live in separate tables joined by workflow id.
/// Task ordering queries always sort by `sequence` with creation order as
/// the tie-break. Deleting a workflow cascades to its instances and tasks
/// and reports both counts.

use crate::{
    db,
    error::{EngineError, Result},
    workflow::types::{NewWorkflow, Task, TaskSpec, WorkflowDefinition, WorkflowStatus, WorkflowUpdate},
};
use sqlx::{sqlite::SqlitePool, SqliteConnection};
use std::collections::HashSet;
use uuid::Uuid;

/// SQLite-backed workflow definition store
#[derive(Debug, Clone)]
pub struct WorkflowStore {
    pool: SqlitePool,
}

/// Result of a cascading workflow deletion
#[derive(Debug)]
pub struct WorkflowDeletion {
    /// The deleted workflow row
    pub workflow: WorkflowDefinition,
    /// How many instances were removed with it
    pub instances_deleted: u64,
    /// How many tasks were removed with it
    pub tasks_deleted: u64,
}

impl WorkflowStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a workflow definition in `draft` status, optionally with its
    /// initial task list
    ///
    /// The workflow row and all task rows are written in one transaction.
    pub async fn create(&self, tenant_id: &str, new: NewWorkflow) -> Result<WorkflowDefinition> {
        let mut seen = HashSet::new();
        for spec in &new.tasks {
            if spec.form_id.is_empty() || spec.task_key.is_empty() {
                return Err(EngineError::Validation(
                    "each task requires formId and taskKey".to_string(),
                ));
            }
            if !seen.insert(spec.task_key.clone()) {
                return Err(EngineError::Validation(format!(
                    "duplicate task key '{}' in workflow tasks",
                    spec.task_key
                )));
            }
        }

        let now = db::now_rfc3339();
        let workflow = WorkflowDefinition {
            id: Uuid::new_v4().to_string(),
            tenant_id: tenant_id.to_string(),
            name: new.name,
            description: new.description,
            diagram: new.diagram,
            status: WorkflowStatus::Draft,
            created_at: now.clone(),
            updated_at: now,
        };

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO workflows (id, tenant_id, name, description, diagram, status, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&workflow.id)
        .bind(&workflow.tenant_id)
        .bind(&workflow.name)
        .bind(&workflow.description)
        .bind(&workflow.diagram)
        .bind(workflow.status.as_str())
        .bind(&workflow.created_at)
        .bind(&workflow.updated_at)
        .execute(&mut *tx)
        .await?;

        for spec in &new.tasks {
            insert_task(&mut *tx, &workflow.id, spec).await?;
        }

        tx.commit().await?;

        tracing::info!(
            "Created workflow: {} ({}) with {} tasks",
            workflow.id,
            workflow.name,
            new.tasks.len()
        );

        Ok(workflow)
    }

    /// List all workflows belonging to a tenant
    pub async fn list_for_tenant(&self, tenant_id: &str) -> Result<Vec<WorkflowDefinition>> {
        let rows = sqlx::query("SELECT * FROM workflows WHERE tenant_id = ?")
            .bind(tenant_id)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(WorkflowDefinition::from_row).collect()
    }

    /// Fetch a workflow by id
    pub async fn find(&self, id: &str) -> Result<Option<WorkflowDefinition>> {
        let row = sqlx::query("SELECT * FROM workflows WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(WorkflowDefinition::from_row).transpose()
    }

    /// Fetch a workflow by id, verifying tenant ownership
    pub async fn find_for_tenant(
        &self,
        id: &str,
        tenant_id: &str,
    ) -> Result<Option<WorkflowDefinition>> {
        let row = sqlx::query("SELECT * FROM workflows WHERE id = ? AND tenant_id = ?")
            .bind(id)
            .bind(tenant_id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(WorkflowDefinition::from_row).transpose()
    }

    /// Apply a partial update to a workflow definition
    ///
    /// Provided fields replace stored values, omitted fields are kept.
    /// Moving status to `active` makes the workflow instantiable.
    pub async fn update(
        &self,
        id: &str,
        tenant_id: &str,
        update: WorkflowUpdate,
    ) -> Result<WorkflowDefinition> {
        let result = sqlx::query(
            r#"
            UPDATE workflows SET
                name = COALESCE(?, name),
                description = COALESCE(?, description),
                diagram = COALESCE(?, diagram),
                status = COALESCE(?, status),
                updated_at = ?
            WHERE id = ? AND tenant_id = ?
            "#,
        )
        .bind(&update.name)
        .bind(&update.description)
        .bind(&update.diagram)
        .bind(update.status.map(|s| s.as_str()))
        .bind(db::now_rfc3339())
        .bind(id)
        .bind(tenant_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(EngineError::WorkflowNotFound(id.to_string()));
        }

        tracing::info!("Updated workflow: {}", id);

        self.find(id)
            .await?
            .ok_or_else(|| EngineError::WorkflowNotFound(id.to_string()))
    }

    /// Delete a workflow and everything that depends on it
    ///
    /// Instances go first, then tasks, then the workflow row, all in one
    /// transaction.
    pub async fn delete(&self, id: &str) -> Result<WorkflowDeletion> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query("SELECT * FROM workflows WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| EngineError::WorkflowNotFound(id.to_string()))?;
        let workflow = WorkflowDefinition::from_row(&row)?;

        let instances = sqlx::query("DELETE FROM workflow_instances WHERE workflow_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let tasks = sqlx::query("DELETE FROM workflow_tasks WHERE workflow_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM workflows WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(
            "Deleted workflow {} ({} instances, {} tasks)",
            id,
            instances.rows_affected(),
            tasks.rows_affected()
        );

        Ok(WorkflowDeletion {
            workflow,
            instances_deleted: instances.rows_affected(),
            tasks_deleted: tasks.rows_affected(),
        })
    }

    /// Add a task to an existing workflow
    pub async fn add_task(
        &self,
        workflow_id: &str,
        tenant_id: &str,
        spec: TaskSpec,
    ) -> Result<Task> {
        self.find_for_tenant(workflow_id, tenant_id)
            .await?
            .ok_or_else(|| EngineError::WorkflowNotFound(workflow_id.to_string()))?;

        if self.task_by_key(workflow_id, &spec.task_key).await?.is_some() {
            return Err(EngineError::Validation(format!(
                "task key '{}' already exists in workflow '{}'",
                spec.task_key, workflow_id
            )));
        }

        let mut conn = self.pool.acquire().await?;
        let task = insert_task(&mut *conn, workflow_id, &spec).await?;

        tracing::info!("Added task '{}' to workflow {}", task.task_key, workflow_id);

        Ok(task)
    }

    /// All tasks of a workflow, ordered by sequence then creation order
    pub async fn tasks_for_workflow(&self, workflow_id: &str) -> Result<Vec<Task>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM workflow_tasks
            WHERE workflow_id = ?
            ORDER BY sequence ASC, created_at ASC, id ASC
            "#,
        )
        .bind(workflow_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Task::from_row).collect()
    }

    /// The task with the minimum sequence value, if any
    pub async fn first_task(&self, workflow_id: &str) -> Result<Option<Task>> {
        let row = sqlx::query(
            r#"
            SELECT * FROM workflow_tasks
            WHERE workflow_id = ?
            ORDER BY sequence ASC, created_at ASC, id ASC
            LIMIT 1
            "#,
        )
        .bind(workflow_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Task::from_row).transpose()
    }

    /// The task whose sequence equals exactly the given value, if any
    pub async fn task_by_sequence(
        &self,
        workflow_id: &str,
        sequence: i64,
    ) -> Result<Option<Task>> {
        let row = sqlx::query(
            r#"
            SELECT * FROM workflow_tasks
            WHERE workflow_id = ? AND sequence = ?
            ORDER BY created_at ASC, id ASC
            LIMIT 1
            "#,
        )
        .bind(workflow_id)
        .bind(sequence)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Task::from_row).transpose()
    }

    /// Look up a task by its key within one workflow
    pub async fn task_by_key(&self, workflow_id: &str, task_key: &str) -> Result<Option<Task>> {
        let row = sqlx::query(
            "SELECT * FROM workflow_tasks WHERE workflow_id = ? AND task_key = ?",
        )
        .bind(workflow_id)
        .bind(task_key)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Task::from_row).transpose()
    }
}

/// Insert one task row, applying the sequence and is_required defaults
async fn insert_task(
    conn: &mut SqliteConnection,
    workflow_id: &str,
    spec: &TaskSpec,
) -> Result<Task> {
    let task = Task {
        id: Uuid::new_v4().to_string(),
        workflow_id: workflow_id.to_string(),
        form_id: spec.form_id.clone(),
        task_key: spec.task_key.clone(),
        task_name: spec.task_name.clone(),
        sequence: spec.sequence.unwrap_or(0),
        is_required: spec.is_required.unwrap_or(true),
        created_at: db::now_rfc3339(),
    };

    sqlx::query(
        r#"
        INSERT INTO workflow_tasks (id, workflow_id, form_id, task_key, task_name, sequence, is_required, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&task.id)
    .bind(&task.workflow_id)
    .bind(&task.form_id)
    .bind(&task.task_key)
    .bind(&task.task_name)
    .bind(task.sequence)
    .bind(task.is_required)
    .bind(&task.created_at)
    .execute(conn)
    .await?;

    Ok(task)
}
