/// Workflow instance state machine
///
/// Owns the lifecycle of workflow instances: creation against an active
/// workflow definition, current-task tracking, and the single
/// running → completed transition driven by task completion. The persisted
/// instance row is the only shared mutable state; same-instance
/// completions are serialized with an optimistic conditional update.

use crate::{
    db,
    error::{EngineError, Result},
    instance::types::{CompletionOutcome, InstanceStatus, WorkflowInstance},
    submission::recorder::SubmissionRecorder,
    tenant::TenantContext,
    workflow::{
        sequencer::TaskSequencer,
        storage::WorkflowStore,
        types::{Task, WorkflowStatus},
    },
};
use serde_json::{json, Value};
use sqlx::sqlite::SqlitePool;
use uuid::Uuid;

/// Drives instance creation and task-completion transitions
#[derive(Debug, Clone)]
pub struct InstanceStateMachine {
    pool: SqlitePool,
    workflows: WorkflowStore,
    sequencer: TaskSequencer,
}

impl InstanceStateMachine {
    pub fn new(pool: SqlitePool, workflows: WorkflowStore) -> Self {
        let sequencer = TaskSequencer::new(workflows.clone());
        Self {
            pool,
            workflows,
            sequencer,
        }
    }

    /// Start a new instance of an active workflow
    ///
    /// The workflow must exist, belong to the tenant, and be `active`.
    /// The instance begins at the workflow's first task; a workflow with
    /// zero tasks yields a running instance with no current task, which
    /// completes on its next transition attempt.
    pub async fn start(
        &self,
        workflow_id: &str,
        ctx: &TenantContext,
        initial_variables: Option<Value>,
    ) -> Result<(WorkflowInstance, Option<Task>)> {
        let workflow = self
            .workflows
            .find_for_tenant(workflow_id, &ctx.tenant_id)
            .await?
            .filter(|w| w.status == WorkflowStatus::Active)
            .ok_or_else(|| EngineError::WorkflowNotActive(workflow_id.to_string()))?;

        let first_task = self.sequencer.first_task(&workflow.id).await?;

        let instance = WorkflowInstance {
            id: Uuid::new_v4().to_string(),
            workflow_id: workflow.id,
            tenant_id: ctx.tenant_id.clone(),
            user_id: ctx.user_id.clone(),
            status: InstanceStatus::Running,
            current_task_key: first_task.as_ref().map(|t| t.task_key.clone()),
            variables: initial_variables.unwrap_or_else(|| json!({})),
            started_at: db::now_rfc3339(),
            completed_at: None,
        };

        sqlx::query(
            r#"
            INSERT INTO workflow_instances
                (id, workflow_id, tenant_id, user_id, status, current_task_key, variables, started_at, completed_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&instance.id)
        .bind(&instance.workflow_id)
        .bind(&instance.tenant_id)
        .bind(&instance.user_id)
        .bind(instance.status.as_str())
        .bind(&instance.current_task_key)
        .bind(serde_json::to_string(&instance.variables)?)
        .bind(&instance.started_at)
        .bind(&instance.completed_at)
        .execute(&self.pool)
        .await?;

        tracing::info!(
            "Started instance {} of workflow {} at task {:?}",
            instance.id,
            instance.workflow_id,
            instance.current_task_key
        );

        Ok((instance, first_task))
    }

    /// Complete the instance's current task and advance it
    ///
    /// Precondition order: the instance must exist for the tenant, the
    /// submitted task key must equal the current task key exactly, and the
    /// task row must resolve within the instance's workflow. The submission
    /// write and the instance transition share one transaction; a failed
    /// write leaves the instance untouched.
    ///
    /// The transition is guarded by a conditional update requiring the
    /// current task key to still match at write time. Losing that race
    /// rolls everything back and reports a conflict.
    pub async fn complete_current_task(
        &self,
        instance_id: &str,
        task_key: &str,
        payload: Value,
        ctx: &TenantContext,
    ) -> Result<CompletionOutcome> {
        let instance = self
            .load_for_tenant(instance_id, &ctx.tenant_id)
            .await?
            .ok_or_else(|| EngineError::InstanceNotFound(instance_id.to_string()))?;

        if instance.current_task_key.as_deref() != Some(task_key) {
            return Err(EngineError::NotCurrentTask(task_key.to_string()));
        }

        let task = self
            .workflows
            .task_by_key(&instance.workflow_id, task_key)
            .await?
            .ok_or_else(|| EngineError::TaskNotFound(task_key.to_string()))?;

        let next_task = self.sequencer.next_task(&instance.workflow_id, &task).await?;

        let completed = next_task.is_none();
        let new_task_key = next_task.as_ref().map(|t| t.task_key.clone());
        let new_status = if completed {
            InstanceStatus::Completed
        } else {
            InstanceStatus::Running
        };
        let completed_at = completed.then(db::now_rfc3339);

        let mut tx = self.pool.begin().await?;

        let submission = SubmissionRecorder::record_on(
            &mut *tx,
            &task.form_id,
            &ctx.tenant_id,
            payload,
            Some(instance_id),
            Some(task_key),
        )
        .await?;

        let result = sqlx::query(
            r#"
            UPDATE workflow_instances
            SET current_task_key = ?, status = ?, completed_at = ?
            WHERE id = ? AND current_task_key = ?
            "#,
        )
        .bind(&new_task_key)
        .bind(new_status.as_str())
        .bind(&completed_at)
        .bind(instance_id)
        .bind(task_key)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            // Another completion advanced the instance between our read and
            // this write; dropping the transaction rolls the submission back.
            return Err(EngineError::Conflict(instance_id.to_string()));
        }

        tx.commit().await?;

        let updated = WorkflowInstance {
            status: new_status,
            current_task_key: new_task_key,
            completed_at,
            ..instance
        };

        if completed {
            tracing::info!("Instance {} completed its final task '{}'", instance_id, task_key);
        } else {
            tracing::info!(
                "Instance {} advanced from task '{}' to {:?}",
                instance_id,
                task_key,
                updated.current_task_key
            );
        }

        Ok(CompletionOutcome {
            submission,
            instance: updated,
            next_task,
            completed,
        })
    }

    /// Fetch an instance by id, verifying tenant ownership
    pub async fn load_for_tenant(
        &self,
        instance_id: &str,
        tenant_id: &str,
    ) -> Result<Option<WorkflowInstance>> {
        let row = sqlx::query("SELECT * FROM workflow_instances WHERE id = ? AND tenant_id = ?")
            .bind(instance_id)
            .bind(tenant_id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(WorkflowInstance::from_row).transpose()
    }
}
