/// Task sequencing for linear workflows
///
/// Resolves the first task of a workflow and the successor of a completed
/// task. The successor lookup matches `sequence + 1` exactly: a gap in the
/// sequence values ends the workflow, even when tasks with larger values
/// exist. That exact-match policy is part of the engine's compatibility
/// contract and must not be relaxed to "next greater sequence".

use crate::{
    error::{EngineError, Result},
    workflow::{storage::WorkflowStore, types::Task},
};

/// Resolves task ordering over a workflow's task list
#[derive(Debug, Clone)]
pub struct TaskSequencer {
    store: WorkflowStore,
}

impl TaskSequencer {
    pub fn new(store: WorkflowStore) -> Self {
        Self { store }
    }

    /// The task with the minimum sequence value, or None for a workflow
    /// with no tasks
    pub async fn first_task(&self, workflow_id: &str) -> Result<Option<Task>> {
        self.ensure_workflow(workflow_id).await?;
        self.store.first_task(workflow_id).await
    }

    /// The task whose sequence is exactly `completed.sequence + 1`
    ///
    /// None means the workflow is finished. Ties on the successor value
    /// resolve to the earliest-created task.
    pub async fn next_task(&self, workflow_id: &str, completed: &Task) -> Result<Option<Task>> {
        self.ensure_workflow(workflow_id).await?;
        self.store
            .task_by_sequence(workflow_id, completed.sequence + 1)
            .await
    }

    async fn ensure_workflow(&self, workflow_id: &str) -> Result<()> {
        self.store
            .find(workflow_id)
            .await?
            .ok_or_else(|| EngineError::WorkflowNotFound(workflow_id.to_string()))?;
        Ok(())
    }
}
