/// HTTP API Layer
///
/// This module binds the engine's capability-level operations to REST
/// endpoints. It handles:
/// - Form CRUD and standalone submissions
/// - Workflow CRUD, task management, and instance start
/// - Instance views and current-task completion
///
/// Handlers validate input presence, then delegate to the core services;
/// error kinds map onto HTTP statuses in `crate::error`.

use crate::{
    error::{EngineError, Result},
    form::FormStore,
    instance::{InstanceQueryService, InstanceStateMachine},
    submission::SubmissionRecorder,
    workflow::WorkflowStore,
};
use serde::Deserialize;

// Form management and submission endpoints
pub mod forms;

// Workflow management and instance-start endpoints
pub mod workflows;

// Instance view and task-completion endpoints
pub mod instances;

// Re-export router builders
pub use forms::form_routes;
pub use instances::instance_routes;
pub use workflows::workflow_routes;

/// Application state containing the core services
#[derive(Clone)]
pub struct AppState {
    /// Form definition store
    pub forms: FormStore,
    /// Workflow definition store
    pub workflows: WorkflowStore,
    /// Instance lifecycle state machine
    pub machine: InstanceStateMachine,
    /// Instance read views
    pub query: InstanceQueryService,
    /// Submission recorder for standalone form fills
    pub recorder: SubmissionRecorder,
}

/// Common query parameters for tenant-scoped reads
#[derive(Debug, Deserialize)]
pub struct TenantQuery {
    #[serde(rename = "tenantId")]
    pub tenant_id: Option<String>,
    #[serde(rename = "workflowId")]
    pub workflow_id: Option<String>,
}

impl TenantQuery {
    /// The tenant id, which every scoped read must supply explicitly
    pub fn require_tenant(&self) -> Result<&str> {
        self.tenant_id
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| EngineError::Validation("tenantId is required".to_string()))
    }
}

/// Reject empty or missing required string fields
pub(crate) fn require(value: &str, message: &str) -> Result<()> {
    if value.is_empty() {
        return Err(EngineError::Validation(message.to_string()));
    }
    Ok(())
}
