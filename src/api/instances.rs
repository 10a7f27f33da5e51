/// Workflow instance REST API endpoints
///
/// Provides instance views and the current-task completion operation that
/// drives instances forward.

use crate::{
    api::{require, AppState, TenantQuery},
    error::{EngineError, Result},
    instance::{CompletionOutcome, InstanceView, TaskDetail},
    tenant::TenantContext,
};
use axum::{
    extract::{Path, Query, State},
    response::Json,
    routing::get,
    Router,
};
use serde::Deserialize;
use serde_json::Value;

/// Request body for completing the current task of an instance
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteTaskRequest {
    #[serde(default)]
    pub tenant_id: String,
    #[serde(default)]
    pub user_id: String,
    pub form_data: Option<Value>,
}

/// Create instance routes
pub fn instance_routes() -> Router<AppState> {
    Router::new()
        .route("/api/workflows/instances", get(list_instances))
        .route("/api/workflows/instances/{id}", get(get_instance))
        .route(
            "/api/workflows/instances/{id}/tasks/{task_key}",
            get(task_detail).post(complete_task),
        )
}

/// List all instances for a tenant, optionally filtered to one workflow
///
/// GET /api/workflows/instances?tenantId=...&workflowId=...
async fn list_instances(
    State(state): State<AppState>,
    Query(query): Query<TenantQuery>,
) -> Result<Json<Vec<InstanceView>>> {
    let tenant_id = query.require_tenant()?;
    let instances = state
        .query
        .list_for_tenant(tenant_id, query.workflow_id.as_deref())
        .await?;

    Ok(Json(instances))
}

/// Get a specific instance with its workflow summary
///
/// GET /api/workflows/instances/{id}?tenantId=...
async fn get_instance(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<TenantQuery>,
) -> Result<Json<InstanceView>> {
    let tenant_id = query.require_tenant()?;
    let view = state.query.get(&id, tenant_id).await?;

    Ok(Json(view))
}

/// Get details for one task of an instance's workflow
///
/// GET /api/workflows/instances/{id}/tasks/{task_key}?tenantId=...
/// The task need not be the instance's current task.
async fn task_detail(
    State(state): State<AppState>,
    Path((id, task_key)): Path<(String, String)>,
    Query(query): Query<TenantQuery>,
) -> Result<Json<TaskDetail>> {
    let tenant_id = query.require_tenant()?;
    let detail = state.query.task_detail(&id, &task_key, tenant_id).await?;

    Ok(Json(detail))
}

/// Complete the instance's current task by submitting its form data
///
/// POST /api/workflows/instances/{id}/tasks/{task_key}
/// Records the submission and advances the instance to the next task, or
/// completes the workflow when no successor exists.
async fn complete_task(
    State(state): State<AppState>,
    Path((id, task_key)): Path<(String, String)>,
    Json(payload): Json<CompleteTaskRequest>,
) -> Result<Json<CompletionOutcome>> {
    require(&payload.tenant_id, "formData, tenantId, and userId are required")?;
    require(&payload.user_id, "formData, tenantId, and userId are required")?;
    let form_data = payload.form_data.filter(|d| !d.is_null()).ok_or_else(|| {
        EngineError::Validation("formData, tenantId, and userId are required".to_string())
    })?;

    let ctx = TenantContext::new(payload.tenant_id, payload.user_id);
    let outcome = state
        .machine
        .complete_current_task(&id, &task_key, form_data, &ctx)
        .await?;

    Ok(Json(outcome))
}
