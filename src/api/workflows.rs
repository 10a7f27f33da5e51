/// Workflow management REST API endpoints
///
/// Provides workflow definition CRUD, task management, and the
/// start-instance operation. Workflows are created in draft and must be
/// activated (status update) before instances can start.

use crate::{
    api::{require, AppState, TenantQuery},
    error::Result,
    tenant::TenantContext,
    workflow::{NewWorkflow, Task, TaskSpec, WorkflowDefinition, WorkflowUpdate},
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

/// Request body for workflow creation
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateWorkflowRequest {
    #[serde(default)]
    pub tenant_id: String,
    #[serde(default)]
    pub name: String,
    pub description: Option<String>,
    pub diagram: Option<String>,
    /// Tasks created together with the workflow
    #[serde(default)]
    pub tasks: Vec<TaskSpec>,
}

/// Request body for workflow updates (partial)
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateWorkflowRequest {
    #[serde(default)]
    pub tenant_id: String,
    #[serde(flatten)]
    pub update: WorkflowUpdate,
}

/// Request body for adding a task to a workflow
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddTaskRequest {
    #[serde(default)]
    pub tenant_id: String,
    #[serde(flatten)]
    pub spec: TaskSpec,
}

/// Request body for starting a workflow instance
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartInstanceRequest {
    #[serde(default)]
    pub tenant_id: String,
    #[serde(default)]
    pub user_id: String,
    pub initial_variables: Option<Value>,
}

/// Create workflow management routes
pub fn workflow_routes() -> Router<AppState> {
    Router::new()
        .route("/api/workflows", get(list_workflows).post(create_workflow))
        .route(
            "/api/workflows/{id}",
            get(get_workflow).put(update_workflow).delete(delete_workflow),
        )
        .route("/api/workflows/{id}/tasks", get(list_tasks).post(add_task))
        .route("/api/workflows/{id}/start", post(start_instance))
}

/// Create a new workflow definition in draft status
///
/// POST /api/workflows
async fn create_workflow(
    State(state): State<AppState>,
    Json(payload): Json<CreateWorkflowRequest>,
) -> Result<Json<WorkflowDefinition>> {
    require(&payload.tenant_id, "tenantId and name are required")?;
    require(&payload.name, "tenantId and name are required")?;

    let workflow = state
        .workflows
        .create(
            &payload.tenant_id,
            NewWorkflow {
                name: payload.name,
                description: payload.description,
                diagram: payload.diagram,
                tasks: payload.tasks,
            },
        )
        .await?;

    Ok(Json(workflow))
}

/// List all workflows for a tenant
///
/// GET /api/workflows?tenantId=...
async fn list_workflows(
    State(state): State<AppState>,
    Query(query): Query<TenantQuery>,
) -> Result<Json<Vec<WorkflowDefinition>>> {
    let tenant_id = query.require_tenant()?;
    let workflows = state.workflows.list_for_tenant(tenant_id).await?;

    Ok(Json(workflows))
}

/// Get a workflow together with its ordered task list
///
/// GET /api/workflows/{id}
async fn get_workflow(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    let workflow = state
        .workflows
        .find(&id)
        .await?
        .ok_or_else(|| crate::error::EngineError::WorkflowNotFound(id.clone()))?;
    let tasks = state.workflows.tasks_for_workflow(&id).await?;

    let mut body = serde_json::to_value(&workflow)?;
    body["tasks"] = serde_json::to_value(&tasks)?;

    Ok(Json(body))
}

/// Update a workflow definition (activation path)
///
/// PUT /api/workflows/{id}
async fn update_workflow(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateWorkflowRequest>,
) -> Result<Json<WorkflowDefinition>> {
    require(&payload.tenant_id, "tenantId is required")?;

    let workflow = state
        .workflows
        .update(&id, &payload.tenant_id, payload.update)
        .await?;

    Ok(Json(workflow))
}

/// Delete a workflow and all dependent instances and tasks
///
/// DELETE /api/workflows/{id}
async fn delete_workflow(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    let deletion = state.workflows.delete(&id).await?;

    Ok(Json(json!({
        "message": "Workflow and all associated data deleted successfully",
        "deletedWorkflow": deletion.workflow,
        "deletedInstancesCount": deletion.instances_deleted,
        "deletedTasksCount": deletion.tasks_deleted,
    })))
}

/// List a workflow's tasks ordered by sequence
///
/// GET /api/workflows/{id}/tasks?tenantId=...
async fn list_tasks(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<TenantQuery>,
) -> Result<Json<Vec<Task>>> {
    let tenant_id = query.require_tenant()?;
    state
        .workflows
        .find_for_tenant(&id, tenant_id)
        .await?
        .ok_or_else(|| crate::error::EngineError::WorkflowNotFound(id.clone()))?;

    let tasks = state.workflows.tasks_for_workflow(&id).await?;

    Ok(Json(tasks))
}

/// Add a task to an existing workflow
///
/// POST /api/workflows/{id}/tasks
async fn add_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<AddTaskRequest>,
) -> Result<(StatusCode, Json<Task>)> {
    require(&payload.tenant_id, "formId, taskKey, and tenantId are required")?;
    require(&payload.spec.form_id, "formId, taskKey, and tenantId are required")?;
    require(&payload.spec.task_key, "formId, taskKey, and tenantId are required")?;

    let task = state
        .workflows
        .add_task(&id, &payload.tenant_id, payload.spec)
        .await?;

    Ok((StatusCode::CREATED, Json(task)))
}

/// Start a new instance of an active workflow
///
/// POST /api/workflows/{id}/start
/// Returns the created instance with the first task to complete.
async fn start_instance(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<StartInstanceRequest>,
) -> Result<Json<Value>> {
    require(&payload.tenant_id, "userId and tenantId are required")?;
    require(&payload.user_id, "userId and tenantId are required")?;

    let ctx = TenantContext::new(payload.tenant_id, payload.user_id);
    let (instance, first_task) = state
        .machine
        .start(&id, &ctx, payload.initial_variables)
        .await?;

    let mut body = serde_json::to_value(&instance)?;
    body["nextTask"] = serde_json::to_value(&first_task)?;

    Ok(Json(body))
}
