/// Form management REST API endpoints
///
/// Provides form definition CRUD and standalone submission recording.
/// Forms are immutable once created; deletion cascades to submissions.

use crate::{
    api::{require, AppState, TenantQuery},
    error::{EngineError, Result},
    form::FormDefinition,
    submission::Submission,
    tenant::TenantContext,
};
use axum::{
    extract::{Path, Query, State},
    response::Json,
    routing::get,
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

/// Request body for form creation
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFormRequest {
    #[serde(default)]
    pub tenant_id: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub name: String,
    pub content: Option<Value>,
}

/// Request body for a standalone submission
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitFormRequest {
    #[serde(default)]
    pub tenant_id: String,
    pub data: Option<Value>,
}

/// Create form management routes
pub fn form_routes() -> Router<AppState> {
    Router::new()
        .route("/api/forms", get(list_forms).post(create_form))
        .route("/api/forms/{id}", get(get_form).delete(delete_form))
        .route(
            "/api/forms/{id}/submissions",
            get(list_submissions).post(submit_form),
        )
}

/// Create a new form definition
///
/// POST /api/forms
async fn create_form(
    State(state): State<AppState>,
    Json(payload): Json<CreateFormRequest>,
) -> Result<Json<FormDefinition>> {
    require(&payload.tenant_id, "tenantId, userId, and name are required")?;
    require(&payload.user_id, "tenantId, userId, and name are required")?;
    require(&payload.name, "tenantId, userId, and name are required")?;

    let ctx = TenantContext::new(payload.tenant_id, payload.user_id);
    let form = state.forms.create(&ctx, &payload.name, payload.content).await?;

    Ok(Json(form))
}

/// List all forms for a tenant
///
/// GET /api/forms?tenantId=...
async fn list_forms(
    State(state): State<AppState>,
    Query(query): Query<TenantQuery>,
) -> Result<Json<Vec<FormDefinition>>> {
    let tenant_id = query.require_tenant()?;
    let forms = state.forms.list_for_tenant(tenant_id).await?;

    Ok(Json(forms))
}

/// Get a specific form, verifying tenant ownership
///
/// GET /api/forms/{id}?tenantId=...
async fn get_form(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<TenantQuery>,
) -> Result<Json<FormDefinition>> {
    let tenant_id = query.require_tenant()?;
    let form = state.forms.get_for_tenant(&id, tenant_id).await?;

    Ok(Json(form))
}

/// Delete a form and all its submissions
///
/// DELETE /api/forms/{id}
async fn delete_form(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    let deletion = state.forms.delete(&id).await?;

    Ok(Json(json!({
        "message": "Form and all associated submissions deleted successfully",
        "deletedForm": deletion.form,
        "deletedSubmissionsCount": deletion.submissions_deleted,
    })))
}

/// Record a standalone submission against a form
///
/// POST /api/forms/{id}/submissions
async fn submit_form(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<SubmitFormRequest>,
) -> Result<Json<Submission>> {
    require(&payload.tenant_id, "tenantId and data are required")?;
    let data = payload
        .data
        .filter(|d| !d.is_null())
        .ok_or_else(|| EngineError::Validation("tenantId and data are required".to_string()))?;

    let submission = state
        .recorder
        .record(&id, &payload.tenant_id, data, None, None)
        .await?;

    Ok(Json(submission))
}

/// List every submission recorded against a form
///
/// GET /api/forms/{id}/submissions
async fn list_submissions(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Submission>>> {
    let submissions = state.recorder.list_for_form(&id).await?;

    Ok(Json(submissions))
}
