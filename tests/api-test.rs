use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use formflow::{
    db,
    server::{build_router, build_state},
};
use serde_json::{json, Value};
use sqlx::sqlite::SqlitePoolOptions;
use tower::ServiceExt;

async fn test_app() -> Router {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory pool");
    db::init_schema(&pool).await.expect("schema init");
    build_router(build_state(pool))
}

async fn request(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = match body {
        Some(value) => Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(value.to_string()))
            .unwrap(),
        None => Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = serde_json::from_slice(&bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));

    (status, value)
}

#[tokio::test]
async fn test_healthz() {
    let app = test_app().await;
    let (status, body) = request(&app, "GET", "/healthz", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::String("ok".to_string()));
}

#[tokio::test]
async fn test_create_form_requires_tenant() {
    let app = test_app().await;
    let (status, body) = request(
        &app,
        "POST",
        "/api/forms",
        Some(json!({ "userId": "user-1", "name": "Form" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("required"));
}

#[tokio::test]
async fn test_list_workflows_requires_tenant() {
    let app = test_app().await;
    let (status, _) = request(&app, "GET", "/api/workflows", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_start_requires_active_workflow() {
    let app = test_app().await;

    let (_, form) = request(
        &app,
        "POST",
        "/api/forms",
        Some(json!({ "tenantId": "t1", "userId": "u1", "name": "Form" })),
    )
    .await;
    let (_, workflow) = request(
        &app,
        "POST",
        "/api/workflows",
        Some(json!({
            "tenantId": "t1",
            "name": "Still a draft",
            "tasks": [{ "formId": form["id"], "taskKey": "step-0", "sequence": 0 }]
        })),
    )
    .await;

    let (status, _) = request(
        &app,
        "POST",
        &format!("/api/workflows/{}/start", workflow["id"].as_str().unwrap()),
        Some(json!({ "tenantId": "t1", "userId": "u1" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

/// Full lifecycle over HTTP: create form and workflow, activate, start an
/// instance, complete both tasks, observe the completed instance.
#[tokio::test]
async fn test_full_workflow_lifecycle() {
    let app = test_app().await;

    let (status, form) = request(
        &app,
        "POST",
        "/api/forms",
        Some(json!({
            "tenantId": "t1",
            "userId": "u1",
            "name": "Intake",
            "content": [{ "id": "name", "type": "text", "label": "Full Name" }]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let form_id = form["id"].as_str().unwrap().to_string();

    let (status, workflow) = request(
        &app,
        "POST",
        "/api/workflows",
        Some(json!({
            "tenantId": "t1",
            "name": "Onboarding",
            "description": "New hire onboarding",
            "tasks": [
                { "formId": form_id, "taskKey": "step-0", "sequence": 0 },
                { "formId": form_id, "taskKey": "step-1", "sequence": 1 }
            ]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(workflow["status"], "draft");
    let workflow_id = workflow["id"].as_str().unwrap().to_string();

    let (status, updated) = request(
        &app,
        "PUT",
        &format!("/api/workflows/{}", workflow_id),
        Some(json!({ "tenantId": "t1", "status": "active" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["status"], "active");

    let (status, detail) = request(&app, "GET", &format!("/api/workflows/{}", workflow_id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["tasks"].as_array().unwrap().len(), 2);

    let (status, started) = request(
        &app,
        "POST",
        &format!("/api/workflows/{}/start", workflow_id),
        Some(json!({ "tenantId": "t1", "userId": "u1" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(started["status"], "running");
    assert_eq!(started["currentTaskKey"], "step-0");
    assert_eq!(started["nextTask"]["taskKey"], "step-0");
    let instance_id = started["id"].as_str().unwrap().to_string();

    // Submitting against the wrong task is rejected.
    let (status, _) = request(
        &app,
        "POST",
        &format!("/api/workflows/instances/{}/tasks/step-1", instance_id),
        Some(json!({ "tenantId": "t1", "userId": "u1", "formData": { "name": "Ada" } })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, outcome) = request(
        &app,
        "POST",
        &format!("/api/workflows/instances/{}/tasks/step-0", instance_id),
        Some(json!({ "tenantId": "t1", "userId": "u1", "formData": { "name": "Ada" } })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(outcome["completed"], json!(false));
    assert_eq!(outcome["nextTask"]["taskKey"], "step-1");

    let (status, outcome) = request(
        &app,
        "POST",
        &format!("/api/workflows/instances/{}/tasks/step-1", instance_id),
        Some(json!({ "tenantId": "t1", "userId": "u1", "formData": { "name": "Ada" } })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(outcome["completed"], json!(true));
    assert_eq!(outcome["instance"]["status"], "completed");
    assert_eq!(outcome["nextTask"], Value::Null);

    let (status, view) = request(
        &app,
        "GET",
        &format!("/api/workflows/instances/{}?tenantId=t1", instance_id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["status"], "completed");
    assert_eq!(view["workflow"]["name"], "Onboarding");

    let (status, instances) = request(&app, "GET", "/api/workflows/instances?tenantId=t1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(instances.as_array().unwrap().len(), 1);

    let (status, submissions) = request(
        &app,
        "GET",
        &format!("/api/forms/{}/submissions", form_id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(submissions.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_workflow_deletion_reports_cascade_counts() {
    let app = test_app().await;

    let (_, form) = request(
        &app,
        "POST",
        "/api/forms",
        Some(json!({ "tenantId": "t1", "userId": "u1", "name": "Form" })),
    )
    .await;
    let (_, workflow) = request(
        &app,
        "POST",
        "/api/workflows",
        Some(json!({
            "tenantId": "t1",
            "name": "Short lived",
            "tasks": [{ "formId": form["id"], "taskKey": "only", "sequence": 0 }]
        })),
    )
    .await;
    let workflow_id = workflow["id"].as_str().unwrap().to_string();
    request(
        &app,
        "PUT",
        &format!("/api/workflows/{}", workflow_id),
        Some(json!({ "tenantId": "t1", "status": "active" })),
    )
    .await;
    request(
        &app,
        "POST",
        &format!("/api/workflows/{}/start", workflow_id),
        Some(json!({ "tenantId": "t1", "userId": "u1" })),
    )
    .await;

    let (status, body) = request(&app, "DELETE", &format!("/api/workflows/{}", workflow_id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deletedInstancesCount"], json!(1));
    assert_eq!(body["deletedTasksCount"], json!(1));

    let (status, _) = request(&app, "GET", &format!("/api/workflows/{}", workflow_id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
