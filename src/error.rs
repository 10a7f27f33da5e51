/// Typed error kinds for the workflow engine core
///
/// Every operation either fully applies its effect or fails with one of
/// these kinds; there is no partial success. Storage failures propagate
/// unchanged and the engine never retries them itself.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    /// Missing or malformed caller input; nothing was changed.
    #[error("{0}")]
    Validation(String),

    #[error("Workflow not found: {0}")]
    WorkflowNotFound(String),

    /// Instances can only be started against `active` workflows. Covers
    /// both an absent workflow and one in draft/inactive status, matching
    /// how the start operation reports the two cases as one.
    #[error("Workflow not found or not active: {0}")]
    WorkflowNotActive(String),

    #[error("Form not found: {0}")]
    FormNotFound(String),

    #[error("Workflow task not found: {0}")]
    TaskNotFound(String),

    #[error("Workflow instance not found: {0}")]
    InstanceNotFound(String),

    /// Strict equality guard: submissions are accepted only against the
    /// instance's current task, never replayed or submitted out of order.
    #[error("task '{0}' is not the current active task")]
    NotCurrentTask(String),

    /// A concurrent completion advanced the instance first; the caller
    /// should re-fetch instance state and retry at most once.
    #[error("concurrent completion detected for instance {0}")]
    Conflict(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;

impl EngineError {
    /// HTTP status the API layer reports for this error kind
    pub fn status_code(&self) -> StatusCode {
        match self {
            EngineError::Validation(_) | EngineError::NotCurrentTask(_) => StatusCode::BAD_REQUEST,
            EngineError::WorkflowNotFound(_)
            | EngineError::WorkflowNotActive(_)
            | EngineError::FormNotFound(_)
            | EngineError::TaskNotFound(_)
            | EngineError::InstanceNotFound(_) => StatusCode::NOT_FOUND,
            EngineError::Conflict(_) => StatusCode::CONFLICT,
            EngineError::Database(_) | EngineError::Json(_) | EngineError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for EngineError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("request failed: {}", self);
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            format!("{}", EngineError::WorkflowNotFound("wf-1".to_string())),
            "Workflow not found: wf-1"
        );
        assert_eq!(
            format!("{}", EngineError::NotCurrentTask("task-b".to_string())),
            "task 'task-b' is not the current active task"
        );
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            EngineError::Validation("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            EngineError::InstanceNotFound("x".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            EngineError::Conflict("x".into()).status_code(),
            StatusCode::CONFLICT
        );
    }
}
