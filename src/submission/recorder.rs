/// Validation and persistence of submitted form data
///
/// The recorder checks only that the referenced form exists and that data
/// was actually supplied. It deliberately performs no schema validation
/// against the form's field list; the data bag is stored unchanged.

use crate::{
    db,
    error::{EngineError, Result},
    submission::types::Submission,
};
use serde_json::Value;
use sqlx::{sqlite::SqlitePool, SqliteConnection};
use uuid::Uuid;

/// Records submissions, standalone or as part of a task completion
#[derive(Debug, Clone)]
pub struct SubmissionRecorder {
    pool: SqlitePool,
}

impl SubmissionRecorder {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Record a submission on its own connection
    ///
    /// Used for standalone submissions made outside any workflow context.
    pub async fn record(
        &self,
        form_id: &str,
        tenant_id: &str,
        data: Value,
        instance_id: Option<&str>,
        task_key: Option<&str>,
    ) -> Result<Submission> {
        let mut conn = self.pool.acquire().await?;
        Self::record_on(&mut *conn, form_id, tenant_id, data, instance_id, task_key).await
    }

    /// Record a submission on an existing connection or transaction
    ///
    /// The instance state machine calls this inside its completion
    /// transaction so the submission write and the instance transition
    /// commit or roll back together.
    pub(crate) async fn record_on(
        conn: &mut SqliteConnection,
        form_id: &str,
        tenant_id: &str,
        data: Value,
        instance_id: Option<&str>,
        task_key: Option<&str>,
    ) -> Result<Submission> {
        if data.is_null() {
            return Err(EngineError::Validation("data is required".to_string()));
        }

        let form_exists = sqlx::query("SELECT id FROM forms WHERE id = ?")
            .bind(form_id)
            .fetch_optional(&mut *conn)
            .await?
            .is_some();
        if !form_exists {
            return Err(EngineError::FormNotFound(form_id.to_string()));
        }

        let submission = Submission {
            id: Uuid::new_v4().to_string(),
            form_id: form_id.to_string(),
            tenant_id: tenant_id.to_string(),
            data,
            workflow_instance_id: instance_id.map(str::to_string),
            task_key: task_key.map(str::to_string),
            created_at: db::now_rfc3339(),
        };

        sqlx::query(
            r#"
            INSERT INTO form_submissions (id, form_id, tenant_id, data, workflow_instance_id, task_key, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&submission.id)
        .bind(&submission.form_id)
        .bind(&submission.tenant_id)
        .bind(serde_json::to_string(&submission.data)?)
        .bind(&submission.workflow_instance_id)
        .bind(&submission.task_key)
        .bind(&submission.created_at)
        .execute(conn)
        .await?;

        tracing::debug!("Recorded submission {} for form {}", submission.id, form_id);

        Ok(submission)
    }

    /// List every submission recorded against a form
    pub async fn list_for_form(&self, form_id: &str) -> Result<Vec<Submission>> {
        let rows = sqlx::query("SELECT * FROM form_submissions WHERE form_id = ?")
            .bind(form_id)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(Submission::from_row).collect()
    }
}
