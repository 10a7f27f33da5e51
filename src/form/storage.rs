/// SQLite persistence for form definitions
///
/// Form rows hold the opaque JSON field schema alongside tenant ownership.
/// Deleting a form cascades to its submissions and reports the count.

use crate::{db, error::{EngineError, Result}, form::types::FormDefinition, tenant::TenantContext};
use serde_json::Value;
use sqlx::sqlite::SqlitePool;
use uuid::Uuid;

/// SQLite-backed form store
#[derive(Debug, Clone)]
pub struct FormStore {
    pool: SqlitePool,
}

/// Result of a cascading form deletion
#[derive(Debug)]
pub struct FormDeletion {
    /// The deleted form row
    pub form: FormDefinition,
    /// How many submissions were removed with it
    pub submissions_deleted: u64,
}

impl FormStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new form definition for the tenant
    ///
    /// The content schema is stored unchanged; it is never interpreted.
    pub async fn create(
        &self,
        ctx: &TenantContext,
        name: &str,
        content: Option<Value>,
    ) -> Result<FormDefinition> {
        let now = db::now_rfc3339();
        let form = FormDefinition {
            id: Uuid::new_v4().to_string(),
            tenant_id: ctx.tenant_id.clone(),
            user_id: ctx.user_id.clone(),
            name: name.to_string(),
            content,
            created_at: now.clone(),
            updated_at: now,
        };

        let content_json = form
            .content
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        sqlx::query(
            r#"
            INSERT INTO forms (id, tenant_id, user_id, name, content, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&form.id)
        .bind(&form.tenant_id)
        .bind(&form.user_id)
        .bind(&form.name)
        .bind(&content_json)
        .bind(&form.created_at)
        .bind(&form.updated_at)
        .execute(&self.pool)
        .await?;

        tracing::info!("Created form: {} ({})", form.id, form.name);

        Ok(form)
    }

    /// List all forms belonging to a tenant
    pub async fn list_for_tenant(&self, tenant_id: &str) -> Result<Vec<FormDefinition>> {
        let rows = sqlx::query("SELECT * FROM forms WHERE tenant_id = ?")
            .bind(tenant_id)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(FormDefinition::from_row).collect()
    }

    /// Fetch a form by id, verifying tenant ownership
    ///
    /// A tenant mismatch is reported identically to an absent form so the
    /// existence of other tenants' forms is never revealed.
    pub async fn get_for_tenant(&self, id: &str, tenant_id: &str) -> Result<FormDefinition> {
        let row = sqlx::query("SELECT * FROM forms WHERE id = ? AND tenant_id = ?")
            .bind(id)
            .bind(tenant_id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => FormDefinition::from_row(&row),
            None => Err(EngineError::FormNotFound(id.to_string())),
        }
    }

    /// Delete a form and every submission recorded against it
    ///
    /// Submissions go first, then the form row, all in one transaction.
    pub async fn delete(&self, id: &str) -> Result<FormDeletion> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query("SELECT * FROM forms WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| EngineError::FormNotFound(id.to_string()))?;
        let form = FormDefinition::from_row(&row)?;

        let submissions = sqlx::query("DELETE FROM form_submissions WHERE form_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM forms WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(
            "Deleted form {} and {} submissions",
            id,
            submissions.rows_affected()
        );

        Ok(FormDeletion {
            form,
            submissions_deleted: submissions.rows_affected(),
        })
    }
}
