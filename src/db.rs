/// SQLite connection and schema management
///
/// Owns pool construction and schema initialization for the single
/// engine database. All tables are created with IF NOT EXISTS so startup
/// is safe to repeat against an existing file.

use crate::config::DatabaseConfig;
use anyhow::Result;
use chrono::{SecondsFormat, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool};
use std::path::Path;

/// Open the engine database, creating the file and parent directory on
/// first use.
pub async fn connect(config: &DatabaseConfig) -> Result<SqlitePool> {
    if let Some(parent) = Path::new(&config.path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| {
                anyhow::anyhow!("Failed to create data directory '{}': {}", parent.display(), e)
            })?;
        }
    }

    tracing::info!("Opening engine database: {}", config.path);

    let options = SqliteConnectOptions::new()
        .filename(&config.path)
        .create_if_missing(true);
    let pool = SqlitePool::connect_with(options).await?;

    Ok(pool)
}

/// Initialize the engine schema
///
/// Creates the forms, workflows, tasks, instances, and submissions tables
/// plus lookup indexes. Safe to call multiple times.
pub async fn init_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS forms (
            id TEXT PRIMARY KEY,
            tenant_id TEXT NOT NULL,
            user_id TEXT NOT NULL,
            name TEXT NOT NULL,
            content JSON,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS workflows (
            id TEXT PRIMARY KEY,
            tenant_id TEXT NOT NULL,
            name TEXT NOT NULL,
            description TEXT,
            diagram TEXT,
            status TEXT NOT NULL DEFAULT 'draft',
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS workflow_tasks (
            id TEXT PRIMARY KEY,
            workflow_id TEXT NOT NULL,
            form_id TEXT NOT NULL,
            task_key TEXT NOT NULL,
            task_name TEXT,
            sequence INTEGER NOT NULL DEFAULT 0,
            is_required INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL,
            UNIQUE (workflow_id, task_key)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS workflow_instances (
            id TEXT PRIMARY KEY,
            workflow_id TEXT NOT NULL,
            tenant_id TEXT NOT NULL,
            user_id TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'running',
            current_task_key TEXT,
            variables JSON NOT NULL,
            started_at TEXT NOT NULL,
            completed_at TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS form_submissions (
            id TEXT PRIMARY KEY,
            form_id TEXT NOT NULL,
            tenant_id TEXT NOT NULL,
            data JSON NOT NULL,
            workflow_instance_id TEXT,
            task_key TEXT,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_forms_tenant ON forms(tenant_id)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_workflows_tenant ON workflows(tenant_id)")
        .execute(pool)
        .await?;
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_workflow_tasks_order ON workflow_tasks(workflow_id, sequence)",
    )
    .execute(pool)
    .await?;
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_instances_tenant ON workflow_instances(tenant_id, workflow_id)",
    )
    .execute(pool)
    .await?;
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_submissions_form ON form_submissions(form_id)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Timestamp format shared by every table. Fixed-width microseconds keep
/// lexicographic ordering identical to chronological ordering, which the
/// task tie-break relies on.
pub(crate) fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}
