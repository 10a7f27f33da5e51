/// Server setup and initialization
///
/// Wires together all components: database, stores, state machine, query
/// service, and HTTP routes. Provides the main application factory
/// function for creating the Axum app.

use crate::{
    api::{form_routes, instance_routes, workflow_routes, AppState},
    config::Config,
    db,
    form::FormStore,
    instance::{InstanceQueryService, InstanceStateMachine},
    submission::SubmissionRecorder,
    workflow::WorkflowStore,
};
use anyhow::Result;
use axum::{routing::get, Router};
use sqlx::sqlite::SqlitePool;
use tokio::net::TcpListener;

/// Build the application state from a ready database pool
pub fn build_state(pool: SqlitePool) -> AppState {
    let workflows = WorkflowStore::new(pool.clone());
    AppState {
        forms: FormStore::new(pool.clone()),
        machine: InstanceStateMachine::new(pool.clone(), workflows.clone()),
        query: InstanceQueryService::new(pool.clone()),
        recorder: SubmissionRecorder::new(pool),
        workflows,
    }
}

/// Assemble the HTTP router over the application state
pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Health check endpoint
        .route("/healthz", get(health_check))
        // Form management and submissions
        .merge(form_routes())
        // Workflow management and instance start
        .merge(workflow_routes())
        // Instance views and task completion
        .merge(instance_routes())
        .with_state(state)
}

/// Create the main Axum application with all routes
///
/// Opens the database, initializes the schema, and wires the core
/// services into a complete application.
pub async fn create_app(config: &Config) -> Result<Router> {
    tracing::info!("🗄️ Initializing engine database");
    let pool = db::connect(&config.database).await?;
    db::init_schema(&pool)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to initialize schema: {}", e))?;

    tracing::info!("🏗️ Initializing core services");
    let state = build_state(pool);

    tracing::info!("📡 Creating HTTP router with all endpoints");
    let app = build_router(state);

    tracing::info!("✅ Application initialized successfully");

    Ok(app)
}

/// Start the HTTP server with the given configuration
pub async fn start_server(config: Config) -> Result<()> {
    // Initialize tracing subscriber for logging
    tracing_subscriber::fmt()
        .with_target(false)
        .with_thread_ids(true)
        .with_level(true)
        .init();

    tracing::info!("Starting Formflow server...");

    let app = create_app(&config).await?;

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&bind_addr).await?;

    tracing::info!("Server listening on http://{}", bind_addr);

    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}

/// Health check endpoint handler
async fn health_check() -> &'static str {
    "ok"
}
