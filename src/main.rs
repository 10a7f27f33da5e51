/// Formflow: multi-tenant form-driven workflow engine
///
/// Main entry point for the Formflow server. Initializes configuration and
/// starts the HTTP server with form, workflow, and instance endpoints.

use formflow::{config::Config, server::start_server};

/// Application entry point
///
/// Initializes the server with default configuration and starts listening
/// for requests. The server provides:
/// - Form management API at /api/forms/*
/// - Workflow management API at /api/workflows/*
/// - Instance execution API at /api/workflows/instances/*
/// - Health check at /healthz
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration (defaults to 0.0.0.0:3005 and data/formflow.db)
    let config = Config::default();

    // Start the server
    start_server(config).await?;

    Ok(())
}
