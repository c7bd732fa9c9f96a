use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::path::PathBuf;

use coasters::config::Config;
use coasters::metrics;
use coasters::server::CoasterServer;
use coasters::storage::StorageBackend;

// ============================================================================
// Coaster Server Implementation
// ============================================================================

/// Command-line overrides for the serve command
pub struct ServeParams {
    pub config: Option<PathBuf>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub backend: Option<StorageBackend>,
    pub enable_cors: bool,
    pub enable_logging: bool,
}

/// Start the coaster server
pub async fn serve(params: ServeParams) -> Result<()> {
    let ServeParams {
        config: config_path,
        host,
        port,
        backend,
        enable_cors,
        enable_logging,
    } = params;

    let mut config =
        Config::load_unvalidated(config_path.as_deref()).context("Failed to load configuration")?;
    apply_flags(&mut config, host, port, backend, enable_cors, enable_logging)?;
    config.validate().context("Invalid configuration")?;

    if let Err(e) = metrics::init_metrics() {
        tracing::warn!("Failed to initialize metrics: {}", e);
    }

    let prefix = config.server.api_prefix.clone();
    let bind_address = config.server.bind_address;

    let server = CoasterServer::new(config)
        .await
        .context("Failed to create coaster server")?;

    println!("{}", server.info().display());
    println!();
    println!("API Endpoints:");
    println!("  GET    {prefix}/coasters         - List coasters");
    println!("  POST   {prefix}/coasters         - Create coaster");
    println!("  GET    {prefix}/coasters/random  - Redirect to a random coaster");
    println!("  GET    {prefix}/coasters/{{id}}    - Get coaster");
    println!("  PUT    {prefix}/coasters/{{id}}    - Replace coaster");
    println!("  DELETE {prefix}/coasters/{{id}}    - Delete coaster");
    println!("  ANY    {prefix}/admin            - Admin portal (Basic auth)");
    println!("  GET    /health                   - Health check");
    println!("  GET    /metrics                  - Prometheus metrics endpoint");
    println!();
    println!("Coaster server listening on http://{bind_address}");
    println!("Press Ctrl+C to stop.\n");

    // Start with graceful shutdown
    server
        .start_with_shutdown(async {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    tracing::info!("Shutdown signal received");
                }
                Err(e) => {
                    tracing::error!("Failed to wait for Ctrl+C: {}", e);
                }
            }
        })
        .await?;

    println!("Coaster server stopped.");
    Ok(())
}

/// Apply command-line flags on top of file and environment configuration
fn apply_flags(
    config: &mut Config,
    host: Option<String>,
    port: Option<u16>,
    backend: Option<StorageBackend>,
    enable_cors: bool,
    enable_logging: bool,
) -> Result<()> {
    if host.is_some() || port.is_some() {
        let current = config.server.bind_address;
        let host = host.unwrap_or_else(|| current.ip().to_string());
        let port = port.unwrap_or(current.port());
        let addr: SocketAddr = format!("{host}:{port}")
            .parse()
            .context("Invalid bind address")?;
        config.server.bind_address = addr;
    }

    if let Some(backend) = backend {
        config.storage.backend = backend;
    }

    config.server.enable_cors &= enable_cors;
    config.server.enable_request_logging &= enable_logging;
    Ok(())
}
