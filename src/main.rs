use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use coasters::config::{Config, LoggingConfig};
use coasters::storage::StorageBackend;

mod commands;

use commands::{check_config, serve, ServeParams};

#[derive(Parser)]
#[command(
    name = "coasters",
    version,
    about = "REST service for roller coaster records",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format (text, json); overrides the configured format
    #[arg(long, global = true)]
    log_format: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server
    Serve {
        /// Path to a TOML config file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Host to bind to
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,

        /// Storage backend (memory, sqlite, postgres)
        #[arg(short, long)]
        backend: Option<StorageBackend>,

        /// Disable CORS
        #[arg(long, default_value = "false")]
        no_cors: bool,

        /// Disable request logging
        #[arg(long, default_value = "false")]
        no_request_logging: bool,
    },

    /// Validate configuration and print the effective values
    CheckConfig {
        /// Path to a TOML config file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

impl Commands {
    fn config_path(&self) -> Option<&PathBuf> {
        match self {
            Self::Serve { config, .. } | Self::CheckConfig { config } => config.as_ref(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logging settings come from the layered config when it can be read at all;
    // real config errors surface later from the command itself.
    let mut logging = Config::load_unvalidated(cli.command.config_path().map(PathBuf::as_path))
        .map(|c| c.logging)
        .unwrap_or_default();
    if let Some(format) = cli.log_format {
        logging.format = format;
    }

    // Initialize tracing/logging
    setup_tracing(&logging, cli.verbose)?;

    match cli.command {
        Commands::Serve {
            config,
            host,
            port,
            backend,
            no_cors,
            no_request_logging,
        } => {
            tracing::info!(
                config = ?config,
                host = ?host,
                port = ?port,
                backend = ?backend,
                "Starting serve command"
            );
            serve(ServeParams {
                config,
                host,
                port,
                backend,
                enable_cors: !no_cors,
                enable_logging: !no_request_logging,
            })
            .await?;
        }

        Commands::CheckConfig { config } => {
            check_config(config)?;
        }
    }

    Ok(())
}

fn setup_tracing(logging: &LoggingConfig, verbose: bool) -> Result<()> {
    let env_filter = if verbose {
        tracing_subscriber::EnvFilter::new("coasters=debug,tower_http=debug,info")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            let level = &logging.level;
            tracing_subscriber::EnvFilter::new(format!("coasters={level},tower_http={level},warn"))
        })
    };

    match logging.format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
    }

    Ok(())
}
