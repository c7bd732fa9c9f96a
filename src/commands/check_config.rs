use anyhow::{Context, Result};
use std::path::PathBuf;

use coasters::config::Config;

/// Load, validate and print the effective configuration
pub fn check_config(path: Option<PathBuf>) -> Result<()> {
    let config = Config::load(path.as_deref()).context("Configuration is invalid")?;

    println!("Configuration OK");
    println!("================");
    println!("{}", summary(&config));
    Ok(())
}

fn summary(config: &Config) -> String {
    let postgres_url = match &config.storage.postgres_url {
        Some(_) => "set",
        None => "unset",
    };

    format!(
        "[server]\n  \
         bind_address = {}\n  \
         api_prefix = {:?}\n  \
         enable_cors = {}\n  \
         enable_request_logging = {}\n  \
         request_timeout_secs = {}\n\
         [storage]\n  \
         backend = {}\n  \
         sqlite_path = {}\n  \
         postgres_url = {}\n  \
         pool_size = {}\n\
         [service]\n  \
         id_strategy = {}\n\
         [admin]\n  \
         username = {}\n  \
         password = ***\n\
         [logging]\n  \
         level = {}\n  \
         format = {}",
        config.server.bind_address,
        config.server.api_prefix,
        config.server.enable_cors,
        config.server.enable_request_logging,
        config.server.request_timeout_secs,
        config.storage.backend,
        config.storage.sqlite_path.display(),
        postgres_url,
        config.storage.pool_size,
        config.service.id_strategy.as_str(),
        config.admin.username,
        config.logging.level,
        config.logging.format,
    )
}
