//! Command-line interface

use std::path::PathBuf;

use clap::Parser;

/// Caching HTTP forwarding proxy
#[derive(Parser, Debug)]
#[command(name = "cache-relay")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file (YAML)
    #[arg(short, long, env = "CACHE_RELAY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Port to listen on
    #[arg(short, long, env = "PORT")]
    pub port: Option<u16>,

    /// Host to bind to
    #[arg(long, env = "CACHE_RELAY_HOST")]
    pub host: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "CACHE_RELAY_LOG_LEVEL")]
    pub log_level: String,

    /// Log format (text, json)
    #[arg(long, env = "CACHE_RELAY_LOG_FORMAT")]
    pub log_format: Option<String>,
}
