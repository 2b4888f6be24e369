use clap::Parser;
use std::path::PathBuf;

use crate::error::{Result, ServiceError};

#[derive(Debug, Parser)]
#[command(name = "home-price-backend")]
#[command(about = "HTTP backend serving home price predictions")]
pub struct ServerConfig {
    /// Address to bind the HTTP server on
    #[arg(long, default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, default_value_t = 5000)]
    pub port: u16,

    /// Directory holding the column manifest and model artifacts
    #[arg(long, default_value = "artifacts")]
    pub artifacts_dir: PathBuf,

    /// Directory holding the static frontend assets
    #[arg(long, default_value = "static")]
    pub static_dir: PathBuf,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl ServerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(ServiceError::validation("host cannot be empty"));
        }
        if self.artifacts_dir.as_os_str().is_empty() {
            return Err(ServiceError::validation("artifacts directory cannot be empty"));
        }
        if self.static_dir.as_os_str().is_empty() {
            return Err(ServiceError::validation("static directory cannot be empty"));
        }
        Ok(())
    }
}
