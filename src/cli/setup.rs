use crate::core::config::AppConfig;
use anyhow::{Context, Result};
use std::path::Path;

pub const DEFAULT_CONFIG: &str = r#"# Example configuration file for coinfolio
---
# Reference currency used until changed with `coinfolio currency <CODE>`
currency: "USD"

# Where snapshots are kept. Defaults to the platform data directory.
# data_path: "/home/me/.local/share/coinfolio"

feed:
  base_url: "https://api.coingecko.com/api/v3"
  timeout_secs: 8
  max_attempts: 3
  backoff_secs: 5
  per_page: 100
"#;

/// Creates a default configuration file at the default location
pub fn setup() -> Result<()> {
    setup_at_path(AppConfig::default_config_path()?)
}

/// Creates a default configuration file at the specified path
pub fn setup_at_path<P: AsRef<Path>>(path: P) -> Result<()> {
    let path = path.as_ref();

    if path.exists() {
        anyhow::bail!("Configuration file already exists at {}", path.display());
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    std::fs::write(path, DEFAULT_CONFIG)
        .with_context(|| format!("Failed to write config file to {}", path.display()))?;

    tracing::info!("Created default configuration at {}", path.display());
    Ok(())
}
