use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use ltdesk_config::Config;

const APP_DIR: &str = "ltdesk";
const CONFIG_FILE: &str = "config.json";

/// Resolve and create the per-user data directory
pub fn data_dir(override_dir: Option<PathBuf>) -> anyhow::Result<PathBuf> {
    let dir = match override_dir {
        Some(dir) => dir,
        None => dirs::data_dir()
            .context("No user data directory on this platform")?
            .join(APP_DIR),
    };

    fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create data directory {}", dir.display()))?;
    Ok(dir)
}

/// Write the default config file if there is none yet
pub fn init_user_config(data_dir: &Path) -> anyhow::Result<()> {
    let path = data_dir.join(CONFIG_FILE);

    if !path.exists() {
        fs::write(&path, serde_json::to_string_pretty(&Config::default())?)?;
        tracing::info!("Created default config at {}", path.display());
    }

    Ok(())
}

/// Load the config file with environment overrides on top
pub fn load_user_config(data_dir: &Path) -> anyhow::Result<Config> {
    let path = data_dir.join(CONFIG_FILE);

    let config = if path.exists() {
        let data = fs::read_to_string(&path)?;
        Config::from_json(&data).with_context(|| format!("Invalid config {}", path.display()))?
    } else {
        tracing::warn!("{} not found, using defaults", path.display());
        Config::default()
    };

    Ok(config.with_env_overrides())
}
