use std::path::{Path, PathBuf};

use ltdesk_config::assets::AssetsConfig;

#[derive(Debug, thiserror::Error)]
#[error("Could not fetch {url}: {reason}")]
pub struct AssetFetchFailure {
    pub url: String,
    pub reason: String,
}

/// Make sure the window icon exists locally, downloading it once if needed.
///
/// There is no retry. A failure here aborts startup.
pub async fn ensure_icon(data_dir: &Path, config: &AssetsConfig) -> Result<PathBuf, AssetFetchFailure> {
    let path = data_dir.join(config.icon_file_name());
    if path.exists() {
        tracing::debug!("Icon already present at {}", path.display());
        return Ok(path);
    }

    let fail = |reason: String| AssetFetchFailure {
        url: config.icon_url.clone(),
        reason,
    };

    tracing::info!("Downloading icon from {}", config.icon_url);
    let response = reqwest::get(&config.icon_url)
        .await
        .map_err(|e| fail(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(fail(format!("HTTP {status}")));
    }

    let bytes = response.bytes().await.map_err(|e| fail(e.to_string()))?;
    tokio::fs::write(&path, &bytes)
        .await
        .map_err(|e| fail(format!("write {}: {}", path.display(), e)))?;

    tracing::info!("Saved icon to {}", path.display());
    Ok(path)
}
