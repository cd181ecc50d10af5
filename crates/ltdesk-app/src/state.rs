use std::path::PathBuf;
use std::sync::Arc;

use ltdesk_config::Config;
use ltdesk_core::session::SessionSettings;

pub struct AppState {
    pub config: Arc<Config>,
    pub data_dir: PathBuf,
}

impl AppState {
    pub fn new(config: Config, data_dir: PathBuf) -> Self {
        Self {
            config: Arc::new(config),
            data_dir,
        }
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join("settings.db")
    }

    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings::from_config(&self.config)
    }
}
