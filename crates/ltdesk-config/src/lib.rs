use std::env;

use serde::{Deserialize, Serialize};

use self::assets::AssetsConfig;
use self::history::HistoryConfig;
use self::sequencer::SequencerConfig;

pub mod assets;
pub mod history;
pub mod sequencer;

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    pub sequencer: SequencerConfig,
    pub history: HistoryConfig,
    pub assets: AssetsConfig,
}

fn env_number<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

impl Config {
    /// Defaults with environment overrides applied
    pub fn new() -> Self {
        Self::default().with_env_overrides()
    }

    /// Environment wins over values loaded from the config file
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(debounce_ms) = env_number("DEBOUNCE_MS") {
            self.sequencer.debounce_ms = debounce_ms;
        }

        if let Some(threshold) = env_number("LOADING_THRESHOLD") {
            self.sequencer.loading_threshold = threshold;
        }

        if let Some(timeout_ms) = env_number("REQUEST_TIMEOUT_MS") {
            self.sequencer.request_timeout_ms = timeout_ms;
        }

        if let Some(limit) = env_number("HISTORY_LIMIT") {
            self.history.limit = limit;
        }

        if let Ok(icon_url) = env::var("ICON_URL")
            && !icon_url.trim().is_empty()
        {
            self.assets.icon_url = icon_url;
        }

        self
    }

    pub fn from_json(data: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(data)
    }
}
