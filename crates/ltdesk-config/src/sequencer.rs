use std::time::Duration;

use serde::{Deserialize, Serialize};

fn default_debounce_ms() -> u64 {
    500
}

fn default_loading_threshold() -> usize {
    300
}

fn default_request_timeout_ms() -> u64 {
    30_000
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct SequencerConfig {
    /// Quiet period after the last keystroke before translating
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    /// Inputs longer than this (in characters) get an interim loading message
    #[serde(default = "default_loading_threshold")]
    pub loading_threshold: usize,
    /// Upper bound for a single provider call
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl SequencerConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl Default for SequencerConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            loading_threshold: default_loading_threshold(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}
