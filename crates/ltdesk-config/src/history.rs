use serde::{Deserialize, Serialize};

fn default_limit() -> usize {
    100
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct HistoryConfig {
    /// Entries returned when no explicit limit is asked for
    #[serde(default = "default_limit")]
    pub limit: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            limit: default_limit(),
        }
    }
}
