use serde::{Deserialize, Serialize};

fn default_icon_url() -> String {
    "https://libretranslate.com/static/favicon.ico".to_string()
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct AssetsConfig {
    #[serde(default = "default_icon_url")]
    pub icon_url: String,
}

impl AssetsConfig {
    /// Local file name, taken from the last url segment
    pub fn icon_file_name(&self) -> String {
        self.icon_url
            .rsplit('/')
            .find(|segment| !segment.is_empty())
            .filter(|segment| !segment.contains(':'))
            .unwrap_or("icon.png")
            .to_string()
    }
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            icon_url: default_icon_url(),
        }
    }
}
