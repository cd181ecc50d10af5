use std::sync::Arc;

use serde::{Deserialize, Serialize};

pub mod libretranslate;

pub use libretranslate::{LibreTranslateClient, LibreTranslateFactory};

pub type LanguageCode = String;

/// Translation provider interface
#[async_trait::async_trait]
pub trait Translator: Send + Sync {
    /// Languages the provider can translate between
    async fn languages(&self) -> Result<Vec<ProviderLanguage>, TranslateError>;

    /// Translate text from source to target language.
    ///
    /// `Ok(None)` means the provider answered but has no translation for the pair.
    async fn translate(
        &self,
        text: &str,
        from: LanguageCode,
        to: LanguageCode,
    ) -> Result<Option<Translation>, TranslateError>;

    /// Provider metadata
    fn metadata(&self) -> ProviderMetadata;
}

/// Builds a provider client from user-supplied endpoint and key
pub trait TranslatorFactory: Send + Sync {
    fn connect(&self, api_url: &str, api_key: &str) -> Result<Arc<dyn Translator>, TranslateError>;
}

/// Language entry as the provider reports it, every field optional
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderLanguage {
    pub code: Option<String>,
    pub name: Option<String>,
    pub targets: Option<Vec<String>>,
}

impl ProviderLanguage {
    pub fn new(code: &str, name: &str) -> Self {
        Self {
            code: Some(code.to_string()),
            name: Some(name.to_string()),
            targets: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Translation {
    pub text: String,
    pub from: LanguageCode,
    pub to: LanguageCode,
    pub provider: String,
}

#[derive(Debug, Clone)]
pub struct ProviderMetadata {
    pub name: String,
    pub requires_api_key: bool,
    pub free_tier_available: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum TranslateError {
    #[error("API error: {0}")]
    ApiError(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Unsupported language pair: {from} -> {to}")]
    UnsupportedLanguagePair { from: String, to: String },

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Authentication error")]
    AuthenticationError,

    #[error("Invalid API url: {0}")]
    InvalidUrl(String),
}
