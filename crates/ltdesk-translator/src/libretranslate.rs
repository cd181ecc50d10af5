use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use crate::{
    LanguageCode, ProviderLanguage, ProviderMetadata, TranslateError, Translation, Translator,
    TranslatorFactory,
};

#[derive(Clone)]
pub struct LibreTranslateClient {
    client: reqwest::Client,
    api_key: String,
    api_url: String,
}

#[derive(Serialize)]
struct TranslateBody<'a> {
    q: &'a str,
    source: &'a str,
    target: &'a str,
    format: &'static str,
    #[serde(skip_serializing_if = "str::is_empty")]
    api_key: &'a str,
}

impl LibreTranslateClient {
    pub fn new(api_url: String, api_key: String) -> Result<Self, TranslateError> {
        let api_url = normalize_url(&api_url)?;
        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            api_url,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.api_url, path)
    }
}

/// Trim whitespace and trailing slashes, require an http(s) scheme
fn normalize_url(raw: &str) -> Result<String, TranslateError> {
    let url = raw.trim().trim_end_matches('/');
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(TranslateError::InvalidUrl(raw.to_string()));
    }
    Ok(url.to_string())
}

/// Pull `translatedText` out of a response; empty counts as nothing
fn parse_translated_text(json: &serde_json::Value) -> Option<String> {
    json["translatedText"]
        .as_str()
        .filter(|text| !text.trim().is_empty())
        .map(str::to_string)
}

fn parse_error_message(json: &serde_json::Value) -> Option<String> {
    json["error"].as_str().map(str::to_string)
}

#[async_trait]
impl Translator for LibreTranslateClient {
    async fn languages(&self) -> Result<Vec<ProviderLanguage>, TranslateError> {
        let mut request = self.client.get(self.endpoint("languages"));
        if !self.api_key.is_empty() {
            request = request.query(&[("api_key", self.api_key.as_str())]);
        }

        let response = request.send().await?;

        if response.status() == 403 {
            return Err(TranslateError::AuthenticationError);
        }

        if !response.status().is_success() {
            return Err(TranslateError::ApiError(format!(
                "HTTP {}",
                response.status()
            )));
        }

        let languages: Vec<ProviderLanguage> = response.json().await.map_err(|e| {
            TranslateError::ApiError(format!("Failed to parse languages: {}", e))
        })?;

        tracing::debug!("Provider reported {} languages", languages.len());
        Ok(languages)
    }

    async fn translate(
        &self,
        text: &str,
        from: LanguageCode,
        to: LanguageCode,
    ) -> Result<Option<Translation>, TranslateError> {
        let body = TranslateBody {
            q: text,
            source: &from,
            target: &to,
            format: "text",
            api_key: &self.api_key,
        };

        let response = self
            .client
            .post(self.endpoint("translate"))
            .json(&body)
            .send()
            .await?;

        let status = response.status();

        if status == 429 {
            return Err(TranslateError::RateLimitExceeded);
        }

        if status == 403 {
            return Err(TranslateError::AuthenticationError);
        }

        if status == 400 {
            if let Ok(json) = response.json::<serde_json::Value>().await
                && let Some(message) = parse_error_message(&json)
            {
                tracing::debug!("Provider rejected {} -> {}: {}", from, to, message);
            }
            return Err(TranslateError::UnsupportedLanguagePair { from, to });
        }

        if !status.is_success() {
            return Err(TranslateError::ApiError(format!("HTTP {}", status)));
        }

        let json: serde_json::Value = response.json().await.map_err(|e| {
            TranslateError::ApiError(format!("Failed to parse response: {}", e))
        })?;

        Ok(parse_translated_text(&json).map(|text| Translation {
            text,
            from,
            to,
            provider: "libretranslate".to_string(),
        }))
    }

    fn metadata(&self) -> ProviderMetadata {
        ProviderMetadata {
            name: "LibreTranslate".to_string(),
            requires_api_key: false,
            free_tier_available: true,
        }
    }
}

/// Factory producing LibreTranslate clients
#[derive(Clone, Default)]
pub struct LibreTranslateFactory;

impl TranslatorFactory for LibreTranslateFactory {
    fn connect(&self, api_url: &str, api_key: &str) -> Result<Arc<dyn Translator>, TranslateError> {
        let client = LibreTranslateClient::new(api_url.to_string(), api_key.to_string())?;
        Ok(Arc::new(client))
    }
}
