//! Test doubles shared by the unit tests in this crate.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use ltdesk_translator::{
    LanguageCode, ProviderLanguage, ProviderMetadata, TranslateError, Translation, Translator,
    TranslatorFactory,
};
use ltdesk_types::{Credentials, HistoryEntry, Language, StoredPair, TranslationRequest};
use tokio::sync::Semaphore;

use crate::store::{SettingsStore, StoreError};

pub fn language(code: &str, name: &str) -> Language {
    Language {
        code: code.to_string(),
        name: name.to_string(),
        targets: vec![],
    }
}

pub fn request(id: u64, text: &str) -> TranslationRequest {
    TranslationRequest::new(
        id,
        text.to_string(),
        Language::auto(),
        language("es", "Spanish"),
    )
}

/// Translator that replies `[<to>] <text>` unless told otherwise
pub struct FakeTranslator {
    languages: Vec<ProviderLanguage>,
    replies: HashMap<String, Option<String>>,
    unsupported: bool,
    delay: Option<Duration>,
    gate: Option<Semaphore>,
    calls: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FakeTranslator {
    pub fn new() -> Self {
        Self {
            languages: vec![
                ProviderLanguage::new("en", "English"),
                ProviderLanguage::new("es", "Spanish"),
            ],
            replies: HashMap::new(),
            unsupported: false,
            delay: None,
            gate: None,
            calls: Mutex::new(vec![]),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    /// Every call blocks until [`FakeTranslator::release`] lets it through
    pub fn gated() -> Self {
        Self {
            gate: Some(Semaphore::new(0)),
            ..Self::new()
        }
    }

    pub fn with_reply(mut self, text: &str, reply: Option<&str>) -> Self {
        self.replies
            .insert(text.to_string(), reply.map(str::to_string));
        self
    }

    pub fn with_languages(mut self, languages: Vec<ProviderLanguage>) -> Self {
        self.languages = languages;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn unsupported(mut self) -> Self {
        self.unsupported = true;
        self
    }

    pub fn release(&self, calls: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(calls);
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Translator for FakeTranslator {
    async fn languages(&self) -> Result<Vec<ProviderLanguage>, TranslateError> {
        Ok(self.languages.clone())
    }

    async fn translate(
        &self,
        text: &str,
        from: LanguageCode,
        to: LanguageCode,
    ) -> Result<Option<Translation>, TranslateError> {
        self.calls.lock().unwrap().push(text.to_string());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.unsupported {
            return Err(TranslateError::UnsupportedLanguagePair { from, to });
        }

        let reply = match self.replies.get(text) {
            Some(reply) => reply.clone(),
            None => Some(format!("[{to}] {text}")),
        };

        Ok(reply.map(|text| Translation {
            text,
            from,
            to,
            provider: "fake".to_string(),
        }))
    }

    fn metadata(&self) -> ProviderMetadata {
        ProviderMetadata {
            name: "Fake".to_string(),
            requires_api_key: false,
            free_tier_available: true,
        }
    }
}

/// Factory handing out one shared translator regardless of credentials
pub struct FakeFactory {
    pub translator: Arc<FakeTranslator>,
    pub connects: Mutex<Vec<Credentials>>,
}

impl FakeFactory {
    pub fn new(translator: Arc<FakeTranslator>) -> Self {
        Self {
            translator,
            connects: Mutex::new(vec![]),
        }
    }
}

impl TranslatorFactory for FakeFactory {
    fn connect(&self, api_url: &str, api_key: &str) -> Result<Arc<dyn Translator>, TranslateError> {
        if !api_url.starts_with("http") {
            return Err(TranslateError::InvalidUrl(api_url.to_string()));
        }
        self.connects.lock().unwrap().push(Credentials {
            url: api_url.to_string(),
            key: api_key.to_string(),
        });
        Ok(self.translator.clone())
    }
}

/// In-memory store that counts writes
#[derive(Default)]
pub struct MemoryStore {
    pub credentials: Mutex<Option<Credentials>>,
    pub pairs: Mutex<Vec<StoredPair>>,
    pub history: Mutex<Vec<HistoryEntry>>,
}

impl MemoryStore {
    pub fn with_credentials(url: &str, key: &str) -> Self {
        let store = Self::default();
        *store.credentials.lock().unwrap() = Some(Credentials {
            url: url.to_string(),
            key: key.to_string(),
        });
        store
    }

    pub fn pair_writes(&self) -> Vec<StoredPair> {
        self.pairs.lock().unwrap().clone()
    }

    pub fn history_entries(&self) -> Vec<HistoryEntry> {
        self.history.lock().unwrap().clone()
    }
}

impl SettingsStore for MemoryStore {
    fn load_language_pair(&self) -> Result<Option<StoredPair>, StoreError> {
        Ok(self.pairs.lock().unwrap().last().cloned())
    }

    fn save_language_pair(&self, pair: &StoredPair) -> Result<(), StoreError> {
        self.pairs.lock().unwrap().push(pair.clone());
        Ok(())
    }

    fn load_api_credentials(&self) -> Result<Option<Credentials>, StoreError> {
        Ok(self.credentials.lock().unwrap().clone())
    }

    fn save_api_credentials(&self, credentials: &Credentials) -> Result<(), StoreError> {
        *self.credentials.lock().unwrap() = Some(credentials.clone());
        Ok(())
    }

    fn append_history(&self, entry: &HistoryEntry) -> Result<(), StoreError> {
        self.history.lock().unwrap().push(entry.clone());
        Ok(())
    }

    fn load_history(&self, limit: usize) -> Result<Vec<HistoryEntry>, StoreError> {
        Ok(self
            .history
            .lock()
            .unwrap()
            .iter()
            .rev()
            .take(limit)
            .cloned()
            .collect())
    }

    fn clear_history(&self) -> Result<(), StoreError> {
        self.history.lock().unwrap().clear();
        Ok(())
    }
}
