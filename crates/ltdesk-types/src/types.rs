use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

/// Reserved code of the synthetic Auto-detect entry
pub const AUTO_CODE: &str = "auto";
pub const AUTO_NAME: &str = "Auto";

/// Text shown when the provider has nothing for the chosen pair
pub const NO_TRANSLATION_TEXT: &str = "No translation available for this language pair";
pub const LOADING_TEXT: &str = "Loading...";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Language {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub targets: Vec<String>,
}

impl Language {
    pub fn auto() -> Self {
        Self {
            code: AUTO_CODE.to_string(),
            name: AUTO_NAME.to_string(),
            targets: vec![],
        }
    }

    pub fn is_auto(&self) -> bool {
        self.code == AUTO_CODE
    }
}

/// Indices into the source list (Auto included) and the target list (Auto excluded)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguagePair {
    pub source_index: usize,
    pub target_index: usize,
}

impl LanguagePair {
    pub fn new(source_index: usize, target_index: usize) -> Self {
        Self {
            source_index,
            target_index,
        }
    }
}

/// One side of a persisted language pair.
///
/// Rows written by this app hold language codes. Older rows hold raw list
/// indices, which are still read so existing settings survive an upgrade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StoredLanguage {
    Code(String),
    Index(usize),
}

impl StoredLanguage {
    /// Numeric values are legacy indices, everything else is a code
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        match raw.parse::<usize>() {
            Ok(index) => StoredLanguage::Index(index),
            Err(_) => StoredLanguage::Code(raw.to_string()),
        }
    }

    pub fn to_column(&self) -> String {
        match self {
            StoredLanguage::Code(code) => code.clone(),
            StoredLanguage::Index(index) => index.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredPair {
    pub left: StoredLanguage,
    pub right: StoredLanguage,
}

impl StoredPair {
    pub fn from_codes(left: &str, right: &str) -> Self {
        Self {
            left: StoredLanguage::Code(left.to_string()),
            right: StoredLanguage::Code(right.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub url: String,
    pub key: String,
}

#[derive(Debug, Clone)]
pub struct TranslationRequest {
    pub id: u64,
    pub input_text: String,
    pub source: Language,
    pub target: Language,
    pub submitted_at: DateTime<Utc>,
}

impl TranslationRequest {
    pub fn new(id: u64, input_text: String, source: Language, target: Language) -> Self {
        Self {
            id,
            input_text,
            source,
            target,
            submitted_at: Utc::now(),
        }
    }

    /// Length as the user perceives it, in characters
    pub fn char_len(&self) -> usize {
        self.input_text.chars().count()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnavailableReason {
    /// Provider answered but had nothing for this pair
    NoTranslation,
    /// Provider did not answer within the configured timeout
    Timeout,
    /// Transport, auth or protocol failure
    Provider(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranslationOutcome {
    Text(String),
    Unavailable(UnavailableReason),
}

impl TranslationOutcome {
    /// What the output area shows for this outcome
    pub fn display_text(&self) -> String {
        match self {
            TranslationOutcome::Text(text) => text.clone(),
            TranslationOutcome::Unavailable(UnavailableReason::NoTranslation)
            | TranslationOutcome::Unavailable(UnavailableReason::Timeout) => {
                NO_TRANSLATION_TEXT.to_string()
            }
            TranslationOutcome::Unavailable(UnavailableReason::Provider(reason)) => {
                format!("Translation failed: {reason}")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub source_language: String,
    pub target_language: String,
    pub input_text: String,
    pub output_text: String,
    pub timestamp: DateTime<Utc>,
}

impl HistoryEntry {
    /// Storage stays UTC, presentation converts
    pub fn local_time(&self) -> String {
        self.timestamp
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string()
    }
}

/// Events flowing from the presentation layer into the app
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    TextChanged(String),
    SourceSelected(usize),
    TargetSelected(usize),
    SwapLanguages,
    SaveCredentials { url: String, key: String },
    RefreshLanguages,
    LoadHistory(usize),
    ClearHistory,
    Shutdown,
}

/// Events flowing from the app to the presentation layer
#[derive(Debug, Clone, PartialEq)]
pub enum DisplayEvent {
    CatalogLoaded {
        sources: Vec<String>,
        targets: Vec<String>,
        pair: LanguagePair,
    },
    CatalogUnavailable(String),
    PairChanged(LanguagePair),
    SetInput(String),
    ShowLoading,
    ShowOutput(String),
    ShowHistory(Vec<HistoryEntry>),
    CredentialsRequired,
    Notice(String),
}
