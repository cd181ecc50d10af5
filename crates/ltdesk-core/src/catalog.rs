use std::collections::HashSet;

use ltdesk_translator::ProviderLanguage;
use ltdesk_types::{AUTO_CODE, Language, LanguagePair, StoredLanguage, StoredPair};
use unicode_normalization::UnicodeNormalization;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("Provider returned no usable languages")]
    Empty,
}

/// Ordered set of languages with the synthetic Auto entry at position 0.
///
/// The source list is the whole catalog. The target list is the same
/// sequence without Auto, so target index `i` is source index `i + 1`.
#[derive(Debug, Clone, PartialEq)]
pub struct LanguageCatalog {
    languages: Vec<Language>,
}

fn normalize_entry(raw: &ProviderLanguage) -> Option<Language> {
    let code = raw.code.as_deref()?.trim().to_string();
    let name: String = raw.name.as_deref()?.trim().nfc().collect();

    if code.is_empty() || name.is_empty() || code.eq_ignore_ascii_case(AUTO_CODE) {
        return None;
    }

    Some(Language {
        code,
        name,
        targets: raw
            .targets
            .as_ref()
            .map(|t| t.iter().map(|c| c.trim().to_string()).collect())
            .unwrap_or_default(),
    })
}

impl LanguageCatalog {
    pub fn build(raw: &[ProviderLanguage]) -> Result<Self, CatalogError> {
        let mut seen = HashSet::new();
        let mut languages = vec![Language::auto()];

        for language in raw.iter().filter_map(normalize_entry) {
            if seen.insert(language.code.to_ascii_lowercase()) {
                languages.push(language);
            } else {
                tracing::debug!("Dropping duplicate language code '{}'", language.code);
            }
        }

        if languages.len() == 1 {
            return Err(CatalogError::Empty);
        }

        Ok(Self { languages })
    }

    pub fn source_list(&self) -> &[Language] {
        &self.languages
    }

    pub fn target_list(&self) -> &[Language] {
        &self.languages[1..]
    }

    pub fn source(&self, index: usize) -> Option<&Language> {
        self.source_list().get(index)
    }

    pub fn target(&self, index: usize) -> Option<&Language> {
        self.target_list().get(index)
    }

    pub fn source_index(&self, code: &str) -> Option<usize> {
        self.source_list()
            .iter()
            .position(|l| l.code.eq_ignore_ascii_case(code))
    }

    pub fn target_index(&self, code: &str) -> Option<usize> {
        self.target_list()
            .iter()
            .position(|l| l.code.eq_ignore_ascii_case(code))
    }

    pub fn source_names(&self) -> Vec<String> {
        self.source_list().iter().map(|l| l.name.clone()).collect()
    }

    pub fn target_names(&self) -> Vec<String> {
        self.target_list().iter().map(|l| l.name.clone()).collect()
    }

    pub fn is_valid(&self, pair: LanguagePair) -> bool {
        self.resolve(pair).is_some()
    }

    pub fn resolve(&self, pair: LanguagePair) -> Option<(&Language, &Language)> {
        Some((self.source(pair.source_index)?, self.target(pair.target_index)?))
    }

    /// Persistable form of a pair, by language code
    pub fn stored_pair(&self, pair: LanguagePair) -> Option<StoredPair> {
        let (source, target) = self.resolve(pair)?;
        Some(StoredPair::from_codes(&source.code, &target.code))
    }

    /// Map a persisted pair back to indices, falling back to `(0, 0)`
    /// when either side no longer matches this catalog
    pub fn restore(&self, stored: Option<&StoredPair>) -> LanguagePair {
        let Some(stored) = stored else {
            return LanguagePair::default();
        };

        let source = match &stored.left {
            StoredLanguage::Code(code) => self.source_index(code),
            StoredLanguage::Index(index) => self.source(*index).map(|_| *index),
        };
        let target = match &stored.right {
            StoredLanguage::Code(code) => self.target_index(code),
            StoredLanguage::Index(index) => self.target(*index).map(|_| *index),
        };

        match (source, target) {
            (Some(source_index), Some(target_index)) => {
                LanguagePair::new(source_index, target_index)
            }
            _ => {
                tracing::warn!("Stored language pair {:?} not in catalog, using defaults", stored);
                LanguagePair::default()
            }
        }
    }
}
