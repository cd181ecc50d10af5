use ltdesk_types::{LanguagePair, StoredPair};

use crate::catalog::LanguageCatalog;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SwapError {
    /// Auto-detect can only ever be a source
    #[error("Unable to swap Auto with {target}")]
    AutoSource { target: String },

    #[error("Language pair {0:?} is not in the catalog")]
    OutOfRange(LanguagePair),
}

/// Exchange source and target languages.
///
/// Target index `t` names the same language as source index `t + 1`, so the
/// new source is `t + 1` and the new target is `s - 1`. A source of Auto has
/// no target counterpart and is rejected.
pub fn swap(catalog: &LanguageCatalog, pair: LanguagePair) -> Result<LanguagePair, SwapError> {
    let (source, target) = catalog
        .resolve(pair)
        .ok_or(SwapError::OutOfRange(pair))?;

    if source.is_auto() {
        return Err(SwapError::AutoSource {
            target: target.name.clone(),
        });
    }

    let swapped = LanguagePair::new(pair.target_index + 1, pair.source_index - 1);
    debug_assert!(catalog.is_valid(swapped));
    Ok(swapped)
}

/// Decides when a pair change reaches the settings store.
///
/// Nothing is written while the catalog and preferences are being restored,
/// and a pair equal to the last persisted one is never written again.
#[derive(Debug, Default)]
pub struct PairPersistence {
    loading: bool,
    last_saved: Option<StoredPair>,
}

impl PairPersistence {
    pub fn new(last_saved: Option<StoredPair>) -> Self {
        Self {
            loading: true,
            last_saved,
        }
    }

    pub fn begin_loading(&mut self) {
        self.loading = true;
    }

    pub fn finish_loading(&mut self) {
        self.loading = false;
    }

    /// Returns the pair to write, if any, and remembers it as persisted
    pub fn should_save(&mut self, pair: StoredPair) -> Option<StoredPair> {
        if self.loading {
            return None;
        }
        if self.last_saved.as_ref() == Some(&pair) {
            return None;
        }
        self.last_saved = Some(pair.clone());
        Some(pair)
    }

    /// Forget a write that failed so the next change retries it
    pub fn rollback(&mut self, previous: Option<StoredPair>) {
        self.last_saved = previous;
    }

    pub fn last_saved(&self) -> Option<&StoredPair> {
        self.last_saved.as_ref()
    }
}
