//! Session controller: owns the catalog snapshot, the selected pair, the
//! typed text and the sequencer, and reacts to presentation events.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use kanal::{AsyncReceiver, AsyncSender};
use ltdesk_config::Config;
use ltdesk_translator::{Translator, TranslatorFactory};
use ltdesk_types::{
    AppEvent, Credentials, DisplayEvent, HistoryEntry, LanguagePair, TranslationOutcome,
    TranslationRequest,
};
use tokio_util::sync::CancellationToken;

use crate::catalog::LanguageCatalog;
use crate::debounce::Debouncer;
use crate::error::CoreError;
use crate::pair::{self, PairPersistence, SwapError};
use crate::sequencer::{Completion, Sequencer, Started, SubmitResult};
use crate::store::{SettingsStore, StoreError};

#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub debounce: Duration,
    pub loading_threshold: usize,
    pub request_timeout: Duration,
    pub history_limit: usize,
}

impl SessionSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            debounce: config.sequencer.debounce(),
            loading_threshold: config.sequencer.loading_threshold,
            request_timeout: config.sequencer.request_timeout(),
            history_limit: config.history.limit,
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

pub struct TranslationSession {
    store: Arc<dyn SettingsStore>,
    factory: Arc<dyn TranslatorFactory>,
    display_tx: AsyncSender<DisplayEvent>,
    settings: SessionSettings,

    translator: Option<Arc<dyn Translator>>,
    catalog: Option<Arc<LanguageCatalog>>,
    pair: LanguagePair,
    input: String,
    /// Output text, only while it is a real translation
    last_translation: Option<String>,
    persistence: PairPersistence,

    debouncer: Debouncer,
    sequencer: Sequencer,
    next_request_id: u64,
}

impl TranslationSession {
    pub fn new(
        store: Arc<dyn SettingsStore>,
        factory: Arc<dyn TranslatorFactory>,
        display_tx: AsyncSender<DisplayEvent>,
        settings: SessionSettings,
    ) -> Result<Self, CoreError> {
        let last_saved = store.load_language_pair()?;

        Ok(Self {
            debouncer: Debouncer::new(settings.debounce),
            sequencer: Sequencer::new(settings.request_timeout, settings.loading_threshold),
            persistence: PairPersistence::new(last_saved),
            store,
            factory,
            display_tx,
            settings,
            translator: None,
            catalog: None,
            pair: LanguagePair::default(),
            input: String::new(),
            last_translation: None,
            next_request_id: 0,
        })
    }

    /// Restore credentials and the catalog, then serve events until
    /// cancelled, told to shut down, or either channel closes.
    pub async fn run(
        mut self,
        events_rx: AsyncReceiver<AppEvent>,
        cancel: CancellationToken,
    ) -> Result<(), CoreError> {
        match self.start().await {
            Err(CoreError::DisplayClosed) => return Ok(()),
            result => result?,
        }

        tracing::info!("[SESSION] Waiting for events");
        loop {
            let result = tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("[SESSION] Cancelled");
                    break;
                }
                event = events_rx.recv() => match event {
                    Ok(AppEvent::Shutdown) => {
                        tracing::info!("[SESSION] Shutdown requested");
                        break;
                    }
                    Ok(event) => self.handle_event(event).await,
                    Err(_) => {
                        tracing::info!("[SESSION] Event channel closed");
                        break;
                    }
                },
                _ = self.debouncer.elapsed() => {
                    self.debouncer.cancel();
                    self.translate_current().await
                }
                completion = self.sequencer.next_completion() => self.on_completion(completion).await,
            };

            match result {
                Ok(()) => {}
                Err(CoreError::DisplayClosed) => {
                    tracing::info!("[SESSION] Presentation went away");
                    break;
                }
                Err(e) => return Err(e),
            }
        }

        Ok(())
    }

    async fn start(&mut self) -> Result<(), CoreError> {
        match self.store.load_api_credentials()? {
            Some(credentials) => match self.factory.connect(&credentials.url, &credentials.key) {
                Ok(translator) => {
                    self.set_translator(Some(translator));
                    self.load_catalog().await
                }
                Err(e) => {
                    tracing::warn!("Stored API settings unusable: {}", e);
                    self.emit(DisplayEvent::Notice(format!("Stored API settings unusable: {e}")))
                        .await?;
                    self.emit(DisplayEvent::CredentialsRequired).await
                }
            },
            None => {
                tracing::info!("No API settings stored yet");
                self.emit(DisplayEvent::CredentialsRequired).await
            }
        }
    }

    async fn handle_event(&mut self, event: AppEvent) -> Result<(), CoreError> {
        tracing::debug!("[SESSION] Event: {:?}", std::mem::discriminant(&event));
        match event {
            AppEvent::TextChanged(text) => {
                self.input = text;
                self.debouncer.trigger();
                Ok(())
            }
            AppEvent::SourceSelected(index) => {
                self.select(LanguagePair::new(index, self.pair.target_index))
                    .await
            }
            AppEvent::TargetSelected(index) => {
                self.select(LanguagePair::new(self.pair.source_index, index))
                    .await
            }
            AppEvent::SwapLanguages => self.swap().await,
            AppEvent::SaveCredentials { url, key } => self.save_credentials(url, key).await,
            AppEvent::RefreshLanguages => self.load_catalog().await,
            AppEvent::LoadHistory(limit) => {
                let limit = if limit == 0 {
                    self.settings.history_limit
                } else {
                    limit
                };
                match self.store.load_history(limit) {
                    Ok(entries) => self.emit(DisplayEvent::ShowHistory(entries)).await,
                    Err(e) => self.report_store_error("load history", e).await,
                }
            }
            AppEvent::ClearHistory => match self.store.clear_history() {
                Ok(()) => {
                    tracing::info!("History cleared");
                    self.emit(DisplayEvent::ShowHistory(vec![])).await
                }
                Err(e) => self.report_store_error("clear history", e).await,
            },
            AppEvent::Shutdown => Ok(()),
        }
    }

    fn set_translator(&mut self, translator: Option<Arc<dyn Translator>>) {
        if let Some(t) = &translator {
            tracing::info!("Using provider {}", t.metadata().name);
        }
        self.sequencer.set_translator(translator.clone());
        self.translator = translator;
    }

    async fn save_credentials(&mut self, url: String, key: String) -> Result<(), CoreError> {
        let credentials = Credentials {
            url: url.trim().to_string(),
            key: key.trim().to_string(),
        };

        let translator = match self.factory.connect(&credentials.url, &credentials.key) {
            Ok(translator) => translator,
            Err(e) => {
                tracing::warn!("Rejected API settings: {}", e);
                return self
                    .emit(DisplayEvent::Notice(format!("Invalid API settings: {e}")))
                    .await;
            }
        };

        if let Err(e) = self.store.save_api_credentials(&credentials) {
            self.report_store_error("save API settings", e).await?;
        }

        self.set_translator(Some(translator));
        self.load_catalog().await
    }

    async fn fetch_catalog(&self) -> Result<LanguageCatalog, CoreError> {
        let translator = self.translator.clone().ok_or(CoreError::CredentialsMissing)?;
        let timeout = self.settings.request_timeout;
        let raw = tokio::time::timeout(timeout, translator.languages())
            .await
            .map_err(|_| CoreError::Timeout(timeout))??;
        Ok(LanguageCatalog::build(&raw)?)
    }

    /// Fetch languages, rebuild the catalog snapshot and restore the saved pair
    async fn load_catalog(&mut self) -> Result<(), CoreError> {
        self.persistence.begin_loading();

        let catalog = match self.fetch_catalog().await {
            Ok(catalog) => catalog,
            Err(CoreError::CredentialsMissing) => {
                return self.emit(DisplayEvent::CredentialsRequired).await;
            }
            Err(e) => {
                tracing::error!("Failed to load languages: {}", e);
                self.catalog = None;
                return self.emit(DisplayEvent::CatalogUnavailable(e.to_string())).await;
            }
        };

        let stored = self.store.load_language_pair().unwrap_or_else(|e| {
            tracing::warn!("Could not read saved language pair: {}", e);
            None
        });
        self.pair = catalog.restore(stored.as_ref());

        tracing::info!(
            "Loaded {} languages, pair {:?}",
            catalog.target_list().len(),
            self.pair
        );

        let event = DisplayEvent::CatalogLoaded {
            sources: catalog.source_names(),
            targets: catalog.target_names(),
            pair: self.pair,
        };
        self.catalog = Some(Arc::new(catalog));
        self.emit(event).await?;

        self.persistence.finish_loading();
        self.translate_current().await
    }

    async fn select(&mut self, pair: LanguagePair) -> Result<(), CoreError> {
        let Some(catalog) = self.catalog.clone() else {
            tracing::debug!("Ignoring language selection without a catalog");
            return Ok(());
        };

        if !catalog.is_valid(pair) {
            tracing::warn!("Ignoring out of range selection {:?}", pair);
            return Ok(());
        }

        if pair == self.pair {
            return Ok(());
        }

        self.pair = pair;
        self.persist_pair(&catalog).await?;
        self.translate_current().await
    }

    async fn swap(&mut self) -> Result<(), CoreError> {
        let Some(catalog) = self.catalog.clone() else {
            return Ok(());
        };

        let swapped = match pair::swap(&catalog, self.pair) {
            Ok(swapped) => swapped,
            Err(e @ SwapError::AutoSource { .. }) => {
                tracing::info!("{}", e);
                self.last_translation = None;
                return self.emit(DisplayEvent::ShowOutput(e.to_string())).await;
            }
            Err(e) => {
                tracing::warn!("{}", e);
                return Ok(());
            }
        };

        self.pair = swapped;
        self.emit(DisplayEvent::PairChanged(swapped)).await?;

        match self.last_translation.take() {
            Some(translated) => {
                let previous_input = std::mem::replace(&mut self.input, translated);
                self.emit(DisplayEvent::SetInput(self.input.clone())).await?;
                self.emit(DisplayEvent::ShowOutput(previous_input.clone()))
                    .await?;
                self.last_translation = Some(previous_input);
            }
            None => self.emit(DisplayEvent::ShowOutput(String::new())).await?,
        }

        self.persist_pair(&catalog).await?;
        self.debouncer.cancel();
        self.translate_current().await
    }

    async fn persist_pair(&mut self, catalog: &LanguageCatalog) -> Result<(), CoreError> {
        let Some(stored) = catalog.stored_pair(self.pair) else {
            return Ok(());
        };

        let previous = self.persistence.last_saved().cloned();
        if let Some(stored) = self.persistence.should_save(stored) {
            tracing::debug!("Saving language pair {:?}", stored);
            if let Err(e) = self.store.save_language_pair(&stored) {
                self.persistence.rollback(previous);
                return self.report_store_error("save language pair", e).await;
            }
        }
        Ok(())
    }

    /// Build a request from what is selected and typed right now
    async fn translate_current(&mut self) -> Result<(), CoreError> {
        let Some(catalog) = self.catalog.clone() else {
            tracing::debug!("No catalog loaded, skipping translation");
            return Ok(());
        };

        if !self.sequencer.has_translator() {
            return self.emit(DisplayEvent::CredentialsRequired).await;
        }

        if self.input.is_empty() {
            return Ok(());
        }

        let Some((source, target)) = catalog.resolve(self.pair) else {
            tracing::warn!("Selected pair {:?} not in catalog", self.pair);
            return Ok(());
        };

        self.next_request_id += 1;
        let request = TranslationRequest::new(
            self.next_request_id,
            self.input.clone(),
            source.clone(),
            target.clone(),
        );

        match self.sequencer.submit(request) {
            SubmitResult::Started(started) => self.on_started(started).await,
            SubmitResult::Queued | SubmitResult::Superseded { .. } => Ok(()),
        }
    }

    async fn on_started(&self, started: Started) -> Result<(), CoreError> {
        if started.show_loading {
            self.emit(DisplayEvent::ShowLoading).await?;
        }
        Ok(())
    }

    async fn on_completion(&mut self, completion: Completion) -> Result<(), CoreError> {
        let Some(finished) = self.sequencer.complete(completion) else {
            return Ok(());
        };

        let Completion { request, outcome } = finished.completion;
        self.emit(DisplayEvent::ShowOutput(outcome.display_text()))
            .await?;

        match outcome {
            TranslationOutcome::Text(text) => {
                self.last_translation = Some(text.clone());
                self.record_history(request, text).await?;
            }
            TranslationOutcome::Unavailable(_) => {
                self.last_translation = None;
            }
        }

        if let Some(next) = finished.next {
            self.on_started(next).await?;
        }
        Ok(())
    }

    async fn record_history(
        &self,
        request: TranslationRequest,
        output_text: String,
    ) -> Result<(), CoreError> {
        let entry = HistoryEntry {
            source_language: request.source.name,
            target_language: request.target.name,
            input_text: request.input_text,
            output_text,
            timestamp: Utc::now(),
        };

        if let Err(e) = self.store.append_history(&entry) {
            return self.report_store_error("save history", e).await;
        }
        Ok(())
    }

    async fn report_store_error(&self, action: &str, e: StoreError) -> Result<(), CoreError> {
        tracing::error!("Failed to {}: {}", action, e);
        self.emit(DisplayEvent::Notice(format!("Failed to {action}: {e}")))
            .await
    }

    async fn emit(&self, event: DisplayEvent) -> Result<(), CoreError> {
        self.display_tx
            .send(event)
            .await
            .map_err(|_| CoreError::DisplayClosed)
    }
}

#[cfg(test)]
mod tests {
    use tokio::task::JoinHandle;
    use tokio::time::{Instant, timeout};

    use ltdesk_translator::ProviderLanguage;
    use ltdesk_types::{NO_TRANSLATION_TEXT, StoredPair};

    use super::*;
    use crate::testing::{FakeFactory, FakeTranslator, MemoryStore};

    struct Harness {
        events_tx: AsyncSender<AppEvent>,
        display_rx: AsyncReceiver<DisplayEvent>,
        store: Arc<MemoryStore>,
        factory: Arc<FakeFactory>,
        translator: Arc<FakeTranslator>,
        task: JoinHandle<Result<(), CoreError>>,
    }

    impl Harness {
        fn spawn(store: MemoryStore, translator: FakeTranslator) -> Self {
            let store = Arc::new(store);
            let translator = Arc::new(translator);
            let factory = Arc::new(FakeFactory::new(translator.clone()));
            let (events_tx, events_rx) = kanal::unbounded_async();
            let (display_tx, display_rx) = kanal::unbounded_async();

            let session = TranslationSession::new(
                store.clone(),
                factory.clone(),
                display_tx,
                SessionSettings::default(),
            )
            .unwrap();
            let task = tokio::spawn(session.run(events_rx, CancellationToken::new()));

            Self {
                events_tx,
                display_rx,
                store,
                factory,
                translator,
                task,
            }
        }

        fn connected(translator: FakeTranslator) -> Self {
            Self::spawn(
                MemoryStore::with_credentials("http://localhost:5000", "key"),
                translator,
            )
        }

        async fn send(&self, event: AppEvent) {
            self.events_tx.send(event).await.unwrap();
        }

        async fn next(&self) -> DisplayEvent {
            timeout(Duration::from_secs(10), self.display_rx.recv())
                .await
                .expect("no display event in time")
                .unwrap()
        }

        /// Skip events until one matches
        async fn wait_for(&self, matches: impl Fn(&DisplayEvent) -> bool) -> DisplayEvent {
            loop {
                let event = self.next().await;
                if matches(&event) {
                    return event;
                }
            }
        }

        async fn next_output(&self) -> String {
            match self
                .wait_for(|e| matches!(e, DisplayEvent::ShowOutput(_)))
                .await
            {
                DisplayEvent::ShowOutput(text) => text,
                _ => unreachable!(),
            }
        }

        /// Round-trip through the event loop so earlier events are handled
        async fn barrier(&self) {
            self.send(AppEvent::LoadHistory(1)).await;
            self.wait_for(|e| matches!(e, DisplayEvent::ShowHistory(_)))
                .await;
        }

        async fn shutdown(self) {
            self.send(AppEvent::Shutdown).await;
            self.task.await.unwrap().unwrap();
        }
    }

    fn is_catalog(event: &DisplayEvent) -> bool {
        matches!(event, DisplayEvent::CatalogLoaded { .. })
    }

    #[tokio::test(start_paused = true)]
    async fn auto_to_spanish_scenario() {
        let harness = Harness::connected(FakeTranslator::new().with_reply("hello", Some("hola")));

        let loaded = harness.wait_for(is_catalog).await;
        assert_eq!(
            loaded,
            DisplayEvent::CatalogLoaded {
                sources: vec!["Auto".into(), "English".into(), "Spanish".into()],
                targets: vec!["English".into(), "Spanish".into()],
                pair: LanguagePair::new(0, 0),
            }
        );

        harness.send(AppEvent::TargetSelected(1)).await;
        harness.send(AppEvent::TextChanged("hello".into())).await;
        assert_eq!(harness.next_output().await, "hola");

        let history = harness.store.history_entries();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].source_language, "Auto");
        assert_eq!(history[0].target_language, "Spanish");
        assert_eq!(history[0].input_text, "hello");
        assert_eq!(history[0].output_text, "hola");

        harness.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn no_translation_writes_no_history() {
        let harness = Harness::connected(FakeTranslator::new().with_reply("hello", None));
        harness.wait_for(is_catalog).await;

        harness.send(AppEvent::TextChanged("hello".into())).await;
        assert_eq!(harness.next_output().await, NO_TRANSLATION_TEXT);
        assert!(harness.store.history_entries().is_empty());

        harness.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn keystrokes_collapse_into_one_request() {
        let harness = Harness::connected(FakeTranslator::new());
        harness.wait_for(is_catalog).await;

        let start = Instant::now();
        harness.send(AppEvent::TextChanged("h".into())).await;
        tokio::time::sleep(Duration::from_millis(100)).await;
        harness.send(AppEvent::TextChanged("he".into())).await;
        tokio::time::sleep(Duration::from_millis(100)).await;
        harness.send(AppEvent::TextChanged("hel".into())).await;
        tokio::time::sleep(Duration::from_millis(499)).await;
        assert!(harness.translator.calls().is_empty());

        assert_eq!(harness.next_output().await, "[en] hel");
        assert!(start.elapsed() >= Duration::from_millis(700));
        assert_eq!(harness.translator.calls(), vec!["hel".to_string()]);

        harness.shutdown().await;
    }

    async fn events_until_output(harness: &Harness) -> Vec<DisplayEvent> {
        let mut events = vec![];
        loop {
            let event = harness.next().await;
            let done = matches!(event, DisplayEvent::ShowOutput(_));
            events.push(event);
            if done {
                return events;
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn loading_message_only_for_long_input() {
        let harness = Harness::connected(FakeTranslator::new());
        harness.wait_for(is_catalog).await;

        harness.send(AppEvent::TextChanged("a".repeat(300))).await;
        let events = events_until_output(&harness).await;
        assert!(!events.contains(&DisplayEvent::ShowLoading));

        harness.send(AppEvent::TextChanged("a".repeat(301))).await;
        let events = events_until_output(&harness).await;
        assert_eq!(events.first(), Some(&DisplayEvent::ShowLoading));

        harness.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn loading_message_emitted_even_on_failure() {
        let harness = Harness::connected(FakeTranslator::new().unsupported());
        harness.wait_for(is_catalog).await;

        harness.send(AppEvent::TextChanged("b".repeat(400))).await;
        let events = events_until_output(&harness).await;
        assert_eq!(
            events,
            vec![
                DisplayEvent::ShowLoading,
                DisplayEvent::ShowOutput(NO_TRANSLATION_TEXT.to_string())
            ]
        );

        harness.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn overlapping_requests_keep_latest() {
        let harness = Harness::connected(FakeTranslator::gated());
        harness.wait_for(is_catalog).await;

        harness.send(AppEvent::TextChanged("first".into())).await;
        tokio::time::sleep(Duration::from_millis(600)).await;
        harness.send(AppEvent::TextChanged("second".into())).await;
        tokio::time::sleep(Duration::from_millis(600)).await;
        harness.send(AppEvent::TextChanged("third".into())).await;
        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(harness.translator.calls(), vec!["first".to_string()]);

        harness.translator.release(2);
        assert_eq!(harness.next_output().await, "[en] first");
        assert_eq!(harness.next_output().await, "[en] third");
        assert_eq!(
            harness.translator.calls(),
            vec!["first".to_string(), "third".to_string()]
        );
        assert_eq!(harness.translator.max_in_flight(), 1);

        harness.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn pair_persistence_skips_restores_and_repeats() {
        let store = MemoryStore::with_credentials("http://localhost:5000", "");
        store.pairs.lock().unwrap().push(StoredPair::from_codes("en", "es"));
        let harness = Harness::spawn(store, FakeTranslator::new());

        match harness.wait_for(is_catalog).await {
            DisplayEvent::CatalogLoaded { pair, .. } => assert_eq!(pair, LanguagePair::new(1, 1)),
            _ => unreachable!(),
        }

        harness.send(AppEvent::TargetSelected(1)).await;
        harness.barrier().await;
        assert_eq!(harness.store.pair_writes().len(), 1);

        harness.send(AppEvent::SourceSelected(0)).await;
        harness.send(AppEvent::SourceSelected(0)).await;
        harness.barrier().await;
        assert_eq!(
            harness.store.pair_writes(),
            vec![
                StoredPair::from_codes("en", "es"),
                StoredPair::from_codes("auto", "es")
            ]
        );

        harness.send(AppEvent::RefreshLanguages).await;
        harness.wait_for(is_catalog).await;
        harness.barrier().await;
        assert_eq!(harness.store.pair_writes().len(), 2);

        harness.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn out_of_range_selection_is_ignored() {
        let harness = Harness::connected(FakeTranslator::new());
        harness.wait_for(is_catalog).await;

        harness.send(AppEvent::TargetSelected(9)).await;
        harness.barrier().await;
        assert!(harness.store.pair_writes().is_empty());

        harness.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn swap_with_auto_is_refused() {
        let harness = Harness::connected(FakeTranslator::new());
        harness.wait_for(is_catalog).await;

        harness.send(AppEvent::SwapLanguages).await;
        assert_eq!(harness.next_output().await, "Unable to swap Auto with English");
        harness.barrier().await;
        assert!(harness.store.pair_writes().is_empty());

        harness.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn swap_exchanges_languages_and_text() {
        let harness = Harness::connected(FakeTranslator::new().with_reply("hello", Some("hola")));
        harness.wait_for(is_catalog).await;

        harness.send(AppEvent::SourceSelected(1)).await;
        harness.send(AppEvent::TargetSelected(1)).await;
        harness.send(AppEvent::TextChanged("hello".into())).await;
        assert_eq!(harness.next_output().await, "hola");

        harness.send(AppEvent::SwapLanguages).await;
        assert_eq!(
            harness.next().await,
            DisplayEvent::PairChanged(LanguagePair::new(2, 0))
        );
        assert_eq!(harness.next().await, DisplayEvent::SetInput("hola".into()));
        assert_eq!(harness.next().await, DisplayEvent::ShowOutput("hello".into()));
        assert_eq!(harness.next_output().await, "[en] hola");
        assert_eq!(
            harness.store.pair_writes().last(),
            Some(&StoredPair::from_codes("es", "en"))
        );

        harness.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn missing_credentials_prompt_and_block_translation() {
        let harness = Harness::spawn(MemoryStore::default(), FakeTranslator::new());
        assert_eq!(harness.next().await, DisplayEvent::CredentialsRequired);

        harness.send(AppEvent::TextChanged("hi".into())).await;
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(harness.translator.calls().is_empty());

        harness
            .send(AppEvent::SaveCredentials {
                url: " http://localhost:5000 ".into(),
                key: "secret".into(),
            })
            .await;
        harness.wait_for(is_catalog).await;
        assert_eq!(harness.next_output().await, "[en] hi");
        assert_eq!(
            harness.store.load_api_credentials().unwrap(),
            Some(Credentials {
                url: "http://localhost:5000".into(),
                key: "secret".into()
            })
        );
        assert_eq!(harness.factory.connects.lock().unwrap().len(), 1);

        harness.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn invalid_credentials_are_not_saved() {
        let harness = Harness::spawn(MemoryStore::default(), FakeTranslator::new());
        assert_eq!(harness.next().await, DisplayEvent::CredentialsRequired);

        harness
            .send(AppEvent::SaveCredentials {
                url: "localhost".into(),
                key: String::new(),
            })
            .await;
        assert!(matches!(harness.next().await, DisplayEvent::Notice(_)));
        assert_eq!(harness.store.load_api_credentials().unwrap(), None);

        harness.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn empty_catalog_is_reported() {
        let harness = Harness::connected(
            FakeTranslator::new().with_languages(vec![ProviderLanguage::default()]),
        );
        assert!(matches!(
            harness.next().await,
            DisplayEvent::CatalogUnavailable(_)
        ));

        harness.send(AppEvent::TextChanged("hi".into())).await;
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(harness.translator.calls().is_empty());

        harness.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn clear_history_empties_it() {
        let harness = Harness::connected(FakeTranslator::new());
        harness.wait_for(is_catalog).await;

        harness.send(AppEvent::TextChanged("one".into())).await;
        harness.next_output().await;
        harness.send(AppEvent::LoadHistory(100)).await;
        match harness
            .wait_for(|e| matches!(e, DisplayEvent::ShowHistory(_)))
            .await
        {
            DisplayEvent::ShowHistory(entries) => assert_eq!(entries.len(), 1),
            _ => unreachable!(),
        }

        harness.send(AppEvent::ClearHistory).await;
        assert_eq!(harness.next().await, DisplayEvent::ShowHistory(vec![]));
        harness.send(AppEvent::LoadHistory(100)).await;
        assert_eq!(harness.next().await, DisplayEvent::ShowHistory(vec![]));

        harness.shutdown().await;
    }

    #[tokio::test]
    async fn cancellation_stops_the_loop() {
        let store = Arc::new(MemoryStore::default());
        let factory = Arc::new(FakeFactory::new(Arc::new(FakeTranslator::new())));
        let (_events_tx, events_rx) = kanal::unbounded_async::<AppEvent>();
        let (display_tx, _display_rx) = kanal::unbounded_async();
        let session =
            TranslationSession::new(store, factory, display_tx, SessionSettings::default())
                .unwrap();

        let cancel = CancellationToken::new();
        let task = tokio::spawn(session.run(events_rx, cancel.clone()));
        cancel.cancel();
        let result = timeout(Duration::from_secs(2), task).await.unwrap().unwrap();
        assert!(result.is_ok());
    }
}
