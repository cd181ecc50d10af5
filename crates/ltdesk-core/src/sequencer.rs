//! Single-flight translation sequencing.
//!
//! At most one request executes at a time and at most one waits behind it.
//! A request submitted while another is already waiting takes its place, so
//! the latest user intent always runs and superseded requests never run.

use std::sync::Arc;
use std::time::Duration;

use kanal::{AsyncReceiver, AsyncSender};
use ltdesk_translator::{TranslateError, Translator};
use ltdesk_types::{TranslationOutcome, TranslationRequest, UnavailableReason};

/// Pending work, as a value.
#[derive(Debug, Default)]
pub enum SequencerState {
    #[default]
    Idle,
    Running {
        active: TranslationRequest,
    },
    Queued {
        active: TranslationRequest,
        queued: TranslationRequest,
    },
}

/// What a submission did to the pending work
#[derive(Debug)]
pub enum Submitted {
    /// Nothing was running, execute this now
    Start(TranslationRequest),
    /// Parked behind the running request
    Queued,
    /// Parked, and the previously parked request was dropped
    Replaced(TranslationRequest),
}

impl SequencerState {
    pub fn submit(self, request: TranslationRequest) -> (Self, Submitted) {
        match self {
            SequencerState::Idle => (
                SequencerState::Running {
                    active: request.clone(),
                },
                Submitted::Start(request),
            ),
            SequencerState::Running { active } => (
                SequencerState::Queued {
                    active,
                    queued: request,
                },
                Submitted::Queued,
            ),
            SequencerState::Queued { active, queued } => (
                SequencerState::Queued {
                    active,
                    queued: request,
                },
                Submitted::Replaced(queued),
            ),
        }
    }

    /// The active request finished. Returns the request to start next, if any.
    pub fn complete(self) -> (Self, Option<TranslationRequest>) {
        match self {
            SequencerState::Idle | SequencerState::Running { .. } => (SequencerState::Idle, None),
            SequencerState::Queued { queued, .. } => (
                SequencerState::Running {
                    active: queued.clone(),
                },
                Some(queued),
            ),
        }
    }

    pub fn active(&self) -> Option<&TranslationRequest> {
        match self {
            SequencerState::Idle => None,
            SequencerState::Running { active } | SequencerState::Queued { active, .. } => {
                Some(active)
            }
        }
    }

    #[cfg(test)]
    pub fn queued(&self) -> Option<&TranslationRequest> {
        match self {
            SequencerState::Queued { queued, .. } => Some(queued),
            _ => None,
        }
    }

    #[cfg(test)]
    pub fn is_idle(&self) -> bool {
        matches!(self, SequencerState::Idle)
    }
}

/// A finished execution, bound to the request that produced it
#[derive(Debug, Clone)]
pub struct Completion {
    pub request: TranslationRequest,
    pub outcome: TranslationOutcome,
}

/// An execution that was just started
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Started {
    pub request_id: u64,
    /// Input is long enough to warrant an interim loading message
    pub show_loading: bool,
}

#[derive(Debug)]
pub enum SubmitResult {
    Started(Started),
    Queued,
    Superseded { discarded_id: u64 },
}

#[derive(Debug)]
pub struct Finished {
    pub completion: Completion,
    pub next: Option<Started>,
}

/// Drives [`SequencerState`], running executions on background tasks and
/// handing their results back through a channel.
pub struct Sequencer {
    state: SequencerState,
    translator: Option<Arc<dyn Translator>>,
    request_timeout: Duration,
    loading_threshold: usize,
    completions_tx: AsyncSender<Completion>,
    completions_rx: AsyncReceiver<Completion>,
}

impl Sequencer {
    pub fn new(request_timeout: Duration, loading_threshold: usize) -> Self {
        let (completions_tx, completions_rx) = kanal::bounded_async(4);
        Self {
            state: SequencerState::Idle,
            translator: None,
            request_timeout,
            loading_threshold,
            completions_tx,
            completions_rx,
        }
    }

    /// Swap the provider. Requests started afterwards use the new one.
    pub fn set_translator(&mut self, translator: Option<Arc<dyn Translator>>) {
        self.translator = translator;
    }

    pub fn has_translator(&self) -> bool {
        self.translator.is_some()
    }

    #[cfg(test)]
    pub fn state(&self) -> &SequencerState {
        &self.state
    }

    /// Never waits on the execution itself
    pub fn submit(&mut self, request: TranslationRequest) -> SubmitResult {
        let (state, submitted) = std::mem::take(&mut self.state).submit(request);
        self.state = state;

        match submitted {
            Submitted::Start(request) => SubmitResult::Started(self.start(request)),
            Submitted::Queued => {
                tracing::debug!("Translation queued behind running request");
                SubmitResult::Queued
            }
            Submitted::Replaced(discarded) => {
                tracing::debug!("Queued request {} superseded", discarded.id);
                SubmitResult::Superseded {
                    discarded_id: discarded.id,
                }
            }
        }
    }

    /// Wait for the running execution to report back
    pub async fn next_completion(&self) -> Completion {
        match self.completions_rx.recv().await {
            Ok(completion) => completion,
            // The sender lives in self, so this only happens during teardown
            Err(_) => std::future::pending().await,
        }
    }

    /// Record a completion and start the queued request, if there is one
    pub fn complete(&mut self, completion: Completion) -> Option<Finished> {
        let active_id = self.state.active().map(|r| r.id);
        if active_id != Some(completion.request.id) {
            tracing::warn!(
                "Ignoring completion for request {} (active: {:?})",
                completion.request.id,
                active_id
            );
            return None;
        }

        let (state, next) = std::mem::take(&mut self.state).complete();
        self.state = state;

        Some(Finished {
            completion,
            next: next.map(|request| self.start(request)),
        })
    }

    fn start(&self, request: TranslationRequest) -> Started {
        let started = Started {
            request_id: request.id,
            show_loading: request.char_len() > self.loading_threshold,
        };

        tracing::debug!(
            "Starting translation {} ({} chars, {} -> {})",
            request.id,
            request.char_len(),
            request.source.code,
            request.target.code
        );

        let translator = self.translator.clone();
        let timeout = self.request_timeout;
        let completions_tx = self.completions_tx.clone();

        tokio::spawn(async move {
            let outcome = execute(translator, &request, timeout).await;
            if let Err(e) = completions_tx.send(Completion { request, outcome }).await {
                tracing::error!("Failed to deliver translation result: {}", e);
            }
        });

        started
    }
}

/// One provider call, mapped to an outcome. No retries.
pub async fn execute(
    translator: Option<Arc<dyn Translator>>,
    request: &TranslationRequest,
    timeout: Duration,
) -> TranslationOutcome {
    let Some(translator) = translator else {
        return TranslationOutcome::Unavailable(UnavailableReason::Provider(
            "No translation provider configured".to_string(),
        ));
    };

    let call = translator.translate(
        &request.input_text,
        request.source.code.clone(),
        request.target.code.clone(),
    );

    match tokio::time::timeout(timeout, call).await {
        Ok(Ok(Some(translation))) if !translation.text.trim().is_empty() => {
            TranslationOutcome::Text(translation.text)
        }
        Ok(Ok(_)) | Ok(Err(TranslateError::UnsupportedLanguagePair { .. })) => {
            tracing::error!("No translation available for this language pair");
            TranslationOutcome::Unavailable(UnavailableReason::NoTranslation)
        }
        Ok(Err(e)) => {
            tracing::error!("Translation request {} failed: {}", request.id, e);
            TranslationOutcome::Unavailable(UnavailableReason::Provider(e.to_string()))
        }
        Err(_) => {
            tracing::error!(
                "Translation request {} timed out after {:?}",
                request.id,
                timeout
            );
            TranslationOutcome::Unavailable(UnavailableReason::Timeout)
        }
    }
}
