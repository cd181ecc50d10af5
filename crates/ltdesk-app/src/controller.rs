use std::sync::{Arc, Mutex};

use kanal::{AsyncReceiver, AsyncSender};
use ltdesk_core::session::TranslationSession;
use ltdesk_core::store::SettingsStore;
use ltdesk_translator::TranslatorFactory;
use ltdesk_types::{AppEvent, DisplayEvent};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::console::{self, ConsoleState};
use crate::state::AppState;

/// Centralized channel management
pub struct ChannelSet {
    pub app_to_ui: (AsyncSender<DisplayEvent>, AsyncReceiver<DisplayEvent>),
    pub ui_to_app: (AsyncSender<AppEvent>, AsyncReceiver<AppEvent>),
}

impl ChannelSet {
    pub fn new() -> Self {
        Self {
            app_to_ui: kanal::bounded_async(256),
            ui_to_app: kanal::bounded_async(64),
        }
    }
}

/// Application controller for task spawning and lifecycle
pub struct AppController {
    channels: ChannelSet,
    state: Arc<AppState>,
    console: Arc<Mutex<ConsoleState>>,
    cancel_token: CancellationToken,
}

impl AppController {
    pub fn new(state: Arc<AppState>) -> Self {
        Self {
            channels: ChannelSet::new(),
            state,
            console: Arc::new(Mutex::new(ConsoleState::default())),
            cancel_token: CancellationToken::new(),
        }
    }

    /// Spawn the session and the console renderer
    pub fn spawn_tasks(
        &self,
        store: Arc<dyn SettingsStore>,
        factory: Arc<dyn TranslatorFactory>,
    ) -> anyhow::Result<JoinSet<anyhow::Result<()>>> {
        let mut tasks = JoinSet::new();

        let session = TranslationSession::new(
            store,
            factory,
            self.channels.app_to_ui.0.clone(),
            self.state.session_settings(),
        )?;

        let events_rx = self.channels.ui_to_app.1.clone();
        let session_cancel = self.cancel_token.child_token();
        tasks.spawn(async move {
            session.run(events_rx, session_cancel).await?;
            Ok(())
        });

        tasks.spawn(console::render_loop(
            self.channels.app_to_ui.1.clone(),
            self.console.clone(),
            self.cancel_token.child_token(),
        ));

        Ok(tasks)
    }

    /// Start reading user input; the thread is detached and ends with the process
    pub fn spawn_input(&self) -> anyhow::Result<()> {
        console::spawn_input_thread(self.channels.ui_to_app.0.clone_sync(), self.console.clone())?;
        Ok(())
    }

    #[cfg(test)]
    pub fn events(&self) -> AsyncSender<AppEvent> {
        self.channels.ui_to_app.0.clone()
    }

    pub fn shutdown(&self) {
        self.cancel_token.cancel();
    }
}
