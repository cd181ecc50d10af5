//! Line-oriented stand-in for the presentation layer.
//!
//! Input runs on its own OS thread because stdin reads block; rendering runs
//! as a task on the runtime.

use std::io::BufRead;
use std::sync::{Arc, Mutex};

use kanal::{AsyncReceiver, Sender};
use ltdesk_types::{AppEvent, DisplayEvent, LOADING_TEXT, LanguagePair};
use tokio_util::sync::CancellationToken;

pub const HELP: &str = "\
Type text to translate it. Commands:
  /source N        select source language N
  /target N        select target language N
  /swap            swap source and target
  /langs           list languages
  /api URL [KEY]   set API url and key
  /refresh         reload languages
  /history [N]     show the last N translations
  /clear-history   delete all history
  /help            show this help
  /quit            exit";

/// What the console knows about the current selection
#[derive(Debug, Default)]
pub struct ConsoleState {
    pub sources: Vec<String>,
    pub targets: Vec<String>,
    pub pair: LanguagePair,
}

#[derive(Debug, PartialEq)]
pub enum Command {
    Send(AppEvent),
    ListLanguages,
    Help,
    Invalid(String),
}

fn parse_index(arg: Option<&str>, what: &str) -> Command {
    match arg.map(str::parse::<usize>) {
        Some(Ok(index)) => match what {
            "source" => Command::Send(AppEvent::SourceSelected(index)),
            _ => Command::Send(AppEvent::TargetSelected(index)),
        },
        _ => Command::Invalid(format!("usage: /{what} N")),
    }
}

pub fn parse_line(line: &str) -> Command {
    let Some(command) = line.strip_prefix('/') else {
        return Command::Send(AppEvent::TextChanged(line.to_string()));
    };

    let mut parts = command.split_whitespace();
    match parts.next() {
        Some("source") => parse_index(parts.next(), "source"),
        Some("target") => parse_index(parts.next(), "target"),
        Some("swap") => Command::Send(AppEvent::SwapLanguages),
        Some("langs") => Command::ListLanguages,
        Some("api") => match (parts.next(), parts.next()) {
            (Some(url), key) => Command::Send(AppEvent::SaveCredentials {
                url: url.to_string(),
                key: key.unwrap_or_default().to_string(),
            }),
            (None, _) => Command::Invalid("usage: /api URL [KEY]".to_string()),
        },
        Some("refresh") => Command::Send(AppEvent::RefreshLanguages),
        Some("history") => match parts.next().map(str::parse::<usize>) {
            None => Command::Send(AppEvent::LoadHistory(0)),
            Some(Ok(limit)) => Command::Send(AppEvent::LoadHistory(limit)),
            Some(Err(_)) => Command::Invalid("usage: /history [N]".to_string()),
        },
        Some("clear-history") => Command::Send(AppEvent::ClearHistory),
        Some("help") => Command::Help,
        Some("quit") | Some("exit") => Command::Send(AppEvent::Shutdown),
        Some(other) => Command::Invalid(format!("unknown command /{other}, try /help")),
        None => Command::Invalid("empty command, try /help".to_string()),
    }
}

pub fn list_languages(state: &ConsoleState) -> Vec<String> {
    if state.sources.is_empty() {
        return vec!["No languages loaded".to_string()];
    }

    let mut lines = vec!["Source languages:".to_string()];
    for (i, name) in state.sources.iter().enumerate() {
        let marker = if i == state.pair.source_index { "*" } else { " " };
        lines.push(format!(" {marker}{i:>3}  {name}"));
    }
    lines.push("Target languages:".to_string());
    for (i, name) in state.targets.iter().enumerate() {
        let marker = if i == state.pair.target_index { "*" } else { " " };
        lines.push(format!(" {marker}{i:>3}  {name}"));
    }
    lines
}

fn pair_line(state: &ConsoleState) -> String {
    let source = state.sources.get(state.pair.source_index);
    let target = state.targets.get(state.pair.target_index);
    match (source, target) {
        (Some(source), Some(target)) => format!("[{source} -> {target}]"),
        _ => "[no language pair]".to_string(),
    }
}

/// Text lines for one display event, updating what the console tracks
pub fn render(event: DisplayEvent, state: &mut ConsoleState) -> Vec<String> {
    match event {
        DisplayEvent::CatalogLoaded {
            sources,
            targets,
            pair,
        } => {
            state.sources = sources;
            state.targets = targets;
            state.pair = pair;
            let mut lines = list_languages(state);
            lines.push(pair_line(state));
            lines
        }
        DisplayEvent::CatalogUnavailable(reason) => {
            state.sources.clear();
            state.targets.clear();
            vec![format!("Languages unavailable: {reason}")]
        }
        DisplayEvent::PairChanged(pair) => {
            state.pair = pair;
            vec![pair_line(state)]
        }
        DisplayEvent::SetInput(text) => vec![format!("> {text}")],
        DisplayEvent::ShowLoading => vec![LOADING_TEXT.to_string()],
        DisplayEvent::ShowOutput(text) => vec![format!("= {text}")],
        DisplayEvent::ShowHistory(entries) if entries.is_empty() => {
            vec!["History is empty".to_string()]
        }
        DisplayEvent::ShowHistory(entries) => entries
            .iter()
            .map(|e| {
                format!(
                    "{}  {} -> {}  {} => {}",
                    e.local_time(),
                    e.source_language,
                    e.target_language,
                    e.input_text,
                    e.output_text
                )
            })
            .collect(),
        DisplayEvent::CredentialsRequired => {
            vec!["API url and key required: /api URL [KEY]".to_string()]
        }
        DisplayEvent::Notice(message) => vec![format!("! {message}")],
    }
}

/// Track selections the user makes so `/langs` marks the right entries
fn note_selection(event: &AppEvent, state: &mut ConsoleState) {
    match event {
        AppEvent::SourceSelected(i) if *i < state.sources.len() => state.pair.source_index = *i,
        AppEvent::TargetSelected(i) if *i < state.targets.len() => state.pair.target_index = *i,
        _ => {}
    }
}

/// Read stdin on a dedicated thread and forward parsed events
pub fn spawn_input_thread(
    ui_to_app_tx: Sender<AppEvent>,
    state: Arc<Mutex<ConsoleState>>,
) -> std::io::Result<std::thread::JoinHandle<()>> {
    std::thread::Builder::new()
        .name("console-input".to_string())
        .spawn(move || {
            println!("{HELP}");
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                let line = match line {
                    Ok(line) => line,
                    Err(e) => {
                        tracing::error!("Failed to read stdin: {}", e);
                        break;
                    }
                };

                let event = match parse_line(line.trim_end()) {
                    Command::Send(event) => event,
                    Command::ListLanguages => {
                        if let Ok(state) = state.lock() {
                            list_languages(&state).iter().for_each(|l| println!("{l}"));
                        }
                        continue;
                    }
                    Command::Help => {
                        println!("{HELP}");
                        continue;
                    }
                    Command::Invalid(message) => {
                        println!("! {message}");
                        continue;
                    }
                };

                if let Ok(mut state) = state.lock() {
                    note_selection(&event, &mut state);
                }

                let quit = matches!(event, AppEvent::Shutdown);
                if ui_to_app_tx.send(event).is_err() || quit {
                    return;
                }
            }

            tracing::info!("stdin closed");
            let _ = ui_to_app_tx.send(AppEvent::Shutdown);
        })
}

/// Print everything the session sends until cancelled
pub async fn render_loop(
    app_to_ui_rx: AsyncReceiver<DisplayEvent>,
    state: Arc<Mutex<ConsoleState>>,
    cancel: CancellationToken,
) -> anyhow::Result<()> {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            event = app_to_ui_rx.recv() => {
                let event = event?;
                let lines = match state.lock() {
                    Ok(mut state) => render(event, &mut state),
                    Err(_) => anyhow::bail!("console state poisoned"),
                };
                for line in lines {
                    println!("{line}");
                }
            }
        }
    }
    Ok(())
}
