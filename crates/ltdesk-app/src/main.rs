use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use ltdesk_store::SqliteStore;
use ltdesk_translator::LibreTranslateFactory;
use tokio::signal;
use tracing_subscriber::EnvFilter;

mod assets;
mod console;
mod controller;
mod paths;
mod state;


use self::controller::AppController;
use self::state::AppState;

#[derive(Parser, Debug)]
#[command(name = "ltdesk", version, about = "Desktop client for LibreTranslate")]
struct Args {
    /// Directory for the database, config and icon
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if json {
        builder.json().init();
    } else {
        builder
            .with_ansi(atty::is(atty::Stream::Stderr))
            .init();
    }
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let args = Args::parse();
    init_tracing(args.json_logs);

    if let Err(e) = run(args).await {
        tracing::error!("{e:#}");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    let data_dir = paths::data_dir(args.data_dir)?;
    paths::init_user_config(&data_dir)?;
    let config = paths::load_user_config(&data_dir)?;

    let icon = assets::ensure_icon(&data_dir, &config.assets).await?;
    tracing::debug!("Using icon {}", icon.display());

    let state = Arc::new(AppState::new(config, data_dir));
    let store = Arc::new(SqliteStore::open(&state.database_path())?);

    let controller = AppController::new(state);
    let mut tasks = controller.spawn_tasks(store, Arc::new(LibreTranslateFactory))?;
    controller.spawn_input()?;

    tokio::select! {
        result = signal::ctrl_c() => {
            if let Err(e) = result {
                tracing::error!("Failed to listen for ctrl+c: {e}");
            }
            tracing::info!("Shutdown requested");
        }
        Some(result) = tasks.join_next() => {
            match result {
                Ok(Ok(())) => tracing::info!("Task finished"),
                Ok(Err(e)) => tracing::error!("Task failed: {e:#}"),
                Err(e) => tracing::error!("Task panicked: {e}"),
            }
        }
    }

    controller.shutdown();
    while let Some(result) = tasks.join_next().await {
        if let Ok(Err(e)) = result {
            tracing::warn!("Task ended with error during shutdown: {e:#}");
        }
    }

    Ok(())
}
