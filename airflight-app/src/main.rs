use std::process::ExitCode;
use std::sync::Arc;

use airflight_app::cli::{self, Cli};
use airflight_app::{AppState, AuthSettings};
use airflight_store::app_config::{Config, StoreBackend};
use airflight_store::FileSessionStore;
use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "airflight_app=info,airflight_store=info".into()),
        )
        // stdout belongs to the command output
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Cli::parse();

    let mut config = Config::load().context("Failed to load config")?;
    if args.memory {
        config.store.backend = StoreBackend::Memory;
    }

    let store = airflight_store::open_remote_store(&config.store)
        .await
        .context("Failed to open remote store")?;
    let sessions = Arc::new(FileSessionStore::new(&config.session.path));

    let state = AppState::new(
        store,
        sessions,
        AuthSettings {
            min_password_length: config.auth.min_password_length,
        },
    );

    Ok(cli::run(args, &state).await)
}
