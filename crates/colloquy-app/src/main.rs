//! Colloquy binary - composition root.
//!
//! 1. Parse CLI flags and load configuration from TOML
//! 2. Initialize tracing
//! 3. Build the remote store (HTTP service, or in-memory with `--offline`)
//! 4. Run the terminal front end over the chat controller

mod cli;
mod commands;
mod repl;

use std::sync::Arc;

use clap::Parser;

use colloquy_chat::ChatController;
use colloquy_core::config::ColloquyConfig;
use colloquy_remote::{HttpRemote, MemoryRemote, RemoteStore};
use colloquy_speech::SpeechCapture;

use cli::CliArgs;
use repl::Repl;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config. Loaded before tracing so the file can set the log level; the
    // outcome is logged once the subscriber is up.
    let config_file = args.resolve_config_path();
    let first_run = !config_file.exists();
    let loaded = ColloquyConfig::load(&config_file);
    let mut config = match &loaded {
        Ok(config) => config.clone(),
        Err(_) => ColloquyConfig::default(),
    };

    // Tracing.
    let log_level = args.resolve_log_level(&config.general.log_level);
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level)),
        )
        .init();

    tracing::info!("Starting Colloquy v{}", env!("CARGO_PKG_VERSION"));
    match loaded {
        Ok(_) => tracing::info!(path = %config_file.display(), "Configuration loaded"),
        Err(_) if first_run => match config.save(&config_file) {
            Ok(()) => tracing::info!(path = %config_file.display(), "Wrote default configuration"),
            Err(e) => tracing::warn!(
                path = %config_file.display(),
                error = %e,
                "Could not write default configuration"
            ),
        },
        Err(e) => tracing::warn!(
            path = %config_file.display(),
            error = %e,
            "Config unavailable, using defaults"
        ),
    }

    config.remote.base_url = args.resolve_base_url(&config.remote.base_url);
    let locale = args.resolve_locale(config.speech.default_locale)?;

    // Remote store.
    let remote: Arc<dyn RemoteStore> = if args.offline {
        tracing::info!("Offline mode, using in-memory store");
        Arc::new(MemoryRemote::with_sessions(&["1"]))
    } else {
        match HttpRemote::from_config(&config.remote) {
            Ok(http) => {
                tracing::info!(base_url = %http.base_url(), "Using chat service");
                Arc::new(http)
            }
            Err(e) => {
                tracing::error!(error = %e, "Invalid service configuration");
                return Err(e.into());
            }
        }
    };

    // No speech recognizer is available in a terminal.
    let speech = SpeechCapture::unsupported(locale);
    let controller = ChatController::new(Arc::clone(&remote), speech);

    Repl::new(controller, remote).run().await?;
    Ok(())
}
