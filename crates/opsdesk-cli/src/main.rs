//! opsdesk - command line client for the operations REST API.
//!
//! Sign in once with `opsdesk login`; the session tokens are kept in the
//! configured token store and attached to every later command. When the
//! server declares the token invalid the session is dropped and the user
//! is sent back to `opsdesk login`.

mod cli;
mod commands;
mod navigator;
mod output;

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use opsdesk_core::auth::{FileTokenStore, KeyringTokenStore, MemoryTokenStore};
use opsdesk_core::config::TokenStoreKind;
use opsdesk_core::{
    ApiClient, ApiClientBuilder, ApiError, AuthProvider, Config, LoginRedirect, SessionListener,
    TokenStore,
};

use cli::{Cli, Commands};
use navigator::TerminalNavigator;

const LOG_FILE: &str = "opsdesk.log";

/// Initialize the tracing subscriber for logging.
///
/// RUST_LOG wins over `-v`. Besides stderr, events are appended to
/// `opsdesk.log` in the cache directory when one is available.
fn init_tracing(verbose: u8, log_dir: Option<PathBuf>) -> Option<WorkerGuard> {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::never(dir, LOG_FILE);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_ansi(false).with_writer(writer)),
                Some(guard),
            )
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

fn token_store(config: &Config) -> Result<Arc<dyn TokenStore>> {
    let store: Arc<dyn TokenStore> = match config.token_store {
        TokenStoreKind::File => Arc::new(FileTokenStore::new(config.cache_dir()?)),
        TokenStoreKind::Keyring => Arc::new(KeyringTokenStore::new()),
        TokenStoreKind::Memory => {
            warn!("Memory token store selected, the session ends with this process");
            Arc::new(MemoryTokenStore::new())
        }
    };
    Ok(store)
}

/// `location` is where the terminal "is": the login path while logging in,
/// so a rejected token there does not print the re-login notice.
fn build_client(config: &Config, location: &str) -> Result<ApiClient> {
    let redirect: Arc<dyn SessionListener> = Arc::new(LoginRedirect::new(
        TerminalNavigator::at(location),
        config.login_path(),
    ));

    let api = ApiClientBuilder::from_config(config)
        .token_store(token_store(config)?)
        .session_listener(redirect)
        .build()?;
    Ok(api)
}

async fn run(command: Commands, mut config: Config) -> Result<()> {
    let location = match command {
        Commands::Login { .. } => config.login_path().to_string(),
        _ => "/".to_string(),
    };
    let api = build_client(&config, &location)?;
    let auth = AuthProvider::with_token_endpoint(api.clone(), config.token_endpoint());

    match command {
        Commands::Login { username } => commands::login(&mut config, &auth, username).await,
        Commands::Logout => commands::logout(&auth),
        Commands::Status => {
            commands::status(&config, &auth);
            Ok(())
        }
        Commands::Request { method, path, data } => {
            commands::request(&api, &method, &path, data.as_deref()).await
        }
        Commands::List { resource, page } => commands::list(&api, resource, page).await,
        Commands::Show { resource, id } => commands::show(&api, resource, id).await,
        Commands::Summary => commands::summary(&api).await,
        Commands::Upload { job, title, file } => commands::upload(&api, job, &title, &file).await,
        Commands::Download { id, out } => commands::download(&api, id, &out).await,
    }
}

#[tokio::main]
async fn main() {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let config = Config::load();
    let guard = init_tracing(
        cli.verbose,
        config.as_ref().ok().and_then(|c| c.cache_dir().ok()),
    );
    info!("opsdesk starting");

    let result = match config.context("Failed to load configuration") {
        Ok(config) => run(cli.command, config).await,
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        if let Some(message) = error_message(&e) {
            eprintln!("{}", message);
        }
        drop(guard);
        std::process::exit(1);
    }
}

/// What to print for a failed command. An invalidated session has already
/// been announced by the navigator, so nothing more is printed for it.
fn error_message(e: &anyhow::Error) -> Option<String> {
    match e.downcast_ref::<ApiError>() {
        Some(api_err) if api_err.is_session_invalidated() => None,
        _ => Some(format!("Error: {:#}", e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opsdesk_core::auth::AuthFailureReason;

    #[test]
    fn test_invalidated_session_prints_nothing_more() {
        let err = anyhow::Error::new(ApiError::SessionInvalidated {
            reason: AuthFailureReason::TokenExpired,
            detail: "Token is expired".to_string(),
        })
        .context("Failed to fetch job 4");
        assert_eq!(error_message(&err), None);
    }

    #[test]
    fn test_other_errors_print_their_chain() {
        let err = anyhow::Error::new(ApiError::NotFound("no such job".to_string()))
            .context("Failed to fetch job 4");
        let message = error_message(&err).unwrap();
        assert!(message.starts_with("Error: Failed to fetch job 4"));
        assert!(message.contains("no such job"));
    }
}
