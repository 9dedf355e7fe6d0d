//! Main entry point for Rusty Shell.
//!
//! Sets up logging and configuration, then hands control to the REPL until
//! the user exits.

use anyhow::Result;
use rusty_shell::config::ShellConfig;
use rusty_shell::shell::{Session, repl};
use rusty_shell::utils;

#[tokio::main]
async fn main() -> Result<()> {
    // Keep the guard alive so buffered log lines are flushed on exit.
    let _log_guard = utils::logger::init_logging();

    match dotenvy::dotenv() {
        Ok(path) => tracing::info!("Loaded environment from {}", path.display()),
        Err(e) if e.not_found() => {}
        Err(e) => tracing::warn!("Failed to load .env file: {}", e),
    }

    let config = ShellConfig::from_env();
    let session = Session::new(config);
    repl::run(&session).await
}
