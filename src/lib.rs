//! Rusty Shell - an interactive shell with AI-assisted, guarded command execution
//!
//! This library provides the core functionality for Rusty Shell, including:
//! - Destructive command detection (static patterns with a model fallback)
//! - Enumeration of the files and git paths a destructive command would touch
//! - A bounded command context store used to ground every model request
//! - The guarded executor, the setup wizard and the error troubleshooter
//! - Natural-language translation and inline command suggestions
//!
//! # Example
//!
//! ```no_run
//! use rusty_shell::config::ShellConfig;
//! use rusty_shell::shell::Session;
//! use rusty_shell::shell::confirm::StdinConfirm;
//!
//! #[tokio::main]
//! async fn main() {
//!     let session = Session::new(ShellConfig::from_env());
//!     let mut confirm = StdinConfirm;
//!
//!     // Asks before running because it matches a destructive pattern.
//!     session.execute("rm -rf ./build", &mut confirm).await;
//!     println!("{}", session.context().render());
//! }
//! ```

pub mod ai;
pub mod config;
pub mod context;
pub mod security;
pub mod shell;
pub mod troubleshoot;
pub mod utils;
pub mod wizard;

#[cfg(test)]
mod testing;

// Re-export commonly used types
pub use config::ShellConfig;
pub use context::{CommandRecord, ContextStore};
pub use security::{RiskAnalyzer, RiskVerdict, classify};
pub use shell::Session;
pub use shell::executor::GuardedExecutor;
