//! Guarded command execution.
//!
//! [`GuardedExecutor::execute`] is the single entry point for running a
//! command. It handles the `cd` and `history` builtins, classifies
//! everything else, asks for confirmation when the verdict is destructive,
//! runs the command and records it in the context store.

use std::path::PathBuf;
use std::sync::Arc;

use crossterm::style::Stylize;
use tracing::{error, info};

use super::confirm::Confirm;
use super::process::run_shell_command;
use crate::context::ContextStore;
use crate::security::{self, RiskAnalyzer, RiskVerdict, UNRESOLVED_PREFIX};
use crate::utils::{expand_tilde, strip_quotes};

/// Number of affected resources listed before summarizing the rest.
const MAX_LISTED_RESOURCES: usize = 10;

pub const PROCEED_QUESTION: &str = "Are you sure you want to proceed?";

pub struct GuardedExecutor {
    context: ContextStore,
    analyzer: Arc<dyn RiskAnalyzer>,
}

impl GuardedExecutor {
    pub fn new(context: ContextStore, analyzer: Arc<dyn RiskAnalyzer>) -> Self {
        Self { context, analyzer }
    }

    pub fn context(&self) -> &ContextStore {
        &self.context
    }

    /// Run `command` after classification and, when needed, confirmation.
    ///
    /// Returns `true` only if the command ran and exited with status zero.
    /// Declines, spawn failures and non-zero exits all return `false`.
    pub async fn execute(&self, command: &str, confirm: &mut dyn Confirm) -> bool {
        let command = command.trim();
        if command.is_empty() {
            return false;
        }

        if command.split_whitespace().next() == Some("cd") {
            // Everything after `cd` is the path; chained commands never run.
            let target = command["cd".len()..].trim();
            return self.change_directory(command, (!target.is_empty()).then_some(target));
        }
        if command == "history" {
            self.print_history();
            return true;
        }

        let verdict = security::assess(command, self.analyzer.as_ref()).await;
        if verdict.is_destructive {
            println!("{}", describe_verdict(&verdict).yellow());
            if !confirm.confirm(PROCEED_QUESTION) {
                info!("User declined destructive command: {}", command);
                println!("Operation cancelled.");
                return false;
            }
        }

        self.run(command).await
    }

    async fn run(&self, command: &str) -> bool {
        let output = match run_shell_command(command).await {
            Ok(output) => output,
            Err(e) => {
                error!("Failed to execute {:?}: {:#}", command, e);
                println!("{}", format!("Error executing command: {:#}", e).red());
                return false;
            }
        };

        let text = output.display_text();
        if !text.is_empty() {
            print!("{}", text);
            if !text.ends_with('\n') {
                println!();
            }
        }

        self.context.append(command, text);
        if !output.success() {
            info!("Command {:?} exited with {}", command, output.status);
        }
        output.success()
    }

    fn change_directory(&self, command: &str, target: Option<&str>) -> bool {
        let target: PathBuf = match target.map(strip_quotes) {
            None | Some("~") => match dirs::home_dir() {
                Some(home) => home,
                None => {
                    println!("Could not determine home directory");
                    return false;
                }
            },
            Some(raw) => expand_tilde(raw),
        };

        if !target.is_dir() {
            println!("Directory does not exist: {}", target.display());
            return false;
        }
        if let Err(e) = std::env::set_current_dir(&target) {
            error!("Failed to change directory to {}: {}", target.display(), e);
            println!("Failed to change directory: {}", e);
            return false;
        }

        let cwd = std::env::current_dir().unwrap_or(target);
        self.context
            .append(command, &format!("Changed directory to: {}", cwd.display()));
        true
    }

    fn print_history(&self) {
        if self.context.is_empty() {
            println!("No commands in history");
        } else {
            println!("{}", self.context.render_history());
        }
    }
}

fn resource_label(entry: &str) -> &'static str {
    if entry.ends_with('/') {
        "directory"
    } else if entry.starts_with(UNRESOLVED_PREFIX) || entry.starts_with('(') {
        "note"
    } else {
        "file"
    }
}

/// Warning text shown before asking to proceed with a destructive command.
pub fn describe_verdict(verdict: &RiskVerdict) -> String {
    let mut text = format!(
        "Warning: potentially destructive command detected!\nReason: {}\nSeverity: {}\nCategory: {}",
        verdict.reason, verdict.severity, verdict.category
    );

    if !verdict.affected_resources.is_empty() {
        text.push_str("\n\nAffected resources:");
        for (i, entry) in verdict
            .affected_resources
            .iter()
            .take(MAX_LISTED_RESOURCES)
            .enumerate()
        {
            text.push_str(&format!("\n  {}. [{}] {}", i + 1, resource_label(entry), entry));
        }
        let remaining = verdict
            .affected_resources
            .len()
            .saturating_sub(MAX_LISTED_RESOURCES);
        if remaining > 0 {
            text.push_str(&format!("\n  ... and {} more", remaining));
        }
    }
    text
}
