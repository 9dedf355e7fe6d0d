//! Command context store shared by the executor and the AI call sites.
//!
//! The store keeps the last few executed commands and their outputs in a
//! bounded FIFO queue. Call sites that talk to the model render it into a
//! plain transcript and send it as conversational grounding.

mod command_log;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

pub use command_log::{CommandLog, CommandRecord};

use crate::utils::truncate_tail;

/// Rendered in place of a transcript when nothing has been executed yet.
pub const EMPTY_CONTEXT: &str = "No previous commands";

/// Per-entry output budget when rendering context for a prompt.
const MAX_RENDERED_OUTPUT: usize = 2048;

/// Cloneable, thread-safe handle to the session's command log.
///
/// Every operation takes the lock exactly once, so a render always sees a
/// consistent snapshot and never a half-appended entry.
#[derive(Clone, Debug)]
pub struct ContextStore {
    log: Arc<Mutex<CommandLog>>,
}

impl Default for ContextStore {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_CONTEXT_LIMIT)
    }
}

impl ContextStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            log: Arc::new(Mutex::new(CommandLog::new(capacity))),
        }
    }

    // A panic while holding the lock cannot leave a record half-written,
    // so the data behind a poisoned lock is still valid.
    fn lock(&self) -> MutexGuard<'_, CommandLog> {
        self.log.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record a command and its captured output.
    pub fn append(&self, command: &str, output: &str) {
        self.record(CommandRecord::new(command, output));
    }

    pub fn record(&self, record: CommandRecord) {
        tracing::debug!("Recording context entry: {}", record.command_line);
        self.lock().push(record);
    }

    /// Most recent `limit` records, oldest first.
    pub fn recent(&self, limit: usize) -> Vec<CommandRecord> {
        self.lock().recent(limit)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.lock().capacity()
    }

    /// Render the store as a transcript for model prompts.
    ///
    /// ```
    /// use rusty_shell::context::ContextStore;
    ///
    /// let store = ContextStore::new(10);
    /// assert_eq!(store.render(), "No previous commands");
    ///
    /// store.append("pwd", "/home/user\n");
    /// assert_eq!(store.render(), "Previous command: pwd\nOutput: /home/user\n\n");
    /// ```
    pub fn render(&self) -> String {
        let log = self.lock();
        if log.is_empty() {
            return EMPTY_CONTEXT.to_string();
        }

        log.entries()
            .map(|record| {
                format!(
                    "Previous command: {}\nOutput: {}\n",
                    record.command_line,
                    truncate_tail(&record.output, MAX_RENDERED_OUTPUT)
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Numbered command listing used by the `history` builtin.
    pub fn render_history(&self) -> String {
        self.lock()
            .entries()
            .enumerate()
            .map(|(i, record)| format!("{}  {}", i + 1, record.command_line))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
