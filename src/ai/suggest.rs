//! Inline command suggestions.
//!
//! Keystrokes reach [`SuggestionEngine::on_input_changed`] from the line
//! editor. Past the debounce gate a background task asks the model for a
//! completion and stores it in the shared [`SuggestionSlot`], which the
//! editor's hinter reads on the next redraw.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use anyhow::Result;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::debug;

use super::client::LlmClient;
use super::{parser, prompt};

/// Inputs shorter than this never trigger a fetch.
const MIN_TRIGGER_CHARS: usize = 2;
/// Inputs shorter than this are not worth a model call.
const MIN_COMPLETION_CHARS: usize = 3;

/// Latest completion, shared between background fetches and the editor.
#[derive(Clone, Debug, Default)]
pub struct SuggestionSlot {
    inner: Arc<Mutex<String>>,
}

impl SuggestionSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, suggestion: impl Into<String>) {
        *self.inner.lock().unwrap_or_else(PoisonError::into_inner) = suggestion.into();
    }

    pub fn get(&self) -> String {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn clear(&self) {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }

    /// Remaining suffix of the stored suggestion if it extends `typed`.
    pub fn hint_for(&self, typed: &str) -> Option<String> {
        if typed.is_empty() {
            return None;
        }
        let suggestion = self.get();
        suggestion
            .strip_prefix(typed)
            .filter(|rest| !rest.is_empty())
            .map(str::to_string)
    }
}

/// Minimum-interval gate for outbound suggestion requests.
#[derive(Debug)]
pub struct Debouncer {
    interval: Duration,
    last: Mutex<Option<Instant>>,
}

impl Debouncer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: Mutex::new(None),
        }
    }

    /// Open the gate if the interval has elapsed since it last opened.
    pub fn try_acquire(&self) -> bool {
        let mut last = self.last.lock().unwrap_or_else(PoisonError::into_inner);
        let now = Instant::now();
        match *last {
            Some(previous) if now.duration_since(previous) < self.interval => false,
            _ => {
                *last = Some(now);
                true
            }
        }
    }
}

/// Turn a raw model answer into a completion of `typed`.
pub fn normalize_completion(typed: &str, response: &str) -> String {
    let suggestion = parser::first_command_line(response);
    if suggestion.is_empty() {
        return suggestion;
    }
    if suggestion == typed {
        format!("{typed} ")
    } else if !suggestion.starts_with(typed) {
        format!("{typed}{suggestion}")
    } else {
        suggestion
    }
}

/// Ask the model to complete `typed`. Very short inputs yield an empty string.
pub async fn fetch_completion(llm: &dyn LlmClient, typed: &str) -> Result<String> {
    if typed.trim().chars().count() < MIN_COMPLETION_CHARS {
        return Ok(String::new());
    }
    let response = llm.complete(prompt::completion_request(typed)).await?;
    Ok(normalize_completion(typed, &response))
}

fn is_special_input(text: &str) -> bool {
    text.starts_with('?') || text.starts_with("%%") || text.starts_with('!')
}

pub struct SuggestionEngine {
    llm: Arc<dyn LlmClient>,
    slot: SuggestionSlot,
    debouncer: Debouncer,
    runtime: Handle,
    last_input: Mutex<String>,
}

impl SuggestionEngine {
    pub fn new(llm: Arc<dyn LlmClient>, slot: SuggestionSlot, debounce: Duration, runtime: Handle) -> Self {
        Self {
            llm,
            slot,
            debouncer: Debouncer::new(debounce),
            runtime,
            last_input: Mutex::new(String::new()),
        }
    }

    pub fn slot(&self) -> &SuggestionSlot {
        &self.slot
    }

    /// React to an edit of the current line.
    ///
    /// Returns the handle of the spawned fetch, if one was started.
    pub fn on_input_changed(&self, text: &str) -> Option<JoinHandle<()>> {
        if text.trim().chars().count() < MIN_TRIGGER_CHARS {
            self.slot.clear();
            return None;
        }
        if is_special_input(text) {
            return None;
        }

        {
            let mut last = self.last_input.lock().unwrap_or_else(PoisonError::into_inner);
            if *last == text {
                return None;
            }
            if !self.debouncer.try_acquire() {
                return None;
            }
            *last = text.to_string();
        }

        let llm = Arc::clone(&self.llm);
        let slot = self.slot.clone();
        let typed = text.to_string();
        Some(self.runtime.spawn(async move {
            match fetch_completion(llm.as_ref(), &typed).await {
                Ok(suggestion) if !suggestion.is_empty() => slot.set(suggestion),
                Ok(_) => {}
                Err(e) => debug!("Suggestion fetch failed for {:?}: {:#}", typed, e),
            }
        }))
    }

    /// Forget the current suggestion once a line has been submitted.
    pub fn reset(&self) {
        self.slot.clear();
        self.last_input
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}
