//! Hand-written doubles for the model boundary, shared by unit tests.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::{Result, anyhow};
use async_trait::async_trait;

use crate::ai::client::{ChatRequest, LlmClient};
use crate::security::{Category, RiskAnalyzer, RiskVerdict, Severity, VerdictSource};

/// Replays canned answers in order and records every request.
pub struct ScriptedLlm {
    responses: Mutex<VecDeque<Result<String, String>>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedLlm {
    pub fn new<'a>(responses: impl IntoIterator<Item = Result<&'a str, &'a str>>) -> Self {
        Self {
            responses: Mutex::new(
                responses
                    .into_iter()
                    .map(|r| r.map(str::to_string).map_err(str::to_string))
                    .collect(),
            ),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn replying(response: &str) -> Self {
        Self::new([Ok(response)])
    }

    pub fn failing(message: &str) -> Self {
        Self::new([Err(message)])
    }

    /// A client that is never expected to be called.
    pub fn idle() -> Self {
        Self::new(Vec::<Result<&str, &str>>::new())
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmClient for ScriptedLlm {
    async fn complete(&self, request: ChatRequest) -> Result<String> {
        self.requests.lock().unwrap().push(request);
        match self.responses.lock().unwrap().pop_front() {
            Some(Ok(text)) => Ok(text),
            Some(Err(message)) => Err(anyhow!(message)),
            None => Err(anyhow!("no scripted response left")),
        }
    }
}

/// Never answers, like a model endpoint that stopped responding.
pub struct PendingLlm;

#[async_trait]
impl LlmClient for PendingLlm {
    async fn complete(&self, _request: ChatRequest) -> Result<String> {
        std::future::pending().await
    }
}

/// Returns a fixed verdict and counts how often it was asked.
pub struct CountingAnalyzer {
    verdict: RiskVerdict,
    calls: AtomicUsize,
}

impl CountingAnalyzer {
    pub fn new(verdict: RiskVerdict) -> Self {
        Self {
            verdict,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn safe() -> Self {
        Self::new(RiskVerdict {
            is_destructive: false,
            reason: "Read-only command".to_string(),
            severity: Severity::Low,
            category: Category::Other,
            affected_resources: Vec::new(),
            source: VerdictSource::Model,
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RiskAnalyzer for CountingAnalyzer {
    async fn analyze(&self, _command: &str) -> RiskVerdict {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.verdict.clone()
    }
}

/// Switches the process working directory and restores it on drop.
///
/// Tests using this must be `#[serial]`.
pub struct CwdGuard {
    previous: std::path::PathBuf,
}

impl CwdGuard {
    pub fn enter(dir: &std::path::Path) -> Self {
        let previous = std::env::current_dir().unwrap();
        std::env::set_current_dir(dir).unwrap();
        Self { previous }
    }
}

impl Drop for CwdGuard {
    fn drop(&mut self) {
        if let Err(e) = std::env::set_current_dir(&self.previous) {
            eprintln!("failed to restore working directory: {e}");
        }
    }
}
