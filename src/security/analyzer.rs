//! Model-backed risk analysis for commands the pattern table does not know.
//!
//! Any failure (transport, timeout, unparseable answer) fails closed: the
//! command is treated as destructive so the user is always asked.

use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use super::{Category, RiskVerdict, Severity, VerdictSource};
use crate::ai::client::LlmClient;
use crate::ai::{parser, prompt};
use crate::context::ContextStore;

/// Produces a verdict for a command that matched no static pattern.
#[async_trait]
pub trait RiskAnalyzer: Send + Sync {
    async fn analyze(&self, command: &str) -> RiskVerdict;
}

/// Verdict shape the model is asked to return.
#[derive(Debug, Deserialize)]
struct ModelVerdict {
    is_destructive: bool,
    #[serde(default)]
    reason: String,
    #[serde(default)]
    severity: String,
    #[serde(default, alias = "type")]
    category: String,
}

/// Parse the model's answer into a verdict.
///
/// Accepts the JSON object wrapped in prose or code fences.
pub fn parse_verdict(response: &str) -> Result<RiskVerdict> {
    let json = parser::extract_json_object(response)
        .ok_or_else(|| anyhow!("response contains no JSON object"))?;
    let raw: ModelVerdict =
        serde_json::from_str(json).context("response is not a valid risk verdict")?;

    Ok(RiskVerdict {
        is_destructive: raw.is_destructive,
        reason: raw.reason.trim().to_string(),
        severity: Severity::from_label(&raw.severity),
        category: Category::from_label(&raw.category),
        affected_resources: Vec::new(),
        source: VerdictSource::Model,
    })
}

/// Asks the language model, grounded in recent command context.
pub struct ModelRiskAnalyzer {
    llm: Arc<dyn LlmClient>,
    context: ContextStore,
}

impl ModelRiskAnalyzer {
    pub fn new(llm: Arc<dyn LlmClient>, context: ContextStore) -> Self {
        Self { llm, context }
    }

    async fn try_analyze(&self, command: &str) -> Result<RiskVerdict> {
        let request = prompt::risk_request(command, &self.context.render());
        let response = self.llm.complete(request).await?;
        debug!("Risk analysis response: {}", response);
        parse_verdict(&response)
    }
}

#[async_trait]
impl RiskAnalyzer for ModelRiskAnalyzer {
    async fn analyze(&self, command: &str) -> RiskVerdict {
        match self.try_analyze(command).await {
            Ok(verdict) => verdict,
            Err(e) => {
                warn!("AI risk analysis failed for {:?}, failing closed: {:#}", command, e);
                println!("AI analysis failed: {:#}", e);
                RiskVerdict::fail_closed()
            }
        }
    }
}
