//! Security module for command analysis and safety checks.
//!
//! Commands are first matched against a static table of destructive
//! patterns. Only when nothing matches is the model asked for a verdict.
//! Either branch produces a [`RiskVerdict`]; the shell never blocks on its
//! own, it only asks the user for confirmation.

mod analyzer;
mod patterns;
mod resolver;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use analyzer::{ModelRiskAnalyzer, RiskAnalyzer, parse_verdict};
pub use patterns::{PatternRule, ResolveStrategy, classify, rules};
pub use resolver::{UNRESOLVED_PREFIX, resolve};

/// Reason reported when the model could not produce a usable verdict.
pub const FAIL_CLOSED_REASON: &str = "Unable to fully analyze command safety";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Lenient parse used at the model boundary. Unknown labels become `Medium`.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "low" => Severity::Low,
            "high" => Severity::High,
            "critical" => Severity::Critical,
            _ => Severity::Medium,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Filesystem,
    System,
    Service,
    Git,
    Network,
    Database,
    Other,
}

impl Category {
    /// Lenient parse used at the model boundary. Unknown labels become `Other`.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "filesystem" | "file system" | "fs" | "file" => Category::Filesystem,
            "system" => Category::System,
            "service" => Category::Service,
            "git" | "vcs" => Category::Git,
            "network" => Category::Network,
            "database" | "db" => Category::Database,
            _ => Category::Other,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Category::Filesystem => "filesystem",
            Category::System => "system",
            Category::Service => "service",
            Category::Git => "git",
            Category::Network => "network",
            Category::Database => "database",
            Category::Other => "other",
        };
        f.write_str(label)
    }
}

/// Which branch of the classification pipeline produced a verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerdictSource {
    /// Matched a static destructive pattern.
    Pattern,
    /// Judged by the model.
    Model,
    /// The model call failed; treated as destructive.
    FailClosed,
}

/// Outcome of analyzing a single command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RiskVerdict {
    pub is_destructive: bool,
    pub reason: String,
    pub severity: Severity,
    pub category: Category,
    /// Concrete files, directories or git paths the command would touch.
    pub affected_resources: Vec<String>,
    pub source: VerdictSource,
}

impl RiskVerdict {
    pub fn from_rule(rule: &PatternRule, affected_resources: Vec<String>) -> Self {
        Self {
            is_destructive: true,
            reason: rule.reason.to_string(),
            severity: rule.severity,
            category: rule.category,
            affected_resources,
            source: VerdictSource::Pattern,
        }
    }

    pub fn fail_closed() -> Self {
        Self {
            is_destructive: true,
            reason: FAIL_CLOSED_REASON.to_string(),
            severity: Severity::Medium,
            category: Category::Other,
            affected_resources: Vec::new(),
            source: VerdictSource::FailClosed,
        }
    }
}

/// Classify a command: static patterns first, then the model.
///
/// The analyzer is consulted exactly once when no pattern matches and
/// never otherwise.
pub async fn assess(command: &str, analyzer: &dyn RiskAnalyzer) -> RiskVerdict {
    match classify(command) {
        Some(rule) => {
            tracing::info!("Command matched destructive pattern: {}", rule.reason);
            RiskVerdict::from_rule(rule, resolve(command, rule))
        }
        None => analyzer.analyze(command).await,
    }
}
