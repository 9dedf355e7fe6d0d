//! Error triage for `!error` input.
//!
//! A pasted error is matched against a few well-known shapes first. Anything
//! else goes to the model together with a summary of the project in the
//! working directory. Proposed commands run through the guarded executor.

mod project;

use std::path::PathBuf;
use std::sync::LazyLock;

use anyhow::{Result, anyhow};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

pub use project::{ProjectScanner, ProjectSummary};

use crate::ai::client::LlmClient;
use crate::ai::{parser, prompt};
use crate::shell::confirm::Confirm;
use crate::shell::executor::GuardedExecutor;

static MODULE_NOT_FOUND: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r#"ModuleNotFoundError: No module named ['"]([^'"]+)['"]"#)
        .map_err(|e| tracing::error!("Invalid module-not-found pattern: {}", e))
        .ok()
});

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileChange {
    pub file: String,
    pub changes: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ErrorAnalysis {
    pub error_type: String,
    pub project_type: String,
    pub missing_dependencies: Vec<String>,
    pub commands: Vec<String>,
    pub explanation: String,
    pub file_changes: Vec<FileChange>,
}

impl ErrorAnalysis {
    pub fn unknown(project_type: Option<&str>) -> Self {
        Self {
            error_type: "unknown".to_string(),
            project_type: project_type.unwrap_or("unknown").to_string(),
            explanation: "Could not analyze error".to_string(),
            ..Default::default()
        }
    }

    fn missing_python_module(module: &str) -> Self {
        Self {
            error_type: "import_error".to_string(),
            project_type: "python".to_string(),
            missing_dependencies: vec![module.to_string()],
            commands: vec![format!("pip install {}", module)],
            explanation: format!("The Python package '{}' is not installed", module),
            file_changes: Vec::new(),
        }
    }

    /// Human-readable summary printed before asking to apply fixes.
    pub fn render(&self) -> String {
        let mut lines = vec![
            "Suggested fixes:".to_string(),
            format!("Error type: {}", self.error_type),
            format!("Project type: {}", self.project_type),
        ];

        let sections = [
            ("Missing dependencies:", self.missing_dependencies.clone()),
            ("Proposed commands:", self.commands.clone()),
            (
                "Required file changes:",
                self.file_changes
                    .iter()
                    .map(|c| format!("{}: {}", c.file, c.changes))
                    .collect(),
            ),
        ];
        for (title, items) in sections {
            if items.is_empty() {
                continue;
            }
            lines.push(format!("\n{}", title));
            lines.extend(items.iter().map(|item| format!("  - {}", item)));
        }

        let options = textwrap::Options::new(76)
            .initial_indent("  ")
            .subsequent_indent("  ");
        lines.push(format!("\nExplanation:\n{}", textwrap::fill(&self.explanation, options)));
        lines.join("\n")
    }
}

/// Top-level package named by a Python `ModuleNotFoundError`.
pub fn module_not_found(error: &str) -> Option<String> {
    let regex = MODULE_NOT_FOUND.as_ref()?;
    let module = regex.captures(error)?.get(1)?.as_str();
    module.split('.').next().map(str::to_string)
}

fn parse_analysis(response: &str) -> Result<ErrorAnalysis> {
    let json = parser::extract_json_object(response)
        .ok_or_else(|| anyhow!("response contains no JSON object"))?;
    Ok(serde_json::from_str(json)?)
}

pub struct Troubleshooter<'a> {
    llm: &'a dyn LlmClient,
    executor: &'a GuardedExecutor,
    root: PathBuf,
}

impl<'a> Troubleshooter<'a> {
    /// Troubleshooter for the project rooted at `root`.
    pub fn new(llm: &'a dyn LlmClient, executor: &'a GuardedExecutor, root: impl Into<PathBuf>) -> Self {
        Self {
            llm,
            executor,
            root: root.into(),
        }
    }

    /// Diagnose `error`. Never fails; an unusable answer yields an
    /// `unknown` analysis without commands.
    pub async fn analyze_error(&self, error: &str) -> ErrorAnalysis {
        if let Some(module) = module_not_found(error) {
            info!("Recognized missing Python module {:?}", module);
            return ErrorAnalysis::missing_python_module(&module);
        }

        let summary = ProjectScanner::new(&self.root).scan();
        let project_json = serde_json::to_string(&summary).unwrap_or_else(|_| "{}".to_string());
        let request = prompt::error_request(error, &project_json, &self.executor.context().render());

        let analysis = self
            .llm
            .complete(request)
            .await
            .and_then(|response| parse_analysis(&response));
        analysis.unwrap_or_else(|e| {
            warn!("Error analysis failed: {:#}", e);
            println!("Error analysis failed: {:#}", e);
            ErrorAnalysis::unknown(summary.project_type.as_deref())
        })
    }

    /// Show `analysis` and run its commands, one confirmation each.
    ///
    /// Returns `true` iff every accepted command succeeded.
    pub async fn apply_fixes(&self, analysis: &ErrorAnalysis, confirm: &mut dyn Confirm) -> bool {
        println!("\n{}", analysis.render());
        if !confirm.confirm("\nWould you like to proceed with the fixes?") {
            return false;
        }

        let mut success = true;
        for command in &analysis.commands {
            println!("\nCommand: {}", command);
            if !confirm.confirm("Execute this command?") {
                println!("Skipping command: {}", command);
                continue;
            }
            if !self.executor.execute(command, confirm).await {
                success = false;
                if !confirm.confirm("Command failed. Continue with remaining commands?") {
                    break;
                }
            }
        }

        if success {
            println!("\nAll selected fixes have been applied successfully.");
        } else {
            println!("\nSome fixes were not applied successfully. Please check the output above.");
        }
        success
    }

    pub async fn run(&self, error: &str, confirm: &mut dyn Confirm) -> bool {
        println!("\nAnalyzing error...");
        let analysis = self.analyze_error(error).await;
        self.apply_fixes(&analysis, confirm).await
    }
}
