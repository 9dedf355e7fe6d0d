//! Setup wizard: multi-step plans generated from a free-text request.
//!
//! The model proposes an ordered list of steps. The user approves the plan
//! as a whole and then every step on its own; shell steps still go through
//! the guarded executor.

mod step;

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use crossterm::style::Stylize;
use tracing::{debug, info, warn};

pub use step::{Operation, SetupStep, parse_steps};

use crate::ai::client::LlmClient;
use crate::ai::prompt;
use crate::shell::confirm::Confirm;
use crate::shell::executor::GuardedExecutor;

const WRAP_WIDTH: usize = 76;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardState {
    Requested,
    StepsGenerated,
    StepConfirmed(usize),
    StepExecuting(usize),
    StepCompleted(usize),
    StepDeclined(usize),
    StepFailed(usize),
    Completed,
    AbortedEarly,
}

/// Outcome of one wizard run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WizardReport {
    pub state: WizardState,
    pub steps_total: usize,
    pub steps_succeeded: usize,
    /// Every state the run went through, in order.
    pub transitions: Vec<WizardState>,
}

struct Transitions(Vec<WizardState>);

impl Transitions {
    fn push(&mut self, state: WizardState) {
        debug!("Setup wizard -> {:?}", state);
        self.0.push(state);
    }

    fn finish(mut self, state: WizardState, steps_total: usize, steps_succeeded: usize) -> WizardReport {
        self.push(state);
        WizardReport {
            state,
            steps_total,
            steps_succeeded,
            transitions: self.0,
        }
    }
}

fn wrapped(text: &str, indent: &str) -> String {
    textwrap::fill(
        text,
        textwrap::Options::new(WRAP_WIDTH)
            .initial_indent(indent)
            .subsequent_indent(indent),
    )
}

fn write_file(operation: Operation, path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }

    match operation {
        Operation::FileEdit => {
            let mut file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open {}", path.display()))?;
            file.write_all(content.as_bytes())
                .with_context(|| format!("Failed to append to {}", path.display()))?;
        }
        _ => fs::write(path, content)
            .with_context(|| format!("Failed to write {}", path.display()))?,
    }
    Ok(())
}

pub struct SetupWizard<'a> {
    llm: &'a dyn LlmClient,
    executor: &'a GuardedExecutor,
}

impl<'a> SetupWizard<'a> {
    pub fn new(llm: &'a dyn LlmClient, executor: &'a GuardedExecutor) -> Self {
        Self { llm, executor }
    }

    /// Ask the model for a plan. Always returns at least one step.
    pub async fn generate_steps(&self, request: &str) -> Vec<SetupStep> {
        let chat = prompt::setup_request(request, &self.executor.context().render());
        match self.llm.complete(chat).await {
            Ok(response) => parse_steps(&response),
            Err(e) => {
                warn!("Setup step generation failed: {:#}", e);
                println!("Error generating setup commands: {:#}", e);
                vec![SetupStep::fallback()]
            }
        }
    }

    /// Generate a plan for `request` and walk the user through it.
    pub async fn run(&self, request: &str, confirm: &mut dyn Confirm) -> WizardReport {
        println!("\nAnalyzing setup request: {}", request);
        let steps = self.generate_steps(request).await;
        self.run_steps(&steps, confirm).await
    }

    /// Walk the user through an already generated plan.
    pub async fn run_steps(&self, steps: &[SetupStep], confirm: &mut dyn Confirm) -> WizardReport {
        let mut transitions = Transitions(Vec::new());
        transitions.push(WizardState::Requested);
        transitions.push(WizardState::StepsGenerated);

        println!("\n{}", "Proposed setup steps:".bold());
        for (i, step) in steps.iter().enumerate() {
            println!("\n{}. {}", i + 1, step.description);
            println!("   Operation: {}", step.operation);
            if let Some(path) = &step.path {
                println!("   File: {}", path);
            }
        }

        if !confirm.confirm("\nWould you like to proceed with these steps?") {
            info!("Setup plan declined");
            return transitions.finish(WizardState::AbortedEarly, steps.len(), 0);
        }

        let mut succeeded = 0;
        for (i, step) in steps.iter().enumerate() {
            println!("\nExecuting step {}/{}", i + 1, steps.len());
            if self.execute_step(i, step, confirm, &mut transitions).await {
                succeeded += 1;
                continue;
            }

            println!("{}", "Step failed.".red());
            if !confirm.confirm("Would you like to continue anyway?") {
                info!("Setup stopped after step {}", i + 1);
                return transitions.finish(WizardState::AbortedEarly, steps.len(), succeeded);
            }
        }

        println!("\n{}", "Setup completed!".green());
        transitions.finish(WizardState::Completed, steps.len(), succeeded)
    }

    async fn execute_step(
        &self,
        index: usize,
        step: &SetupStep,
        confirm: &mut dyn Confirm,
        transitions: &mut Transitions,
    ) -> bool {
        println!("\nStep:\n{}", wrapped(&step.description, "  "));

        let question = match step.operation {
            Operation::Command => {
                if step.requires_sudo {
                    println!("Note: This step requires administrative privileges");
                }
                println!("Command to execute: {}", step.content);
                "Execute this command?"
            }
            Operation::FileCreate | Operation::FileEdit => {
                let Some(path) = step.path.as_deref() else {
                    println!("Error: File path is empty");
                    transitions.push(WizardState::StepFailed(index));
                    return false;
                };
                println!("File: {}\nContent:\n---\n{}\n---", path, step.content);
                if step.operation == Operation::FileCreate {
                    "Create this file?"
                } else {
                    "Edit this file?"
                }
            }
        };

        if !confirm.confirm(question) {
            transitions.push(WizardState::StepDeclined(index));
            return false;
        }
        transitions.push(WizardState::StepConfirmed(index));
        transitions.push(WizardState::StepExecuting(index));

        let ok = match (step.operation, step.path.as_deref()) {
            (Operation::Command, _) => self.executor.execute(&step.content, confirm).await,
            (operation, Some(path)) => match write_file(operation, Path::new(path), &step.content) {
                Ok(()) => {
                    let verb = if operation == Operation::FileCreate { "created" } else { "edited" };
                    println!("Successfully {} {}", verb, path);
                    true
                }
                Err(e) => {
                    warn!("Setup file step failed: {:#}", e);
                    println!("{}", format!("Error: {:#}", e).red());
                    false
                }
            },
            (_, None) => false,
        };

        transitions.push(if ok {
            WizardState::StepCompleted(index)
        } else {
            WizardState::StepFailed(index)
        });
        ok
    }
}
