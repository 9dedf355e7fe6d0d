//! Yes/no prompts.
//!
//! Everything that needs the user's approval takes a `&mut dyn Confirm`,
//! so the same flows run against a terminal or against canned answers.

use std::collections::VecDeque;
use std::io::{self, BufRead, Write};

pub trait Confirm {
    /// Ask `question`; `true` only on an explicit yes.
    fn confirm(&mut self, question: &str) -> bool;
}

/// Reads answers from the terminal.
#[derive(Debug, Default)]
pub struct StdinConfirm;

pub fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

/// `block_in_place` panics outside a multi-thread runtime.
pub(crate) fn on_multi_thread_runtime() -> bool {
    tokio::runtime::Handle::try_current()
        .map(|handle| handle.runtime_flavor() == tokio::runtime::RuntimeFlavor::MultiThread)
        .unwrap_or(false)
}

fn read_answer(question: &str) -> io::Result<String> {
    let mut stdout = io::stdout();
    write!(stdout, "{} [y/N] ", question)?;
    stdout.flush()?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(answer)
}

impl Confirm for StdinConfirm {
    fn confirm(&mut self, question: &str) -> bool {
        let answer = if on_multi_thread_runtime() {
            tokio::task::block_in_place(|| read_answer(question))
        } else {
            read_answer(question)
        };
        match answer {
            Ok(answer) => is_affirmative(&answer),
            Err(e) => {
                tracing::warn!("Failed to read confirmation, treating as no: {}", e);
                false
            }
        }
    }
}

/// Replays canned answers and records the questions asked.
///
/// Once the answers run out every further question is declined.
#[derive(Debug, Default)]
pub struct ScriptedConfirm {
    answers: VecDeque<bool>,
    asked: Vec<String>,
}

impl ScriptedConfirm {
    pub fn new(answers: impl IntoIterator<Item = bool>) -> Self {
        Self {
            answers: answers.into_iter().collect(),
            asked: Vec::new(),
        }
    }

    pub fn asked(&self) -> &[String] {
        &self.asked
    }
}

impl Confirm for ScriptedConfirm {
    fn confirm(&mut self, question: &str) -> bool {
        self.asked.push(question.to_string());
        self.answers.pop_front().unwrap_or(false)
    }
}
