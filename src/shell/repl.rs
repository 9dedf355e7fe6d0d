//! Interactive read-eval loop.
//!
//! Line editing is handled by rustyline. The helper shows the current AI
//! suggestion as a dim inline hint; Tab or Right arrow accepts it.

use std::borrow::Cow;
use std::sync::Arc;

use anyhow::Result;
use crossterm::style::Stylize;
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::history::DefaultHistory;
use rustyline::{Cmd, Completer, Config, Editor, Helper, KeyCode, KeyEvent, Modifiers, Validator};
use tracing::{debug, error, info};

use super::Session;
use super::confirm::{StdinConfirm, on_multi_thread_runtime};
use crate::ai::suggest::{SuggestionEngine, SuggestionSlot};

const PROMPT: &str = "$ ";

/// One line of user input, classified by its prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input<'a> {
    Empty,
    Exit,
    /// `%%request`
    Setup(&'a str),
    /// `?query`
    Translate(&'a str),
    /// `!error message`
    Troubleshoot(&'a str),
    /// A special prefix without its argument.
    Usage(&'static str),
    Command(&'a str),
}

pub fn parse_input(line: &str) -> Input<'_> {
    let line = line.trim();
    if line.is_empty() {
        return Input::Empty;
    }
    if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
        return Input::Exit;
    }

    if let Some(request) = line.strip_prefix("%%") {
        return match request.trim() {
            "" => Input::Usage("Please provide a setup request after %%"),
            request => Input::Setup(request),
        };
    }
    if let Some(message) = line.strip_prefix("!error") {
        return match message.trim() {
            "" => Input::Usage("Usage: !error <paste error message>"),
            message => Input::Troubleshoot(message),
        };
    }
    if let Some(query) = line.strip_prefix('?') {
        return match query.trim() {
            "" => Input::Usage("Please provide a query after ?"),
            query => Input::Translate(query),
        };
    }
    Input::Command(line)
}

#[derive(Helper, Completer, Validator)]
pub struct ShellHelper {
    engine: Option<Arc<SuggestionEngine>>,
    slot: SuggestionSlot,
}

impl ShellHelper {
    pub fn new(engine: Option<Arc<SuggestionEngine>>) -> Self {
        let slot = engine
            .as_ref()
            .map(|engine| engine.slot().clone())
            .unwrap_or_default();
        Self { engine, slot }
    }
}

impl Hinter for ShellHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &rustyline::Context<'_>) -> Option<String> {
        if pos < line.len() {
            return None;
        }
        if let Some(engine) = &self.engine {
            // Detached; the result lands in the slot for a later redraw.
            let _fetch = engine.on_input_changed(line);
        }
        self.slot.hint_for(line)
    }
}

impl Highlighter for ShellHelper {
    fn highlight_prompt<'b, 's: 'b, 'p: 'b>(&'s self, prompt: &'p str, _default: bool) -> Cow<'b, str> {
        Cow::Owned(prompt.green().bold().to_string())
    }

    fn highlight_hint<'h>(&self, hint: &'h str) -> Cow<'h, str> {
        Cow::Owned(hint.dark_grey().to_string())
    }
}

fn print_banner(session: &Session) {
    let config = session.config();
    println!("{}", "=== Rusty Shell ===".bold());
    println!("Type commands directly or start with ? for natural language (e.g., ?how to list all files)");
    println!("Special commands:");
    println!("  %%       - Start setup wizard with context awareness");
    println!("  ?        - Natural language command translation");
    println!("  !error   - Error analysis");
    println!("  history  - Show recent commands");
    println!(
        "  Note: Shell keeps the last {} commands as context",
        config.context_limit
    );
    if session.suggestions().is_some() {
        println!("Press TAB or RIGHT ARROW to accept suggestions, ENTER to execute");
    }
    match config.masked_api_key() {
        Some(key) => println!("Model: {} ({}, key {})", config.model, config.api_base, key),
        None => println!(
            "{}",
            "No API key configured; set RUSTY_SHELL_API_KEY to enable AI features".yellow()
        ),
    }
    println!();
}

fn read_line(editor: &mut Editor<ShellHelper, DefaultHistory>) -> rustyline::Result<String> {
    if on_multi_thread_runtime() {
        tokio::task::block_in_place(|| editor.readline(PROMPT))
    } else {
        editor.readline(PROMPT)
    }
}

/// Run the shell until `exit`, `quit` or end of input.
pub async fn run(session: &Session) -> Result<()> {
    let config = Config::builder().auto_add_history(true).build();
    let mut editor: Editor<ShellHelper, DefaultHistory> = Editor::with_config(config)?;
    editor.set_helper(Some(ShellHelper::new(session.suggestions())));
    editor.bind_sequence(KeyEvent(KeyCode::Tab, Modifiers::NONE), Cmd::CompleteHint);

    print_banner(session);
    let mut confirm = StdinConfirm;

    loop {
        let line = match read_line(&mut editor) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) => {
                println!("Use 'exit' or 'quit' to exit");
                continue;
            }
            Err(ReadlineError::Eof) => break,
            Err(e) => {
                error!("Readline failed: {}", e);
                return Err(e.into());
            }
        };
        session.clear_suggestion();

        match parse_input(&line) {
            Input::Empty => {}
            Input::Exit => break,
            Input::Usage(message) => println!("{}", message),
            Input::Setup(request) => {
                let report = session.setup(request, &mut confirm).await;
                debug!("Setup finished: {:?}", report);
            }
            Input::Troubleshoot(message) => {
                session.troubleshoot(message, &mut confirm).await;
            }
            Input::Translate(query) => {
                session.translate_and_run(query, &mut confirm).await;
            }
            Input::Command(command) => {
                session.execute(command, &mut confirm).await;
            }
        }
    }

    info!("Shell exiting");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_special_prefixes() {
        assert_eq!(parse_input("%% install postgres"), Input::Setup("install postgres"));
        assert_eq!(parse_input("?list all files"), Input::Translate("list all files"));
        assert_eq!(
            parse_input("!error ModuleNotFoundError: No module named 'x'"),
            Input::Troubleshoot("ModuleNotFoundError: No module named 'x'")
        );
    }

    #[test]
    fn test_parse_missing_arguments() {
        assert_eq!(parse_input("%%"), Input::Usage("Please provide a setup request after %%"));
        assert_eq!(parse_input("?  "), Input::Usage("Please provide a query after ?"));
        assert_eq!(parse_input("!error"), Input::Usage("Usage: !error <paste error message>"));
    }

    #[test]
    fn test_parse_exit_and_commands() {
        assert_eq!(parse_input("  "), Input::Empty);
        assert_eq!(parse_input("EXIT"), Input::Exit);
        assert_eq!(parse_input("quit"), Input::Exit);
        assert_eq!(parse_input("  ls -la  "), Input::Command("ls -la"));
        assert_eq!(parse_input("exit 1"), Input::Command("exit 1"));
        assert_eq!(parse_input("!!"), Input::Command("!!"));
    }

    #[test]
    fn test_helper_without_engine_reads_slot() {
        let helper = ShellHelper::new(None);
        helper.slot.set("git status");
        assert_eq!(helper.slot.hint_for("git st").as_deref(), Some("atus"));
    }
}
