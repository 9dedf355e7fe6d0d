//! Command and output logging for AI context.
//!
//! This module records executed commands and their captured outputs,
//! providing conversational grounding for the model call sites.

use std::collections::VecDeque;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// A single command execution record with its output.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CommandRecord {
    #[serde(rename = "command")]
    pub command_line: String,
    pub output: String,
    pub timestamp: DateTime<Local>,
}

impl CommandRecord {
    /// Create a new record stamped with the current time.
    /// ANSI escape codes are stripped so stored output is clean.
    pub fn new(command_line: impl Into<String>, output: &str) -> Self {
        Self {
            command_line: command_line.into(),
            output: strip_ansi_codes(output),
            timestamp: Local::now(),
        }
    }
}

/// Maintains a bounded log of recent command executions.
///
/// Records are never modified once pushed; when the log is full the
/// oldest record is evicted.
#[derive(Debug)]
pub struct CommandLog {
    entries: VecDeque<CommandRecord>,
    max_len: usize,
}

impl CommandLog {
    /// Create a new command log with a maximum capacity (at least one).
    pub fn new(max_len: usize) -> Self {
        let max_len = max_len.max(1);
        Self {
            entries: VecDeque::with_capacity(max_len + 1),
            max_len,
        }
    }

    /// Add a command record to the log.
    /// If the log is over capacity afterwards, removes the oldest entry.
    pub fn push(&mut self, record: CommandRecord) {
        self.entries.push_back(record);
        while self.entries.len() > self.max_len {
            self.entries.pop_front();
        }
    }

    /// Iterate over all records, oldest first.
    pub fn entries(&self) -> impl Iterator<Item = &CommandRecord> {
        self.entries.iter()
    }

    /// Get the most recent n command records, oldest first.
    pub fn recent(&self, n: usize) -> Vec<CommandRecord> {
        let start = self.entries.len().saturating_sub(n);
        self.entries.iter().skip(start).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.max_len
    }
}

impl Default for CommandLog {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_CONTEXT_LIMIT)
    }
}

/// Strip ANSI escape codes from text.
/// Removes color codes, cursor movements, and other terminal control sequences.
fn strip_ansi_codes(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '\x1b' {
            result.push(ch);
            continue;
        }
        match chars.peek() {
            Some('[') => {
                chars.next();
                // CSI sequences end with a letter.
                while let Some(next_ch) = chars.next() {
                    if next_ch.is_ascii_alphabetic() {
                        break;
                    }
                }
            }
            Some(']') => {
                chars.next();
                // OSC sequences end with BEL or ST (ESC \).
                while let Some(next_ch) = chars.next() {
                    if next_ch == '\x07' {
                        break;
                    }
                    if next_ch == '\x1b' && chars.peek() == Some(&'\\') {
                        chars.next();
                        break;
                    }
                }
            }
            _ => {}
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(cmd: &str) -> CommandRecord {
        CommandRecord::new(cmd, "")
    }

    #[test]
    fn test_strip_ansi_codes() {
        let input = "\x1b[31mRed text\x1b[0m Normal text";
        assert_eq!(strip_ansi_codes(input), "Red text Normal text");

        let input = "Line 1\x1b[2J\x1b[HCleared";
        assert_eq!(strip_ansi_codes(input), "Line 1Cleared");

        let input = "Before\x1b]7;file://host/path\x07After";
        assert_eq!(strip_ansi_codes(input), "BeforeAfter");

        assert_eq!(strip_ansi_codes("Plain text"), "Plain text");
    }

    #[test]
    fn test_record_strips_ansi() {
        let rec = CommandRecord::new("ls", "\x1b[31mfile1.txt\x1b[0m\n\x1b[32mfile2.txt\x1b[0m\n");
        assert_eq!(rec.output, "file1.txt\nfile2.txt\n");
    }

    #[test]
    fn test_bounded_log_evicts_oldest() {
        let mut log = CommandLog::new(3);

        for cmd in ["cmd1", "cmd2", "cmd3", "cmd4"] {
            log.push(record(cmd));
        }

        assert_eq!(log.len(), 3);
        let names: Vec<_> = log.entries().map(|r| r.command_line.as_str()).collect();
        assert_eq!(names, vec!["cmd2", "cmd3", "cmd4"]);
    }

    #[test]
    fn test_recent() {
        let mut log = CommandLog::new(10);
        for cmd in ["cmd1", "cmd2", "cmd3", "cmd4"] {
            log.push(record(cmd));
        }

        let recent = log.recent(2);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].command_line, "cmd3");
        assert_eq!(recent[1].command_line, "cmd4");

        assert_eq!(log.recent(50).len(), 4);
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let mut log = CommandLog::new(0);
        log.push(record("a"));
        log.push(record("b"));
        assert_eq!(log.capacity(), 1);
        assert_eq!(log.recent(1)[0].command_line, "b");
    }

    #[test]
    fn test_timestamps_are_ordered() {
        let mut log = CommandLog::new(5);
        log.push(record("first"));
        log.push(record("second"));
        let recent = log.recent(2);
        assert!(recent[0].timestamp <= recent[1].timestamp);
    }
}
