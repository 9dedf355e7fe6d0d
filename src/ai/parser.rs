//! Parser module for processing AI responses.
//!
//! Models rarely answer with exactly the requested shape. These helpers
//! pull a bare command or an embedded JSON value out of free-form text.

/// Reduce a model answer to a single shell command.
///
/// Takes the first non-empty line outside code-fence markers, drops any
/// trailing `#` comment and strips surrounding quotes or backticks.
///
/// ```
/// use rusty_shell::ai::parser::first_command_line;
///
/// assert_eq!(first_command_line("```bash\nls -la # list\n```"), "ls -la");
/// assert_eq!(first_command_line("\"git status\""), "git status");
/// ```
pub fn first_command_line(response: &str) -> String {
    let line = response
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty() && !line.starts_with("```"))
        .unwrap_or_default();

    let without_comment = line.split('#').next().unwrap_or_default().trim();
    without_comment
        .trim_matches(|c| c == '"' || c == '\'' || c == '`')
        .trim()
        .to_string()
}

/// Slice from the first `open` to the last `close`, inclusive.
fn extract_span(response: &str, open: char, close: char) -> Option<&str> {
    let start = response.find(open)?;
    let end = response.rfind(close)?;
    (end > start).then(|| &response[start..=end])
}

/// Outermost `{...}` span in the response.
pub fn extract_json_object(response: &str) -> Option<&str> {
    extract_span(response, '{', '}')
}

/// Outermost `[...]` span in the response.
pub fn extract_json_array(response: &str) -> Option<&str> {
    extract_span(response, '[', ']')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_command_line_plain() {
        assert_eq!(first_command_line("ls -la"), "ls -la");
        assert_eq!(first_command_line("  \n  pwd  \n echo later"), "pwd");
    }

    #[test]
    fn test_first_command_line_strips_decoration() {
        assert_eq!(first_command_line("`docker ps`"), "docker ps");
        assert_eq!(first_command_line("'du -sh .' # disk usage"), "du -sh .");
        assert_eq!(
            first_command_line("```\nfind . -name \"*.rs\" -type f\n```"),
            "find . -name \"*.rs\" -type f"
        );
    }

    #[test]
    fn test_first_command_line_empty() {
        assert_eq!(first_command_line(""), "");
        assert_eq!(first_command_line("```\n```"), "");
    }

    #[test]
    fn test_extract_json_object() {
        let text = "Result:\n{\"a\": {\"b\": 1}}\nThanks";
        assert_eq!(extract_json_object(text), Some("{\"a\": {\"b\": 1}}"));
        assert_eq!(extract_json_object("no json"), None);
        assert_eq!(extract_json_object("} backwards {"), None);
    }

    #[test]
    fn test_extract_json_array() {
        let text = "```json\n[{\"operation\": \"command\"}]\n```";
        assert_eq!(extract_json_array(text), Some("[{\"operation\": \"command\"}]"));
        assert_eq!(extract_json_array("nothing here"), None);
    }
}
