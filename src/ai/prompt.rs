//! Prompt building utilities for AI requests.
//!
//! Each call site has a fixed system instruction and a request builder
//! that folds the user input (and, where relevant, the rendered command
//! context) into the user message.

use super::client::ChatRequest;

const RISK_SYSTEM_PROMPT: &str = r#"You are a command-line security expert. Analyze the given command and determine if it's potentially destructive.
Consider operations that could:
- Delete or modify files/directories
- Affect system configuration
- Impact system stability
- Modify important settings
- Require elevated privileges
- Have network-wide effects
- Be irreversible

Respond ONLY with a JSON object:
{
    "is_destructive": true/false,
    "reason": "Brief explanation of why it's considered destructive",
    "severity": "low/medium/high/critical",
    "category": "filesystem/system/service/git/network/database/other"
}"#;

const COMPLETION_SYSTEM_PROMPT: &str = "You are a command-line expert. Complete the given command. \
Respond ONLY with the completed command, no explanations. Focus on common commands like git, docker, \
npm, pip, cargo, ls, cd, mkdir, rm, cp, mv, grep, find, chmod, ps, kill, curl, tar, ssh, systemctl \
and the tools a developer typically uses.";

const SETUP_SYSTEM_PROMPT: &str = r#"You are a command-line expert. Generate appropriate commands based on the request and previous command context.
Previous commands and their outputs are provided for context.
ALWAYS return the response in this exact JSON format:
[
    {
        "description": "Brief description of what this step does",
        "operation": "command",
        "content": "the actual command to run"
    }
]
"operation" is one of "command", "file_create" or "file_edit". File operations also need a "path".
Set "requires_sudo": true on steps that need administrative privileges.
For simple commands, return just one step. Use common Unix/Linux commands."#;

const TROUBLESHOOT_SYSTEM_PROMPT: &str = r#"You are a development troubleshooter. Analyze the error message and suggest fixes.
Return a valid JSON object with this exact structure:
{
    "error_type": "import_error",
    "project_type": "python",
    "missing_dependencies": ["package_name"],
    "commands": ["pip install package_name"],
    "explanation": "Package X is not installed",
    "file_changes": [{"file": "path", "changes": "description"}]
}"#;

fn translate_system_prompt(context_limit: usize) -> String {
    format!(
        "You are a command-line expert. Convert natural language queries into appropriate shell commands.\n\
         Consider the context of previous commands when suggesting new ones.\n\
         For file operations, prefer simple commands like touch, echo, mkdir, etc.\n\
         You have access to the last {context_limit} commands and their outputs for context.\n\
         Respond ONLY with the command, no explanations or additional text."
    )
}

/// Ask for a destructive/safe verdict on `command`.
pub fn risk_request(command: &str, context: &str) -> ChatRequest {
    ChatRequest::new(
        RISK_SYSTEM_PROMPT,
        format!("Recent command history:\n{context}\n\nAnalyze this command: {command}"),
        150,
    )
}

/// Ask for the completion of a partially typed command.
pub fn completion_request(typed: &str) -> ChatRequest {
    ChatRequest::new(
        COMPLETION_SYSTEM_PROMPT,
        format!("Complete this command: {typed}"),
        50,
    )
}

/// Ask for one shell command implementing a natural-language query.
pub fn translate_request(query: &str, context: &str, context_limit: usize) -> ChatRequest {
    ChatRequest::new(
        translate_system_prompt(context_limit),
        format!("Recent command history:\n{context}\n\nConvert this to a shell command: {query}"),
        100,
    )
}

/// Ask for an ordered JSON list of setup steps.
pub fn setup_request(request: &str, context: &str) -> ChatRequest {
    ChatRequest::new(
        SETUP_SYSTEM_PROMPT,
        format!("Recent command history:\n{context}\n\nRequest: {request}"),
        1000,
    )
}

/// Ask for a structured fix plan for a pasted error.
pub fn error_request(error: &str, project_json: &str, context: &str) -> ChatRequest {
    ChatRequest::new(
        TROUBLESHOOT_SYSTEM_PROMPT,
        format!(
            "Recent command history:\n{context}\n\nError message: {error}\nProject info: {project_json}"
        ),
        500,
    )
}
