//! Runtime configuration for the shell.
//!
//! Settings are read from the process environment (after an optional `.env`
//! file has been loaded by `main`). Every field has a default so the shell
//! starts even with an empty environment; only the model calls need a key.

use std::time::Duration;

use tracing::warn;

/// Default OpenAI-compatible endpoint.
pub const DEFAULT_API_BASE: &str = "https://openrouter.ai/api/v1";
/// Default chat model.
pub const DEFAULT_MODEL: &str = "openai/gpt-3.5-turbo";
/// Number of executed commands kept as AI context.
pub const DEFAULT_CONTEXT_LIMIT: usize = 10;

const DEFAULT_TIMEOUT_MS: u64 = 5_000;
const DEFAULT_DEBOUNCE_MS: u64 = 300;

#[derive(Clone, Debug)]
pub struct ShellConfig {
    /// API key for the model endpoint. `None` leaves key lookup to async-openai.
    pub api_key: Option<String>,
    pub api_base: String,
    pub model: String,
    /// Upper bound for every outbound model request.
    pub request_timeout: Duration,
    /// Minimum interval between two inline suggestion requests.
    pub suggestion_debounce: Duration,
    /// Capacity of the command context store.
    pub context_limit: usize,
    pub suggestions_enabled: bool,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base: DEFAULT_API_BASE.to_string(),
            model: DEFAULT_MODEL.to_string(),
            request_timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            suggestion_debounce: Duration::from_millis(DEFAULT_DEBOUNCE_MS),
            context_limit: DEFAULT_CONTEXT_LIMIT,
            suggestions_enabled: true,
        }
    }
}

impl ShellConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    ///
    /// Malformed numeric values are logged and replaced by their defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let api_key = get("RUSTY_SHELL_API_KEY")
            .or_else(|| get("OPENROUTER_API_KEY"))
            .or_else(|| get("OPENAI_API_KEY"));

        let request_timeout = get("RUSTY_SHELL_TIMEOUT_MS")
            .and_then(|raw| parse_number::<u64>("RUSTY_SHELL_TIMEOUT_MS", &raw))
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
            .unwrap_or(defaults.request_timeout);

        let suggestion_debounce = get("RUSTY_SHELL_DEBOUNCE_MS")
            .and_then(|raw| parse_number::<u64>("RUSTY_SHELL_DEBOUNCE_MS", &raw))
            .map(Duration::from_millis)
            .unwrap_or(defaults.suggestion_debounce);

        let context_limit = get("RUSTY_SHELL_CONTEXT_LIMIT")
            .and_then(|raw| parse_number::<usize>("RUSTY_SHELL_CONTEXT_LIMIT", &raw))
            .filter(|n| *n > 0)
            .unwrap_or(defaults.context_limit);

        let suggestions_enabled = get("RUSTY_SHELL_SUGGESTIONS")
            .map(|raw| !matches!(raw.to_ascii_lowercase().as_str(), "0" | "off" | "false" | "no"))
            .unwrap_or(defaults.suggestions_enabled);

        Self {
            api_key,
            api_base: get("RUSTY_SHELL_API_BASE").unwrap_or(defaults.api_base),
            model: get("RUSTY_SHELL_MODEL").unwrap_or(defaults.model),
            request_timeout,
            suggestion_debounce,
            context_limit,
            suggestions_enabled,
        }
    }

    /// Key prefix safe to show in the startup banner.
    pub fn masked_api_key(&self) -> Option<String> {
        self.api_key
            .as_ref()
            .map(|key| format!("{}...", key.chars().take(8).collect::<String>()))
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, raw: &str) -> Option<T> {
    match raw.parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("Ignoring invalid value {:?} for {}", raw, key);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_with_empty_environment() {
        let cfg = ShellConfig::from_lookup(lookup(&[]));
        assert_eq!(cfg.api_key, None);
        assert_eq!(cfg.api_base, DEFAULT_API_BASE);
        assert_eq!(cfg.model, DEFAULT_MODEL);
        assert_eq!(cfg.request_timeout, Duration::from_secs(5));
        assert_eq!(cfg.suggestion_debounce, Duration::from_millis(300));
        assert_eq!(cfg.context_limit, 10);
        assert!(cfg.suggestions_enabled);
    }

    #[test]
    fn test_overrides() {
        let cfg = ShellConfig::from_lookup(lookup(&[
            ("RUSTY_SHELL_API_KEY", "sk-abcdefghijkl"),
            ("RUSTY_SHELL_MODEL", "gpt-4o-mini"),
            ("RUSTY_SHELL_TIMEOUT_MS", "1500"),
            ("RUSTY_SHELL_CONTEXT_LIMIT", "4"),
            ("RUSTY_SHELL_SUGGESTIONS", "off"),
        ]));
        assert_eq!(cfg.api_key.as_deref(), Some("sk-abcdefghijkl"));
        assert_eq!(cfg.model, "gpt-4o-mini");
        assert_eq!(cfg.request_timeout, Duration::from_millis(1500));
        assert_eq!(cfg.context_limit, 4);
        assert!(!cfg.suggestions_enabled);
        assert_eq!(cfg.masked_api_key().as_deref(), Some("sk-abcde..."));
    }

    #[test]
    fn test_api_key_fallback_order() {
        let cfg = ShellConfig::from_lookup(lookup(&[
            ("OPENAI_API_KEY", "openai"),
            ("OPENROUTER_API_KEY", "router"),
        ]));
        assert_eq!(cfg.api_key.as_deref(), Some("router"));
    }

    #[test]
    fn test_invalid_numbers_fall_back() {
        let cfg = ShellConfig::from_lookup(lookup(&[
            ("RUSTY_SHELL_TIMEOUT_MS", "soon"),
            ("RUSTY_SHELL_CONTEXT_LIMIT", "0"),
        ]));
        assert_eq!(cfg.request_timeout, Duration::from_secs(5));
        assert_eq!(cfg.context_limit, DEFAULT_CONTEXT_LIMIT);
    }
}
