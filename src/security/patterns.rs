//! Static table of destructive command signatures.
//!
//! Matching is case-insensitive and ordered: the first rule that matches
//! wins. No I/O happens here, so the table is checked before any model call.

use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};

use super::{Category, Severity};

/// What the resolver should enumerate for a matched rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveStrategy {
    /// Nothing to enumerate.
    None,
    /// Paths named by a deletion command.
    DeletedPaths,
    /// Modified and untracked paths in the git working tree.
    GitWorkingTree,
    /// Paths changed by the commit being reverted.
    GitCommitFiles,
}

#[derive(Debug)]
pub struct PatternRule {
    regex: Regex,
    pub reason: &'static str,
    pub severity: Severity,
    pub category: Category,
    pub strategy: ResolveStrategy,
}

impl PatternRule {
    pub fn pattern(&self) -> &str {
        self.regex.as_str()
    }

    pub fn is_match(&self, command: &str) -> bool {
        self.regex.is_match(command)
    }
}

type RuleSpec = (&'static str, &'static str, Severity, Category, ResolveStrategy);

const RULE_SPECS: &[RuleSpec] = &[
    (r"\brm\s+-[rf]*\b", "File/directory deletion", Severity::High, Category::Filesystem, ResolveStrategy::DeletedPaths),
    (r"\bsystemctl\s+(stop|restart|disable)\b", "Service interruption", Severity::High, Category::Service, ResolveStrategy::None),
    (r"\bservice\s+\w+\s+(stop|restart)\b", "Service interruption", Severity::High, Category::Service, ResolveStrategy::None),
    (r"\bgit\s+reset\s+--hard\b", "Hard reset of git changes", Severity::High, Category::Git, ResolveStrategy::GitWorkingTree),
    (r"\bgit\s+clean\s+-[fd]+\b", "Removal of untracked files", Severity::Medium, Category::Git, ResolveStrategy::GitWorkingTree),
    (r"\bgit\s+push\s+(-f|--force)\b", "Force push to repository", Severity::High, Category::Git, ResolveStrategy::None),
    (r"\bgit\s+revert\b", "Reverting commits", Severity::Medium, Category::Git, ResolveStrategy::GitCommitFiles),
    (r"\bdd\b", "Direct disk operations", Severity::Critical, Category::System, ResolveStrategy::None),
    (r"\bformat\b", "Formatting operations", Severity::Critical, Category::System, ResolveStrategy::None),
    (r"[>|2]>\s*/dev", "Device file operations", Severity::High, Category::System, ResolveStrategy::None),
    (r"\bchmod\s+-[R]*\b", "Recursive permission changes", Severity::Medium, Category::Filesystem, ResolveStrategy::None),
    (r"\bsudo\s+", "Administrative privileges required", Severity::Medium, Category::System, ResolveStrategy::None),
];

static RULES: LazyLock<Vec<PatternRule>> = LazyLock::new(|| {
    RULE_SPECS
        .iter()
        .filter_map(|&(pattern, reason, severity, category, strategy)| {
            match RegexBuilder::new(pattern).case_insensitive(true).build() {
                Ok(regex) => Some(PatternRule {
                    regex,
                    reason,
                    severity,
                    category,
                    strategy,
                }),
                Err(e) => {
                    tracing::error!("Skipping invalid destructive pattern {:?}: {}", pattern, e);
                    None
                }
            }
        })
        .collect()
});

/// All compiled rules in match order.
pub fn rules() -> &'static [PatternRule] {
    &RULES
}

/// Return the first destructive rule matching `command`.
///
/// `None` only means the static table has nothing to say about the
/// command; it is not a statement that the command is safe.
///
/// ```
/// use rusty_shell::security::classify;
///
/// let rule = classify("RM -RF build").unwrap();
/// assert_eq!(rule.reason, "File/directory deletion");
/// assert!(classify("ls -la").is_none());
/// ```
pub fn classify(command: &str) -> Option<&'static PatternRule> {
    rules().iter().find(|rule| rule.is_match(command))
}
