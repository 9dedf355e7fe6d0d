//! Enumerates the concrete resources a destructive command would touch.
//!
//! Resolution is best-effort: whatever goes wrong is folded into a single
//! diagnostic entry so the confirmation prompt can still be shown.

use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result, anyhow, bail};
use tracing::warn;
use walkdir::WalkDir;

use super::patterns::{PatternRule, ResolveStrategy};
use crate::utils::{expand_tilde, strip_quotes};

/// Stop walking after this many entries; `rm -rf /` should not hang the prompt.
const MAX_ENUMERATED: usize = 5_000;

/// Prefix of the synthetic entry reported when enumeration fails.
pub const UNRESOLVED_PREFIX: &str = "Unable to determine affected files";

/// List the resources `command` would affect under `rule`.
///
/// Never fails: enumeration errors come back as a single
/// `"Unable to determine affected files: ..."` entry.
pub fn resolve(command: &str, rule: &PatternRule) -> Vec<String> {
    let result = match rule.strategy {
        ResolveStrategy::None => return Vec::new(),
        ResolveStrategy::DeletedPaths => deleted_paths(command),
        ResolveStrategy::GitWorkingTree => git_working_tree(),
        ResolveStrategy::GitCommitFiles => git_commit_files(command),
    };

    result.unwrap_or_else(|e| {
        warn!("Failed to resolve affected resources for {:?}: {:#}", command, e);
        vec![format!("{}: {:#}", UNRESOLVED_PREFIX, e)]
    })
}

fn is_delete_verb(token: &str) -> bool {
    let name = token.rsplit('/').next().unwrap_or(token);
    name.eq_ignore_ascii_case("rm")
}

/// First non-flag argument after the deletion verb.
fn deletion_target(command: &str) -> Result<&str> {
    let tokens: Vec<&str> = command.split_whitespace().collect();
    let verb = tokens
        .iter()
        .position(|t| is_delete_verb(t))
        .ok_or_else(|| anyhow!("no deletion command found"))?;

    tokens[verb + 1..]
        .iter()
        .find(|t| !t.starts_with('-'))
        .copied()
        .map(strip_quotes)
        .ok_or_else(|| anyhow!("no path argument after `{}`", tokens[verb]))
}

fn expand(target: &str) -> Result<Vec<PathBuf>> {
    // A pattern without metacharacters can only match itself.
    if !target.contains(['*', '?', '[']) {
        return Ok(vec![PathBuf::from(target)]);
    }

    let matches: Vec<PathBuf> = glob::glob(target)
        .with_context(|| format!("invalid glob pattern `{}`", target))?
        .filter_map(|entry| entry.ok())
        .collect();

    if matches.is_empty() {
        Ok(vec![PathBuf::from(target)])
    } else {
        Ok(matches)
    }
}

fn directory_marker(path: &Path) -> String {
    let display = path.display().to_string();
    format!("{}/", display.trim_end_matches('/'))
}

fn collect_path(path: &Path, out: &mut Vec<String>) -> Result<()> {
    // symlink_metadata so a dangling link still counts as something to delete.
    let Ok(meta) = path.symlink_metadata() else {
        return Ok(());
    };

    if !meta.is_dir() {
        out.push(path.display().to_string());
        return Ok(());
    }

    for entry in WalkDir::new(path).sort_by_file_name() {
        if out.len() >= MAX_ENUMERATED {
            out.push(format!("(stopped listing after {} entries)", MAX_ENUMERATED));
            break;
        }
        let entry = entry.with_context(|| format!("failed to walk {}", path.display()))?;
        if entry.file_type().is_dir() {
            out.push(directory_marker(entry.path()));
        } else {
            out.push(entry.path().display().to_string());
        }
    }
    Ok(())
}

fn deleted_paths(command: &str) -> Result<Vec<String>> {
    // The shell expands `~` before rm sees it.
    let target = expand_tilde(deletion_target(command)?);
    let mut affected = Vec::new();
    for path in expand(&target.to_string_lossy())? {
        collect_path(&path, &mut affected)?;
        if affected.len() > MAX_ENUMERATED {
            break;
        }
    }
    Ok(affected)
}

fn run_git(args: &[&str]) -> Result<String> {
    let output = Command::new("git")
        .args(args)
        .output()
        .with_context(|| format!("failed to run git {}", args.join(" ")))?;

    if !output.status.success() {
        bail!(
            "git {} failed: {}",
            args.first().copied().unwrap_or_default(),
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

fn git_working_tree() -> Result<Vec<String>> {
    let stdout = run_git(&["status", "--porcelain"])?;
    Ok(parse_porcelain(&stdout))
}

fn git_commit_files(command: &str) -> Result<Vec<String>> {
    let commit = command
        .split_whitespace()
        .last()
        .filter(|t| !t.eq_ignore_ascii_case("revert") && !t.starts_with('-'))
        .unwrap_or("HEAD");
    let stdout = run_git(&["show", "--name-only", "--format=", commit])?;
    Ok(parse_show_names(&stdout))
}

/// Paths from `git status --porcelain` (the two status letters and a space stripped).
fn parse_porcelain(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.get(3..).unwrap_or(line).to_string())
        .collect()
}

/// Paths from `git show --name-only`, ignoring the commit metadata line.
fn parse_show_names(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with("commit "))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::security::classify;
    use std::fs;

    fn deletion_rule() -> &'static PatternRule {
        classify("rm -rf x").unwrap()
    }

    #[test]
    fn test_directory_enumeration() {
        let dir = tempfile::tempdir().unwrap();
        let tmp = dir.path().join("tmp");
        fs::create_dir(&tmp).unwrap();
        fs::write(tmp.join("a.txt"), "a").unwrap();
        fs::write(tmp.join("b.txt"), "b").unwrap();

        let command = format!("rm -rf {}", tmp.display());
        let affected = resolve(&command, deletion_rule());

        assert_eq!(
            affected,
            vec![
                format!("{}/", tmp.display()),
                format!("{}/a.txt", tmp.display()),
                format!("{}/b.txt", tmp.display()),
            ]
        );
    }

    #[test]
    fn test_directory_with_n_files_yields_marker_plus_n() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("data");
        fs::create_dir(&target).unwrap();
        for i in 0..7 {
            fs::write(target.join(format!("f{}.log", i)), "x").unwrap();
        }

        let affected = resolve(&format!("rm -r {}", target.display()), deletion_rule());
        assert_eq!(affected.len(), 8);
        assert_eq!(affected.iter().filter(|p| p.ends_with('/')).count(), 1);
    }

    #[test]
    fn test_nested_directories_are_marked() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("root");
        fs::create_dir_all(root.join("sub")).unwrap();
        fs::write(root.join("sub").join("deep.txt"), "x").unwrap();

        let affected = resolve(&format!("rm -rf {}/", root.display()), deletion_rule());
        assert_eq!(
            affected,
            vec![
                format!("{}/", root.display()),
                format!("{}/sub/", root.display()),
                format!("{}/sub/deep.txt", root.display()),
            ]
        );
    }

    #[test]
    fn test_single_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("notes.txt");
        fs::write(&file, "x").unwrap();

        let affected = resolve(&format!("rm -f {}", file.display()), deletion_rule());
        assert_eq!(affected, vec![file.display().to_string()]);
    }

    #[test]
    fn test_glob_expansion() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("one.log"), "").unwrap();
        fs::write(dir.path().join("two.log"), "").unwrap();
        fs::write(dir.path().join("keep.txt"), "").unwrap();

        let affected = resolve(&format!("rm -f {}/*.log", dir.path().display()), deletion_rule());
        assert_eq!(affected.len(), 2);
        assert!(affected.iter().all(|p| p.ends_with(".log")));
    }

    #[test]
    fn test_missing_path_yields_nothing() {
        let affected = resolve("rm -rf /definitely/not/here/xyz", deletion_rule());
        assert!(affected.is_empty());
    }

    #[test]
    fn test_missing_argument_is_reported() {
        let affected = resolve("rm -rf", deletion_rule());
        assert_eq!(affected.len(), 1);
        assert!(affected[0].starts_with(UNRESOLVED_PREFIX));
    }

    #[test]
    fn test_deletion_target_skips_prefix_and_flags() {
        assert_eq!(deletion_target("sudo rm -rf -v build").unwrap(), "build");
        assert_eq!(deletion_target("/bin/rm -f build.log").unwrap(), "build.log");
        assert_eq!(deletion_target("rm -r \"dir\"").unwrap(), "dir");
    }

    #[test]
    fn test_tilde_target_is_expanded() {
        let home = dirs::home_dir().unwrap();
        let dir = tempfile::Builder::new()
            .prefix("rusty-shell-resolve")
            .tempdir_in(&home)
            .unwrap();
        let name = dir.path().file_name().unwrap().to_string_lossy().into_owned();
        fs::write(dir.path().join("a.txt"), "a").unwrap();

        let affected = resolve(&format!("rm -rf ~/{}", name), deletion_rule());
        assert_eq!(
            affected,
            vec![
                format!("{}/", home.join(&name).display()),
                home.join(&name).join("a.txt").display().to_string(),
            ]
        );
    }

    #[test]
    fn test_non_enumerating_rule_returns_empty() {
        let rule = classify("systemctl stop nginx").unwrap();
        assert!(resolve("systemctl stop nginx", rule).is_empty());
    }

    #[test]
    fn test_parse_porcelain() {
        let stdout = " M src/main.rs\n?? notes.md\nA  new.rs\n\n";
        assert_eq!(parse_porcelain(stdout), vec!["src/main.rs", "notes.md", "new.rs"]);
    }

    #[test]
    fn test_parse_show_names() {
        let stdout = "commit 1a2b3c\n\nsrc/lib.rs\nREADME.md\n";
        assert_eq!(parse_show_names(stdout), vec!["src/lib.rs", "README.md"]);
    }
}
