//! Lightweight project detection for error triage.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;
use tracing::debug;
use walkdir::{DirEntry, WalkDir};

const CONFIG_FILES: &[(&str, &[&str])] = &[
    ("python", &["requirements.txt", "Pipfile", "pyproject.toml", "setup.py"]),
    ("node", &["package.json", "package-lock.json", "yarn.lock"]),
    ("java", &["pom.xml", "build.gradle", "build.gradle.kts"]),
    ("ruby", &["Gemfile", "Gemfile.lock"]),
    ("php", &["composer.json", "composer.lock"]),
    ("rust", &["Cargo.toml", "Cargo.lock"]),
    ("go", &["go.mod", "go.sum"]),
];

const SOURCE_EXTENSIONS: &[(&str, &[&str])] = &[
    ("python", &["py"]),
    ("node", &["js", "jsx", "ts", "tsx"]),
    ("java", &["java"]),
    ("ruby", &["rb"]),
    ("php", &["php"]),
    ("rust", &["rs"]),
    ("go", &["go"]),
    ("html", &["html", "htm"]),
    ("css", &["css", "scss", "sass", "less"]),
];

const SKIPPED_DIRS: &[&str] = &["target", "node_modules"];

/// Stop counting sources after this many files.
const MAX_SCANNED_FILES: usize = 20_000;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProjectSummary {
    pub project_type: Option<String>,
    /// Language -> config file names present in the root.
    pub config_files: BTreeMap<String, Vec<String>>,
    /// Language -> number of source files.
    pub source_files: BTreeMap<String, usize>,
    /// Language -> declared dependency names.
    pub dependencies: BTreeMap<String, Vec<String>>,
}

pub struct ProjectScanner {
    root: PathBuf,
}

fn is_skipped(entry: &DirEntry) -> bool {
    if entry.depth() == 0 {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    name.starts_with('.') || (entry.file_type().is_dir() && SKIPPED_DIRS.iter().any(|dir| *dir == name))
}

fn language_for_extension(ext: &str) -> Option<&'static str> {
    SOURCE_EXTENSIONS
        .iter()
        .find(|(_, exts)| exts.iter().any(|e| *e == ext))
        .map(|(lang, _)| *lang)
}

pub fn parse_requirements(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

/// Names under `dependencies` and `devDependencies`.
pub fn parse_package_json(content: &str) -> Option<Vec<String>> {
    let manifest: Value = serde_json::from_str(content).ok()?;
    let names = ["dependencies", "devDependencies"]
        .iter()
        .filter_map(|key| manifest.get(*key).and_then(Value::as_object))
        .flat_map(|deps| deps.keys().cloned())
        .collect();
    Some(names)
}

impl ProjectScanner {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn scan(&self) -> ProjectSummary {
        let mut summary = ProjectSummary {
            config_files: self.find_config_files(),
            source_files: self.count_source_files(),
            ..Default::default()
        };
        summary.project_type = Self::project_type(&summary);
        summary.dependencies = self.dependencies(&summary);
        debug!("Scanned project at {}: {:?}", self.root.display(), summary.project_type);
        summary
    }

    fn find_config_files(&self) -> BTreeMap<String, Vec<String>> {
        CONFIG_FILES
            .iter()
            .filter_map(|(lang, files)| {
                let found: Vec<String> = files
                    .iter()
                    .filter(|file| self.root.join(file).is_file())
                    .map(|file| file.to_string())
                    .collect();
                (!found.is_empty()).then(|| (lang.to_string(), found))
            })
            .collect()
    }

    fn count_source_files(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        let walker = WalkDir::new(&self.root)
            .into_iter()
            .filter_entry(|entry| !is_skipped(entry))
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().is_file())
            .take(MAX_SCANNED_FILES);

        for entry in walker {
            let lang = entry
                .path()
                .extension()
                .and_then(|ext| ext.to_str())
                .and_then(language_for_extension);
            if let Some(lang) = lang {
                *counts.entry(lang.to_string()).or_insert(0) += 1;
            }
        }
        counts
    }

    /// First language with a config file, else the one with the most sources.
    fn project_type(summary: &ProjectSummary) -> Option<String> {
        if let Some((lang, _)) = CONFIG_FILES
            .iter()
            .find(|(lang, _)| summary.config_files.contains_key(*lang))
        {
            return Some(lang.to_string());
        }

        let mut best: Option<(&str, usize)> = None;
        for (lang, _) in SOURCE_EXTENSIONS {
            let count = summary.source_files.get(*lang).copied().unwrap_or(0);
            if count > best.map_or(0, |(_, c)| c) {
                best = Some((*lang, count));
            }
        }
        best.map(|(lang, _)| lang.to_string())
    }

    fn read(&self, file: &str) -> Option<String> {
        fs::read_to_string(self.root.join(file)).ok()
    }

    fn dependencies(&self, summary: &ProjectSummary) -> BTreeMap<String, Vec<String>> {
        let has = |lang: &str, file: &str| {
            summary
                .config_files
                .get(lang)
                .is_some_and(|files| files.iter().any(|f| f == file))
        };

        let mut deps = BTreeMap::new();
        if has("python", "requirements.txt") {
            if let Some(content) = self.read("requirements.txt") {
                deps.insert("python".to_string(), parse_requirements(&content));
            }
        }
        if has("node", "package.json") {
            if let Some(names) = self.read("package.json").as_deref().and_then(parse_package_json) {
                deps.insert("node".to_string(), names);
            }
        }
        deps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(root: &Path, relative: &str, content: &str) {
        let path = root.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_python_project() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "requirements.txt", "# pinned\nrequests==2.31\n\nflask\n");
        touch(dir.path(), "app.py", "");
        touch(dir.path(), "pkg/util.py", "");
        touch(dir.path(), ".venv/lib/site.py", "");
        touch(dir.path(), "node_modules/left-pad/index.js", "");
        touch(dir.path(), "target/debug/build.rs", "");

        let summary = ProjectScanner::new(dir.path()).scan();

        assert_eq!(summary.project_type.as_deref(), Some("python"));
        assert_eq!(summary.config_files["python"], vec!["requirements.txt"]);
        assert_eq!(summary.source_files.get("python"), Some(&2));
        assert!(!summary.source_files.contains_key("node"));
        assert!(!summary.source_files.contains_key("rust"));
        assert_eq!(summary.dependencies["python"], vec!["requests==2.31", "flask"]);
    }

    #[test]
    fn test_node_dependencies() {
        let dir = tempfile::tempdir().unwrap();
        touch(
            dir.path(),
            "package.json",
            r#"{"name": "web", "dependencies": {"react": "^18"}, "devDependencies": {"vite": "^5"}}"#,
        );
        touch(dir.path(), "src/index.tsx", "");

        let summary = ProjectScanner::new(dir.path()).scan();
        assert_eq!(summary.project_type.as_deref(), Some("node"));
        assert_eq!(summary.dependencies["node"], vec!["react", "vite"]);
    }

    #[test]
    fn test_type_from_source_counts() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "main.go", "");
        touch(dir.path(), "cmd/tool.go", "");
        touch(dir.path(), "script.rb", "");

        let summary = ProjectScanner::new(dir.path()).scan();
        assert!(summary.config_files.is_empty());
        assert_eq!(summary.project_type.as_deref(), Some("go"));
    }

    #[test]
    fn test_empty_directory() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(ProjectScanner::new(dir.path()).scan(), ProjectSummary::default());
    }

    #[test]
    fn test_invalid_package_json_is_ignored() {
        assert_eq!(parse_package_json("{not json"), None);
        assert_eq!(parse_package_json("{}"), Some(Vec::new()));
    }
}
