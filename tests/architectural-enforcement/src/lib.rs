//! Architectural Enforcement Integration Tests
//!
//! This package contains integration tests that enforce architectural principles:
//! - `court-core` stays headless (no UI crates, no terminal code)
//! - No blocking sleeps on the async runtime thread
//! - No panicking shortcuts in production code
//!
//! The helpers here walk the workspace source trees so each test can stay a
//! short list of rules.

use std::fs;
use std::path::{Path, PathBuf};

/// Workspace root, two levels above this package
#[must_use]
pub fn workspace_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .ancestors()
        .nth(2)
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
}

/// One source file, split into production lines and test lines
pub struct SourceFile {
    /// Path relative to the workspace root
    pub path: PathBuf,
    /// Lines before the first `#[cfg(test)]`, with their 1-based numbers
    pub production: Vec<(usize, String)>,
}

impl SourceFile {
    /// Production lines with `//` comments stripped
    pub fn code_lines(&self) -> impl Iterator<Item = (usize, &str)> {
        self.production
            .iter()
            .map(|(n, line)| (*n, line.split("//").next().unwrap_or(line)))
    }
}

/// Split file contents at the first test module
#[must_use]
pub fn production_lines(content: &str) -> Vec<(usize, String)> {
    content
        .lines()
        .enumerate()
        .take_while(|(_, line)| !line.trim_start().starts_with("#[cfg(test)]"))
        .map(|(idx, line)| (idx + 1, line.to_string()))
        .collect()
}

/// Every `.rs` file under `dir` (relative to the workspace root)
#[must_use]
pub fn rust_sources(dir: &str) -> Vec<SourceFile> {
    let root = workspace_root();
    let base = root.join(dir);
    if !base.exists() {
        return Vec::new();
    }

    walkdir::WalkDir::new(&base)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.path().extension().and_then(|s| s.to_str()) == Some("rs"))
        .filter_map(|e| {
            let content = fs::read_to_string(e.path()).ok()?;
            Some(SourceFile {
                path: e.path().strip_prefix(&root).unwrap_or(e.path()).to_path_buf(),
                production: production_lines(&content),
            })
        })
        .collect()
}

/// Collect `path:line - text` for every production line matching `pred`
pub fn violations<F>(sources: &[SourceFile], pred: F) -> Vec<String>
where
    F: Fn(&str) -> bool,
{
    sources
        .iter()
        .flat_map(|file| {
            file.code_lines()
                .filter(|(_, code)| pred(code))
                .map(|(n, code)| format!("{}:{} - {}", file.path.display(), n, code.trim()))
                .collect::<Vec<_>>()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_production_lines_stop_at_test_module() {
        let lines = production_lines("fn a() {}\n// note\n#[cfg(test)]\nmod tests {}\n");
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1], (2, "// note".to_string()));
    }

    #[test]
    fn test_comments_are_not_code() {
        let file = SourceFile {
            path: PathBuf::from("x.rs"),
            production: vec![(1, "let a = 1; // x.unwrap()".to_string())],
        };
        let found = violations(&[file], |code| code.contains(".unwrap()"));
        assert!(found.is_empty());
    }

    #[test]
    fn test_workspace_root_holds_core() {
        assert!(workspace_root().join("court/core/Cargo.toml").exists());
    }
}
