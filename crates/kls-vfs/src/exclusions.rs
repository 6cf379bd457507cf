use std::fs;
use std::path::{Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};
use walkdir::WalkDir;

use crate::path::VfsPath;

/// Directory and file name patterns that are never part of a workspace.
pub const DEFAULT_EXCLUDED_PATTERNS: &[&str] = &[
    // Version control.
    ".git",
    ".hg",
    ".svn",
    // IDE metadata.
    ".idea",
    ".idea_modules",
    ".vs",
    ".vscode",
    ".code-workspace",
    ".settings",
    // Build output.
    "bazel-*",
    "bin",
    "build",
    "node_modules",
];

/// Patterns excluding script files that are not enabled.
pub fn script_exclusions(scripts_enabled: bool, build_scripts_enabled: bool) -> Vec<String> {
    if !scripts_enabled {
        vec!["*.kts".to_string()]
    } else if !build_scripts_enabled {
        vec!["*.gradle.kts".to_string()]
    } else {
        Vec::new()
    }
}

/// Decides which paths belong to the workspace.
///
/// A path is included when it lies under a workspace root and no component of
/// its root-relative path matches an excluded pattern. Inside a `target`
/// directory only `target/generated-sources` is included.
#[derive(Debug, Clone)]
pub struct SourceExclusions {
    roots: Vec<PathBuf>,
    patterns: Vec<String>,
    matcher: GlobSet,
}

impl SourceExclusions {
    /// `extra_patterns` are added to the defaults and to the patterns of each
    /// root's `.gitignore`.
    pub fn new(roots: &[PathBuf], extra_patterns: &[String]) -> Self {
        let mut patterns: Vec<String> = DEFAULT_EXCLUDED_PATTERNS
            .iter()
            .map(|p| p.to_string())
            .collect();
        patterns.extend(extra_patterns.iter().cloned());
        for pattern in gitignore_patterns(roots) {
            if !patterns.contains(&pattern) {
                patterns.push(pattern);
            }
        }

        let mut builder = GlobSetBuilder::new();
        // Negations are not supported.
        for pattern in patterns.iter().filter(|p| !p.starts_with('!')) {
            match Glob::new(pattern) {
                Ok(glob) => {
                    builder.add(glob);
                }
                Err(err) => {
                    tracing::warn!(target: "kls.vfs", pattern = %pattern, error = %err, "ignoring invalid exclusion pattern");
                }
            }
        }
        let matcher = builder.build().unwrap_or_else(|err| {
            tracing::warn!(target: "kls.vfs", error = %err, "failed to build exclusion matcher");
            GlobSet::empty()
        });

        Self {
            roots: roots.to_vec(),
            patterns,
            matcher,
        }
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    pub fn is_included(&self, path: &VfsPath) -> bool {
        path.as_local_path()
            .is_some_and(|path| self.is_path_included(path))
    }

    pub fn is_path_included(&self, path: &Path) -> bool {
        if !self.roots.iter().any(|root| path.starts_with(root)) {
            return false;
        }

        let components: Vec<&str> = self
            .roots
            .iter()
            .filter_map(|root| path.strip_prefix(root).ok())
            .flat_map(|relative| relative.iter().filter_map(|c| c.to_str()))
            .collect();

        if let Some(idx) = components.iter().position(|c| *c == "target") {
            return components
                .get(idx + 1)
                .map_or(true, |next| *next == "generated-sources");
        }

        !components.iter().any(|c| self.matcher.is_match(c))
    }

    /// Kotlin source files under `root`, without descending into excluded
    /// directories.
    pub fn source_files(&self, root: &Path) -> Vec<PathBuf> {
        WalkDir::new(root)
            .follow_links(false)
            .into_iter()
            .filter_entry(|entry| self.is_path_included(entry.path()))
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(err) => {
                    tracing::debug!(target: "kls.vfs", error = %err, "skipping unreadable entry");
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .filter(|path| VfsPath::local(path.as_path()).is_kotlin_source())
            .collect()
    }
}

fn gitignore_patterns(roots: &[PathBuf]) -> Vec<String> {
    let mut patterns = Vec::new();
    for root in roots {
        let gitignore = root.join(".gitignore");
        if !gitignore.is_file() {
            continue;
        }
        match fs::read_to_string(&gitignore) {
            Ok(text) => {
                let before = patterns.len();
                patterns.extend(
                    text.lines()
                        .map(str::trim)
                        .filter(|line| !line.is_empty() && !line.starts_with('#'))
                        .map(|line| line.trim_end_matches('/').to_string()),
                );
                tracing::debug!(
                    target: "kls.vfs",
                    path = %gitignore.display(),
                    count = patterns.len() - before,
                    "read .gitignore patterns"
                );
            }
            Err(err) => {
                tracing::warn!(target: "kls.vfs", path = %gitignore.display(), error = %err, "could not read .gitignore");
            }
        }
    }
    patterns
}
