use std::collections::{HashMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::change::{FileChange, FileChangeKind};
use crate::document::{ContentChange, Document, DocumentError};
use crate::exclusions::SourceExclusions;
use crate::fs::FileSystem;
use crate::path::VfsPath;

/// Receives every content change accepted by [`SourceFiles`].
///
/// The compilation cache implements this; it only records the new text and
/// works out staleness when it is next queried.
pub trait SourceSink: Send + Sync {
    fn put(&self, path: &VfsPath, content: Arc<str>, temporary: bool);

    fn remove(&self, path: &VfsPath);
}

/// One file known to the text store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedFile {
    document: Document,
    is_temporary: bool,
}

impl TrackedFile {
    pub fn content(&self) -> &Arc<str> {
        self.document.text()
    }

    pub fn version(&self) -> i32 {
        self.document.version()
    }

    /// Outside the workspace, tracked only while open in the editor.
    pub fn is_temporary(&self) -> bool {
        self.is_temporary
    }
}

/// The text store: latest text, version, and open state of every tracked file.
///
/// Calls for one path must not race each other; the owner serializes them.
pub struct SourceFiles {
    fs: Arc<dyn FileSystem>,
    sink: Arc<dyn SourceSink>,
    files: HashMap<VfsPath, TrackedFile>,
    open: HashSet<VfsPath>,
    roots: Vec<PathBuf>,
    extra_exclusions: Vec<String>,
    exclusions: SourceExclusions,
}

impl SourceFiles {
    pub fn new(fs: Arc<dyn FileSystem>, sink: Arc<dyn SourceSink>) -> Self {
        Self::with_exclusions(fs, sink, Vec::new())
    }

    /// `extra_exclusions` are glob patterns added to the default exclusions.
    pub fn with_exclusions(
        fs: Arc<dyn FileSystem>,
        sink: Arc<dyn SourceSink>,
        extra_exclusions: Vec<String>,
    ) -> Self {
        let exclusions = SourceExclusions::new(&[], &extra_exclusions);
        Self {
            fs,
            sink,
            files: HashMap::new(),
            open: HashSet::new(),
            roots: Vec::new(),
            extra_exclusions,
            exclusions,
        }
    }

    pub fn get(&self, path: &VfsPath) -> Option<&TrackedFile> {
        self.files.get(path)
    }

    pub fn paths(&self) -> impl Iterator<Item = &VfsPath> {
        self.files.keys()
    }

    pub fn is_open(&self, path: &VfsPath) -> bool {
        self.open.contains(path)
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    pub fn exclusions(&self) -> &SourceExclusions {
        &self.exclusions
    }

    pub fn is_included(&self, path: &VfsPath) -> bool {
        self.exclusions.is_included(path)
    }

    /// Included in the workspace and a `.kt`/`.kts` file.
    pub fn is_source(&self, path: &VfsPath) -> bool {
        path.is_kotlin_source() && self.is_included(path)
    }

    pub fn open(&mut self, path: VfsPath, text: &str, version: i32) {
        let is_temporary = !self.is_included(&path);
        tracing::debug!(target: "kls.vfs", path = %path, version, is_temporary, "opened");
        self.open.insert(path.clone());
        self.store(path, Document::new(text, version), is_temporary);
    }

    /// Temporary files are dropped; workspace files fall back to their disk
    /// contents, or are dropped when they no longer exist.
    pub fn close(&mut self, path: &VfsPath) {
        if !self.open.remove(path) {
            return;
        }
        let is_temporary = self.files.get(path).map_or(true, |f| f.is_temporary);
        if is_temporary {
            tracing::debug!(target: "kls.vfs", path = %path, "closed temporary file");
            self.remove(path);
        } else {
            self.read_from_disk(path, false);
        }
    }

    /// Applies `changes` when `version` is newer than the tracked one. Returns
    /// whether the edit was applied.
    pub fn edit(&mut self, path: &VfsPath, version: i32, changes: &[ContentChange]) -> bool {
        let Some(file) = self.files.get_mut(path) else {
            tracing::warn!(target: "kls.vfs", path = %path, version, "ignored edit to untracked file");
            return false;
        };

        match file.document.apply_changes(version, changes) {
            Ok(()) => {
                let content = Arc::clone(file.document.text());
                let temporary = file.is_temporary;
                self.sink.put(path, content, temporary);
                true
            }
            Err(DocumentError::StaleVersion { .. }) => {
                tracing::warn!(target: "kls.vfs", "Ignored {path} version {version}");
                false
            }
            Err(err) => {
                tracing::warn!(target: "kls.vfs", path = %path, version, error = %err, "ignored malformed edit");
                false
            }
        }
    }

    pub fn created_on_disk(&mut self, path: &VfsPath) {
        self.changed_on_disk(path);
    }

    /// Open files keep their editor text; other source files are re-read.
    pub fn changed_on_disk(&mut self, path: &VfsPath) {
        if !self.is_source(path) {
            return;
        }
        if self.open.contains(path) {
            tracing::debug!(target: "kls.vfs", path = %path, "open file changed on disk; keeping editor text");
            return;
        }
        let is_temporary = self.files.get(path).is_some_and(|f| f.is_temporary);
        self.read_from_disk(path, is_temporary);
    }

    pub fn deleted_on_disk(&mut self, path: &VfsPath) {
        if !self.is_source(path) {
            return;
        }
        self.open.remove(path);
        self.remove(path);
    }

    pub fn apply_file_change(&mut self, change: &FileChange) {
        match change.kind {
            FileChangeKind::Created => self.created_on_disk(&change.path),
            FileChangeKind::Modified => self.changed_on_disk(&change.path),
            FileChangeKind::Deleted => self.deleted_on_disk(&change.path),
        }
    }

    /// Loads every source file under `root`. Files already open keep their
    /// editor text.
    pub fn add_workspace_root(&mut self, root: &Path) {
        if !self.roots.iter().any(|r| r == root) {
            self.roots.push(root.to_path_buf());
            self.rebuild_exclusions();
        }

        let adopted: Vec<VfsPath> = self
            .files
            .iter()
            .filter(|(path, file)| file.is_temporary && self.exclusions.is_included(path))
            .map(|(path, _)| path.clone())
            .collect();
        for path in adopted {
            if let Some(file) = self.files.get_mut(&path) {
                file.is_temporary = false;
                self.sink.put(&path, Arc::clone(file.document.text()), false);
            }
        }

        let files = self.exclusions.source_files(root);
        tracing::info!(target: "kls.vfs", root = %root.display(), count = files.len(), "adding workspace root");
        for file in files {
            let path = VfsPath::local(file);
            if !self.open.contains(&path) {
                self.read_from_disk(&path, false);
            }
        }
    }

    pub fn remove_workspace_root(&mut self, root: &Path) {
        let removed: Vec<VfsPath> = self
            .files
            .keys()
            .filter(|path| path.starts_with(root))
            .cloned()
            .collect();
        tracing::info!(target: "kls.vfs", root = %root.display(), count = removed.len(), "removing workspace root");
        for path in &removed {
            self.open.remove(path);
            self.remove(path);
        }
        self.roots.retain(|r| r != root);
        self.rebuild_exclusions();
    }

    pub fn set_extra_exclusions(&mut self, patterns: Vec<String>) {
        self.extra_exclusions = patterns;
        self.rebuild_exclusions();
    }

    fn rebuild_exclusions(&mut self) {
        self.exclusions = SourceExclusions::new(&self.roots, &self.extra_exclusions);
    }

    /// A missing file is removed; any other I/O error keeps the current state.
    fn read_from_disk(&mut self, path: &VfsPath, is_temporary: bool) {
        match self.fs.read_to_string(path) {
            Ok(text) => self.store(path.clone(), Document::from_disk(&text), is_temporary),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(target: "kls.vfs", path = %path, "file no longer exists");
                self.remove(path);
            }
            Err(err) => {
                tracing::warn!(target: "kls.vfs", path = %path, error = %err, "failed to read file; keeping cached text");
            }
        }
    }

    fn store(&mut self, path: VfsPath, document: Document, is_temporary: bool) {
        let content = Arc::clone(document.text());
        self.sink.put(&path, content, is_temporary);
        self.files.insert(
            path,
            TrackedFile {
                document,
                is_temporary,
            },
        );
    }

    fn remove(&mut self, path: &VfsPath) {
        if self.files.remove(path).is_some() {
            self.sink.remove(path);
        }
    }
}
