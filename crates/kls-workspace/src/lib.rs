//! Library entry point for a kls workspace.
//!
//! A [`Workspace`] wires the text store ([`SourceFiles`]) to the compilation
//! cache ([`SourcePath`]) for one root directory, using the root's `kls.toml`
//! to decide which files belong to it. Editor and watcher notifications go in;
//! compiled files and diagnostics come out.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use kls_config::{KlsConfig, LogBuffer};
use kls_core::{LineIndex, Position, Range, TextSize};
use kls_db::{CompiledFile, Frontend, Severity, SourcePath};
use kls_syntax::ParsedFile;
use kls_vfs::{
    script_exclusions, ContentChange, FileChange, FileSystem, LocalFs, SourceFiles, SourceSink,
    VfsPath,
};
use parking_lot::Mutex;

/// A diagnostic positioned for an editor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LintDiagnostic {
    pub path: VfsPath,
    pub range: Range,
    pub severity: Severity,
    pub message: String,
}

pub struct Workspace<F: Frontend> {
    root: PathBuf,
    config: KlsConfig,
    config_path: Option<PathBuf>,
    files: Mutex<SourceFiles>,
    source_path: Arc<SourcePath<F>>,
}

impl<F: Frontend> Workspace<F> {
    /// Open a workspace rooted at `path` and load every source file under it.
    ///
    /// If `path` is a file, its parent directory is treated as the workspace root.
    pub fn open(path: impl AsRef<Path>, frontend: Arc<F>) -> Result<Self> {
        Self::open_with_file_system(path, frontend, Arc::new(LocalFs::new()))
    }

    pub fn open_with_file_system(
        path: impl AsRef<Path>,
        frontend: Arc<F>,
        fs: Arc<dyn FileSystem>,
    ) -> Result<Self> {
        let path = path.as_ref();
        let meta = std::fs::metadata(path)
            .with_context(|| format!("failed to read metadata for {}", path.display()))?;
        let root = if meta.is_dir() {
            path.to_path_buf()
        } else {
            path.parent()
                .map(|p| p.to_path_buf())
                .context("file path has no parent directory")?
        };
        let root = root
            .canonicalize()
            .with_context(|| format!("failed to canonicalize {}", root.display()))?;

        let (config, config_path) = kls_config::load_for_workspace(&root)
            .with_context(|| format!("failed to load config for {}", root.display()))?;

        let source_path = Arc::new(SourcePath::with_file_system(frontend, Arc::clone(&fs)));
        let sink: Arc<dyn SourceSink> = Arc::clone(&source_path) as Arc<dyn SourceSink>;
        let mut files = SourceFiles::with_exclusions(fs, sink, exclusion_patterns(&config));
        files.add_workspace_root(&root);

        tracing::info!(
            target: "kls.workspace",
            root = %root.display(),
            config = ?config_path,
            files = source_path.paths().len(),
            "opened workspace"
        );

        Ok(Self {
            root,
            config,
            config_path,
            files: Mutex::new(files),
            source_path,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &KlsConfig {
        &self.config
    }

    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    pub fn source_path(&self) -> &Arc<SourcePath<F>> {
        &self.source_path
    }

    /// Installs the global subscriber from the `[logging]` section. Only the
    /// first call in a process has an effect.
    pub fn init_logging(&self) -> Arc<LogBuffer> {
        kls_config::init_tracing(&self.config.logging)
    }

    pub fn open_document(&self, path: VfsPath, text: &str, version: i32) {
        self.files.lock().open(path, text, version);
    }

    /// Returns whether the edit was applied.
    pub fn change_document(&self, path: &VfsPath, version: i32, changes: &[ContentChange]) -> bool {
        self.files.lock().edit(path, version, changes)
    }

    /// Temporary files leave the cache; workspace files revert to disk.
    pub fn close_document(&self, path: &VfsPath) {
        self.files.lock().close(path);
        self.source_path.delete_if_temporary(path);
    }

    pub fn did_change_watched_files(&self, changes: &[FileChange]) {
        let mut files = self.files.lock();
        for change in changes {
            if self.config_path.is_some() && change.path.as_local_path() == self.config_path.as_deref() {
                tracing::info!(
                    target: "kls.workspace",
                    path = %change.path,
                    "config file changed; reopen the workspace to apply it"
                );
                continue;
            }
            files.apply_file_change(change);
        }
    }

    pub fn add_workspace_root(&self, root: &Path) {
        self.files.lock().add_workspace_root(root);
    }

    pub fn remove_workspace_root(&self, root: &Path) {
        self.files.lock().remove_workspace_root(root);
    }

    pub fn is_open(&self, path: &VfsPath) -> bool {
        self.files.lock().is_open(path)
    }

    /// Editor version of an open file; files read from disk report -1.
    pub fn document_version(&self, path: &VfsPath) -> Option<i32> {
        self.files.lock().get(path).map(|file| file.version())
    }

    pub fn content(&self, path: &VfsPath) -> Option<Arc<str>> {
        self.files
            .lock()
            .get(path)
            .map(|file| Arc::clone(file.content()))
    }

    /// Byte offset of an editor position in the live text of `path`.
    pub fn offset_at(&self, path: &VfsPath, position: Position) -> Option<TextSize> {
        let text = self.content(path)?;
        LineIndex::new(&text).offset_of_position(&text, position)
    }

    pub fn current_version(&self, path: &VfsPath) -> Option<CompiledFile<F>> {
        self.source_path.current_version(path)
    }

    pub fn latest_compiled_version(&self, path: &VfsPath) -> Option<CompiledFile<F>> {
        self.source_path.latest_compiled_version(path)
    }

    pub fn parsed_file(&self, path: &VfsPath) -> Option<Arc<ParsedFile>> {
        self.source_path.parsed_file(path)
    }

    pub fn compile_files(&self, paths: &[VfsPath]) -> kls_db::CompositeBindingContext<F> {
        self.source_path.compile_files(paths)
    }

    pub fn compile_all_files(&self) {
        self.source_path.compile_all_files();
    }

    /// Compiles `paths` as one batch and returns their diagnostics, in path
    /// order.
    pub fn lint(&self, paths: &[VfsPath]) -> Vec<LintDiagnostic> {
        let _span = tracing::debug_span!(target: "kls.workspace", "lint", files = paths.len()).entered();
        let context = self.source_path.compile_files(paths);

        let mut out = Vec::new();
        for path in paths {
            let Some(parsed) = self.source_path.parsed_file(path) else {
                continue;
            };
            let text = parsed.text();
            let index = LineIndex::new(text);
            out.extend(
                context
                    .diagnostics_for(&path.to_path_buf())
                    .into_iter()
                    .map(|diagnostic| LintDiagnostic {
                        path: path.clone(),
                        range: index.range(text, diagnostic.range),
                        severity: diagnostic.severity,
                        message: diagnostic.message,
                    }),
            );
        }
        tracing::debug!(target: "kls.workspace", diagnostics = out.len(), "lint finished");
        out
    }

    /// Swaps the analyzer and recompiles everything that had been compiled.
    pub fn replace_frontend(&self, frontend: Arc<F>) {
        tracing::info!(target: "kls.workspace", "replacing frontend");
        self.source_path.set_frontend(frontend);
    }
}

fn exclusion_patterns(config: &KlsConfig) -> Vec<String> {
    let mut patterns =
        script_exclusions(config.scripts.enabled, config.scripts.build_scripts_enabled);
    patterns.extend(config.exclusions.patterns.iter().cloned());
    patterns
}
