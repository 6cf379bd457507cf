use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use kls_syntax::ParsedFile;
use kls_vfs::{normalize_line_endings, FileSystem, LocalFs, SourceSink, VfsPath};
use parking_lot::Mutex;

use crate::binding::{BindingContext, CompositeBindingContext};
use crate::compiled_file::CompiledFile;
use crate::compiler::{BeforeCompile, Compiler};
use crate::frontend::{AnalysisError, CompilationKind, CompileError, Frontend};

struct Compiled<F: Frontend> {
    file: Arc<ParsedFile>,
    context: Arc<BindingContext<F>>,
    module: Arc<F::Module>,
}

impl<F: Frontend> Clone for Compiled<F> {
    fn clone(&self) -> Self {
        Self {
            file: Arc::clone(&self.file),
            context: Arc::clone(&self.context),
            module: Arc::clone(&self.module),
        }
    }
}

struct SourceFile<F: Frontend> {
    content: Arc<str>,
    parsed: Option<Arc<ParsedFile>>,
    compiled: Option<Compiled<F>>,
    /// Not part of other files' source path.
    is_temporary: bool,
    kind: CompilationKind,
}

impl<F: Frontend> SourceFile<F> {
    fn new(path: &VfsPath, content: Arc<str>, is_temporary: bool) -> Self {
        Self {
            content,
            parsed: None,
            compiled: None,
            is_temporary,
            kind: CompilationKind::of(path),
        }
    }

    fn fresh_parse(&self) -> Option<&Arc<ParsedFile>> {
        self.parsed
            .as_ref()
            .filter(|parsed| parsed.text() == &self.content)
    }

    fn is_compiled(&self, parsed: &ParsedFile) -> bool {
        self.compiled
            .as_ref()
            .is_some_and(|compiled| compiled.file.text() == parsed.text())
    }
}

/// The parse and compile caches for every tracked file.
///
/// Staleness is decided by comparing texts: a file is reparsed when its
/// content differs from the text of its cached tree, and recompiled when its
/// tree's text differs from the text of the tree it was last compiled from.
/// Nothing is invalidated eagerly; [`SourceSink::put`] only records content.
///
/// Lock order is compile lock, then the file map. The file map is never held
/// while parsing or analyzing.
pub struct SourcePath<F: Frontend> {
    files: Mutex<HashMap<VfsPath, SourceFile<F>>>,
    compiler: Arc<Compiler<F>>,
    fs: Arc<dyn FileSystem>,
}

impl<F: Frontend> fmt::Debug for SourcePath<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourcePath")
            .field("files", &self.files.lock().len())
            .finish_non_exhaustive()
    }
}

impl<F: Frontend> SourcePath<F> {
    pub fn new(frontend: Arc<F>) -> Self {
        Self::with_file_system(frontend, Arc::new(LocalFs::new()))
    }

    /// `fs` provides the content of files queried before they were added.
    pub fn with_file_system(frontend: Arc<F>, fs: Arc<dyn FileSystem>) -> Self {
        Self {
            files: Mutex::new(HashMap::new()),
            compiler: Arc::new(Compiler::new(frontend)),
            fs,
        }
    }

    pub fn compiler(&self) -> &Arc<Compiler<F>> {
        &self.compiler
    }

    pub fn put(&self, path: &VfsPath, content: Arc<str>, temporary: bool) {
        debug_assert!(!content.contains('\r'));
        let mut files = self.files.lock();
        match files.get_mut(path) {
            Some(file) => {
                file.content = content;
                file.is_temporary = temporary;
            }
            None => {
                if temporary {
                    tracing::info!(target: "kls.db", path = %path, "adding temporary source file");
                }
                files.insert(path.clone(), SourceFile::new(path, content, temporary));
            }
        }
    }

    pub fn delete(&self, path: &VfsPath) {
        if self.files.lock().remove(path).is_some() {
            tracing::debug!(target: "kls.db", path = %path, "removed from source path");
        }
    }

    /// Returns whether the file was temporary and has been removed.
    pub fn delete_if_temporary(&self, path: &VfsPath) -> bool {
        let mut files = self.files.lock();
        if files.get(path).is_some_and(|file| file.is_temporary) {
            tracing::info!(target: "kls.db", path = %path, "removing temporary source file");
            files.remove(path);
            true
        } else {
            false
        }
    }

    pub fn contains(&self, path: &VfsPath) -> bool {
        self.files.lock().contains_key(path)
    }

    pub fn is_temporary(&self, path: &VfsPath) -> Option<bool> {
        self.files.lock().get(path).map(|file| file.is_temporary)
    }

    pub fn paths(&self) -> Vec<VfsPath> {
        let mut paths: Vec<VfsPath> = self.files.lock().keys().cloned().collect();
        paths.sort();
        paths
    }

    /// Latest content of a file.
    pub fn content(&self, path: &VfsPath) -> Option<Arc<str>> {
        if !self.ensure_tracked(path) {
            return None;
        }
        self.files.lock().get(path).map(|file| Arc::clone(&file.content))
    }

    /// The tree of the file's latest content, reparsing if it changed.
    pub fn parsed_file(&self, path: &VfsPath) -> Option<Arc<ParsedFile>> {
        if !self.ensure_tracked(path) {
            return None;
        }
        self.parse_if_changed(path)
    }

    /// Context of the last successful compile, however stale.
    pub fn compiled_context(&self, path: &VfsPath) -> Option<Arc<BindingContext<F>>> {
        self.files
            .lock()
            .get(path)
            .and_then(|file| file.compiled.as_ref())
            .map(|compiled| Arc::clone(&compiled.context))
    }

    /// Trees of all files, parsing any that changed. Temporary files are only
    /// included with `include_hidden`.
    pub fn all(&self, include_hidden: bool) -> Vec<Arc<ParsedFile>> {
        let mut paths: Vec<VfsPath> = self
            .files
            .lock()
            .iter()
            .filter(|(_, file)| include_hidden || !file.is_temporary)
            .map(|(path, _)| path.clone())
            .collect();
        paths.sort();
        paths
            .iter()
            .filter_map(|path| self.parse_if_changed(path))
            .collect()
    }

    pub fn compile_if_changed(&self, path: &VfsPath) -> Result<(), CompileError> {
        if !self.ensure_tracked(path) {
            return Err(CompileError::UnknownFile(path.clone()));
        }
        let unknown = || CompileError::UnknownFile(path.clone());

        let parsed = self.parse_if_changed(path).ok_or_else(unknown)?;
        if self.is_compiled(path, &parsed) {
            return Ok(());
        }

        let _guard = self.compiler.lock();
        // Another caller may have compiled it while we waited.
        let parsed = self.parse_if_changed(path).ok_or_else(unknown)?;
        if self.is_compiled(path, &parsed) {
            return Ok(());
        }

        let kind = self.kind(path).ok_or_else(unknown)?;
        tracing::debug!(target: "kls.db", path = %path, "compiling");
        self.compile_and_update(&[(path.clone(), parsed)], kind)?;
        Ok(())
    }

    /// Compiles only when the file has never been compiled; a stale compile
    /// is left alone.
    pub fn compile_if_null(&self, path: &VfsPath) -> Result<(), CompileError> {
        if !self.ensure_tracked(path) {
            return Err(CompileError::UnknownFile(path.clone()));
        }
        let compiled = self
            .files
            .lock()
            .get(path)
            .is_some_and(|file| file.compiled.is_some());
        if compiled {
            return Ok(());
        }
        self.compile_if_changed(path)
    }

    /// Compiles the changed files among `paths` in one analyzer call per
    /// compilation kind and returns their new contexts combined with the
    /// cached contexts of the unchanged ones.
    ///
    /// A failed analysis is logged and the affected files keep their previous
    /// contexts. Paths that are not tracked and cannot be read are skipped.
    pub fn compile_files(&self, paths: &[VfsPath]) -> CompositeBindingContext<F> {
        let _span = tracing::debug_span!(target: "kls.db", "compile_files", files = paths.len()).entered();
        let _guard = self.compiler.lock();

        let mut changed: Vec<(VfsPath, Arc<ParsedFile>, CompilationKind)> = Vec::new();
        let mut unchanged: Vec<(Arc<Path>, Arc<BindingContext<F>>)> = Vec::new();
        for path in paths {
            if !self.ensure_tracked(path) {
                continue;
            }
            let Some(parsed) = self.parse_if_changed(path) else {
                continue;
            };
            let files = self.files.lock();
            let Some(file) = files.get(path) else {
                continue;
            };
            match &file.compiled {
                Some(compiled) if compiled.file.text() == parsed.text() => {
                    unchanged.push((Arc::clone(parsed.path()), Arc::clone(&compiled.context)));
                }
                _ => changed.push((path.clone(), parsed, file.kind)),
            }
        }

        let mut owned: Vec<(Arc<Path>, Arc<BindingContext<F>>)> = Vec::new();
        for kind in CompilationKind::ALL {
            let batch: Vec<(VfsPath, Arc<ParsedFile>)> = changed
                .iter()
                .filter(|(_, _, k)| *k == kind)
                .map(|(path, parsed, _)| (path.clone(), Arc::clone(parsed)))
                .collect();
            if batch.is_empty() {
                continue;
            }
            match self.compile_and_update(&batch, kind) {
                Ok(context) => owned.extend(
                    batch
                        .iter()
                        .map(|(_, parsed)| (Arc::clone(parsed.path()), Arc::clone(&context))),
                ),
                Err(err) => {
                    tracing::warn!(
                        target: "kls.db",
                        ?kind,
                        files = batch.len(),
                        error = %err,
                        "compilation failed; keeping previous results"
                    );
                    owned.extend(batch.iter().filter_map(|(path, parsed)| {
                        let context = self.compiled_context(path)?;
                        Some((Arc::clone(parsed.path()), context))
                    }));
                }
            }
        }
        owned.extend(unchanged);

        CompositeBindingContext::new(owned)
    }

    /// Compiles every workspace file that changed, one file at a time.
    pub fn compile_all_files(&self) {
        let paths: Vec<VfsPath> = {
            let files = self.files.lock();
            let mut paths: Vec<VfsPath> = files
                .iter()
                .filter(|(_, file)| !file.is_temporary)
                .map(|(path, _)| path.clone())
                .collect();
            paths.sort();
            paths
        };
        for path in paths {
            self.compile_files(std::slice::from_ref(&path));
        }
    }

    /// Drops all parse and compile results and recompiles every file, if any
    /// file had been parsed.
    pub fn refresh(&self) {
        let _guard = self.compiler.lock();
        let paths = {
            let mut files = self.files.lock();
            if !files.values().any(|file| file.parsed.is_some()) {
                return;
            }
            for file in files.values_mut() {
                file.parsed = None;
                file.compiled = None;
            }
            let mut paths: Vec<VfsPath> = files.keys().cloned().collect();
            paths.sort();
            paths
        };

        tracing::info!(target: "kls.db", files = paths.len(), "refreshing source path");
        for path in paths {
            if let Err(err) = self.compile_if_changed(&path) {
                tracing::warn!(target: "kls.db", path = %path, error = %err, "failed to recompile");
            }
        }
    }

    pub fn set_frontend(&self, frontend: Arc<F>) {
        self.compiler.set_frontend(frontend);
        self.refresh();
    }

    pub fn set_before_compile(&self, hook: impl Fn() + Send + Sync + 'static) {
        let hook: BeforeCompile = Arc::new(hook);
        self.compiler.set_before_compile(Some(hook));
    }

    /// Compiles the latest version of a file and returns it. When compilation
    /// fails the last successful compile is returned instead.
    pub fn current_version(&self, path: &VfsPath) -> Option<CompiledFile<F>> {
        match self.compile_if_changed(path) {
            Ok(()) => {}
            Err(CompileError::UnknownFile(_)) => return None,
            Err(err) => {
                tracing::warn!(target: "kls.db", path = %path, error = %err, "compilation failed");
            }
        }
        self.prepare_compiled_file(path)
    }

    /// The most recent compile of a file, compiling only if there is none.
    pub fn latest_compiled_version(&self, path: &VfsPath) -> Option<CompiledFile<F>> {
        match self.compile_if_null(path) {
            Ok(()) => {}
            Err(CompileError::UnknownFile(_)) => return None,
            Err(err) => {
                tracing::warn!(target: "kls.db", path = %path, error = %err, "compilation failed");
            }
        }
        self.prepare_compiled_file(path)
    }

    fn prepare_compiled_file(&self, path: &VfsPath) -> Option<CompiledFile<F>> {
        let parsed = self.parse_if_changed(path)?;
        let (content, compiled, is_temporary, kind) = {
            let files = self.files.lock();
            let file = files.get(path)?;
            (
                Arc::clone(&file.content),
                file.compiled.clone()?,
                file.is_temporary,
                file.kind,
            )
        };

        let mut source_path = self.all(false);
        if is_temporary {
            source_path.push(parsed);
        }

        Some(CompiledFile::new(
            path.clone(),
            content,
            compiled.file,
            compiled.context,
            compiled.module,
            source_path,
            kind,
            Arc::clone(&self.compiler),
        ))
    }

    fn compile_and_update(
        &self,
        batch: &[(VfsPath, Arc<ParsedFile>)],
        kind: CompilationKind,
    ) -> Result<Arc<BindingContext<F>>, AnalysisError> {
        let _guard = self.compiler.lock();
        let files: Vec<Arc<ParsedFile>> = batch.iter().map(|(_, parsed)| Arc::clone(parsed)).collect();
        let mut source_path = self.all(false);
        for (path, parsed) in batch {
            if self.is_temporary(path) == Some(true) {
                source_path.push(Arc::clone(parsed));
            }
        }

        let (context, module) = self.compiler.compile_files(&files, &source_path, kind)?;
        let context = Arc::new(context);
        let module = Arc::new(module);

        let mut tracked = self.files.lock();
        for (path, parsed) in batch {
            let Some(file) = tracked.get_mut(path) else {
                continue;
            };
            // A newer parse means the result is already stale; keep it out.
            if file.parsed.as_ref().is_some_and(|p| Arc::ptr_eq(p, parsed)) {
                file.compiled = Some(Compiled {
                    file: Arc::clone(parsed),
                    context: Arc::clone(&context),
                    module: Arc::clone(&module),
                });
            } else {
                tracing::debug!(target: "kls.db", path = %path, "file changed during compilation");
            }
        }
        Ok(context)
    }

    fn parse_if_changed(&self, path: &VfsPath) -> Option<Arc<ParsedFile>> {
        let (content, kind) = {
            let files = self.files.lock();
            let file = files.get(path)?;
            if let Some(parsed) = file.fresh_parse() {
                return Some(Arc::clone(parsed));
            }
            (Arc::clone(&file.content), file.kind)
        };

        let parsed = Arc::new(self.compiler.parse(&path.to_path_buf(), &content, kind));

        let mut files = self.files.lock();
        let file = files.get_mut(path)?;
        if let Some(existing) = file.fresh_parse() {
            // Parsed concurrently; keep the stored tree so identity checks hold.
            return Some(Arc::clone(existing));
        }
        if file.content == content {
            file.parsed = Some(Arc::clone(&parsed));
        }
        Some(parsed)
    }

    fn is_compiled(&self, path: &VfsPath, parsed: &ParsedFile) -> bool {
        self.files
            .lock()
            .get(path)
            .is_some_and(|file| file.is_compiled(parsed))
    }

    fn kind(&self, path: &VfsPath) -> Option<CompilationKind> {
        self.files.lock().get(path).map(|file| file.kind)
    }

    /// Untracked files are read through the file system and added as
    /// temporary files.
    fn ensure_tracked(&self, path: &VfsPath) -> bool {
        if self.contains(path) {
            return true;
        }
        match self.fs.read_to_string(path) {
            Ok(text) => {
                tracing::warn!(
                    target: "kls.db",
                    path = %path,
                    "requested file is not on the source path; adding it as a temporary file"
                );
                let content: Arc<str> = normalize_line_endings(&text).into();
                self.put(path, content, true);
                true
            }
            Err(err) => {
                tracing::warn!(target: "kls.db", path = %path, error = %err, "requested file is not on the source path");
                false
            }
        }
    }
}

impl<F: Frontend> SourceSink for SourcePath<F> {
    fn put(&self, path: &VfsPath, content: Arc<str>, temporary: bool) {
        SourcePath::put(self, path, content, temporary);
    }

    fn remove(&self, path: &VfsPath) {
        self.delete(path);
    }
}
