use std::fmt;
use std::path::Path;
use std::sync::Arc;

use kls_syntax::{ParsedFile, SyntaxNode};
use kls_vfs::VfsPath;

use crate::binding::BindingContext;

/// Which analyzer configuration a file is compiled with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CompilationKind {
    Default,
    /// `*.gradle.kts` files, analyzed against the build script classpath.
    BuildScript,
}

impl CompilationKind {
    pub const ALL: [CompilationKind; 2] = [CompilationKind::Default, CompilationKind::BuildScript];

    pub fn of(path: &VfsPath) -> Self {
        if path.is_build_script() {
            CompilationKind::BuildScript
        } else {
            CompilationKind::Default
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct AnalysisError {
    pub message: String,
}

impl AnalysisError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// The compiler capability the cache drives.
///
/// A frontend owns whatever symbol tables and classpath state analysis needs.
/// Analysis entry points are never called concurrently: the cache serializes
/// them behind its compile lock. `parse` must be a pure function of its
/// inputs and may run on any thread at any time.
///
/// One frontend instance corresponds to one classpath configuration; swap it
/// with [`crate::SourcePath::set_frontend`] when the classpath changes.
pub trait Frontend: Send + Sync + Sized + 'static {
    type Type: Clone + fmt::Debug + Send + Sync + 'static;
    type Declaration: Clone + fmt::Debug + Send + Sync + 'static;
    type Scope: Clone + fmt::Debug + Send + Sync + 'static;
    type Module: fmt::Debug + Send + Sync + 'static;

    fn parse(&self, path: &Path, text: &str, kind: CompilationKind) -> ParsedFile;

    /// Analyzes the top-level declarations of `files`, resolving names against
    /// `source_path` (which contains `files` as well).
    fn analyze_files(
        &self,
        files: &[Arc<ParsedFile>],
        source_path: &[Arc<ParsedFile>],
        kind: CompilationKind,
    ) -> Result<(BindingContext<Self>, Self::Module), AnalysisError>;

    /// Analyzes a single node of `file` inside `scope`. The node is an
    /// expression, a declaration or a type reference.
    fn analyze_expression(
        &self,
        file: &ParsedFile,
        expression: &SyntaxNode,
        scope: &Self::Scope,
        source_path: &[Arc<ParsedFile>],
        kind: CompilationKind,
    ) -> Result<BindingContext<Self>, AnalysisError>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompileError {
    #[error("{0} is not tracked and could not be read")]
    UnknownFile(VfsPath),
    #[error(transparent)]
    Analysis(#[from] AnalysisError),
}
