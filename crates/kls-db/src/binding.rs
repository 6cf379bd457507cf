use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use kls_syntax::{SyntaxKind, SyntaxNode, TextRange};

use crate::frontend::Frontend;

/// Identity of a syntax node across snapshots of the same tree.
///
/// Nodes are identified by file, range, and kind rather than by pointer, so a
/// context recorded against one parse can be queried with nodes of another
/// parse of the same text.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SyntaxKey {
    pub path: Arc<Path>,
    pub range: TextRange,
    pub kind: SyntaxKind,
}

impl SyntaxKey {
    pub fn new(path: Arc<Path>, range: TextRange, kind: SyntaxKind) -> Self {
        Self { path, range, kind }
    }

    pub fn of(path: &Arc<Path>, node: &SyntaxNode) -> Self {
        Self::new(Arc::clone(path), node.text_range(), node.kind())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
    Information,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Diagnostic {
    pub path: Arc<Path>,
    pub range: TextRange,
    pub severity: Severity,
    pub message: String,
}

impl Diagnostic {
    pub fn error(path: Arc<Path>, range: TextRange, message: impl Into<String>) -> Self {
        Self {
            path,
            range,
            severity: Severity::Error,
            message: message.into(),
        }
    }

    pub fn warning(path: Arc<Path>, range: TextRange, message: impl Into<String>) -> Self {
        Self {
            path,
            range,
            severity: Severity::Warning,
            message: message.into(),
        }
    }
}

/// What one analyzer run learned: expression types, reference targets,
/// lexical scopes, and diagnostics.
pub struct BindingContext<F: Frontend> {
    types: HashMap<SyntaxKey, F::Type>,
    references: HashMap<SyntaxKey, F::Declaration>,
    scopes: Vec<(SyntaxKey, F::Scope)>,
    diagnostics: Vec<Diagnostic>,
}

impl<F: Frontend> Default for BindingContext<F> {
    fn default() -> Self {
        Self {
            types: HashMap::new(),
            references: HashMap::new(),
            scopes: Vec::new(),
            diagnostics: Vec::new(),
        }
    }
}

impl<F: Frontend> fmt::Debug for BindingContext<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BindingContext")
            .field("types", &self.types.len())
            .field("references", &self.references.len())
            .field("scopes", &self.scopes.len())
            .field("diagnostics", &self.diagnostics)
            .finish()
    }
}

impl<F: Frontend> BindingContext<F> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_type(&mut self, key: SyntaxKey, ty: F::Type) {
        self.types.insert(key, ty);
    }

    pub fn record_reference(&mut self, key: SyntaxKey, target: F::Declaration) {
        self.references.insert(key, target);
    }

    pub fn record_scope(&mut self, key: SyntaxKey, scope: F::Scope) {
        self.scopes.push((key, scope));
    }

    pub fn push_diagnostic(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn type_of(&self, key: &SyntaxKey) -> Option<&F::Type> {
        self.types.get(key)
    }

    pub fn type_of_node(&self, path: &Arc<Path>, node: &SyntaxNode) -> Option<&F::Type> {
        self.type_of(&SyntaxKey::of(path, node))
    }

    pub fn reference(&self, key: &SyntaxKey) -> Option<&F::Declaration> {
        self.references.get(key)
    }

    pub fn references(&self) -> impl Iterator<Item = (&SyntaxKey, &F::Declaration)> {
        self.references.iter()
    }

    pub fn scopes(&self) -> impl Iterator<Item = (&SyntaxKey, &F::Scope)> {
        self.scopes.iter().map(|(key, scope)| (key, scope))
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
            && self.references.is_empty()
            && self.scopes.is_empty()
            && self.diagnostics.is_empty()
    }
}

/// Read-only union of the contexts covering a set of files.
///
/// Every file is answered only by the context that compiled its current
/// text. A batch context also holds results for its other files, which may
/// have been recompiled since; those are never consulted.
pub struct CompositeBindingContext<F: Frontend> {
    contexts: Vec<Arc<BindingContext<F>>>,
    owners: Vec<(Arc<Path>, usize)>,
}

impl<F: Frontend> Clone for CompositeBindingContext<F> {
    fn clone(&self) -> Self {
        Self {
            contexts: self.contexts.clone(),
            owners: self.owners.clone(),
        }
    }
}

impl<F: Frontend> fmt::Debug for CompositeBindingContext<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.owners.iter().map(|(path, idx)| (path, &self.contexts[*idx])))
            .finish()
    }
}

impl<F: Frontend> Default for CompositeBindingContext<F> {
    fn default() -> Self {
        Self {
            contexts: Vec::new(),
            owners: Vec::new(),
        }
    }
}

impl<F: Frontend> CompositeBindingContext<F> {
    /// `owned` pairs each file with the context of its latest compile. Files
    /// of one batch share a context; it is stored once. A file listed twice
    /// keeps its first context.
    pub fn new(owned: impl IntoIterator<Item = (Arc<Path>, Arc<BindingContext<F>>)>) -> Self {
        let mut composite = Self::default();
        for (path, context) in owned {
            if composite.owners.iter().any(|(seen, _)| *seen == path) {
                continue;
            }
            let idx = match composite
                .contexts
                .iter()
                .position(|seen| Arc::ptr_eq(seen, &context))
            {
                Some(idx) => idx,
                None => {
                    composite.contexts.push(context);
                    composite.contexts.len() - 1
                }
            };
            composite.owners.push((path, idx));
        }
        composite
    }

    /// Distinct contexts, in order of first use.
    pub fn contexts(&self) -> &[Arc<BindingContext<F>>] {
        &self.contexts
    }

    pub fn paths(&self) -> impl Iterator<Item = &Arc<Path>> {
        self.owners.iter().map(|(path, _)| path)
    }

    /// The context answering for `path`.
    pub fn context_of(&self, path: &Path) -> Option<&Arc<BindingContext<F>>> {
        self.owners
            .iter()
            .find(|(owned, _)| &**owned == path)
            .map(|(_, idx)| &self.contexts[*idx])
    }

    pub fn type_of(&self, key: &SyntaxKey) -> Option<&F::Type> {
        self.context_of(&key.path)?.type_of(key)
    }

    pub fn reference(&self, key: &SyntaxKey) -> Option<&F::Declaration> {
        self.context_of(&key.path)?.reference(key)
    }

    /// Diagnostics of every file, each taken from the file's own context.
    pub fn diagnostics(&self) -> impl Iterator<Item = &Diagnostic> {
        self.owners.iter().flat_map(move |(path, idx)| {
            self.contexts[*idx]
                .diagnostics()
                .iter()
                .filter(move |diagnostic| diagnostic.path == *path)
        })
    }

    /// Diagnostics reported against `path`, in order and without duplicates.
    pub fn diagnostics_for(&self, path: &Path) -> Vec<Diagnostic> {
        let Some(context) = self.context_of(path) else {
            return Vec::new();
        };
        let mut out: Vec<Diagnostic> = Vec::new();
        for diagnostic in context.diagnostics().iter().filter(|d| &*d.path == path) {
            if !out.contains(diagnostic) {
                out.push(diagnostic.clone());
            }
        }
        out
    }
}
