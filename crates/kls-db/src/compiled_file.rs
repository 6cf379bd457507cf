use std::fmt;
use std::path::Path;
use std::sync::Arc;

use kls_core::{describe_position, line_after, line_before, old_offset, TextRange, TextSize};
use kls_syntax::ast::{AstNode, DotQualifiedExpression};
use kls_syntax::{ParsedFile, SyntaxKind, SyntaxNode, SyntaxToken};
use kls_vfs::VfsPath;

use crate::binding::{BindingContext, SyntaxKey};
use crate::compiler::Compiler;
use crate::frontend::{CompilationKind, Frontend};
use crate::recovery::{self, Recovery};

/// A compiled snapshot of one file together with its live text.
///
/// `parse` and `compile` describe the text as it was last compiled; `content`
/// is the text as it is now. Cursor offsets passed to queries are offsets into
/// `content` and are translated into the compiled text where needed.
///
/// Every query returns `None` when it cannot answer; misses are logged at info
/// level.
pub struct CompiledFile<F: Frontend> {
    path: VfsPath,
    content: Arc<str>,
    parse: Arc<ParsedFile>,
    compile: Arc<BindingContext<F>>,
    module: Arc<F::Module>,
    source_path: Vec<Arc<ParsedFile>>,
    kind: CompilationKind,
    compiler: Arc<Compiler<F>>,
}

impl<F: Frontend> Clone for CompiledFile<F> {
    fn clone(&self) -> Self {
        Self {
            path: self.path.clone(),
            content: Arc::clone(&self.content),
            parse: Arc::clone(&self.parse),
            compile: Arc::clone(&self.compile),
            module: Arc::clone(&self.module),
            source_path: self.source_path.clone(),
            kind: self.kind,
            compiler: Arc::clone(&self.compiler),
        }
    }
}

impl<F: Frontend> fmt::Debug for CompiledFile<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledFile")
            .field("path", &self.path)
            .field("kind", &self.kind)
            .field("stale", &self.is_stale())
            .finish_non_exhaustive()
    }
}

/// The reference under the cursor and what it resolves to.
pub type Reference<F> = (SyntaxKey, <F as Frontend>::Declaration);

impl<F: Frontend> CompiledFile<F> {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        path: VfsPath,
        content: Arc<str>,
        parse: Arc<ParsedFile>,
        compile: Arc<BindingContext<F>>,
        module: Arc<F::Module>,
        source_path: Vec<Arc<ParsedFile>>,
        kind: CompilationKind,
        compiler: Arc<Compiler<F>>,
    ) -> Self {
        Self {
            path,
            content,
            parse,
            compile,
            module,
            source_path,
            kind,
            compiler,
        }
    }

    pub fn path(&self) -> &VfsPath {
        &self.path
    }

    pub fn content(&self) -> &Arc<str> {
        &self.content
    }

    /// The tree that was compiled.
    pub fn parse(&self) -> &Arc<ParsedFile> {
        &self.parse
    }

    pub fn compile(&self) -> &Arc<BindingContext<F>> {
        &self.compile
    }

    pub fn module(&self) -> &Arc<F::Module> {
        &self.module
    }

    pub fn source_path(&self) -> &[Arc<ParsedFile>] {
        &self.source_path
    }

    pub fn kind(&self) -> CompilationKind {
        self.kind
    }

    pub fn is_script(&self) -> bool {
        self.parse.is_script()
    }

    /// Whether the live text has moved past the compiled one.
    pub fn is_stale(&self) -> bool {
        **self.parse.text() != *self.content
    }

    /// Type of the expression at `cursor`, computed on a fresh parse of the
    /// region around it.
    pub fn type_at_point(&self, cursor: TextSize) -> Option<F::Type> {
        let recovery = self.parse_at_point(cursor, true);
        let Some((file, expression)) = recovery
            .and_then(|r| innermost_expression(&r.element).map(|expression| (r.file, expression)))
        else {
            return self.miss(format!("Couldn't find expression at {}", self.describe_position(cursor)));
        };
        let expression = expand_for_type(cursor, expression);
        let Some(scope) = self.scope_at_point(cursor) else {
            return self.miss(format!("Couldn't find scope at {}", self.describe_position(cursor)));
        };
        self.type_of_expression(&file, &expression, &scope)
    }

    /// `expression` must belong to `file`.
    pub fn type_of_expression(
        &self,
        file: &ParsedFile,
        expression: &SyntaxNode,
        scope: &F::Scope,
    ) -> Option<F::Type> {
        let context = self.binding_context_of(file, expression, scope)?;
        context.type_of_node(file.path(), expression).cloned()
    }

    /// Analyzes a single expression under the compile lock. Analysis failures
    /// are logged and yield `None`.
    pub fn binding_context_of(
        &self,
        file: &ParsedFile,
        expression: &SyntaxNode,
        scope: &F::Scope,
    ) -> Option<BindingContext<F>> {
        match self
            .compiler
            .compile_expression(file, expression, scope, &self.source_path, self.kind)
        {
            Ok(context) => Some(context),
            Err(err) => {
                tracing::warn!(target: "kls.db", path = %self.path, "{err}");
                None
            }
        }
    }

    /// The reference at `cursor` and its target, resolved on a fresh parse of
    /// the region around it. Member accesses and calls are widened to the
    /// whole chain before analysis.
    pub fn reference_at_point(&self, cursor: TextSize) -> Option<Reference<F>> {
        let recovery = self.parse_at_point(cursor, true);
        let Some((file, expression)) = recovery
            .and_then(|r| innermost_expression(&r.element).map(|expression| (r.file, expression)))
        else {
            return self.miss(format!("Couldn't find expression at {}", self.describe_position(cursor)));
        };
        let expression = expand_for_reference(expression);
        let Some(scope) = self.scope_at_point(cursor) else {
            return self.miss(format!("Couldn't find scope at {}", self.describe_position(cursor)));
        };

        // The fragment has its own path, so lookups use the fragment's.
        let context = self.binding_context_of(&file, &expression, &scope)?;
        tracing::info!(target: "kls.db", "Hovering {}", expression);
        reference_from_context(cursor, file.path(), &context)
    }

    /// Like [`Self::reference_at_point`] but answered from the compiled
    /// context alone, without analyzing anything.
    pub fn reference_expression_at_point(&self, cursor: TextSize) -> Option<Reference<F>> {
        let old_cursor = self.old_offset(cursor);
        reference_from_context(old_cursor, self.parse.path(), &self.compile)
    }

    /// The innermost lexical scope of the compiled file around `cursor`.
    pub fn scope_at_point(&self, cursor: TextSize) -> Option<F::Scope> {
        let old_cursor = self.old_offset(cursor);
        let path = self.parse.path();
        self.compile
            .scopes()
            .filter(|(key, _)| {
                key.range.start() <= old_cursor && old_cursor <= key.range.end() && &key.path == path
            })
            // Ties go to the later, inner scope.
            .reduce(|best, candidate| {
                if candidate.0.range.len() <= best.0.range.len() {
                    candidate
                } else {
                    best
                }
            })
            .map(|(_, scope)| scope.clone())
    }

    /// The compiled element at `cursor`. May lag behind the live text.
    pub fn element_at_point(&self, cursor: TextSize) -> Option<SyntaxNode> {
        let old_cursor = self.old_offset(cursor);
        match self.parse.element_at(old_cursor) {
            Some(token) => token.parent(),
            None => self.miss(format!("Couldn't find anything at {}", self.describe_position(cursor))),
        }
    }

    /// The named declaration whose name is at `cursor`, with the range of the
    /// name in the compiled text.
    pub fn declaration_at_point(&self, cursor: TextSize) -> Option<(SyntaxNode, TextRange)> {
        let element = self.element_at_point(cursor)?;
        let declaration = element
            .ancestors()
            .find(|node| node.kind().is_declaration())?;
        let name = name_of(&declaration)?;
        Some((declaration, name.text_range()))
    }

    /// See [`recovery::parse_at_point`].
    pub fn parse_at_point(&self, cursor: TextSize, as_reference: bool) -> Option<Recovery> {
        recovery::parse_at_point(&self.parse, &self.content, cursor, as_reference, |path, text| {
            self.compiler.parse(path, text, self.kind)
        })
    }

    pub fn old_offset(&self, cursor: TextSize) -> TextSize {
        old_offset(self.parse.text(), &self.content, cursor)
    }

    pub fn line_before(&self, cursor: TextSize) -> &str {
        line_before(&self.content, cursor)
    }

    pub fn line_after(&self, cursor: TextSize) -> &str {
        line_after(&self.content, cursor)
    }

    /// `Main.kt 3:5` for an offset into the live text.
    pub fn describe_position(&self, offset: TextSize) -> String {
        describe_position(self.parse.file_name(), &self.content, offset)
    }

    fn miss<T>(&self, message: String) -> Option<T> {
        tracing::info!(target: "kls.db", path = %self.path, "{message}");
        None
    }
}

/// Declarations and type references count: a recovered class name comes
/// back as the type of a dummy property.
fn innermost_expression(element: &SyntaxNode) -> Option<SyntaxNode> {
    element.ancestors().find(|node| {
        let kind = node.kind();
        kind.is_expression() || kind.is_declaration() || kind == SyntaxKind::TypeReference
    })
}

/// Widens to `a.b` while the cursor is on the selector `b`.
fn expand_for_type(cursor: TextSize, mut expression: SyntaxNode) -> SyntaxNode {
    while let Some(parent) = expression.parent().and_then(DotQualifiedExpression::cast) {
        let on_selector = parent
            .selector()
            .is_some_and(|selector| selector.text_range().contains(cursor));
        if !on_selector {
            break;
        }
        expression = parent.syntax().clone();
    }
    expression
}

/// Widens through every enclosing `a.b`, `a?.b`, and `f()`.
fn expand_for_reference(mut expression: SyntaxNode) -> SyntaxNode {
    while let Some(parent) = expression.parent().filter(|parent| {
        matches!(
            parent.kind(),
            SyntaxKind::DotQualifiedExpression
                | SyntaxKind::SafeQualifiedExpression
                | SyntaxKind::CallExpression
        )
    }) {
        expression = parent;
    }
    expression
}

/// The smallest reference recorded for `path` whose range contains `cursor`.
fn reference_from_context<F: Frontend>(
    cursor: TextSize,
    path: &Arc<Path>,
    context: &BindingContext<F>,
) -> Option<Reference<F>> {
    context
        .references()
        .filter(|(key, _)| key.range.contains(cursor) && &key.path == path)
        .min_by_key(|(key, _)| (key.range.len(), key.range.start()))
        .map(|(key, declaration)| (key.clone(), declaration.clone()))
}

fn name_of(declaration: &SyntaxNode) -> Option<SyntaxToken> {
    declaration
        .children_with_tokens()
        .filter_map(|element| element.into_token())
        .find(|token| token.kind() == SyntaxKind::Identifier)
}
