use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use kls_syntax::{ParsedFile, SyntaxNode};
use parking_lot::{ReentrantMutex, ReentrantMutexGuard, RwLock};

use crate::binding::BindingContext;
use crate::frontend::{AnalysisError, CompilationKind, Frontend};

/// Called right before every file analysis.
pub type BeforeCompile = Arc<dyn Fn() + Send + Sync>;

/// Held while the analyzer runs. Reentrant, so callers may take it around a
/// staleness check and then call back into [`Compiler`].
pub type CompileGuard<'a> = ReentrantMutexGuard<'a, ()>;

/// Owns the frontend and serializes every analyzer call behind one lock.
pub struct Compiler<F: Frontend> {
    frontend: RwLock<Arc<F>>,
    lock: ReentrantMutex<()>,
    before_compile: RwLock<Option<BeforeCompile>>,
}

impl<F: Frontend> fmt::Debug for Compiler<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Compiler").finish_non_exhaustive()
    }
}

impl<F: Frontend> Compiler<F> {
    pub fn new(frontend: Arc<F>) -> Self {
        Self {
            frontend: RwLock::new(frontend),
            lock: ReentrantMutex::new(()),
            before_compile: RwLock::new(None),
        }
    }

    pub fn frontend(&self) -> Arc<F> {
        Arc::clone(&self.frontend.read())
    }

    pub fn lock(&self) -> CompileGuard<'_> {
        self.lock.lock()
    }

    /// Waits for any running analysis to finish before swapping.
    pub fn set_frontend(&self, frontend: Arc<F>) {
        let _guard = self.lock();
        *self.frontend.write() = frontend;
    }

    pub fn set_before_compile(&self, hook: Option<BeforeCompile>) {
        *self.before_compile.write() = hook;
    }

    /// Parsing does not take the compile lock.
    pub fn parse(&self, path: &Path, text: &str, kind: CompilationKind) -> ParsedFile {
        self.frontend().parse(path, text, kind)
    }

    pub fn compile_files(
        &self,
        files: &[Arc<ParsedFile>],
        source_path: &[Arc<ParsedFile>],
        kind: CompilationKind,
    ) -> Result<(BindingContext<F>, F::Module), AnalysisError> {
        let _guard = self.lock();
        let hook = self.before_compile.read().clone();
        if let Some(hook) = hook {
            hook();
        }

        let started = Instant::now();
        let result = self.frontend().analyze_files(files, source_path, kind);
        tracing::debug!(
            target: "kls.db",
            files = files.len(),
            source_path = source_path.len(),
            ?kind,
            elapsed_ms = started.elapsed().as_millis() as u64,
            ok = result.is_ok(),
            "analyzed files"
        );
        result
    }

    pub fn compile_expression(
        &self,
        file: &ParsedFile,
        expression: &SyntaxNode,
        scope: &F::Scope,
        source_path: &[Arc<ParsedFile>],
        kind: CompilationKind,
    ) -> Result<BindingContext<F>, AnalysisError> {
        let _guard = self.lock();
        self.frontend()
            .analyze_expression(file, expression, scope, source_path, kind)
            .map_err(|err| {
                AnalysisError::new(format!(
                    "Error while analyzing: {}: {err}",
                    describe_expression(&expression.text().to_string())
                ))
            })
    }
}

/// Short form of an expression's source for log messages: the whole text when
/// it has fewer than five lines, otherwise the first three, `...`, and the last.
pub(crate) fn describe_expression(expression: &str) -> String {
    let lines: Vec<&str> = expression.split('\n').collect();
    if lines.len() < 5 {
        return expression.to_string();
    }
    let mut out: Vec<&str> = lines[..3].to_vec();
    out.push("...");
    out.extend(lines.last());
    out.join("\n")
}
