//! Incremental parse and compile caches for kls.
//!
//! This crate provides:
//! - [`Frontend`]: the injected compiler capability (parse, file analysis,
//!   expression analysis).
//! - [`SourcePath`]: per-file parse and compile caches, refreshed lazily by
//!   comparing texts, and batch compilation into a [`CompositeBindingContext`].
//! - [`Compiler`]: the one lock every analyzer call goes through.
//! - [`recovery`]: narrow reparsing of the declaration around the cursor.
//! - [`CompiledFile`]: point queries (type, reference, scope, element) over a
//!   possibly stale compile.

mod binding;
mod compiled_file;
mod compiler;
mod frontend;
pub mod recovery;
mod source_path;

pub use binding::{
    BindingContext, CompositeBindingContext, Diagnostic, Severity, SyntaxKey,
};
pub use compiled_file::{CompiledFile, Reference};
pub use compiler::{BeforeCompile, CompileGuard, Compiler};
pub use frontend::{AnalysisError, CompilationKind, CompileError, Frontend};
pub use recovery::{Recovery, RecoveryWindow};
pub use source_path::SourcePath;
