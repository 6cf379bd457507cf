//! Utilities shared by kls tests.
//!
//! - [`SketchFrontend`]: a small reference frontend over the bundled parser.
//!   It understands enough Kotlin (literals, locals, parameters, classes,
//!   members, calls) to exercise every cache path, and counts its analyzer
//!   calls so tests can assert on caching behavior.
//! - Fixture helpers: `$0` cursor markers and temporary workspaces.

mod fixtures;
mod sketch;

#[cfg(feature = "fixture-fs")]
mod fixture_fs;

pub use fixtures::{extract_cursor, offset_of, CURSOR_MARKER};
pub use sketch::{
    DeclarationKind, SketchDeclaration, SketchFrontend, SketchModule, SketchScope, SketchType,
};

#[cfg(feature = "fixture-fs")]
pub use fixture_fs::TempWorkspace;
