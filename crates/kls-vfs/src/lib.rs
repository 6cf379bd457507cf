//! Text store for kls.
//!
//! This crate owns the latest text of every tracked file:
//! - Editor buffers (open, versioned, incrementally edited).
//! - Workspace files loaded from disk and kept in sync with watcher events.
//! - Workspace membership (`SourceExclusions`), which decides whether an open
//!   file is part of the workspace or only a temporary guest.
//!
//! Every accepted change is forwarded to a [`SourceSink`], normally the
//! compilation cache.

mod change;
mod document;
mod exclusions;
mod fs;
mod path;
mod source_files;

pub use change::{FileChange, FileChangeKind};
pub use document::{apply_change, normalize_line_endings, ContentChange, Document, DocumentError};
pub use exclusions::{script_exclusions, SourceExclusions, DEFAULT_EXCLUDED_PATTERNS};
pub use fs::{FileSystem, LocalFs};
pub use path::VfsPath;
pub use source_files::{SourceFiles, SourceSink, TrackedFile};
