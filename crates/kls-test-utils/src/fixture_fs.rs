use std::fs;
use std::path::{Path, PathBuf};

use kls_vfs::VfsPath;

/// A workspace directory on disk that is deleted when dropped.
pub struct TempWorkspace {
    dir: tempfile::TempDir,
}

impl TempWorkspace {
    /// Creates the directory and writes `files` (`(relative path, text)`).
    ///
    /// # Panics
    ///
    /// Panics on any I/O error.
    pub fn new(files: &[(&str, &str)]) -> Self {
        let workspace = Self {
            dir: tempfile::tempdir().expect("create temp dir"),
        };
        for (relative, text) in files {
            workspace.write(relative, text);
        }
        workspace
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.dir.path().join(relative)
    }

    pub fn vfs_path(&self, relative: &str) -> VfsPath {
        VfsPath::local(self.path(relative))
    }

    pub fn write(&self, relative: &str, text: &str) {
        let path = self.path(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create fixture directory");
        }
        fs::write(&path, text).expect("write fixture file");
    }

    pub fn remove(&self, relative: &str) {
        fs::remove_file(self.path(relative)).expect("remove fixture file");
    }
}
