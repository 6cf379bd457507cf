use std::fs;
use std::io;

use crate::path::VfsPath;

/// Where the text store reads file contents from when a file is not open.
pub trait FileSystem: Send + Sync {
    /// Reads the file contents as UTF-8 text.
    fn read_to_string(&self, path: &VfsPath) -> io::Result<String>;

    /// Returns whether a path exists.
    fn exists(&self, path: &VfsPath) -> bool;
}

/// Local OS file system implementation.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFs;

impl LocalFs {
    pub fn new() -> Self {
        Self
    }
}

impl FileSystem for LocalFs {
    fn read_to_string(&self, path: &VfsPath) -> io::Result<String> {
        match path {
            VfsPath::Local(path) => fs::read_to_string(path),
            VfsPath::Uri(uri) => Err(io::Error::new(
                io::ErrorKind::Unsupported,
                format!("cannot read URI path: {uri}"),
            )),
        }
    }

    fn exists(&self, path: &VfsPath) -> bool {
        match path {
            VfsPath::Local(path) => path.exists(),
            VfsPath::Uri(_) => false,
        }
    }
}
