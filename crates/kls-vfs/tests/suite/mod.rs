use std::collections::HashMap;
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use kls_vfs::{FileSystem, SourceFiles, SourceSink, VfsPath};

mod edits;
mod splice_props;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkEvent {
    Put {
        path: VfsPath,
        content: String,
        temporary: bool,
    },
    Remove(VfsPath),
}

#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<SinkEvent>>,
}

impl RecordingSink {
    pub fn take(&self) -> Vec<SinkEvent> {
        std::mem::take(&mut *self.events.lock().unwrap())
    }
}

impl SourceSink for RecordingSink {
    fn put(&self, path: &VfsPath, content: Arc<str>, temporary: bool) {
        self.events.lock().unwrap().push(SinkEvent::Put {
            path: path.clone(),
            content: content.to_string(),
            temporary,
        });
    }

    fn remove(&self, path: &VfsPath) {
        self.events
            .lock()
            .unwrap()
            .push(SinkEvent::Remove(path.clone()));
    }
}

/// In-memory disk. Paths registered through `fail` return a permission error.
#[derive(Default)]
pub struct MemoryFs {
    files: Mutex<HashMap<PathBuf, String>>,
    failing: Mutex<Vec<PathBuf>>,
}

impl MemoryFs {
    pub fn write(&self, path: &str, text: &str) {
        self.files
            .lock()
            .unwrap()
            .insert(PathBuf::from(path), text.to_string());
    }

    pub fn delete(&self, path: &str) {
        self.files.lock().unwrap().remove(&PathBuf::from(path));
    }

    pub fn fail(&self, path: &str) {
        self.failing.lock().unwrap().push(PathBuf::from(path));
    }
}

impl FileSystem for MemoryFs {
    fn read_to_string(&self, path: &VfsPath) -> io::Result<String> {
        let Some(local) = path.as_local_path() else {
            return Err(io::Error::new(io::ErrorKind::Unsupported, "not a local path"));
        };
        if self.failing.lock().unwrap().iter().any(|p| p == local) {
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied"));
        }
        self.files
            .lock()
            .unwrap()
            .get(local)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "missing"))
    }

    fn exists(&self, path: &VfsPath) -> bool {
        path.as_local_path()
            .is_some_and(|local| self.files.lock().unwrap().contains_key(local))
    }
}

pub struct Harness {
    pub fs: Arc<MemoryFs>,
    pub sink: Arc<RecordingSink>,
    pub files: SourceFiles,
}

/// A store with `/ws` as its only workspace root and an empty disk.
pub fn harness() -> Harness {
    let fs = Arc::new(MemoryFs::default());
    let sink = Arc::new(RecordingSink::default());
    let mut files = SourceFiles::new(fs.clone(), sink.clone());
    files.add_workspace_root(std::path::Path::new("/ws"));
    sink.take();
    Harness { fs, sink, files }
}

pub fn path(p: &str) -> VfsPath {
    VfsPath::local(p)
}

pub fn content(files: &SourceFiles, p: &str) -> Option<String> {
    files.get(&path(p)).map(|f| f.content().to_string())
}
