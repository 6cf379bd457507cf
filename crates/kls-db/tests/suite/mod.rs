use std::path::Path;
use std::sync::Arc;

use kls_db::SourcePath;
use kls_test_utils::SketchFrontend;
use kls_vfs::VfsPath;

mod batch;
mod concurrency;
mod logging;
mod queries;

pub fn path(name: &str) -> VfsPath {
    VfsPath::local(format!("/ws/{name}"))
}

pub fn fs_path(name: &str) -> Arc<Path> {
    Arc::from(Path::new(&format!("/ws/{name}")))
}

pub struct Fixture {
    pub frontend: Arc<SketchFrontend>,
    pub source_path: SourcePath<SketchFrontend>,
}

impl Fixture {
    pub fn new(files: &[(&str, &str)]) -> Self {
        let frontend = Arc::new(SketchFrontend::new());
        let source_path = SourcePath::new(Arc::clone(&frontend));
        for (name, text) in files {
            source_path.put(&path(name), Arc::from(*text), false);
        }
        Self {
            frontend,
            source_path,
        }
    }

    pub fn put(&self, name: &str, text: &str) {
        self.source_path.put(&path(name), Arc::from(text), false);
    }
}
