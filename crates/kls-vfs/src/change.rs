use crate::path::VfsPath;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileChangeKind {
    Created,
    Modified,
    Deleted,
}

/// A file system notification, as reported by an editor's file watcher.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileChange {
    pub path: VfsPath,
    pub kind: FileChangeKind,
}

impl FileChange {
    pub fn new(path: VfsPath, kind: FileChangeKind) -> Self {
        Self { path, kind }
    }
}

#[cfg(feature = "lsp")]
impl From<&lsp_types::FileEvent> for FileChange {
    fn from(value: &lsp_types::FileEvent) -> Self {
        let kind = match value.typ {
            lsp_types::FileChangeType::CREATED => FileChangeKind::Created,
            lsp_types::FileChangeType::DELETED => FileChangeKind::Deleted,
            _ => FileChangeKind::Modified,
        };
        Self::new(VfsPath::from(&value.uri), kind)
    }
}
