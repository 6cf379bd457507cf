use std::fmt;
use std::path::{Component, Path, PathBuf};

/// Identity of a tracked file.
///
/// `file:` URIs are converted to local paths so that editor buffers and disk
/// paths map to the same key. Anything else (`untitled:`, remote schemes) is
/// kept verbatim and can never be read from disk.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum VfsPath {
    /// A file on the local OS file system.
    Local(PathBuf),
    /// A URI that does not name a local file.
    Uri(String),
}

impl VfsPath {
    pub fn local(path: impl Into<PathBuf>) -> Self {
        Self::Local(normalize_local_path(&path.into()))
    }

    pub fn uri(uri: impl Into<String>) -> Self {
        let uri = uri.into();
        if uri.starts_with("file:") {
            if let Some(path) = url::Url::parse(&uri)
                .ok()
                .and_then(|url| url.to_file_path().ok())
            {
                return Self::local(path);
            }
        }
        Self::Uri(uri)
    }

    pub fn as_local_path(&self) -> Option<&Path> {
        match self {
            VfsPath::Local(path) => Some(path),
            VfsPath::Uri(_) => None,
        }
    }

    /// `file://` form of a local path.
    pub fn to_file_uri(&self) -> Option<String> {
        match self {
            VfsPath::Local(path) => url::Url::from_file_path(path).ok().map(String::from),
            VfsPath::Uri(_) => None,
        }
    }

    /// A path usable as a syntax tree's file name. URIs become relative paths
    /// made of their text.
    pub fn to_path_buf(&self) -> PathBuf {
        match self {
            VfsPath::Local(path) => path.clone(),
            VfsPath::Uri(uri) => PathBuf::from(uri),
        }
    }

    pub fn file_name(&self) -> Option<&str> {
        match self {
            VfsPath::Local(path) => path.file_name()?.to_str(),
            VfsPath::Uri(uri) => uri.rsplit('/').next().filter(|name| !name.is_empty()),
        }
    }

    /// `.kt` and `.kts` files.
    pub fn is_kotlin_source(&self) -> bool {
        self.file_name()
            .is_some_and(|name| name.ends_with(".kt") || name.ends_with(".kts"))
    }

    pub fn is_build_script(&self) -> bool {
        self.file_name()
            .is_some_and(|name| name.ends_with(".gradle.kts"))
    }

    pub fn is_script(&self) -> bool {
        self.file_name().is_some_and(|name| name.ends_with(".kts"))
    }

    pub fn starts_with(&self, root: &Path) -> bool {
        self.as_local_path().is_some_and(|path| path.starts_with(root))
    }
}

impl fmt::Display for VfsPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VfsPath::Local(path) => write!(f, "{}", path.display()),
            VfsPath::Uri(uri) => f.write_str(uri),
        }
    }
}

impl From<PathBuf> for VfsPath {
    fn from(value: PathBuf) -> Self {
        VfsPath::local(value)
    }
}

impl From<&Path> for VfsPath {
    fn from(value: &Path) -> Self {
        VfsPath::local(value)
    }
}

#[cfg(feature = "lsp")]
impl From<&lsp_types::Uri> for VfsPath {
    fn from(value: &lsp_types::Uri) -> Self {
        VfsPath::uri(value.as_str())
    }
}

/// Lexically resolve `.` and `..` without touching the file system.
fn normalize_local_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let popped = matches!(out.components().last(), Some(Component::Normal(_)))
                    && out.pop();
                if !popped && !out.has_root() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
