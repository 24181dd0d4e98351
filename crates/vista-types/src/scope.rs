use crate::path::PathKey;

/// The part of the repository a scan is restricted to.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Scope {
    /// The whole repository.
    #[default]
    All,
    /// Everything strictly inside a directory (held as a directory key).
    Directory(PathKey),
    /// Exactly one path.
    Path(PathKey),
}

impl Scope {
    /// Restrict to the contents of `dir`.
    pub fn directory(dir: &PathKey) -> Self {
        Self::Directory(dir.to_dir())
    }

    /// Restrict to the single path `path`.
    pub fn path(path: &PathKey) -> Self {
        Self::Path(path.to_file())
    }

    /// Whether `key` falls inside the scope.
    pub fn contains(&self, key: &PathKey) -> bool {
        match self {
            Self::All => true,
            Self::Directory(dir) => key.is_inside(dir),
            Self::Path(path) => key == path,
        }
    }

    /// Whether entries after `key` (in path order) can still be in scope.
    pub fn is_exhausted_after(&self, key: &PathKey) -> bool {
        match self {
            Self::All => false,
            Self::Directory(dir) => key.as_bytes() > dir.as_bytes() && !key.is_inside(dir),
            Self::Path(path) => key >= path,
        }
    }
}
