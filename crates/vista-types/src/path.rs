//! Repository-relative path keys.
//!
//! A [`PathKey`] is the join key shared by HEAD, the index, and the worktree.
//! It is a forward-slash separated byte string relative to the repository
//! root. File keys never end in `/`; a trailing `/` marks a directory key,
//! which only worktree listers produce (as directory markers) and which the
//! status scan reports for collapsed directories.
//!
//! Keys order byte-wise. Because `/` sorts after `.` but before every
//! alphanumeric byte, a directory key `a/` lands between `a.txt` and `a/b`,
//! which is exactly the order a pre-order walk of git-sorted trees produces.

use std::borrow::Cow;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::TypeError;

/// A normalized, repository-relative path.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PathKey(Vec<u8>);

impl PathKey {
    /// Normalize raw path bytes into a key.
    ///
    /// Empty and `.` segments are dropped and leading slashes removed. A
    /// trailing slash is preserved and turns the key into a directory key.
    /// `..` segments and paths that normalize to nothing are rejected.
    pub fn parse(raw: impl AsRef<[u8]>) -> Result<Self, TypeError> {
        let raw = raw.as_ref();
        let invalid = |reason| TypeError::InvalidPath {
            path: String::from_utf8_lossy(raw).into_owned(),
            reason,
        };
        if raw.contains(&0) {
            return Err(invalid("contains a NUL byte"));
        }

        let mut out = Vec::with_capacity(raw.len());
        for segment in raw.split(|b| *b == b'/') {
            match segment {
                b"" | b"." => continue,
                b".." => return Err(invalid("contains a `..` component")),
                _ => {
                    if !out.is_empty() {
                        out.push(b'/');
                    }
                    out.extend_from_slice(segment);
                }
            }
        }
        if out.is_empty() {
            return Err(invalid("empty path"));
        }
        if raw.ends_with(b"/") {
            out.push(b'/');
        }
        Ok(Self(out))
    }

    /// Normalize and force a directory key (trailing `/`).
    pub fn directory(raw: impl AsRef<[u8]>) -> Result<Self, TypeError> {
        Ok(Self::parse(raw)?.to_dir())
    }

    /// Build a key from a path relative to the repository root.
    pub fn from_relative_path(rel: &Path) -> Result<Self, TypeError> {
        Self::parse(path_bytes(rel).as_ref())
    }

    /// The raw key bytes (including the trailing `/` of directory keys).
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Returns `true` for directory keys.
    pub fn is_dir(&self) -> bool {
        self.0.ends_with(b"/")
    }

    /// The key bytes without a directory's trailing slash.
    pub fn trimmed(&self) -> &[u8] {
        self.0.strip_suffix(b"/").unwrap_or(&self.0)
    }

    /// The directory form of this key.
    pub fn to_dir(&self) -> PathKey {
        if self.is_dir() {
            self.clone()
        } else {
            let mut bytes = self.0.clone();
            bytes.push(b'/');
            PathKey(bytes)
        }
    }

    /// The file form of this key (trailing slash removed).
    pub fn to_file(&self) -> PathKey {
        PathKey(self.trimmed().to_vec())
    }

    /// The final path segment.
    pub fn file_name(&self) -> &[u8] {
        let trimmed = self.trimmed();
        match trimmed.iter().rposition(|b| *b == b'/') {
            Some(pos) => &trimmed[pos + 1..],
            None => trimmed,
        }
    }

    /// The containing directory as a directory key, or `None` at top level.
    pub fn parent(&self) -> Option<PathKey> {
        let trimmed = self.trimmed();
        trimmed
            .iter()
            .rposition(|b| *b == b'/')
            .map(|pos| PathKey(trimmed[..=pos].to_vec()))
    }

    /// Number of path segments.
    pub fn depth(&self) -> usize {
        self.trimmed().iter().filter(|b| **b == b'/').count() + 1
    }

    /// Proper ancestor directories, shallowest first, without trailing slash.
    ///
    /// `a/b/c` yields `a` then `a/b`.
    pub fn ancestors(&self) -> impl Iterator<Item = &[u8]> + '_ {
        let trimmed = self.trimmed();
        trimmed
            .iter()
            .enumerate()
            .filter(|(_, b)| **b == b'/')
            .map(move |(pos, _)| &trimmed[..pos])
    }

    /// Returns `true` if this key lies strictly inside directory `dir`.
    pub fn is_inside(&self, dir: &PathKey) -> bool {
        let prefix = dir.trimmed();
        self.0.len() > prefix.len() + 1
            && self.0.starts_with(prefix)
            && self.0[prefix.len()] == b'/'
    }

    /// Append a child segment to a directory key.
    pub fn join(&self, name: &[u8]) -> Result<PathKey, TypeError> {
        let mut bytes = self.trimmed().to_vec();
        bytes.push(b'/');
        bytes.extend_from_slice(name);
        PathKey::parse(bytes)
    }

    /// Resolve the key against a worktree root.
    pub fn to_path(&self, root: &Path) -> PathBuf {
        root.join(bytes_to_path(self.trimmed()))
    }

    /// Lossy UTF-8 rendering.
    pub fn to_string_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.0)
    }
}

#[cfg(unix)]
fn path_bytes(path: &Path) -> Cow<'_, [u8]> {
    use std::os::unix::ffi::OsStrExt;
    Cow::Borrowed(path.as_os_str().as_bytes())
}

#[cfg(not(unix))]
fn path_bytes(path: &Path) -> Cow<'_, [u8]> {
    let lossy = path.to_string_lossy().replace('\\', "/");
    Cow::Owned(lossy.into_bytes())
}

/// Repository-relative bytes as a platform path.
#[cfg(unix)]
pub fn bytes_to_path(bytes: &[u8]) -> PathBuf {
    use std::os::unix::ffi::OsStrExt;
    PathBuf::from(std::ffi::OsStr::from_bytes(bytes))
}

#[cfg(not(unix))]
pub fn bytes_to_path(bytes: &[u8]) -> PathBuf {
    PathBuf::from(String::from_utf8_lossy(bytes).into_owned())
}

impl fmt::Debug for PathKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PathKey({:?})", self.to_string_lossy())
    }
}

impl fmt::Display for PathKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_string_lossy())
    }
}

impl FromStr for PathKey {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<&str> for PathKey {
    type Error = TypeError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Self::parse(s)
    }
}

impl AsRef<[u8]> for PathKey {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Serialize for PathKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string_lossy())
    }
}

impl<'de> Deserialize<'de> for PathKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        PathKey::parse(raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn key(s: &str) -> PathKey {
        PathKey::parse(s).unwrap()
    }

    #[test]
    fn parse_normalizes_separators() {
        assert_eq!(key("./src//lib.rs").as_bytes(), b"src/lib.rs");
        assert_eq!(key("/top.txt").as_bytes(), b"top.txt");
        assert_eq!(key("build/").as_bytes(), b"build/");
        assert!(key("build/").is_dir());
        assert!(!key("build").is_dir());
    }

    #[test]
    fn parse_rejects_escapes_and_empty() {
        assert!(matches!(
            PathKey::parse("a/../b"),
            Err(TypeError::InvalidPath { reason, .. }) if reason.contains("..")
        ));
        assert!(PathKey::parse("").is_err());
        assert!(PathKey::parse("./").is_err());
        assert!(PathKey::parse(b"a\0b").is_err());
    }

    #[test]
    fn names_and_parents() {
        let k = key("a/b/c.txt");
        assert_eq!(k.file_name(), b"c.txt");
        assert_eq!(k.parent(), Some(key("a/b/")));
        assert_eq!(k.depth(), 3);
        assert_eq!(key("top").parent(), None);
        assert_eq!(key("a/b/").file_name(), b"b");
    }

    #[test]
    fn ancestors_shallowest_first() {
        let k = key("a/b/c");
        let ancestors: Vec<&[u8]> = k.ancestors().collect();
        assert_eq!(ancestors, vec![&b"a"[..], &b"a/b"[..]]);
        assert_eq!(key("file").ancestors().count(), 0);
    }

    #[test]
    fn inside_requires_segment_boundary() {
        let dir = key("build/");
        assert!(key("build/out.o").is_inside(&dir));
        assert!(key("build/x/y").is_inside(&key("build")));
        assert!(!key("build.txt").is_inside(&dir));
        assert!(!key("builder/x").is_inside(&dir));
        assert!(!key("build/").is_inside(&dir));
    }

    #[test]
    fn directory_key_sorts_between_sibling_file_and_children() {
        let mut keys = vec![key("a/b"), key("a/"), key("a.txt"), key("a0")];
        keys.sort();
        let rendered: Vec<String> = keys.iter().map(|k| k.to_string()).collect();
        assert_eq!(rendered, vec!["a.txt", "a/", "a/b", "a0"]);
    }

    #[test]
    fn serde_as_string() {
        let json = serde_json::to_string(&key("src/main.rs")).unwrap();
        assert_eq!(json, "\"src/main.rs\"");
        let back: PathKey = serde_json::from_str(&json).unwrap();
        assert_eq!(back, key("src/main.rs"));
        assert!(serde_json::from_str::<PathKey>("\"../x\"").is_err());
    }

    proptest! {
        #[test]
        fn children_sort_after_their_directory_marker(
            dir in "[a-z]{1,4}",
            sibling_suffix in "[.!#-]{1}[a-z]{0,3}",
            child in "[a-z]{1,4}",
        ) {
            let marker = PathKey::directory(&dir).unwrap();
            let sibling = key(&format!("{dir}{sibling_suffix}"));
            let inner = marker.join(child.as_bytes()).unwrap();
            prop_assert!(sibling < marker);
            prop_assert!(marker < inner);
            prop_assert!(inner.is_inside(&marker));
        }
    }
}
