use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// File mode of an entry in HEAD, the index, or the worktree.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FileMode {
    /// Normal file (0o100644).
    Regular,
    /// Executable file (0o100755).
    Executable,
    /// Symbolic link (0o120000).
    Symlink,
    /// Subtree / directory (0o040000).
    Directory,
}

impl FileMode {
    /// Octal mode value (for display/serialization).
    pub fn mode_bits(&self) -> u32 {
        match self {
            Self::Regular => 0o100644,
            Self::Executable => 0o100755,
            Self::Symlink => 0o120000,
            Self::Directory => 0o040000,
        }
    }

    /// Parse from an octal mode value.
    ///
    /// Index files record any regular file as either 0o100644 or 0o100755,
    /// but older writers left group-writable bits behind, so only the type
    /// and owner-execute bits are inspected.
    pub fn from_mode_bits(bits: u32) -> Result<Self, TypeError> {
        match bits & 0o170000 {
            0o100000 if bits & 0o100 != 0 => Ok(Self::Executable),
            0o100000 => Ok(Self::Regular),
            0o120000 => Ok(Self::Symlink),
            0o040000 => Ok(Self::Directory),
            _ => Err(TypeError::UnknownMode(bits)),
        }
    }

    /// Returns `true` for regular and executable files.
    pub fn is_file(&self) -> bool {
        matches!(self, Self::Regular | Self::Executable)
    }

    /// Compare two modes, optionally disregarding the executable bit.
    pub fn matches(&self, other: &FileMode, honor_executable: bool) -> bool {
        if honor_executable {
            self == other
        } else {
            self == other || (self.is_file() && other.is_file())
        }
    }
}

impl fmt::Display for FileMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:06o}", self.mode_bits())
    }
}
