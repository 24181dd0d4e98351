//! Per-path status bitmask.
//!
//! The bit positions are part of the public contract: tooling built against
//! the status API stores and compares the raw values, so they must never
//! move.

use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign};

use serde::{Deserialize, Serialize};

/// Status of a single path across HEAD, the index, and the worktree.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatusFlags(u32);

impl StatusFlags {
    /// Identical in every source it is present in, and not ignored.
    pub const CURRENT: Self = Self(0);

    pub const INDEX_NEW: Self = Self(1 << 0);
    pub const INDEX_MODIFIED: Self = Self(1 << 1);
    pub const INDEX_DELETED: Self = Self(1 << 2);

    pub const WT_NEW: Self = Self(1 << 3);
    pub const WT_MODIFIED: Self = Self(1 << 4);
    pub const WT_DELETED: Self = Self(1 << 5);

    pub const IGNORED: Self = Self(1 << 6);

    const ALL: u32 = (1 << 7) - 1;

    const NAMES: [(Self, &'static str); 7] = [
        (Self::INDEX_NEW, "INDEX_NEW"),
        (Self::INDEX_MODIFIED, "INDEX_MODIFIED"),
        (Self::INDEX_DELETED, "INDEX_DELETED"),
        (Self::WT_NEW, "WT_NEW"),
        (Self::WT_MODIFIED, "WT_MODIFIED"),
        (Self::WT_DELETED, "WT_DELETED"),
        (Self::IGNORED, "IGNORED"),
    ];

    /// Raw bit value.
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Parse a raw value, rejecting unknown bits.
    pub const fn from_bits(bits: u32) -> Option<Self> {
        if bits & !Self::ALL == 0 {
            Some(Self(bits))
        } else {
            None
        }
    }

    pub const fn is_current(self) -> bool {
        self.0 == 0
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: Self) {
        self.0 &= !other.0;
    }

    /// Any HEAD-vs-index change.
    pub const fn is_index_change(self) -> bool {
        self.intersects(Self(
            Self::INDEX_NEW.0 | Self::INDEX_MODIFIED.0 | Self::INDEX_DELETED.0,
        ))
    }

    /// Any index-vs-worktree change on a tracked path.
    pub const fn is_worktree_change(self) -> bool {
        self.intersects(Self(Self::WT_MODIFIED.0 | Self::WT_DELETED.0))
    }

    /// Names of the set bits, in bit order.
    pub fn names(self) -> Vec<&'static str> {
        Self::NAMES
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect()
    }
}

impl BitOr for StatusFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for StatusFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for StatusFlags {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl fmt::Display for StatusFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_current() {
            return f.write_str("CURRENT");
        }
        f.write_str(&self.names().join(" | "))
    }
}

impl fmt::Debug for StatusFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StatusFlags({self})")
    }
}
