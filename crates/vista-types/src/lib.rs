//! Foundation types for Vista.
//!
//! This crate provides the value types shared by every stage of a status
//! scan: the path key all three sources are joined on, file modes, the
//! content identities used to decide whether two entries differ, and the
//! public status bitmask.
//!
//! # Key Types
//!
//! - [`PathKey`] - Normalized repository-relative path (byte-ordered join key)
//! - [`EntryDescriptor`] - `(path, mode, identity)` tuple produced by a source
//! - [`ContentIdentity`] / [`StatFingerprint`] - Cheap equality tokens for content
//! - [`StatusFlags`] - Stable per-path status bitmask
//! - [`Scope`] - Restriction of a scan to a directory or a single path

pub mod entry;
pub mod error;
pub mod flags;
pub mod mode;
pub mod object;
pub mod path;
pub mod scope;

pub use entry::{ContentIdentity, EntryDescriptor, FileTime, Sameness, StatFingerprint};
pub use error::TypeError;
pub use flags::StatusFlags;
pub use mode::FileMode;
pub use object::ObjectId;
pub use path::PathKey;
pub use scope::Scope;
