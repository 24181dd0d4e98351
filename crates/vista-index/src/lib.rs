//! Staging index for Vista.
//!
//! Holds the staged snapshot: one entry per tracked file with the blob id
//! and the stat data recorded when it was staged. [`IndexLister`] exposes
//! the entries as the sorted index source of a status scan.
//!
//! # Key Types
//!
//! - [`Index`] -- The in-memory staging area (BTreeMap-backed)
//! - [`IndexEntry`] -- A tracked file with its stat fingerprint
//! - [`IndexLister`] -- Scoped, racy-aware entry stream

pub mod entry;
pub mod error;
pub mod index;
pub mod lister;

pub use entry::IndexEntry;
pub use error::{IndexError, IndexResult};
pub use index::Index;
pub use lister::IndexLister;
