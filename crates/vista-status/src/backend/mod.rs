//! Repository backends built from Vista's own store and index.

pub mod native;

pub use native::NativeBackend;
