//! Shared primitives used across the engine

pub mod cancel;
pub mod fingerprint;
pub mod paths;

pub use cancel::CancelToken;
pub use fingerprint::{FileHasher, Fingerprint};
pub use paths::{slug, ArchivePaths, ThumbSize};
