//! conftree - hierarchical, dot-addressed configuration store.
//!
//! Holds nested key/value settings, reads and writes individual settings by
//! dot path, merges settings loaded from multiple declarative source files,
//! tracks which settings changed since the last save, and serializes the
//! changed subtree back into the canonical settings format.

pub mod codec;
pub mod error;
pub mod identity;
pub mod merge;
pub mod normalize;
pub mod path;
pub mod source;
pub mod store;

pub use error::ConfigError;
pub use identity::{Anonymous, Identity, NamedIdentity};
pub use merge::{merge, merge_into};
pub use normalize::{PrefixNormalizer, ValueNormalizer};
pub use store::{Config, LoadTarget, ROOT_NAME};
