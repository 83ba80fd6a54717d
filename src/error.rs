//! Error types for the settings store.
//!
//! Soft conditions (missing paths, missing source files) never surface here;
//! they are resolved locally with default values or boolean results. Only the
//! fatal save-time conditions produce a `ConfigError`.

use thiserror::Error;

/// Fatal errors raised while saving a settings tree.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No destination path was given and none was remembered from a
    /// save-target load.
    #[error("no destination file for save; pass an explicit path or load a file for save first")]
    MissingDestination,

    /// Rendering the pending tree produced no assignment statements.
    #[error("rendering produced no settings to save")]
    EmptySave,

    /// Writing the rendered file failed.
    #[error("failed to write {path}: {source}")]
    WriteFailed {
        /// Destination path that could not be written.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}
