//! Error types for the Markov generator.

use std::path::PathBuf;

/// Errors from building a model.
#[derive(Debug, thiserror::Error)]
pub enum MarkovError {
    /// The corpus file could not be read.
    #[error("failed to read corpus {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
