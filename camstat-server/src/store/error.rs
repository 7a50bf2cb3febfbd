//! Journey store error types.

use std::io;
use std::path::PathBuf;

/// Errors that can occur when loading or querying a journey store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Data file could not be opened
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// CSV input could not be read
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}
