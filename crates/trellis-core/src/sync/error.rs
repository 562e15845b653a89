use std::path::PathBuf;
use thiserror::Error;

use crate::catalog::CatalogError;

/// Errors that can occur during reconciliation.
///
/// Conflicts are not errors; they travel in the sync report. These variants
/// cover adapter failures and malformed records only.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("External source error: {0}")]
    Source(String),

    #[error("API returned error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Failed to parse external data: {0}")]
    Parse(String),

    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

impl From<reqwest::Error> for SyncError {
    fn from(err: reqwest::Error) -> Self {
        SyncError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        SyncError::Parse(err.to_string())
    }
}

impl SyncError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SyncError::Io {
            path: path.into(),
            source,
        }
    }
}
