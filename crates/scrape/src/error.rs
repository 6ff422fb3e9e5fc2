use std::io;
use std::path::PathBuf;

use thiserror::Error;

use shopfeed_catalog::StoreError;

/// A single page fetch failed. Never escapes the option cache: the attempt
/// counts as "no options found" and feeds the retry loop.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {message}")]
    Request { url: String, message: String },

    #[error("{url} answered with status {status}")]
    Status { url: String, status: u16 },
}

/// The on-disk page cache could not be read or written.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("page cache I/O on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl CacheError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[derive(Debug, Error)]
pub enum HarvestError {
    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
