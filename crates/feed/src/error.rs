use thiserror::Error;

use shopfeed_catalog::StoreError;
use shopfeed_core::DomainError;

/// Failures that abort a feed compilation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FeedError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
