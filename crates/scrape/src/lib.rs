//! Per-item option recovery from remote item pages.
//!
//! Pages are fetched through a [`PageFetcher`], cached on disk by item handle
//! in a [`PageCache`], parsed into options, and retried a bounded number of
//! times by the [`OptionCache`] before the item is marked as having none.

pub mod cache;
pub mod error;
pub mod fetch;
pub mod harvest;
pub mod option_cache;
pub mod parse;

pub use cache::{CacheEntry, NO_OPTIONS_MARKER, PageCache};
pub use error::{CacheError, FetchError, HarvestError};
pub use fetch::{HttpFetcher, HttpFetcherConfig, PageFetcher};
pub use harvest::{HarvestSummary, OptionHarvester};
pub use option_cache::{OptionCache, OptionLookup, OptionState};
pub use parse::parse_options;
