//! Infrastructure layer: catalog stores, configuration, maintenance jobs.

pub mod config;
pub mod jobs;
pub mod store;

pub use config::{AppConfig, ConfigError, SizeOptionConfig};
pub use jobs::{CollectionDraft, FeedAttribute, ImportSummary, ItemRecord};
pub use store::{InMemoryCatalogStore, SqliteCatalogStore};
