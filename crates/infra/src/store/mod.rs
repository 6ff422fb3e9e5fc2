//! Catalog store implementations.

pub mod in_memory;
pub mod sqlite;

pub use in_memory::InMemoryCatalogStore;
pub use sqlite::SqliteCatalogStore;
