//! Catalog domain module.
//!
//! Items, collections and the rules that group them, implemented as
//! deterministic domain logic. Persistence is reached only through the
//! [`CatalogStore`] port; implementations live in `shopfeed-infra`.

pub mod collection;
pub mod color;
pub mod condition;
pub mod item;
pub mod option;
pub mod store;
pub mod vocabulary;

pub use collection::Collection;
pub use color::ColorInferrer;
pub use condition::{Condition, ConditionSet, ItemFilter, Predicate, Relation, Variable};
pub use item::{Item, TAG_SEPARATOR, join_tags, parse_tags};
pub use option::ProductOption;
pub use store::{CatalogError, CatalogStore, StoreError, StoreResult};
pub use vocabulary::Vocabulary;
