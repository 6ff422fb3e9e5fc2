//! Persistence port for the catalog.
//!
//! All operations are synchronous. Implementations must bind every value as a
//! query parameter; no caller-supplied text is ever spliced into a statement.

use thiserror::Error;

use shopfeed_core::{CollectionId, DomainError, Handle, ItemId, OptionId};

use crate::collection::Collection;
use crate::condition::ItemFilter;
use crate::item::Item;
use crate::option::ProductOption;

pub type StoreResult<T> = Result<T, StoreError>;

/// Store operation failure, carrying the operation and statement context.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("{operation}: {what} not found")]
    NotFound { operation: &'static str, what: String },

    #[error("{operation} failed: {message} (statement: {statement})")]
    Statement {
        operation: &'static str,
        statement: String,
        message: String,
    },

    #[error("{operation}: connection failed: {message}")]
    Connection { operation: &'static str, message: String },

    #[error("{operation}: store lock poisoned")]
    Poisoned { operation: &'static str },
}

impl StoreError {
    pub fn not_found(operation: &'static str, what: impl Into<String>) -> Self {
        Self::NotFound {
            operation,
            what: what.into(),
        }
    }

    pub fn statement(operation: &'static str, statement: impl Into<String>, message: impl ToString) -> Self {
        Self::Statement {
            operation,
            statement: statement.into(),
            message: message.to_string(),
        }
    }

    pub fn connection(operation: &'static str, message: impl ToString) -> Self {
        Self::Connection {
            operation,
            message: message.to_string(),
        }
    }
}

/// Failures of catalog operations that touch both rules and storage.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Catalog persistence.
///
/// Each call is one unit of work. Multi-row writes (`save_items`,
/// `save_collection`) are all-or-nothing: a failure part-way rolls back the
/// whole call.
pub trait CatalogStore {
    fn get_item(&self, handle: &Handle) -> StoreResult<Option<Item>>;

    fn list_item_handles(&self) -> StoreResult<Vec<Handle>>;

    /// Update the item if its handle exists, else insert it. Assigns the id
    /// on the item.
    fn save_item(&self, item: &mut Item) -> StoreResult<ItemId>;

    /// Save a batch of items in one unit of work.
    fn save_items(&self, items: &mut [Item]) -> StoreResult<Vec<ItemId>>;

    /// Handles of the items matching every predicate of the filter.
    fn select_item_handles(&self, filter: &ItemFilter) -> StoreResult<Vec<Handle>>;

    fn list_collection_handles(&self) -> StoreResult<Vec<Handle>>;

    fn get_collection(&self, handle: &Handle) -> StoreResult<Collection>;

    /// Insert the collection if missing, replace its conditions and its
    /// membership. Member items are saved too and get their ids assigned.
    fn save_collection(&self, collection: &mut Collection) -> StoreResult<CollectionId>;

    /// Insert the option unless an identical one exists; returns the id of
    /// the stored option either way.
    fn save_option(&self, option: &ProductOption) -> StoreResult<OptionId>;

    /// Link an option to an item. Saves the option first when needed; an
    /// existing link is left alone.
    fn associate_option(&self, item: &Handle, option: &ProductOption) -> StoreResult<()>;

    /// Options linked to an item, in link order.
    fn item_options(&self, item: &Handle) -> StoreResult<Vec<ProductOption>>;

    /// Remove every item, collection, option and link.
    fn wipe(&self) -> StoreResult<()>;
}

impl<S> CatalogStore for &S
where
    S: CatalogStore + ?Sized,
{
    fn get_item(&self, handle: &Handle) -> StoreResult<Option<Item>> {
        (**self).get_item(handle)
    }

    fn list_item_handles(&self) -> StoreResult<Vec<Handle>> {
        (**self).list_item_handles()
    }

    fn save_item(&self, item: &mut Item) -> StoreResult<ItemId> {
        (**self).save_item(item)
    }

    fn save_items(&self, items: &mut [Item]) -> StoreResult<Vec<ItemId>> {
        (**self).save_items(items)
    }

    fn select_item_handles(&self, filter: &ItemFilter) -> StoreResult<Vec<Handle>> {
        (**self).select_item_handles(filter)
    }

    fn list_collection_handles(&self) -> StoreResult<Vec<Handle>> {
        (**self).list_collection_handles()
    }

    fn get_collection(&self, handle: &Handle) -> StoreResult<Collection> {
        (**self).get_collection(handle)
    }

    fn save_collection(&self, collection: &mut Collection) -> StoreResult<CollectionId> {
        (**self).save_collection(collection)
    }

    fn save_option(&self, option: &ProductOption) -> StoreResult<OptionId> {
        (**self).save_option(option)
    }

    fn associate_option(&self, item: &Handle, option: &ProductOption) -> StoreResult<()> {
        (**self).associate_option(item, option)
    }

    fn item_options(&self, item: &Handle) -> StoreResult<Vec<ProductOption>> {
        (**self).item_options(item)
    }

    fn wipe(&self) -> StoreResult<()> {
        (**self).wipe()
    }
}
