use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use shopfeed_catalog::{
    CatalogStore, Collection, ConditionSet, Item, ItemFilter, ProductOption, StoreError, StoreResult,
};
use shopfeed_core::{CollectionId, Handle, ItemId, OptionId};

#[derive(Debug)]
struct StoredCollection {
    id: CollectionId,
    handle: Handle,
    title: String,
    conditions: ConditionSet,
    members: Vec<Handle>,
}

#[derive(Debug, Default)]
struct Tables {
    items: Vec<(ItemId, Item)>,
    collections: Vec<StoredCollection>,
    options: Vec<ProductOption>,
    links: Vec<(Handle, OptionId)>,
    next_item: i64,
    next_collection: i64,
    next_option: i64,
}

impl Tables {
    fn item(&self, handle: &Handle) -> Option<&Item> {
        self.items.iter().map(|(_, i)| i).find(|i| i.handle() == handle)
    }

    fn upsert_item(&mut self, item: &mut Item) -> ItemId {
        if let Some((id, existing)) = self.items.iter_mut().find(|(_, i)| i.handle() == item.handle()) {
            item.assign_id(*id);
            *existing = item.clone();
            return *id;
        }
        self.next_item += 1;
        let id = ItemId::from_raw(self.next_item);
        item.assign_id(id);
        self.items.push((id, item.clone()));
        id
    }

    fn insert_option(&mut self, option: &ProductOption) -> OptionId {
        if let Some(existing) = self.options.iter().find(|o| o.is_identical(option)) {
            if let Some(id) = existing.id() {
                return id;
            }
        }
        self.next_option += 1;
        let id = OptionId::from_raw(self.next_option);
        self.options.push(option.clone().with_id(id));
        id
    }
}

/// In-memory catalog store.
///
/// Intended for tests/dev. Every call holds one lock for its whole duration,
/// so multi-row writes are all-or-nothing.
#[derive(Debug, Default)]
pub struct InMemoryCatalogStore {
    tables: RwLock<Tables>,
}

impl InMemoryCatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self, operation: &'static str) -> StoreResult<RwLockReadGuard<'_, Tables>> {
        self.tables.read().map_err(|_| StoreError::Poisoned { operation })
    }

    fn write(&self, operation: &'static str) -> StoreResult<RwLockWriteGuard<'_, Tables>> {
        self.tables.write().map_err(|_| StoreError::Poisoned { operation })
    }
}

impl CatalogStore for InMemoryCatalogStore {
    fn get_item(&self, handle: &Handle) -> StoreResult<Option<Item>> {
        Ok(self.read("get_item")?.item(handle).cloned())
    }

    fn list_item_handles(&self) -> StoreResult<Vec<Handle>> {
        let tables = self.read("list_item_handles")?;
        Ok(tables.items.iter().map(|(_, i)| i.handle().clone()).collect())
    }

    fn save_item(&self, item: &mut Item) -> StoreResult<ItemId> {
        Ok(self.write("save_item")?.upsert_item(item))
    }

    fn save_items(&self, items: &mut [Item]) -> StoreResult<Vec<ItemId>> {
        let mut tables = self.write("save_items")?;
        Ok(items.iter_mut().map(|item| tables.upsert_item(item)).collect())
    }

    fn select_item_handles(&self, filter: &ItemFilter) -> StoreResult<Vec<Handle>> {
        let tables = self.read("select_item_handles")?;
        Ok(tables
            .items
            .iter()
            .map(|(_, item)| item)
            .filter(|item| filter.matches(item))
            .map(|item| item.handle().clone())
            .collect())
    }

    fn list_collection_handles(&self) -> StoreResult<Vec<Handle>> {
        let tables = self.read("list_collection_handles")?;
        Ok(tables.collections.iter().map(|c| c.handle.clone()).collect())
    }

    fn get_collection(&self, handle: &Handle) -> StoreResult<Collection> {
        let tables = self.read("get_collection")?;
        let stored = tables
            .collections
            .iter()
            .find(|c| c.handle == *handle)
            .ok_or_else(|| StoreError::not_found("get_collection", format!("collection '{handle}'")))?;

        let items = stored
            .members
            .iter()
            .filter_map(|member| tables.item(member).cloned())
            .collect();
        Ok(Collection::restore(
            stored.id,
            stored.handle.clone(),
            stored.title.clone(),
            stored.conditions.clone(),
            items,
        ))
    }

    fn save_collection(&self, collection: &mut Collection) -> StoreResult<CollectionId> {
        let mut tables = self.write("save_collection")?;
        let members: Vec<Handle> = collection
            .items_mut()
            .iter_mut()
            .map(|item| {
                tables.upsert_item(item);
                item.handle().clone()
            })
            .collect();

        let id = match tables.collections.iter_mut().find(|c| c.handle == *collection.handle()) {
            Some(stored) => {
                stored.title = collection.title().to_string();
                stored.conditions = collection.conditions().clone();
                stored.members = members;
                stored.id
            }
            None => {
                tables.next_collection += 1;
                let id = CollectionId::from_raw(tables.next_collection);
                tables.collections.push(StoredCollection {
                    id,
                    handle: collection.handle().clone(),
                    title: collection.title().to_string(),
                    conditions: collection.conditions().clone(),
                    members,
                });
                id
            }
        };
        collection.assign_id(id);
        Ok(id)
    }

    fn save_option(&self, option: &ProductOption) -> StoreResult<OptionId> {
        Ok(self.write("save_option")?.insert_option(option))
    }

    fn associate_option(&self, item: &Handle, option: &ProductOption) -> StoreResult<()> {
        let mut tables = self.write("associate_option")?;
        if tables.item(item).is_none() {
            return Err(StoreError::not_found("associate_option", format!("item '{item}'")));
        }
        let option_id = tables.insert_option(option);
        if tables.links.iter().any(|(h, o)| h == item && *o == option_id) {
            tracing::debug!(%item, option = %option.handle(), "option already associated");
            return Ok(());
        }
        tables.links.push((item.clone(), option_id));
        Ok(())
    }

    fn item_options(&self, item: &Handle) -> StoreResult<Vec<ProductOption>> {
        let tables = self.read("item_options")?;
        Ok(tables
            .links
            .iter()
            .filter(|(h, _)| h == item)
            .filter_map(|(_, id)| tables.options.iter().find(|o| o.id() == Some(*id)).cloned())
            .collect())
    }

    fn wipe(&self) -> StoreResult<()> {
        *self.write("wipe")? = Tables::default();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use shopfeed_catalog::{Condition, Relation, Variable};

    use super::*;

    fn tagged(title: &str, tags: &[&str]) -> Item {
        Item::new(title).with_tags(tags.iter().copied())
    }

    #[test]
    fn save_item_updates_by_handle() {
        let store = InMemoryCatalogStore::new();
        let mut item = tagged("Navy Suit", &["suit"]);
        let id = store.save_item(&mut item).unwrap();

        let mut edited = Item::with_handle(Handle::new("navy-suit"), "Navy Suit II");
        assert_eq!(store.save_item(&mut edited).unwrap(), id);
        assert_eq!(edited.id(), Some(id));
        assert_eq!(store.get_item(item.handle()).unwrap().unwrap().title, "Navy Suit II");
        assert_eq!(store.list_item_handles().unwrap().len(), 1);
    }

    #[test]
    fn collections_round_trip_with_members() {
        let store = InMemoryCatalogStore::new();
        let mut items = vec![tagged("Navy Suit", &["suit"]), tagged("Red Tie", &["tie"])];
        store.save_items(&mut items).unwrap();

        let conditions = vec![Condition::new(Variable::Tag, Relation::Equals, "suit")];
        let mut suits = Collection::from_conditions("Suits", conditions, &store).unwrap();
        store.save_collection(&mut suits).unwrap();

        let loaded = store.get_collection(&Handle::new("suits")).unwrap();
        assert_eq!(loaded.id(), suits.id());
        assert_eq!(loaded.conditions(), suits.conditions());
        let members: Vec<&str> = loaded.items().iter().map(|i| i.handle().as_str()).collect();
        assert_eq!(members, ["navy-suit"]);
    }

    #[test]
    fn identical_options_are_stored_once_and_linked_once() {
        let store = InMemoryCatalogStore::new();
        store.save_item(&mut Item::new("Navy Suit")).unwrap();
        let size = ProductOption::new("Jacket Size", vec!["38R".into(), "40L".into()]);
        let reordered = ProductOption::new("Jacket Size", vec!["40L".into(), "38R".into()]);

        let id = store.save_option(&size).unwrap();
        assert_eq!(store.save_option(&reordered).unwrap(), id);

        let handle = Handle::new("navy-suit");
        store.associate_option(&handle, &size).unwrap();
        store.associate_option(&handle, &size).unwrap();
        let options = store.item_options(&handle).unwrap();
        assert_eq!(options.len(), 1);
        assert_eq!(options[0].id(), Some(id));

        assert!(store.associate_option(&Handle::new("missing"), &size).is_err());
    }

    #[test]
    fn wipe_clears_everything() {
        let store = InMemoryCatalogStore::new();
        store.save_item(&mut Item::new("Navy Suit")).unwrap();
        store.wipe().unwrap();
        assert!(store.list_item_handles().unwrap().is_empty());
        assert!(matches!(
            store.get_collection(&Handle::new("suits")),
            Err(StoreError::NotFound { .. })
        ));
    }
}
