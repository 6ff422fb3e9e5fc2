//! Named, rule-derived groupings of items.

use tracing::{debug, info, warn};

use shopfeed_core::{CollectionId, DomainError, Handle};

use crate::color::ColorInferrer;
use crate::condition::{Condition, ConditionSet};
use crate::item::Item;
use crate::store::{CatalogError, CatalogStore};
use crate::vocabulary::Vocabulary;

/// A collection of items.
///
/// Membership is an ordered set keyed by item handle. When a collection is
/// built from conditions its membership is computed once; it is not refreshed
/// automatically and must be recomputed (and re-saved) explicitly.
#[derive(Debug, Clone, PartialEq)]
pub struct Collection {
    id: Option<CollectionId>,
    handle: Handle,
    title: String,
    conditions: ConditionSet,
    items: Vec<Item>,
}

impl Collection {
    /// Empty collection with a handle slugged from its title.
    pub fn new(title: impl Into<String>) -> Self {
        let title = title.into();
        Self {
            id: None,
            handle: Handle::from_title(&title),
            title,
            conditions: ConditionSet::default(),
            items: Vec::new(),
        }
    }

    /// Rebuild a persisted collection from its stored parts.
    pub fn restore(
        id: CollectionId,
        handle: Handle,
        title: impl Into<String>,
        conditions: ConditionSet,
        items: Vec<Item>,
    ) -> Self {
        let mut collection = Self {
            id: Some(id),
            handle,
            title: title.into(),
            conditions,
            items: Vec::with_capacity(items.len()),
        };
        for item in items {
            collection.insert(item);
        }
        collection
    }

    /// Build a collection from conditions and compute its membership once.
    pub fn from_conditions<S>(
        title: impl Into<String>,
        conditions: Vec<Condition>,
        store: &S,
    ) -> Result<Self, CatalogError>
    where
        S: CatalogStore + ?Sized,
    {
        let mut collection = Self::new(title);
        collection.conditions = ConditionSet::new(conditions);
        collection.recompute(store)?;
        Ok(collection)
    }

    pub fn id(&self) -> Option<CollectionId> {
        self.id
    }

    pub fn assign_id(&mut self, id: CollectionId) {
        self.id = Some(id);
    }

    pub fn handle(&self) -> &Handle {
        &self.handle
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn conditions(&self) -> &ConditionSet {
        &self.conditions
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn items_mut(&mut self) -> &mut [Item] {
        &mut self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, handle: &Handle) -> bool {
        self.items.iter().any(|i| i.handle() == handle)
    }

    /// Append an item unless one with the same handle is already a member.
    pub fn insert(&mut self, item: Item) -> bool {
        if self.contains(item.handle()) {
            return false;
        }
        self.items.push(item);
        true
    }

    /// Re-run the conditions against the store and replace the membership.
    pub fn recompute<S>(&mut self, store: &S) -> Result<(), CatalogError>
    where
        S: CatalogStore + ?Sized,
    {
        let filter = self.conditions.compile()?;
        let handles = store.select_item_handles(&filter)?;

        self.items.clear();
        for handle in handles {
            let item = store
                .get_item(&handle)?
                .ok_or_else(|| DomainError::not_found(format!("item '{handle}'")))?;
            debug!(collection = %self.handle, item = %handle, "collection member");
            self.insert(item);
        }
        info!(collection = %self.handle, members = self.items.len(), "collection membership computed");
        Ok(())
    }

    /// Storefront URL of every member:
    /// `https://{domain}/collections/{collection}/products/{item}`.
    pub fn generate_urls(&mut self, domain: &str) {
        for item in &mut self.items {
            item.url = format!("https://{}/collections/{}/products/{}", domain, self.handle, item.handle());
        }
    }

    /// Propagate an age group to every member. A value outside the
    /// vocabulary is logged and nothing changes.
    pub fn set_age_group(&mut self, value: &str, vocabulary: &Vocabulary) -> bool {
        if !vocabulary.is_age_group(value) {
            warn!(collection = %self.handle, value, "malformed age group not propagated");
            return false;
        }
        info!(collection = %self.handle, value, "setting age group");
        for item in &mut self.items {
            item.set_age_group(value, vocabulary);
        }
        true
    }

    /// Propagate a gender to every member.
    pub fn set_gender(&mut self, value: &str, vocabulary: &Vocabulary) -> bool {
        if !vocabulary.is_gender(value) {
            warn!(collection = %self.handle, value, "malformed gender not propagated");
            return false;
        }
        info!(collection = %self.handle, value, "setting gender");
        for item in &mut self.items {
            item.set_gender(value, vocabulary);
        }
        true
    }

    /// Propagate a product category to every member.
    pub fn set_product_category(&mut self, value: &str, vocabulary: &Vocabulary) -> bool {
        if !vocabulary.is_product_category(value) {
            warn!(collection = %self.handle, value, "malformed product category not propagated");
            return false;
        }
        info!(collection = %self.handle, value, "setting product category");
        for item in &mut self.items {
            item.set_product_category(value, vocabulary);
        }
        true
    }

    /// Infer colors for every member from its title.
    pub fn infer_colors(&mut self, inferrer: &ColorInferrer) {
        for item in &mut self.items {
            inferrer.apply(item);
        }
    }
}

impl core::fmt::Display for Collection {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.handle, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_keeps_membership_unique_and_ordered() {
        let mut c = Collection::new("Wedding Suits");
        assert!(c.insert(Item::new("Navy Suit")));
        assert!(c.insert(Item::new("Black Suit")));
        assert!(!c.insert(Item::new("Navy Suit")));
        let handles: Vec<_> = c.items().iter().map(|i| i.handle().as_str()).collect();
        assert_eq!(handles, ["navy-suit", "black-suit"]);
    }

    #[test]
    fn generate_urls_uses_collection_and_item_handles() {
        let mut c = Collection::new("Wedding Suits");
        c.insert(Item::new("Navy Suit"));
        c.generate_urls("shop.example.com");
        assert_eq!(
            c.items()[0].url,
            "https://shop.example.com/collections/wedding-suits/products/navy-suit"
        );
    }

    #[test]
    fn malformed_propagation_changes_nothing() {
        let vocab = Vocabulary::default();
        let mut c = Collection::new("Kids");
        c.insert(Item::new("Boys Vest"));
        assert!(!c.set_age_group("teen-ish", &vocab));
        assert_eq!(c.items()[0].age_group, "");
        assert!(c.set_age_group("kids", &vocab));
        assert!(c.set_gender("Male", &vocab));
        assert_eq!(c.items()[0].age_group, "kids");
        assert_eq!(c.items()[0].gender, "male");
    }
}
