//! Catalog item (a product as sold on the storefront).

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use shopfeed_core::{Handle, ItemId, Price};

use crate::vocabulary::Vocabulary;

/// Separator of the stored tag string.
pub const TAG_SEPARATOR: &str = ", ";

/// Split a stored tag string (`"a, b, c"`) into tags.
pub fn parse_tags(raw: &str) -> Vec<String> {
    raw.split(TAG_SEPARATOR)
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Join tags into the stored `", "`-separated form.
pub fn join_tags(tags: &[String]) -> String {
    tags.join(TAG_SEPARATOR)
}

/// A catalog entry with commerce and shopping-feed attributes.
///
/// `handle` is the identity and is immutable; the only way to obtain an item
/// with another handle is [`Item::derive`], used for size variants. `id` is
/// assigned by the store on first save.
///
/// `size`, `item_group_id` and `mpn` are transient: they are filled during
/// variant expansion and never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    id: Option<ItemId>,
    handle: Handle,
    pub title: String,
    pub price: Price,
    pub description: String,
    pub vendor: String,
    pub sku: String,
    pub tags: Vec<String>,
    pub url: String,
    pub image_url: String,
    pub age_group: String,
    pub color: String,
    pub product_category: String,
    pub gender: String,
    #[serde(skip)]
    pub size: String,
    #[serde(skip)]
    pub item_group_id: String,
    #[serde(skip)]
    pub mpn: String,
}

impl Item {
    /// New, unsaved item whose handle is slugged from the title.
    pub fn new(title: impl Into<String>) -> Self {
        let title = title.into();
        let handle = Handle::from_title(&title);
        Self::with_handle(handle, title)
    }

    /// New, unsaved item with an explicit handle (e.g. supplied by the import
    /// collaborator or read back from the store).
    pub fn with_handle(handle: Handle, title: impl Into<String>) -> Self {
        Self {
            id: None,
            handle,
            title: title.into(),
            price: Price::ZERO,
            description: String::new(),
            vendor: String::new(),
            sku: String::new(),
            tags: Vec::new(),
            url: String::new(),
            image_url: String::new(),
            age_group: String::new(),
            color: String::new(),
            product_category: String::new(),
            gender: String::new(),
            size: String::new(),
            item_group_id: String::new(),
            mpn: String::new(),
        }
    }

    pub fn id(&self) -> Option<ItemId> {
        self.id
    }

    /// Record the surrogate key handed out by the store.
    pub fn assign_id(&mut self, id: ItemId) {
        self.id = Some(id);
    }

    pub fn handle(&self) -> &Handle {
        &self.handle
    }

    /// Clone into a derived item whose handle is `{handle}-{slug(suffix)}`.
    /// The clone has no store id.
    pub fn derive(&self, suffix: &str) -> Item {
        let mut derived = self.clone();
        derived.handle = self.handle.derive(suffix);
        derived.id = None;
        derived
    }

    pub fn with_price(mut self, price: Price) -> Self {
        self.price = price;
        self
    }

    pub fn with_sku(mut self, sku: impl Into<String>) -> Self {
        self.sku = sku.into();
        self
    }

    pub fn with_vendor(mut self, vendor: impl Into<String>) -> Self {
        self.vendor = vendor.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn with_image_url(mut self, image_url: impl Into<String>) -> Self {
        self.image_url = image_url.into();
        self
    }

    pub fn tags_string(&self) -> String {
        join_tags(&self.tags)
    }

    /// Case-insensitive tag lookup.
    pub fn has_tag(&self, tag: &str) -> bool {
        let tag = tag.to_lowercase();
        self.tags.iter().any(|t| t.to_lowercase() == tag)
    }

    /// Set the age group if it belongs to the vocabulary. A malformed value is
    /// logged and ignored.
    pub fn set_age_group(&mut self, value: &str, vocabulary: &Vocabulary) -> bool {
        let Some(canonical) = vocabulary.age_group(value) else {
            warn!(handle = %self.handle, value, "malformed age group ignored");
            return false;
        };
        debug!(handle = %self.handle, value = canonical, "setting age group");
        self.age_group = canonical.to_string();
        true
    }

    /// Set the gender if it belongs to the vocabulary. A malformed value is
    /// logged and ignored.
    pub fn set_gender(&mut self, value: &str, vocabulary: &Vocabulary) -> bool {
        let Some(canonical) = vocabulary.gender(value) else {
            warn!(handle = %self.handle, value, "malformed gender ignored");
            return false;
        };
        debug!(handle = %self.handle, value = canonical, "setting gender");
        self.gender = canonical.to_string();
        true
    }

    /// Set the product category if it belongs to the taxonomy. A malformed
    /// value is logged and ignored.
    pub fn set_product_category(&mut self, value: &str, vocabulary: &Vocabulary) -> bool {
        let Some(canonical) = vocabulary.product_category(value) else {
            warn!(handle = %self.handle, value, "malformed product category ignored");
            return false;
        };
        debug!(handle = %self.handle, value = canonical, "setting product category");
        self.product_category = canonical.to_string();
        true
    }
}

impl core::fmt::Display for Item {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.handle, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handle_is_slugged_from_title() {
        let item = Item::new("Men's Black Tuxedo");
        assert_eq!(item.handle().as_str(), "mens-black-tuxedo");
        assert_eq!(item.id(), None);
    }

    #[test]
    fn tags_round_trip_through_string_form() {
        let item = Item::new("Hat").with_tags(["Red", "Hat", "Summer Sale"]);
        assert_eq!(item.tags_string(), "Red, Hat, Summer Sale");
        assert_eq!(parse_tags(&item.tags_string()), item.tags);
        assert!(parse_tags("").is_empty());
    }

    #[test]
    fn has_tag_ignores_case() {
        let item = Item::new("Hat").with_tags(["Red", "Hat"]);
        assert!(item.has_tag("red"));
        assert!(!item.has_tag("re"));
    }

    #[test]
    fn derive_changes_handle_and_drops_id() {
        let mut item = Item::new("Classic Vest").with_sku("CV-1");
        item.assign_id(ItemId::from_raw(7));
        let derived = item.derive("Size 40");
        assert_eq!(derived.handle().as_str(), "classic-vest-size-40");
        assert_eq!(derived.id(), None);
        assert_eq!(derived.sku, "CV-1");
        assert_eq!(item.handle().as_str(), "classic-vest");
    }

    #[test]
    fn setters_enforce_vocabulary() {
        let vocab = Vocabulary::default();
        let mut item = Item::new("Vest");

        assert!(item.set_age_group("adult", &vocab));
        assert!(!item.set_age_group("ancient", &vocab));
        assert_eq!(item.age_group, "adult");

        assert!(item.set_gender("Male", &vocab));
        assert_eq!(item.gender, "male");
        assert!(item.set_age_group("KIDS", &vocab));
        assert_eq!(item.age_group, "kids");

        assert!(!item.set_product_category("Toys", &vocab));
        assert_eq!(item.product_category, "");
    }
}
