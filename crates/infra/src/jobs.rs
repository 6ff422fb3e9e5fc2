//! Catalog maintenance jobs run by the binary between import and export.

use serde::Deserialize;
use tracing::{debug, info, warn};

use shopfeed_catalog::{CatalogError, CatalogStore, Collection, ColorInferrer, Condition, Item, StoreResult, Vocabulary};
use shopfeed_core::{Handle, ItemId, Price};

/// Collection titles containing any of these are never imported.
pub const TITLE_BLACKLIST: &[&str] = &[
    "hidden",
    "Hidden",
    "HIDDEN",
    "internal",
    "Internal",
    "INTERNAL",
    "Newest Products",
    "Best Selling Products",
    "Featured Products",
    "Home page",
    "Unavailable",
];

/// A collection as listed by the storefront admin: a title and its rules in
/// storefront phrasing (`"Product tag is equal to Suit"`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CollectionDraft {
    pub title: String,
    pub rules: Vec<String>,
}

impl CollectionDraft {
    pub fn new<I, S>(title: impl Into<String>, rules: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            title: title.into(),
            rules: rules.into_iter().map(Into::into).collect(),
        }
    }

    fn is_blacklisted(&self) -> bool {
        TITLE_BLACKLIST.iter().any(|word| self.title.contains(word))
    }

    /// Apostrophes are dropped from rules before parsing.
    fn conditions(&self) -> Result<Vec<Condition>, CatalogError> {
        self.rules
            .iter()
            .map(|rule| Condition::from_rule_text(&rule.replace('\'', "")).map_err(CatalogError::from))
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub imported: Vec<Handle>,
    pub blacklisted: Vec<String>,
    pub duplicates: Vec<String>,
}

/// Build collections from drafts, compute their membership once, generate
/// member URLs for `domain` and save each collection with its members.
///
/// A rule that cannot be parsed aborts the import.
pub fn import_collections<S>(store: &S, drafts: &[CollectionDraft], domain: &str) -> Result<ImportSummary, CatalogError>
where
    S: CatalogStore + ?Sized,
{
    let mut summary = ImportSummary::default();
    let mut seen_titles: Vec<&str> = Vec::new();

    for draft in drafts {
        if draft.is_blacklisted() {
            info!(title = %draft.title, "skipped collection: blacklisted title");
            summary.blacklisted.push(draft.title.clone());
            continue;
        }
        if seen_titles.contains(&draft.title.as_str()) {
            warn!(title = %draft.title, "skipped collection: duplicate title");
            summary.duplicates.push(draft.title.clone());
            continue;
        }
        seen_titles.push(&draft.title);

        let mut collection = Collection::from_conditions(&draft.title, draft.conditions()?, store)?;
        if domain.is_empty() {
            warn!(collection = %collection.handle(), "no storefront domain configured, item urls left unchanged");
        } else {
            collection.generate_urls(domain);
        }
        store.save_collection(&mut collection)?;
        summary.imported.push(collection.handle().clone());
    }

    info!(
        imported = summary.imported.len(),
        blacklisted = summary.blacklisted.len(),
        duplicates = summary.duplicates.len(),
        "collections imported"
    );
    Ok(summary)
}

/// Option name under which the storefront export carries shopping colors.
pub const SHOPPING_COLORS_OPTION: &str = "GOOGLE_SHOPPING_COLORS";

/// An item row as handed over by the storefront export. Missing fields are
/// empty; a missing handle is slugged from the title.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ItemRecord {
    pub handle: Option<Handle>,
    pub title: String,
    pub price: Price,
    pub description: String,
    pub vendor: String,
    pub sku: String,
    pub tags: String,
    pub url: String,
    pub image_url: String,
    pub age_group: String,
    pub color: String,
    pub product_category: String,
    pub gender: String,
    /// Colors travel in the first option when it is named
    /// [`SHOPPING_COLORS_OPTION`].
    pub option1_name: String,
    pub option1_value: String,
    /// Unpublished rows are not imported.
    pub published: bool,
}

impl Default for ItemRecord {
    fn default() -> Self {
        Self {
            handle: None,
            title: String::new(),
            price: Price::ZERO,
            description: String::new(),
            vendor: String::new(),
            sku: String::new(),
            tags: String::new(),
            url: String::new(),
            image_url: String::new(),
            age_group: String::new(),
            color: String::new(),
            product_category: String::new(),
            gender: String::new(),
            option1_name: String::new(),
            option1_value: String::new(),
            published: true,
        }
    }
}

impl ItemRecord {
    pub fn into_item(self) -> Item {
        let handle = self.handle.unwrap_or_else(|| Handle::from_title(&self.title));
        let mut item = Item::with_handle(handle, self.title)
            .with_price(self.price)
            .with_description(self.description)
            .with_vendor(self.vendor)
            .with_sku(self.sku)
            .with_tags(shopfeed_catalog::parse_tags(&self.tags))
            .with_url(self.url)
            .with_image_url(self.image_url);
        item.age_group = self.age_group;
        item.product_category = self.product_category;
        item.gender = self.gender;
        item.color = if self.color.is_empty() && self.option1_name == SHOPPING_COLORS_OPTION {
            self.option1_value
        } else {
            self.color
        };
        item
    }
}

/// Keep what the catalog already knows where the import row is silent.
fn keep_stored(item: &mut Item, stored: Item) {
    let fields = [
        (&mut item.url, stored.url),
        (&mut item.age_group, stored.age_group),
        (&mut item.color, stored.color),
        (&mut item.product_category, stored.product_category),
        (&mut item.gender, stored.gender),
    ];
    for (slot, known) in fields {
        if slot.is_empty() {
            *slot = known;
        }
    }
}

/// Upsert imported items in one batch. Unpublished rows and rows with an
/// empty title are skipped. URL and shopping attributes left empty by a row
/// keep their stored values.
pub fn import_items<S>(store: &S, records: Vec<ItemRecord>) -> StoreResult<Vec<ItemId>>
where
    S: CatalogStore + ?Sized,
{
    let mut items = Vec::with_capacity(records.len());
    for record in records {
        if !record.published {
            debug!(handle = ?record.handle, "skipped unpublished item");
            continue;
        }
        if record.title.trim().is_empty() {
            warn!(handle = ?record.handle, "skipped item without title");
            continue;
        }
        let mut item = record.into_item();
        if let Some(stored) = store.get_item(item.handle())? {
            keep_stored(&mut item, stored);
        }
        items.push(item);
    }
    let ids = store.save_items(&mut items)?;
    info!(items = ids.len(), "items imported");
    Ok(ids)
}

/// Shopping-feed attribute validated against a controlled vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedAttribute {
    AgeGroup,
    Gender,
    ProductCategory,
}

impl FeedAttribute {
    fn is_valid(self, value: &str, vocabulary: &Vocabulary) -> bool {
        match self {
            FeedAttribute::AgeGroup => vocabulary.is_age_group(value),
            FeedAttribute::Gender => vocabulary.is_gender(value),
            FeedAttribute::ProductCategory => vocabulary.is_product_category(value),
        }
    }

    fn set_on_item(self, item: &mut Item, value: &str, vocabulary: &Vocabulary) -> bool {
        match self {
            FeedAttribute::AgeGroup => item.set_age_group(value, vocabulary),
            FeedAttribute::Gender => item.set_gender(value, vocabulary),
            FeedAttribute::ProductCategory => item.set_product_category(value, vocabulary),
        }
    }

    fn set_on_collection(self, collection: &mut Collection, value: &str, vocabulary: &Vocabulary) -> bool {
        match self {
            FeedAttribute::AgeGroup => collection.set_age_group(value, vocabulary),
            FeedAttribute::Gender => collection.set_gender(value, vocabulary),
            FeedAttribute::ProductCategory => collection.set_product_category(value, vocabulary),
        }
    }
}

/// Set an attribute on every member of a collection and save the members.
/// Returns how many items were saved; a malformed value saves nothing.
pub fn propagate_to_collection<S>(
    store: &S,
    collection: &Handle,
    attribute: FeedAttribute,
    value: &str,
    vocabulary: &Vocabulary,
) -> StoreResult<usize>
where
    S: CatalogStore + ?Sized,
{
    let mut collection = store.get_collection(collection)?;
    if !attribute.set_on_collection(&mut collection, value, vocabulary) {
        return Ok(0);
    }
    Ok(store.save_items(collection.items_mut())?.len())
}

/// Set an attribute on every stored item.
pub fn set_catalog_default<S>(
    store: &S,
    attribute: FeedAttribute,
    value: &str,
    vocabulary: &Vocabulary,
) -> StoreResult<usize>
where
    S: CatalogStore + ?Sized,
{
    if !attribute.is_valid(value, vocabulary) {
        warn!(?attribute, value, "malformed default not applied");
        return Ok(0);
    }
    let mut items = all_items(store)?;
    for item in &mut items {
        attribute.set_on_item(item, value, vocabulary);
    }
    let saved = store.save_items(&mut items)?.len();
    info!(?attribute, value, items = saved, "catalog default applied");
    Ok(saved)
}

/// Infer colors from titles for every member of every collection.
pub fn infer_colors<S>(store: &S, inferrer: &ColorInferrer) -> StoreResult<usize>
where
    S: CatalogStore + ?Sized,
{
    let mut saved = 0;
    for handle in store.list_collection_handles()? {
        let mut collection = store.get_collection(&handle)?;
        collection.infer_colors(inferrer);
        saved += store.save_items(collection.items_mut())?.len();
    }
    info!(items = saved, "colors inferred");
    Ok(saved)
}

/// Items that belong to no collection.
pub fn orphans<S>(store: &S) -> StoreResult<Vec<Item>>
where
    S: CatalogStore + ?Sized,
{
    let mut members = Vec::new();
    for handle in store.list_collection_handles()? {
        let collection = store.get_collection(&handle)?;
        members.extend(collection.items().iter().map(|i| i.handle().clone()));
    }
    Ok(all_items(store)?
        .into_iter()
        .filter(|item| !members.contains(item.handle()))
        .collect())
}

/// Every stored collection, in storage order.
pub fn load_collections<S>(store: &S) -> StoreResult<Vec<Collection>>
where
    S: CatalogStore + ?Sized,
{
    store
        .list_collection_handles()?
        .iter()
        .map(|handle| store.get_collection(handle))
        .collect()
}

fn all_items<S>(store: &S) -> StoreResult<Vec<Item>>
where
    S: CatalogStore + ?Sized,
{
    Ok(store
        .list_item_handles()?
        .iter()
        .map(|handle| store.get_item(handle))
        .collect::<StoreResult<Vec<_>>>()?
        .into_iter()
        .flatten()
        .collect())
}
