use std::cell::Cell;
use std::collections::HashMap;

use shopfeed_catalog::{CatalogStore, Collection, Item};
use shopfeed_core::Handle;
use shopfeed_infra::InMemoryCatalogStore;
use shopfeed_scrape::{FetchError, HarvestSummary, OptionCache, OptionHarvester, PageCache, PageFetcher};

const SIZED_PAGE: &str = r#"
    <div class="bold_option_dropdown">
      <span class="bold_option_title">Jacket Size *</span>
      <select><option>Choose</option><option>38 Regular</option><option>40 Long</option></select>
    </div>
"#;

/// Serves fixed pages by URL and counts requests.
#[derive(Default)]
struct Storefront {
    pages: HashMap<String, String>,
    requests: Cell<u32>,
}

impl Storefront {
    fn with_page(mut self, url: &str, body: &str) -> Self {
        self.pages.insert(url.to_string(), body.to_string());
        self
    }
}

impl PageFetcher for Storefront {
    fn fetch(&self, url: &str) -> Result<String, FetchError> {
        self.requests.set(self.requests.get() + 1);
        self.pages.get(url).cloned().ok_or_else(|| FetchError::Status {
            url: url.to_string(),
            status: 404,
        })
    }
}

fn catalog() -> (InMemoryCatalogStore, Collection) {
    let store = InMemoryCatalogStore::new();
    let mut items = vec![
        Item::new("Navy Suit").with_url("https://shop.example/products/navy-suit"),
        Item::new("Black Tuxedo").with_url("https://shop.example/products/black-tuxedo"),
        Item::new("Ivory Vest"),
    ];
    store.save_items(&mut items).unwrap();

    let mut collection = Collection::new("Formal");
    for item in items {
        collection.insert(item);
    }
    (store, collection)
}

#[test]
fn harvesting_a_collection_links_options_once() {
    let dir = tempfile::tempdir().unwrap();
    let storefront = Storefront::default()
        .with_page("https://shop.example/products/navy-suit", SIZED_PAGE)
        .with_page("https://shop.example/products/black-tuxedo", "<p>No options</p>");
    let harvester = OptionHarvester::new(OptionCache::new(PageCache::new(dir.path()), &storefront, 2));
    let (store, collection) = catalog();

    let summary = harvester.harvest_collection(&store, &collection).unwrap();
    assert_eq!(
        summary,
        HarvestSummary {
            items: 3,
            with_options: 1,
            without_options: 1,
            skipped: 1,
            options_linked: 1,
        }
    );
    assert_eq!(storefront.requests.get(), 3);

    let options = store.item_options(&Handle::new("navy-suit")).unwrap();
    assert_eq!(options.len(), 1);
    assert_eq!(options[0].handle().as_str(), "jacket-size");
    assert_eq!(options[0].attributes(), ["38 Regular", "40 Long"]);
    assert!(store.item_options(&Handle::new("black-tuxedo")).unwrap().is_empty());

    // Cached page and marker: no requests, no duplicate links.
    harvester.harvest_collection(&store, &collection).unwrap();
    assert_eq!(storefront.requests.get(), 3);
    assert_eq!(store.item_options(&Handle::new("navy-suit")).unwrap().len(), 1);
}

#[test]
fn harvesting_one_item() {
    let dir = tempfile::tempdir().unwrap();
    let storefront = Storefront::default().with_page("https://shop.example/products/navy-suit", SIZED_PAGE);
    let harvester = OptionHarvester::new(OptionCache::new(PageCache::new(dir.path()), &storefront, 3));
    let (store, collection) = catalog();

    assert_eq!(harvester.harvest(&store, &collection.items()[0]).unwrap(), 1);
    assert_eq!(store.item_options(&Handle::new("navy-suit")).unwrap().len(), 1);

    // No URL, nothing to fetch.
    assert_eq!(harvester.harvest(&store, &collection.items()[2]).unwrap(), 0);
    assert_eq!(storefront.requests.get(), 1);

    // Unreachable page: every attempt fails, then the item is marked.
    assert_eq!(harvester.harvest(&store, &collection.items()[1]).unwrap(), 0);
    assert_eq!(storefront.requests.get(), 4);
    assert_eq!(harvester.harvest(&store, &collection.items()[1]).unwrap(), 0);
    assert_eq!(storefront.requests.get(), 4);
}
