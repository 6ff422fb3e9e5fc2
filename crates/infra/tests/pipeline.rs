use shopfeed_catalog::{CatalogStore, ProductOption};
use shopfeed_core::Handle;
use shopfeed_feed::{AdmissionRule, FeedCompiler, FeedSettings};
use shopfeed_infra::jobs::{self, CollectionDraft, ItemRecord};
use shopfeed_infra::{AppConfig, InMemoryCatalogStore, SqliteCatalogStore};

const ITEMS: &str = r#"[
    {
        "title": "Navy Suit",
        "price": "100.00",
        "description": "<p>Wool <img src=\"x.jpg\">suit</p>",
        "vendor": "Tailors",
        "sku": "SU100",
        "tags": "Suit, Navy",
        "image_url": "https://cdn.example/navy.jpg"
    },
    {
        "title": "Charcoal Suit",
        "price": "120.00",
        "description": "Charcoal wool suit",
        "vendor": "Tailors",
        "sku": "SU100",
        "tags": "Suit",
        "image_url": "https://cdn.example/charcoal.jpg"
    },
    {
        "title": "Red Pocket Square",
        "price": "15.00",
        "description": "Silk",
        "vendor": "Tailors",
        "sku": "PS1",
        "tags": "Accessory",
        "image_url": "https://cdn.example/square.jpg"
    }
]"#;

const CONFIG: &str = r#"{
    "domain_name": "shop.example",
    "feed": { "option_names_in_title": true },
    "sizes": [
        {
            "option": "jacket-size",
            "price_pattern": "Add \\$(\\d+\\.\\d{2})",
            "strip_patterns": ["Add \\$\\d+\\.\\d{2}"]
        }
    ]
}"#;

fn seed<S>(store: &S, config: &AppConfig)
where
    S: CatalogStore + ?Sized,
{
    let records: Vec<ItemRecord> = serde_json::from_str(ITEMS).unwrap();
    jobs::import_items(store, records).unwrap();
    jobs::import_collections(
        store,
        &[
            CollectionDraft::new("Suits", ["Product tag is equal to Suit"]),
            CollectionDraft::new("Featured Products", ["Product tag is equal to Accessory"]),
        ],
        &config.domain_name,
    )
    .unwrap();

    let size = ProductOption::new("Jacket Size", vec!["38 Regular".into(), "40 Long Add $10.00".into()]);
    store.associate_option(&Handle::new("navy-suit"), &size).unwrap();
}

fn assert_feeds<S>(store: &S, config: &AppConfig)
where
    S: CatalogStore + ?Sized,
{
    let collections = jobs::load_collections(store).unwrap();
    assert_eq!(collections.len(), 1);

    let strict = FeedCompiler::strict()
        .with_settings(config.feed.clone())
        .with_expander(config.variant_expander().unwrap())
        .compile(&collections, store)
        .unwrap();

    assert_eq!(strict.report.admitted, 2);
    assert_eq!(
        strict.report.rejected,
        vec![(Handle::new("charcoal-suit"), AdmissionRule::ItemIdNotDuplicate)]
    );

    let rows: Vec<Vec<&str>> = strict.payload.lines().skip(1).map(|l| l.split('\t').collect()).collect();
    assert_eq!(rows.len(), 2);
    let long = &rows[1];
    assert_eq!(long[0], "\"SU100-40-long\"");
    assert_eq!(long[1], "\"Navy Suit (40 Long)\"");
    assert_eq!(long[2], "\"Wool suit\"");
    assert_eq!(long[3], "\"https://shop.example/collections/suits/products/navy-suit\"");
    assert_eq!(long[5], "\"110.00 USD\"");
    assert_eq!(long[9], "\"SU100\"");
    assert_eq!(long[14], "\"40 Long\"");
    assert_eq!(long[15], "\"SU100\"");
    assert_eq!(rows[0][5], "\"100.00 USD\"");

    let permissive = FeedCompiler::permissive();
    let out = permissive.compile(&collections, store).unwrap();
    let header = out.payload.lines().next().unwrap();
    assert_eq!(header, permissive.mapping().header().collect::<Vec<_>>().join(","));
    assert_eq!(out.report.admitted, 2);

    // Expansion never writes variants back to the catalog.
    assert!(store.get_item(&Handle::new("navy-suit-40-long")).unwrap().is_none());
    let orphans: Vec<Handle> = jobs::orphans(store).unwrap().iter().map(|i| i.handle().clone()).collect();
    assert_eq!(orphans, [Handle::new("red-pocket-square")]);
}

#[test]
fn in_memory_catalog_compiles_both_feeds() {
    let config: AppConfig = serde_json::from_str(CONFIG).unwrap();
    let store = InMemoryCatalogStore::new();
    seed(&store, &config);
    assert_feeds(&store, &config);
}

#[test]
fn sqlite_catalog_compiles_both_feeds() {
    let config: AppConfig = serde_json::from_str(CONFIG).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let store = SqliteCatalogStore::open(&format!("sqlite://{}", dir.path().join("catalog.db").display())).unwrap();
    seed(&store, &config);
    assert_feeds(&store, &config);
}

#[test]
fn items_are_not_expanded_without_size_options() {
    let config: AppConfig = serde_json::from_str(CONFIG).unwrap();
    let store = InMemoryCatalogStore::new();
    seed(&store, &config);
    let collections = jobs::load_collections(&store).unwrap();

    let compiled = FeedCompiler::strict()
        .with_settings(FeedSettings::default())
        .compile(&collections, &store)
        .unwrap();
    assert_eq!(compiled.report.admitted, 1);
    assert!(compiled.payload.contains("\"100.00 USD\""));
}
