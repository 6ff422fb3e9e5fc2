use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{info, warn};

use shopfeed_catalog::{CatalogStore, ColorInferrer, Vocabulary};
use shopfeed_core::Handle;
use shopfeed_feed::{FeedCompiler, FeedOutput};
use shopfeed_infra::jobs::{self, CollectionDraft, FeedAttribute, ItemRecord};
use shopfeed_infra::{AppConfig, SqliteCatalogStore};
use shopfeed_scrape::{HttpFetcher, HttpFetcherConfig, OptionCache, OptionHarvester, PageCache};

const STRICT_FEED_FILE: &str = "google_feed.tsv";
const PERMISSIVE_FEED_FILE: &str = "catalog_export.csv";

/// Catalog maintenance and shopping feed export.
#[derive(Parser, Debug)]
#[command(name = "shopfeed", version)]
struct Cli {
    /// Defaults to `export`.
    #[clap(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Upsert items from a JSON array of item rows.
    ImportItems { path: PathBuf },
    /// Create collections from a JSON array of `{ "title", "rules" }`.
    ImportCollections { path: PathBuf },
    /// Look up the options of every collection member on the storefront.
    Harvest,
    /// Infer item colors from titles.
    Colors,
    /// Set a shopping attribute on a collection, or on every item.
    SetAttribute {
        attribute: AttributeArg,
        value: String,
        /// Only members of this collection.
        #[arg(long)]
        collection: Option<String>,
    },
    /// List items that belong to no collection.
    Orphans,
    /// Compile both feeds into the output directory.
    Export,
    /// Delete every stored record.
    Wipe,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum AttributeArg {
    AgeGroup,
    Gender,
    ProductCategory,
}

impl From<AttributeArg> for FeedAttribute {
    fn from(arg: AttributeArg) -> Self {
        match arg {
            AttributeArg::AgeGroup => FeedAttribute::AgeGroup,
            AttributeArg::Gender => FeedAttribute::Gender,
            AttributeArg::ProductCategory => FeedAttribute::ProductCategory,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load().context("failed to load configuration")?;
    shopfeed_observability::init_with(&config.log).context("failed to initialize logging")?;

    let store = SqliteCatalogStore::open(&config.database_url)
        .with_context(|| format!("failed to open catalog store {}", config.database_url))?;

    match cli.command.unwrap_or(Command::Export) {
        Command::ImportItems { path } => {
            let records: Vec<ItemRecord> = read_json(&path)?;
            jobs::import_items(&store, records)?;
        }
        Command::ImportCollections { path } => {
            let drafts: Vec<CollectionDraft> = read_json(&path)?;
            jobs::import_collections(&store, &drafts, &config.domain_name)?;
        }
        Command::Harvest => harvest(&store, &config)?,
        Command::Colors => {
            jobs::infer_colors(&store, &ColorInferrer::new(&Vocabulary::default()))?;
        }
        Command::SetAttribute {
            attribute,
            value,
            collection,
        } => {
            let vocabulary = Vocabulary::default();
            let saved = match collection {
                Some(handle) => {
                    jobs::propagate_to_collection(&store, &Handle::new(handle), attribute.into(), &value, &vocabulary)?
                }
                None => jobs::set_catalog_default(&store, attribute.into(), &value, &vocabulary)?,
            };
            info!(items = saved, "attribute set");
        }
        Command::Orphans => {
            for item in jobs::orphans(&store)? {
                println!("{}\t{}", item.handle(), item.title);
            }
        }
        Command::Export => export(&store, &config)?,
        Command::Wipe => {
            store.wipe()?;
            info!("catalog wiped");
        }
    }
    Ok(())
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("failed to parse {}", path.display()))
}

fn harvest(store: &SqliteCatalogStore, config: &AppConfig) -> Result<()> {
    let fetcher = HttpFetcher::new(&HttpFetcherConfig {
        timeout: Duration::from_secs(config.fetch_timeout_secs),
        ..HttpFetcherConfig::default()
    })?;
    let cache = OptionCache::new(
        PageCache::new(&config.cache_dir),
        fetcher,
        config.max_option_fetch_attempts,
    );
    let harvester = OptionHarvester::new(cache);

    for collection in jobs::load_collections(store)? {
        harvester.harvest_collection(store, &collection)?;
    }
    Ok(())
}

fn export(store: &SqliteCatalogStore, config: &AppConfig) -> Result<()> {
    let collections = jobs::load_collections(store)?;
    if collections.is_empty() {
        warn!("no collections stored, feeds will be empty");
    }
    fs::create_dir_all(&config.output_dir)
        .with_context(|| format!("failed to create {}", config.output_dir.display()))?;

    let strict = FeedCompiler::strict()
        .with_settings(config.feed.clone())
        .with_expander(config.variant_expander()?);
    write_feed(&config.output_dir.join(STRICT_FEED_FILE), strict.compile(&collections, store)?)?;

    let permissive = FeedCompiler::permissive().with_settings(config.feed.clone());
    write_feed(&config.output_dir.join(PERMISSIVE_FEED_FILE), permissive.compile(&collections, store)?)?;
    Ok(())
}

fn write_feed(path: &Path, output: FeedOutput) -> Result<()> {
    fs::write(path, &output.payload).with_context(|| format!("failed to write {}", path.display()))?;
    info!(
        path = %path.display(),
        admitted = output.report.admitted,
        excluded = output.report.excluded.len(),
        rejected = output.report.rejected.len(),
        failed = output.report.failed.len(),
        "feed written"
    );
    Ok(())
}
