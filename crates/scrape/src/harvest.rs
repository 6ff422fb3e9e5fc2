//! Persist recovered options against their items.

use tracing::{info, warn};

use shopfeed_catalog::{CatalogStore, Collection, Item};

use crate::error::HarvestError;
use crate::fetch::PageFetcher;
use crate::option_cache::{OptionCache, OptionState};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct HarvestSummary {
    pub items: usize,
    pub with_options: usize,
    pub without_options: usize,
    pub skipped: usize,
    pub options_linked: usize,
}

/// Drives the [`OptionCache`] over items and links what it finds in the
/// catalog store.
#[derive(Debug)]
pub struct OptionHarvester<F> {
    cache: OptionCache<F>,
}

impl<F: PageFetcher> OptionHarvester<F> {
    pub fn new(cache: OptionCache<F>) -> Self {
        Self { cache }
    }

    pub fn option_cache(&self) -> &OptionCache<F> {
        &self.cache
    }

    /// Look up one item's options and associate each with the item. Returns
    /// how many options were linked. Items without a URL are skipped.
    pub fn harvest<S>(&self, store: &S, item: &Item) -> Result<usize, HarvestError>
    where
        S: CatalogStore + ?Sized,
    {
        if item.url.is_empty() {
            warn!(item = %item.handle(), "item has no url, cannot look up options");
            return Ok(0);
        }

        let lookup = self.cache.options_for(item.handle(), &item.url)?;
        for option in &lookup.options {
            store.associate_option(item.handle(), option)?;
        }
        Ok(lookup.options.len())
    }

    pub fn harvest_collection<S>(&self, store: &S, collection: &Collection) -> Result<HarvestSummary, HarvestError>
    where
        S: CatalogStore + ?Sized,
    {
        let mut summary = HarvestSummary::default();
        for item in collection.items() {
            summary.items += 1;
            if item.url.is_empty() {
                warn!(item = %item.handle(), "item has no url, cannot look up options");
                summary.skipped += 1;
                continue;
            }

            let lookup = self.cache.options_for(item.handle(), &item.url)?;
            match lookup.state {
                OptionState::HasOptions => summary.with_options += 1,
                OptionState::NoOptions => summary.without_options += 1,
            }
            for option in &lookup.options {
                store.associate_option(item.handle(), option)?;
                summary.options_linked += 1;
            }
        }

        info!(
            collection = %collection.handle(),
            items = summary.items,
            with_options = summary.with_options,
            without_options = summary.without_options,
            skipped = summary.skipped,
            "option harvest finished"
        );
        Ok(summary)
    }
}
