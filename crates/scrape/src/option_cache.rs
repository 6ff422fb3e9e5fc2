//! Bounded-retry option retrieval on top of the page cache.

use tracing::{debug, info, warn};

use shopfeed_catalog::ProductOption;
use shopfeed_core::Handle;

use crate::cache::{CacheEntry, PageCache};
use crate::error::CacheError;
use crate::fetch::PageFetcher;
use crate::parse::parse_options;

/// Where an item ended up after a lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionState {
    /// Options were parsed from the page.
    HasOptions,
    /// Terminal: the marker is on disk and the network is skipped from now on.
    NoOptions,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OptionLookup {
    pub options: Vec<ProductOption>,
    pub state: OptionState,
    /// Parse attempts made during this lookup (0 when the marker short-cut
    /// the lookup).
    pub attempts: u32,
    /// Network fetches made during this lookup.
    pub fetches: u32,
}

/// Per-item option retrieval with a durable cache and a retry ceiling.
///
/// Per handle: no marker → fetch → page cached → parse. Options found ends
/// in `HasOptions`. Zero options discards the cached page and fetches again,
/// up to `max_attempts` attempts in total, then writes the no-options marker.
/// A failed fetch counts as an attempt that found zero options.
#[derive(Debug)]
pub struct OptionCache<F> {
    cache: PageCache,
    fetcher: F,
    max_attempts: u32,
}

impl<F: PageFetcher> OptionCache<F> {
    pub fn new(cache: PageCache, fetcher: F, max_attempts: u32) -> Self {
        Self {
            cache,
            fetcher,
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn cache(&self) -> &PageCache {
        &self.cache
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Force the next lookup for this item to hit the network.
    pub fn invalidate(&self, handle: &Handle) -> Result<bool, CacheError> {
        self.cache.invalidate(handle)
    }

    pub fn options_for(&self, handle: &Handle, url: &str) -> Result<OptionLookup, CacheError> {
        if self.cache.read(handle)? == CacheEntry::NoOptions {
            debug!(%handle, "cache marks item as having no options, skipping");
            return Ok(OptionLookup {
                options: Vec::new(),
                state: OptionState::NoOptions,
                attempts: 0,
                fetches: 0,
            });
        }

        let mut fetches = 0;
        for attempt in 1..=self.max_attempts {
            if attempt > 1 {
                self.cache.remove(handle)?;
            }

            let page = match self.cache.read(handle)? {
                CacheEntry::Page(body) => {
                    debug!(%handle, "reading options from cached page");
                    Some(body)
                }
                CacheEntry::Missing => {
                    fetches += 1;
                    self.fetch_and_cache(handle, url)?
                }
                CacheEntry::NoOptions => None,
            };

            let options = page.as_deref().map(parse_options).unwrap_or_default();
            if !options.is_empty() {
                debug!(%handle, attempt, found = options.len(), "options found");
                return Ok(OptionLookup {
                    options,
                    state: OptionState::HasOptions,
                    attempts: attempt,
                    fetches,
                });
            }
            debug!(%handle, attempt, "attempt found no options");
        }

        info!(%handle, attempts = self.max_attempts, "no options found");
        self.cache.mark_no_options(handle)?;
        Ok(OptionLookup {
            options: Vec::new(),
            state: OptionState::NoOptions,
            attempts: self.max_attempts,
            fetches,
        })
    }

    fn fetch_and_cache(&self, handle: &Handle, url: &str) -> Result<Option<String>, CacheError> {
        match self.fetcher.fetch(url) {
            Ok(body) => {
                self.cache.store_page(handle, &body)?;
                Ok(Some(body))
            }
            Err(e) => {
                warn!(%handle, error = %e, "fetching item page failed");
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};

    use super::*;
    use crate::error::FetchError;

    const WITH_OPTIONS: &str = r#"<div class="bold_option_dropdown">
        <span class="bold_option_title">Size</span>
        <select><option>Pick</option><option>S</option><option>M</option></select></div>"#;

    /// Serves scripted responses and counts calls.
    struct ScriptedFetcher {
        responses: RefCell<Vec<Result<String, FetchError>>>,
        fallback: &'static str,
        calls: Cell<u32>,
    }

    impl ScriptedFetcher {
        fn always(body: &'static str) -> Self {
            Self {
                responses: RefCell::new(Vec::new()),
                fallback: body,
                calls: Cell::new(0),
            }
        }

        fn then(self, response: Result<String, FetchError>) -> Self {
            self.responses.borrow_mut().insert(0, response);
            self
        }
    }

    impl PageFetcher for ScriptedFetcher {
        fn fetch(&self, url: &str) -> Result<String, FetchError> {
            self.calls.set(self.calls.get() + 1);
            match self.responses.borrow_mut().pop() {
                Some(r) => r,
                None if self.fallback.is_empty() => Err(FetchError::Request {
                    url: url.to_string(),
                    message: "offline".into(),
                }),
                None => Ok(self.fallback.to_string()),
            }
        }
    }

    fn handle() -> Handle {
        Handle::new("navy-suit")
    }

    #[test]
    fn zero_options_retries_up_to_the_ceiling_then_marks() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = ScriptedFetcher::always("<html><body>no dropdowns</body></html>");
        let cache = OptionCache::new(PageCache::new(dir.path()), &fetcher, 3);

        let lookup = cache.options_for(&handle(), "https://shop/p").unwrap();
        assert_eq!(lookup.state, OptionState::NoOptions);
        assert!(lookup.options.is_empty());
        assert_eq!(fetcher.calls.get(), 3);
        assert_eq!(lookup.fetches, 3);
        assert_eq!(cache.cache().read(&handle()).unwrap(), CacheEntry::NoOptions);

        // The marker short-cuts every later lookup.
        let again = cache.options_for(&handle(), "https://shop/p").unwrap();
        assert_eq!(again.state, OptionState::NoOptions);
        assert_eq!(again.attempts, 0);
        assert_eq!(fetcher.calls.get(), 3);
    }

    #[test]
    fn a_retry_that_finds_options_stops_early() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = ScriptedFetcher::always(WITH_OPTIONS).then(Ok("<p>loading</p>".into()));
        let cache = OptionCache::new(PageCache::new(dir.path()), &fetcher, 5);

        let lookup = cache.options_for(&handle(), "https://shop/p").unwrap();
        assert_eq!(lookup.state, OptionState::HasOptions);
        assert_eq!(lookup.attempts, 2);
        assert_eq!(fetcher.calls.get(), 2);
        assert_eq!(lookup.options[0].attributes(), ["S", "M"]);
    }

    #[test]
    fn cached_pages_are_read_without_network() {
        let dir = tempfile::tempdir().unwrap();
        let pages = PageCache::new(dir.path());
        pages.store_page(&handle(), WITH_OPTIONS).unwrap();
        let fetcher = ScriptedFetcher::always("");
        let cache = OptionCache::new(pages, &fetcher, 3);

        let lookup = cache.options_for(&handle(), "https://shop/p").unwrap();
        assert_eq!(lookup.state, OptionState::HasOptions);
        assert_eq!(fetcher.calls.get(), 0);
    }

    #[test]
    fn fetch_failures_feed_the_retry_loop() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = ScriptedFetcher::always("");
        let cache = OptionCache::new(PageCache::new(dir.path()), &fetcher, 2);

        let lookup = cache.options_for(&handle(), "https://shop/p").unwrap();
        assert_eq!(lookup.state, OptionState::NoOptions);
        assert_eq!(fetcher.calls.get(), 2);
    }

    #[test]
    fn invalidate_forces_a_fresh_fetch() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = ScriptedFetcher::always(WITH_OPTIONS);
        let cache = OptionCache::new(PageCache::new(dir.path()), &fetcher, 3);

        cache.options_for(&handle(), "https://shop/p").unwrap();
        cache.options_for(&handle(), "https://shop/p").unwrap();
        assert_eq!(fetcher.calls.get(), 1);

        assert!(cache.invalidate(&handle()).unwrap());
        cache.options_for(&handle(), "https://shop/p").unwrap();
        assert_eq!(fetcher.calls.get(), 2);
    }

    #[test]
    fn ceiling_of_zero_still_makes_one_attempt() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = ScriptedFetcher::always("<p></p>");
        let cache = OptionCache::new(PageCache::new(dir.path()), &fetcher, 0);
        cache.options_for(&handle(), "https://shop/p").unwrap();
        assert_eq!(fetcher.calls.get(), 1);
    }
}
