//! Durable page cache keyed by item handle.
//!
//! One file per item under the cache root. The file holds either the raw
//! fetched page body or the literal [`NO_OPTIONS_MARKER`]. Writers for the
//! same handle are not synchronized; callers run one worker per handle.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use shopfeed_core::Handle;

use crate::error::CacheError;

/// Content of a cache file meaning "this item has no options".
pub const NO_OPTIONS_MARKER: &str = "NOOPTIONS";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheEntry {
    Missing,
    Page(String),
    NoOptions,
}

#[derive(Debug, Clone)]
pub struct PageCache {
    root: PathBuf,
}

impl PageCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, handle: &Handle) -> PathBuf {
        let name: String = handle
            .as_str()
            .chars()
            .map(|c| if matches!(c, '/' | '\\' | '\0') { '_' } else { c })
            .collect();
        self.root.join(format!("{name}.html"))
    }

    pub fn read(&self, handle: &Handle) -> Result<CacheEntry, CacheError> {
        let path = self.path_for(handle);
        match fs::read_to_string(&path) {
            Ok(body) if body == NO_OPTIONS_MARKER => Ok(CacheEntry::NoOptions),
            Ok(body) => Ok(CacheEntry::Page(body)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(CacheEntry::Missing),
            Err(e) => Err(CacheError::io(path, e)),
        }
    }

    pub fn store_page(&self, handle: &Handle, body: &str) -> Result<(), CacheError> {
        self.write(handle, body)
    }

    pub fn mark_no_options(&self, handle: &Handle) -> Result<(), CacheError> {
        debug!(%handle, "marking item as having no options");
        self.write(handle, NO_OPTIONS_MARKER)
    }

    /// Discard a cached page so the next read goes to the network. The
    /// no-options marker is kept. Returns whether a page was removed.
    pub fn invalidate(&self, handle: &Handle) -> Result<bool, CacheError> {
        match self.read(handle)? {
            CacheEntry::Page(_) => {
                self.remove(handle)?;
                Ok(true)
            }
            CacheEntry::NoOptions => Ok(false),
            CacheEntry::Missing => {
                warn!(%handle, "asked to discard a cached page that does not exist");
                Ok(false)
            }
        }
    }

    /// Remove whatever is cached for the handle, marker included.
    pub fn remove(&self, handle: &Handle) -> Result<(), CacheError> {
        let path = self.path_for(handle);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CacheError::io(path, e)),
        }
    }

    fn write(&self, handle: &Handle, contents: &str) -> Result<(), CacheError> {
        fs::create_dir_all(&self.root).map_err(|e| CacheError::io(&self.root, e))?;
        let path = self.path_for(handle);
        fs::write(&path, contents).map_err(|e| CacheError::io(path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_survive_a_new_cache_instance() {
        let dir = tempfile::tempdir().unwrap();
        let handle = Handle::new("navy-suit");

        let cache = PageCache::new(dir.path().join("pages"));
        assert_eq!(cache.read(&handle).unwrap(), CacheEntry::Missing);
        cache.store_page(&handle, "<html></html>").unwrap();

        let reopened = PageCache::new(dir.path().join("pages"));
        assert_eq!(reopened.read(&handle).unwrap(), CacheEntry::Page("<html></html>".into()));

        reopened.mark_no_options(&handle).unwrap();
        assert_eq!(cache.read(&handle).unwrap(), CacheEntry::NoOptions);
    }

    #[test]
    fn invalidate_discards_pages_but_keeps_the_marker() {
        let dir = tempfile::tempdir().unwrap();
        let cache = PageCache::new(dir.path());
        let page = Handle::new("with-page");
        let marked = Handle::new("marked");

        cache.store_page(&page, "body").unwrap();
        cache.mark_no_options(&marked).unwrap();

        assert!(cache.invalidate(&page).unwrap());
        assert_eq!(cache.read(&page).unwrap(), CacheEntry::Missing);
        assert!(!cache.invalidate(&marked).unwrap());
        assert_eq!(cache.read(&marked).unwrap(), CacheEntry::NoOptions);
        assert!(!cache.invalidate(&Handle::new("never-cached")).unwrap());
    }

    #[test]
    fn path_separators_stay_inside_the_root() {
        let cache = PageCache::new("/tmp/cache");
        let path = cache.path_for(&Handle::new("a/../b"));
        assert_eq!(path, PathBuf::from("/tmp/cache/a_.._b.html"));
    }
}
