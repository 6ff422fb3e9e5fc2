//! Selectable option axis (size, color, ...) and its allowed values.

use serde::{Deserialize, Serialize};

use shopfeed_core::{Handle, OptionId};

/// An option scraped from an item page, e.g. `Size: [38 Regular, 40 Long]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductOption {
    id: Option<OptionId>,
    title: String,
    handle: Handle,
    attributes: Vec<String>,
}

impl ProductOption {
    pub fn new(title: impl Into<String>, attributes: Vec<String>) -> Self {
        let title = title.into();
        Self {
            id: None,
            handle: Handle::from_title(&title),
            title,
            attributes,
        }
    }

    pub fn with_id(mut self, id: OptionId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn id(&self) -> Option<OptionId> {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn handle(&self) -> &Handle {
        &self.handle
    }

    pub fn attributes(&self) -> &[String] {
        &self.attributes
    }

    /// Same handle and the same attributes compared as a multiset.
    pub fn is_identical(&self, other: &ProductOption) -> bool {
        if self.handle != other.handle || self.attributes.len() != other.attributes.len() {
            return false;
        }
        let mut mine: Vec<&String> = self.attributes.iter().collect();
        let mut theirs: Vec<&String> = other.attributes.iter().collect();
        mine.sort();
        theirs.sort();
        mine == theirs
    }
}

impl core::fmt::Display for ProductOption {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.handle, f)
    }
}
