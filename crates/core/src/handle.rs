//! Stable, slugified identifiers for items, collections and options.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("static whitespace pattern"));

/// Slugify free text: lower-case, apostrophes removed, every whitespace run
/// replaced by a single hyphen.
///
/// `slug(slug(s)) == slug(s)` for every input.
pub fn slug(text: &str) -> String {
    let lowered = text.to_lowercase().replace('\'', "");
    WHITESPACE_RUN.replace_all(&lowered, "-").into_owned()
}

/// Unique, immutable identifier of an item, collection or option.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Handle(String);

impl Handle {
    /// Wrap a handle that was already assigned (e.g. read back from the store
    /// or supplied by the import collaborator).
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Derive the handle of a freshly created record from its title.
    pub fn from_title(title: &str) -> Self {
        Self(slug(title))
    }

    /// Handle of a record derived from this one, e.g. a size variant:
    /// `{self}-{slug(value)}`.
    pub fn derive(&self, value: &str) -> Self {
        Self(format!("{}-{}", self.0, slug(value)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl core::fmt::Display for Handle {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Handle {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<Handle> for String {
    fn from(value: Handle) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn slug_lowercases_and_hyphenates() {
        assert_eq!(slug("Navy Blue Slim Suit"), "navy-blue-slim-suit");
        assert_eq!(slug("Men's  Tuxedo\tJacket"), "mens-tuxedo-jacket");
    }

    #[test]
    fn derive_appends_slugged_value() {
        let base = Handle::from_title("Classic Vest");
        assert_eq!(base.derive("Size 42 Long").as_str(), "classic-vest-size-42-long");
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 512,
            ..ProptestConfig::default()
        })]

        /// Property: slugging is idempotent.
        #[test]
        fn slug_is_idempotent(title in "[A-Za-z0-9' \t\n-]{0,60}") {
            let once = slug(&title);
            prop_assert_eq!(slug(&once), once.clone());
        }

        /// Property: slugs carry no upper-case letters, whitespace or apostrophes,
        /// and never two hyphens produced from one whitespace run.
        #[test]
        fn slug_shape(words in prop::collection::vec("[A-Za-z']{1,8}", 1..6), gaps in prop::collection::vec("[ \t]{1,3}", 5)) {
            let mut title = String::new();
            for (i, w) in words.iter().enumerate() {
                if i > 0 {
                    title.push_str(&gaps[i - 1]);
                }
                title.push_str(w);
            }
            let s = slug(&title);
            prop_assert!(!s.chars().any(|c| c.is_uppercase() || c.is_whitespace() || c == '\''));
            prop_assert!(s.matches('-').count() <= words.len() - 1);
        }
    }
}
