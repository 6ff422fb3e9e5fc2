//! Per-item admission rules.

use std::collections::HashSet;

use shopfeed_catalog::Item;
use shopfeed_core::Handle;

use crate::format::clean_sku;
use crate::mapping::FeedMode;

/// A named admission check. Failing a hard rule skips the item; a warning
/// rule is only logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdmissionRule {
    ItemNotDuplicate,
    ItemIdNotDuplicate,
    ItemHasId,
    ItemHasTitle,
    ItemHasDescription,
    ItemHasLink,
    ItemHasImageLink,
    ItemHasPrice,
    ItemTitleAtMost150,
    ItemTitleAtMost70,
}

const PERMISSIVE_RULES: &[AdmissionRule] = &[
    AdmissionRule::ItemNotDuplicate,
    AdmissionRule::ItemHasId,
    AdmissionRule::ItemHasTitle,
    AdmissionRule::ItemHasDescription,
    AdmissionRule::ItemHasImageLink,
    AdmissionRule::ItemHasPrice,
];

const STRICT_RULES: &[AdmissionRule] = &[
    AdmissionRule::ItemNotDuplicate,
    AdmissionRule::ItemIdNotDuplicate,
    AdmissionRule::ItemHasId,
    AdmissionRule::ItemHasTitle,
    AdmissionRule::ItemHasDescription,
    AdmissionRule::ItemHasLink,
    AdmissionRule::ItemHasImageLink,
    AdmissionRule::ItemHasPrice,
    AdmissionRule::ItemTitleAtMost150,
];

const STRICT_WARNINGS: &[AdmissionRule] = &[AdmissionRule::ItemTitleAtMost70];

impl AdmissionRule {
    pub fn name(self) -> &'static str {
        match self {
            AdmissionRule::ItemNotDuplicate => "item_not_duplicate",
            AdmissionRule::ItemIdNotDuplicate => "item_id_not_duplicate",
            AdmissionRule::ItemHasId => "item_has_id",
            AdmissionRule::ItemHasTitle => "item_has_title",
            AdmissionRule::ItemHasDescription => "item_has_description",
            AdmissionRule::ItemHasLink => "item_has_link",
            AdmissionRule::ItemHasImageLink => "item_has_image_link",
            AdmissionRule::ItemHasPrice => "item_has_price",
            AdmissionRule::ItemTitleAtMost150 => "item_title_at_most_150",
            AdmissionRule::ItemTitleAtMost70 => "item_title_at_most_70",
        }
    }
}

impl core::fmt::Display for AdmissionRule {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

/// Tracks what a feed already holds and judges new items against it.
#[derive(Debug)]
pub struct Admission {
    mode: FeedMode,
    handles: HashSet<Handle>,
    ids: HashSet<String>,
}

impl Admission {
    pub fn new(mode: FeedMode) -> Self {
        Self {
            mode,
            handles: HashSet::new(),
            ids: HashSet::new(),
        }
    }

    pub fn contains(&self, handle: &Handle) -> bool {
        self.handles.contains(handle)
    }

    /// First failing hard rule, or the warnings raised by an admissible item.
    pub fn check(&self, item: &Item) -> Result<Vec<AdmissionRule>, AdmissionRule> {
        let (rules, warnings) = match self.mode {
            FeedMode::Permissive => (PERMISSIVE_RULES, &[][..]),
            FeedMode::Strict => (STRICT_RULES, STRICT_WARNINGS),
        };
        if let Some(failed) = rules.iter().copied().find(|rule| !self.holds(*rule, item)) {
            return Err(failed);
        }
        Ok(warnings.iter().copied().filter(|rule| !self.holds(*rule, item)).collect())
    }

    /// Remember an admitted item so later duplicates are rejected.
    pub fn record(&mut self, item: &Item) {
        self.handles.insert(item.handle().clone());
        self.ids.insert(clean_sku(&item.sku));
    }

    fn holds(&self, rule: AdmissionRule, item: &Item) -> bool {
        let title_len = item.title.chars().count();
        match rule {
            AdmissionRule::ItemNotDuplicate => !self.handles.contains(item.handle()),
            AdmissionRule::ItemIdNotDuplicate => !self.ids.contains(&clean_sku(&item.sku)),
            AdmissionRule::ItemHasId => !item.sku.is_empty(),
            AdmissionRule::ItemHasTitle => !item.title.is_empty(),
            AdmissionRule::ItemHasDescription => !item.description.is_empty(),
            AdmissionRule::ItemHasLink => !item.url.is_empty(),
            AdmissionRule::ItemHasImageLink => !item.image_url.is_empty(),
            AdmissionRule::ItemHasPrice => item.price.is_set(),
            AdmissionRule::ItemTitleAtMost150 => title_len <= 150,
            AdmissionRule::ItemTitleAtMost70 => title_len <= 70,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete(title: &str, sku: &str) -> Item {
        Item::new(title)
            .with_sku(sku)
            .with_description("<p>wool</p>")
            .with_url("https://shop.example/products/x")
            .with_image_url("https://cdn.example/x.jpg")
            .with_price("10".parse().unwrap())
    }

    #[test]
    fn strict_rejects_reused_ids_across_handles() {
        let mut admission = Admission::new(FeedMode::Strict);
        let first = complete("Navy Suit", "SU100");
        assert_eq!(admission.check(&first), Ok(vec![]));
        admission.record(&first);

        let second = complete("Grey Suit", "#SU100");
        assert_eq!(admission.check(&second), Err(AdmissionRule::ItemIdNotDuplicate));
        assert_eq!(admission.check(&first), Err(AdmissionRule::ItemNotDuplicate));
    }

    #[test]
    fn permissive_ignores_ids_and_links() {
        let mut admission = Admission::new(FeedMode::Permissive);
        admission.record(&complete("Navy Suit", "SU100"));
        let mut other = complete("Grey Suit", "SU100");
        other.url.clear();
        assert_eq!(admission.check(&other), Ok(vec![]));
    }

    #[test]
    fn first_failing_rule_is_reported() {
        let admission = Admission::new(FeedMode::Strict);
        let mut item = complete("Navy Suit", "");
        item.description.clear();
        assert_eq!(admission.check(&item), Err(AdmissionRule::ItemHasId));

        let free = complete("Navy Suit", "SU1").with_price(shopfeed_core::Price::ZERO);
        assert_eq!(admission.check(&free), Err(AdmissionRule::ItemHasPrice));
    }

    #[test]
    fn title_length_rules() {
        let admission = Admission::new(FeedMode::Strict);
        let long = complete(&"x".repeat(71), "SU1");
        assert_eq!(admission.check(&long), Ok(vec![AdmissionRule::ItemTitleAtMost70]));

        let too_long = complete(&"x".repeat(151), "SU1");
        assert_eq!(admission.check(&too_long), Err(AdmissionRule::ItemTitleAtMost150));

        let permissive = Admission::new(FeedMode::Permissive);
        assert_eq!(permissive.check(&too_long), Ok(vec![]));
    }
}
