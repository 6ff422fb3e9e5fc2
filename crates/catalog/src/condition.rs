//! Declarative membership rules for collections.
//!
//! A [`Condition`] is a `(variable, relation, value)` triple. A
//! [`ConditionSet`] is the AND of its conditions and compiles into an
//! [`ItemFilter`]: a list of [`Predicate`]s that can be evaluated in memory
//! or translated into bound query parameters by a store.

use serde::{Deserialize, Serialize};

use shopfeed_core::{DomainError, DomainResult};

use crate::item::{Item, TAG_SEPARATOR};

/// Item attribute a condition reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variable {
    Tag,
    Title,
    Vendor,
}

impl Variable {
    pub fn token(self) -> &'static str {
        match self {
            Variable::Tag => "tag",
            Variable::Title => "title",
            Variable::Vendor => "vendor",
        }
    }

    pub fn parse(token: &str) -> DomainResult<Self> {
        match token.trim() {
            "tag" => Ok(Variable::Tag),
            "title" => Ok(Variable::Title),
            "vendor" => Ok(Variable::Vendor),
            other => Err(DomainError::malformed_condition(format!("unknown variable '{other}'"))),
        }
    }
}

/// Relation between the attribute and the condition value.
///
/// `LessThan` and `GreaterThan` are legal tokens but have no matching rule;
/// evaluating them is an `UnsupportedCondition` error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Relation {
    Equals,
    DoesNotContain,
    LessThan,
    GreaterThan,
}

impl Relation {
    pub fn token(self) -> &'static str {
        match self {
            Relation::Equals => "equals",
            Relation::DoesNotContain => "does not contain",
            Relation::LessThan => "less than",
            Relation::GreaterThan => "greater than",
        }
    }

    /// Accepts both the spaced and the hyphenated spelling.
    pub fn parse(token: &str) -> DomainResult<Self> {
        match token.trim().replace('-', " ").as_str() {
            "equals" => Ok(Relation::Equals),
            "does not contain" => Ok(Relation::DoesNotContain),
            "less than" => Ok(Relation::LessThan),
            "greater than" => Ok(Relation::GreaterThan),
            _ => Err(DomainError::malformed_condition(format!("unknown relation '{token}'"))),
        }
    }
}

/// One filter rule over one item attribute.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Condition {
    variable: Variable,
    relation: Relation,
    value: String,
}

/// Storefront phrasing of variables, in the order they are searched.
const RULE_VARIABLES: &[(&str, Variable)] = &[
    ("Product tag", Variable::Tag),
    ("Product title", Variable::Title),
    ("Product vendor", Variable::Vendor),
];

/// Storefront phrasing of relations. "contains" maps to equals; the later,
/// longer phrase wins when both are present.
const RULE_RELATIONS: &[(&str, Relation)] = &[
    ("is equal to", Relation::Equals),
    ("contains", Relation::Equals),
    ("does not contain", Relation::DoesNotContain),
];

impl Condition {
    pub fn new(variable: Variable, relation: Relation, value: impl Into<String>) -> Self {
        Self {
            variable,
            relation,
            value: value.into(),
        }
    }

    /// Build from raw tokens, rejecting wrong arity and unknown tokens.
    pub fn from_tokens(tokens: &[&str]) -> DomainResult<Self> {
        let [variable, relation, value] = tokens else {
            return Err(DomainError::malformed_condition(format!(
                "expected 3 elements (variable, relation, value), got {}",
                tokens.len()
            )));
        };
        Ok(Self::new(Variable::parse(variable)?, Relation::parse(relation)?, *value))
    }

    /// Parse storefront rule text such as `"Product tag is equal to Red"`.
    pub fn from_rule_text(text: &str) -> DomainResult<Self> {
        let malformed = || DomainError::malformed_condition(format!("cannot parse rule '{text}'"));

        let (variable_phrase, variable) = RULE_VARIABLES
            .iter()
            .filter(|(phrase, _)| text.contains(phrase))
            .next_back()
            .ok_or_else(malformed)?;
        let after_variable = &text[text.find(variable_phrase).ok_or_else(malformed)? + variable_phrase.len()..];

        let (relation_phrase, relation) = RULE_RELATIONS
            .iter()
            .filter(|(phrase, _)| after_variable.contains(phrase))
            .next_back()
            .ok_or_else(malformed)?;
        let value_start = after_variable.find(relation_phrase).ok_or_else(malformed)? + relation_phrase.len();
        let value = after_variable[value_start..].replace('"', "");
        let value = value.trim();

        if value.is_empty() {
            return Err(malformed());
        }
        Ok(Self::new(*variable, *relation, value))
    }

    pub fn variable(&self) -> Variable {
        self.variable
    }

    pub fn relation(&self) -> Relation {
        self.relation
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// Resolve the matching rule for this (variable, relation) pairing.
    ///
    /// A tag value must be one non-empty tag: it cannot contain the `", "`
    /// tag separator.
    pub fn predicate(&self) -> DomainResult<Predicate> {
        if self.variable == Variable::Tag && (self.value.trim().is_empty() || self.value.contains(TAG_SEPARATOR)) {
            return Err(DomainError::malformed_condition(format!(
                "tag value '{}' is not a single tag",
                self.value
            )));
        }
        let value = self.value.clone();
        match (self.variable, self.relation) {
            (Variable::Tag, Relation::Equals) => Ok(Predicate::HasTag(value)),
            (Variable::Tag, Relation::DoesNotContain) => Ok(Predicate::LacksTag(value)),
            (Variable::Title, Relation::Equals) => Ok(Predicate::TitleContains(value)),
            (Variable::Title, Relation::DoesNotContain) => Ok(Predicate::TitleLacks(value)),
            (Variable::Vendor, Relation::Equals) => Ok(Predicate::VendorContains(value)),
            (variable, relation) => Err(DomainError::unsupported_condition(variable.token(), relation.token())),
        }
    }

    pub fn matches(&self, item: &Item) -> DomainResult<bool> {
        Ok(self.predicate()?.matches(item))
    }
}

impl core::fmt::Display for Condition {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{} {} {}", self.variable.token(), self.relation.token(), self.value)
    }
}

/// A compiled, supported matching rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// The tag list contains the value as a whole tag.
    HasTag(String),
    /// The tag list does not contain the value as a whole tag.
    LacksTag(String),
    /// Case-sensitive substring of the title.
    TitleContains(String),
    /// Case-sensitive non-substring of the title.
    TitleLacks(String),
    /// Case-sensitive substring of the vendor.
    VendorContains(String),
}

impl Predicate {
    /// The literal the predicate compares against.
    pub fn value(&self) -> &str {
        match self {
            Predicate::HasTag(v)
            | Predicate::LacksTag(v)
            | Predicate::TitleContains(v)
            | Predicate::TitleLacks(v)
            | Predicate::VendorContains(v) => v.as_str(),
        }
    }

    pub fn matches(&self, item: &Item) -> bool {
        match self {
            Predicate::HasTag(v) => item.tags.iter().any(|t| t == v),
            Predicate::LacksTag(v) => !item.tags.iter().any(|t| t == v),
            Predicate::TitleContains(v) => item.title.contains(v.as_str()),
            Predicate::TitleLacks(v) => !item.title.contains(v.as_str()),
            Predicate::VendorContains(v) => item.vendor.contains(v.as_str()),
        }
    }
}

/// Ordered conditions combined with logical AND.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConditionSet(Vec<Condition>);

impl ConditionSet {
    pub fn new(conditions: Vec<Condition>) -> Self {
        Self(conditions)
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Compile into a filter. Fails on the first unsupported pairing; an empty
    /// set is rejected since it would select the whole catalog.
    pub fn compile(&self) -> DomainResult<ItemFilter> {
        if self.0.is_empty() {
            return Err(DomainError::malformed_condition("a condition set needs at least one condition"));
        }
        let predicates = self
            .0
            .iter()
            .map(Condition::predicate)
            .collect::<DomainResult<Vec<_>>>()?;
        Ok(ItemFilter { predicates })
    }
}

impl From<Vec<Condition>> for ConditionSet {
    fn from(value: Vec<Condition>) -> Self {
        Self(value)
    }
}

/// Compiled AND of predicates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemFilter {
    predicates: Vec<Predicate>,
}

impl ItemFilter {
    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    pub fn matches(&self, item: &Item) -> bool {
        self.predicates.iter().all(|p| p.matches(item))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn tagged(tags: &[&str]) -> Item {
        Item::new("Tagged").with_tags(tags.iter().copied())
    }

    #[test]
    fn tag_equals_is_a_whole_tag_match() {
        let cond = Condition::new(Variable::Tag, Relation::Equals, "Re");
        assert!(!cond.matches(&tagged(&["Red", "Hat"])).unwrap());
        let cond = Condition::new(Variable::Tag, Relation::Equals, "Red");
        assert!(cond.matches(&tagged(&["Red", "Hat"])).unwrap());
    }

    #[test]
    fn tag_does_not_contain_negates_the_whole_tag_test() {
        let cond = Condition::new(Variable::Tag, Relation::DoesNotContain, "Hat");
        assert!(!cond.matches(&tagged(&["Red", "Hat"])).unwrap());
        assert!(cond.matches(&tagged(&["Red", "Hats"])).unwrap());
    }

    #[test]
    fn title_and_vendor_are_case_sensitive_substrings() {
        let item = Item::new("Slim Fit Tuxedo").with_vendor("Acme Formal");
        assert!(Condition::new(Variable::Title, Relation::Equals, "Fit").matches(&item).unwrap());
        assert!(!Condition::new(Variable::Title, Relation::Equals, "fit").matches(&item).unwrap());
        assert!(Condition::new(Variable::Title, Relation::DoesNotContain, "Vest").matches(&item).unwrap());
        assert!(Condition::new(Variable::Vendor, Relation::Equals, "Acme").matches(&item).unwrap());
    }

    #[test]
    fn unsupported_pairings_error_at_evaluation() {
        let item = Item::new("Anything");
        for cond in [
            Condition::new(Variable::Vendor, Relation::DoesNotContain, "x"),
            Condition::new(Variable::Title, Relation::LessThan, "x"),
            Condition::new(Variable::Tag, Relation::GreaterThan, "x"),
        ] {
            assert!(matches!(cond.matches(&item), Err(DomainError::UnsupportedCondition { .. })));
        }
    }

    #[test]
    fn tag_values_must_be_single_tags() {
        let item = tagged(&["Red", "Hat"]);
        for value in ["Red, Hat", "", "  "] {
            let cond = Condition::new(Variable::Tag, Relation::Equals, value);
            assert!(matches!(cond.matches(&item), Err(DomainError::MalformedCondition(_))));
        }
        assert!(ConditionSet::new(vec![Condition::new(Variable::Tag, Relation::DoesNotContain, "Red, Hat")])
            .compile()
            .is_err());
        assert!(Condition::new(Variable::Tag, Relation::Equals, "Red,Hat").matches(&item).is_ok());
    }

    #[test]
    fn from_tokens_rejects_malformed_input() {
        assert!(Condition::from_tokens(&["tag", "equals", "Red"]).is_ok());
        assert!(Condition::from_tokens(&["tag", "does-not-contain", "Red"]).is_ok());
        assert!(matches!(
            Condition::from_tokens(&["tag", "equals"]),
            Err(DomainError::MalformedCondition(_))
        ));
        assert!(matches!(
            Condition::from_tokens(&["price", "equals", "10"]),
            Err(DomainError::MalformedCondition(_))
        ));
        assert!(matches!(
            Condition::from_tokens(&["tag", "starts with", "R"]),
            Err(DomainError::MalformedCondition(_))
        ));
    }

    #[test]
    fn rule_text_parsing() {
        let c = Condition::from_rule_text("Product tag is equal to Wedding").unwrap();
        assert_eq!(c, Condition::new(Variable::Tag, Relation::Equals, "Wedding"));

        let c = Condition::from_rule_text("Product title contains Slim Fit").unwrap();
        assert_eq!(c, Condition::new(Variable::Title, Relation::Equals, "Slim Fit"));

        let c = Condition::from_rule_text("Product title does not contain \"Vest\"").unwrap();
        assert_eq!(c, Condition::new(Variable::Title, Relation::DoesNotContain, "Vest"));

        assert!(Condition::from_rule_text("Product price is greater than 10").is_err());
        assert!(Condition::from_rule_text("Product tag is equal to ").is_err());
    }

    #[test]
    fn condition_set_is_a_conjunction() {
        let set = ConditionSet::new(vec![
            Condition::new(Variable::Tag, Relation::Equals, "Suit"),
            Condition::new(Variable::Title, Relation::DoesNotContain, "Vest"),
        ]);
        let filter = set.compile().unwrap();
        assert!(filter.matches(&Item::new("Navy Suit").with_tags(["Suit"])));
        assert!(!filter.matches(&Item::new("Navy Vest").with_tags(["Suit"])));
        assert!(!filter.matches(&Item::new("Navy Suit").with_tags(["Tie"])));
    }

    #[test]
    fn empty_or_unsupported_sets_do_not_compile() {
        assert!(matches!(ConditionSet::default().compile(), Err(DomainError::MalformedCondition(_))));
        let set = ConditionSet::new(vec![Condition::new(Variable::Vendor, Relation::LessThan, "x")]);
        assert!(matches!(set.compile(), Err(DomainError::UnsupportedCondition { .. })));
    }

    proptest! {
        /// Property: `tag equals V` matches `[V]` and never `[V + "x"]`.
        #[test]
        fn tag_equals_matches_exactly(value in "[A-Za-z0-9][A-Za-z0-9 ]{0,15}") {
            let cond = Condition::new(Variable::Tag, Relation::Equals, value.clone());
            prop_assert!(cond.matches(&tagged(&[value.as_str()])).unwrap());
            let longer = format!("{value}x");
            prop_assert!(!cond.matches(&tagged(&[longer.as_str()])).unwrap());
        }
    }
}
