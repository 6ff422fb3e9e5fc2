//! Column mapping tables and per-mode fallbacks.

use shopfeed_catalog::Item;

use crate::field::Field;

/// Output shape of a compiled feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedMode {
    /// Comma-separated storefront product export.
    Permissive,
    /// Tab-separated shopping feed with every value quoted.
    Strict,
}

impl FeedMode {
    pub fn delimiter(self) -> char {
        match self {
            FeedMode::Permissive => ',',
            FeedMode::Strict => '\t',
        }
    }

    /// Default column table for the mode.
    pub fn mapping(self) -> Mapping {
        match self {
            FeedMode::Permissive => Mapping::permissive(),
            FeedMode::Strict => Mapping::strict(),
        }
    }

    /// Value of a `NONE` column. Unknown columns fall back to an empty value.
    pub fn fallback(self, column: &str, item: &Item) -> String {
        let value = match (self, column) {
            (FeedMode::Strict, "availability") => Fallback::Text("in stock"),
            (FeedMode::Strict, "condition") => Fallback::Text("new"),
            (FeedMode::Strict, "MPN") => Fallback::Attr(Field::Sku),
            (FeedMode::Permissive, "Published") => Fallback::Text("true"),
            (FeedMode::Permissive, "Google Shopping / Condition") => Fallback::Text("new"),
            (FeedMode::Permissive, "Google Shopping / MPN") => Fallback::Attr(Field::Sku),
            _ => Fallback::Text(""),
        };
        match value {
            Fallback::Text(text) => text.to_string(),
            Fallback::Attr(field) => field.read(item).into_owned(),
        }
    }
}

enum Fallback {
    Text(&'static str),
    Attr(Field),
}

/// Source of one output column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rule {
    Attr(Field),
    /// The attribute, or the mode's fallback when the attribute is empty.
    AttrOrFallback(Field),
    /// `NONE`: the mode's fallback for the column.
    Fallback,
    Literal(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub rule: Rule,
}

impl Column {
    pub fn new(name: impl Into<String>, rule: Rule) -> Self {
        Self { name: name.into(), rule }
    }
}

/// Ordered `(column, rule)` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mapping {
    columns: Vec<Column>,
}

impl Mapping {
    pub fn new(columns: Vec<Column>) -> Self {
        Self { columns }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn header(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    pub fn strict() -> Self {
        use Field::*;
        let attr = |name: &str, field| Column::new(name, Rule::Attr(field));
        Self::new(vec![
            attr("id", Sku),
            attr("title", Title),
            attr("description", Description),
            attr("link", Url),
            attr("image_link", ImageUrl),
            attr("price", Price),
            Column::new("availability", Rule::Fallback),
            attr("google_product_category", ProductCategory),
            attr("brand", Vendor),
            Column::new("MPN", Rule::AttrOrFallback(Mpn)),
            Column::new("condition", Rule::Fallback),
            attr("age_group", AgeGroup),
            attr("color", Color),
            attr("gender", Gender),
            attr("size", Size),
            attr("item_group_id", ItemGroupId),
        ])
    }

    pub fn permissive() -> Self {
        use Field::*;
        let attr = |name: &str, field| Column::new(name, Rule::Attr(field));
        let none = |name: &str| Column::new(name, Rule::Fallback);
        let literal = |name: &str, value: &str| Column::new(name, Rule::Literal(value.to_string()));
        Self::new(vec![
            attr("Handle", Handle),
            attr("Title", Title),
            attr("Body (HTML)", Description),
            attr("Vendor", Vendor),
            none("Type"),
            attr("Tags", Tags),
            none("Published"),
            literal("Option1 Name", "GOOGLE_SHOPPING_COLORS"),
            attr("Option1 Value", Color),
            none("Option2 Name"),
            none("Option2 Value"),
            none("Option3 Name"),
            none("Option3 Value"),
            attr("Variant SKU", Sku),
            none("Variant Grams"),
            none("Variant Inventory Tracker"),
            none("Variant Inventory Qty"),
            literal("Variant Inventory Policy", "continue"),
            literal("Variant Fulfillment Service", "manual"),
            attr("Variant Price", Price),
            none("Variant Compare At Price"),
            none("Variant Requires Shipping"),
            none("Variant Taxable"),
            none("Variant Barcode"),
            attr("Image Src", ImageUrl),
            none("Image Alt Text"),
            none("Gift Card"),
            none("Google Shopping / MPN"),
            attr("Google Shopping / Age Group", AgeGroup),
            attr("Google Shopping / Gender", Gender),
            attr("Google Shopping / Google Product Category", ProductCategory),
            none("SEO Title"),
            none("SEO Description"),
            none("Google Shopping / AdWords Grouping"),
            none("Google Shopping / AdWords Labels"),
            none("Google Shopping / Condition"),
            none("Google Shopping / Custom Product"),
            none("Google Shopping / Custom Label 0"),
            none("Google Shopping / Custom Label 1"),
            none("Google Shopping / Custom Label 2"),
            none("Google Shopping / Custom Label 3"),
            none("Google Shopping / Custom Label 4"),
            none("Variant Image"),
            none("Variant Weight Unit"),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strict_table_column_order() {
        let mapping = Mapping::strict();
        let header: Vec<&str> = mapping.header().collect();
        assert_eq!(header.first(), Some(&"id"));
        assert_eq!(header.last(), Some(&"item_group_id"));
        assert_eq!(header.len(), 16);
    }

    #[test]
    fn fallbacks_depend_on_mode() {
        let item = Item::new("Slim Suit").with_sku("SKU1");
        assert_eq!(FeedMode::Strict.fallback("availability", &item), "in stock");
        assert_eq!(FeedMode::Strict.fallback("MPN", &item), "SKU1");
        assert_eq!(FeedMode::Permissive.fallback("Google Shopping / MPN", &item), "SKU1");
        assert_eq!(FeedMode::Permissive.fallback("Published", &item), "true");
        assert_eq!(FeedMode::Permissive.fallback("availability", &item), "");
        assert_eq!(FeedMode::Strict.fallback("Type", &item), "");
    }
}
