//! Controlled vocabularies for shopping attributes.

/// Reference vocabularies used to validate attribute setters and to infer
/// colors from titles.
///
/// Vocabulary order matters for color inference: colors are reported in the
/// order they appear here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vocabulary {
    colors: Vec<String>,
    age_groups: Vec<String>,
    genders: Vec<String>,
    product_categories: Vec<String>,
}

const COLORS: &[&str] = &[
    "black", "white", "ivory", "cream", "champagne", "beige", "tan", "khaki", "brown",
    "chocolate", "gray", "grey", "charcoal", "charcoal gray", "steel gray", "silver", "gold",
    "rose gold", "copper", "bronze", "red", "apple red", "burgundy", "wine", "maroon", "coral",
    "peach", "orange", "yellow", "canary", "green", "hunter green", "kelly green", "emerald",
    "sage", "mint", "olive", "teal", "turquoise", "aqua", "tiffany blue", "blue", "navy",
    "navy blue", "royal blue", "light blue", "sky blue", "baby blue", "cobalt", "purple",
    "plum", "eggplant", "lavender", "lilac", "fuchsia", "pink", "hot pink", "blush", "rose",
];

const AGE_GROUPS: &[&str] = &["newborn", "infant", "toddler", "kids", "adult"];

const GENDERS: &[&str] = &["male", "female", "unisex"];

const PRODUCT_CATEGORIES: &[&str] = &[
    "Apparel & Accessories",
    "Apparel & Accessories > Clothing",
    "Apparel & Accessories > Clothing > Shirts & Tops",
    "Apparel & Accessories > Clothing > Suits",
    "Apparel & Accessories > Clothing > Suits > Tuxedos",
    "Apparel & Accessories > Clothing > Suits > Suit Jackets",
    "Apparel & Accessories > Clothing > Pants",
    "Apparel & Accessories > Clothing > Vests",
    "Apparel & Accessories > Clothing Accessories",
    "Apparel & Accessories > Clothing Accessories > Bow Ties",
    "Apparel & Accessories > Clothing Accessories > Neckties",
    "Apparel & Accessories > Clothing Accessories > Cummerbunds",
    "Apparel & Accessories > Clothing Accessories > Suspenders",
    "Apparel & Accessories > Clothing Accessories > Pocket Squares",
    "Apparel & Accessories > Jewelry > Cufflinks",
    "Apparel & Accessories > Shoes",
];

fn canonical<'a>(terms: &'a [String], value: &str) -> Option<&'a str> {
    let value = value.to_lowercase();
    terms.iter().find(|t| t.to_lowercase() == value).map(String::as_str)
}

fn owned(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| (*s).to_string()).collect()
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self {
            colors: owned(COLORS),
            age_groups: owned(AGE_GROUPS),
            genders: owned(GENDERS),
            product_categories: owned(PRODUCT_CATEGORIES),
        }
    }
}

impl Vocabulary {
    pub fn with_colors<I, S>(mut self, colors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.colors = colors.into_iter().map(Into::into).collect();
        self
    }

    pub fn colors(&self) -> &[String] {
        &self.colors
    }

    /// Vocabulary spelling of an age group, matched ignoring case.
    pub fn age_group(&self, value: &str) -> Option<&str> {
        canonical(&self.age_groups, value)
    }

    /// Vocabulary spelling of a gender, matched ignoring case.
    pub fn gender(&self, value: &str) -> Option<&str> {
        canonical(&self.genders, value)
    }

    /// Exact match against the taxonomy path.
    pub fn product_category(&self, value: &str) -> Option<&str> {
        self.product_categories.iter().find(|c| *c == value).map(String::as_str)
    }

    pub fn is_age_group(&self, value: &str) -> bool {
        self.age_group(value).is_some()
    }

    pub fn is_gender(&self, value: &str) -> bool {
        self.gender(value).is_some()
    }

    pub fn is_product_category(&self, value: &str) -> bool {
        self.product_category(value).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn age_group_and_gender_ignore_case() {
        let vocab = Vocabulary::default();
        assert!(vocab.is_age_group("Adult"));
        assert!(vocab.is_gender("MALE"));
        assert!(!vocab.is_gender("robot"));
        assert_eq!(vocab.gender("Male"), Some("male"));
        assert_eq!(vocab.age_group("ADULT"), Some("adult"));
    }

    #[test]
    fn product_category_is_exact() {
        let vocab = Vocabulary::default();
        assert!(vocab.is_product_category("Apparel & Accessories > Clothing > Suits > Tuxedos"));
        assert!(!vocab.is_product_category("apparel & accessories"));
    }

    #[test]
    fn colors_can_be_replaced() {
        let vocab = Vocabulary::default().with_colors(["red", "dark red"]);
        assert_eq!(vocab.colors(), ["red".to_string(), "dark red".to_string()]);
    }
}
