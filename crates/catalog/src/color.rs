//! Color inference from item titles.

use tracing::{debug, info};

use crate::item::Item;
use crate::vocabulary::Vocabulary;

/// Most colors a single item may carry.
pub const MAX_COLORS: usize = 3;

/// Derives the `color` attribute from an item title against a fixed,
/// ordered color vocabulary. Output order follows vocabulary order.
#[derive(Debug, Clone)]
pub struct ColorInferrer {
    colors: Vec<String>,
}

impl ColorInferrer {
    pub fn new(vocabulary: &Vocabulary) -> Self {
        Self {
            colors: vocabulary.colors().iter().map(|c| c.to_lowercase()).collect(),
        }
    }

    /// Colors named by the title, lower-cased, at most [`MAX_COLORS`].
    pub fn infer(&self, title: &str) -> Vec<String> {
        let title = title.to_lowercase();
        let words: Vec<&str> = title.split_whitespace().collect();

        let mut found: Vec<&str> = self
            .colors
            .iter()
            .map(String::as_str)
            .filter(|color| title.contains(color))
            .collect();

        // "tan" inside "tanner" is not a color.
        found.retain(|color| color.contains(' ') || words.contains(color));

        // "navy" is dropped when "navy blue" was found.
        let multi_word_parts: Vec<&str> = found
            .iter()
            .copied()
            .filter(|color| color.contains(' '))
            .flat_map(str::split_whitespace)
            .collect();
        found.retain(|color| color.contains(' ') || !multi_word_parts.contains(color));

        let mut colors: Vec<String> = Vec::with_capacity(found.len());
        for color in found {
            if !colors.iter().any(|c| c == color) {
                colors.push(color.to_string());
            }
        }

        if colors.len() > MAX_COLORS {
            info!(title = %title, found = colors.len(), "too many colors, keeping the first {MAX_COLORS}");
            colors.truncate(MAX_COLORS);
        }
        colors
    }

    /// Set `item.color` to the inferred colors joined with `/`. The title is
    /// never touched; with no color found the attribute is left as it was.
    pub fn apply(&self, item: &mut Item) -> bool {
        let colors = self.infer(&item.title);
        if colors.is_empty() {
            info!(handle = %item.handle(), "could not find a color");
            return false;
        }
        item.color = colors.join("/");
        debug!(handle = %item.handle(), color = %item.color, "colors assigned");
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inferrer(colors: &[&str]) -> ColorInferrer {
        ColorInferrer::new(&Vocabulary::default().with_colors(colors.iter().copied()))
    }

    #[test]
    fn multi_word_color_suppresses_its_parts() {
        let inf = inferrer(&["navy", "navy blue", "blue"]);
        assert_eq!(inf.infer("Navy Blue Slim Suit"), ["navy blue"]);
    }

    #[test]
    fn substring_hits_inside_words_are_dropped() {
        let inf = inferrer(&["tan", "red"]);
        assert_eq!(inf.infer("Tanner Red Loafer"), ["red"]);
    }

    #[test]
    fn more_than_three_colors_keep_scan_order() {
        let inf = inferrer(&["black", "white", "red", "green", "gold"]);
        assert_eq!(
            inf.infer("Gold Green Red White Black Plaid Vest"),
            ["black", "white", "red"]
        );
    }

    #[test]
    fn no_color_leaves_attribute_untouched() {
        let inf = inferrer(&["red"]);
        let mut item = Item::new("Classic Vest");
        item.color = "previous".to_string();
        assert!(!inf.apply(&mut item));
        assert_eq!(item.color, "previous");
    }

    #[test]
    fn apply_joins_with_slash_and_keeps_title() {
        let inf = inferrer(&["black", "white"]);
        let mut item = Item::new("Black and White Tuxedo");
        assert!(inf.apply(&mut item));
        assert_eq!(item.color, "black/white");
        assert_eq!(item.title, "Black and White Tuxedo");
    }

    #[test]
    fn inference_is_deterministic() {
        let inf = ColorInferrer::new(&Vocabulary::default());
        let title = "Charcoal Gray and Rose Gold Burgundy Vest";
        let first = inf.infer(title);
        for _ in 0..10 {
            assert_eq!(inf.infer(title), first);
        }
    }
}
