//! Field cleanup and cell encoding.

use scraper::Html;

use shopfeed_core::Price;

use crate::mapping::FeedMode;

const DROPPED_ELEMENTS: [&str; 3] = ["img", "script", "style"];

/// Plain text of an HTML fragment, without the content of `img`, `script`
/// and `style` elements.
pub fn html_to_text(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let mut text = String::new();
    for node in fragment.tree.root().descendants() {
        let Some(chunk) = node.value().as_text() else {
            continue;
        };
        let dropped = node.ancestors().any(|parent| {
            parent
                .value()
                .as_element()
                .is_some_and(|el| DROPPED_ELEMENTS.contains(&el.name()))
        });
        if !dropped {
            text.push_str(chunk);
        }
    }
    text
}

/// Strict feed description: HTML stripped, trimmed, control characters and
/// backslashes escaped as backslash sequences.
pub fn clean_description(html: &str) -> String {
    let text = html_to_text(html);
    let mut escaped = String::with_capacity(text.len());
    for c in text.trim().chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '\t' => escaped.push_str("\\t"),
            '\r' => escaped.push_str("\\r"),
            '\n' => escaped.push_str("\\n"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// `1234.5` → `1,234.50 USD`.
pub fn strict_price(price: Price) -> String {
    format!("{} USD", price.grouped_two_decimals())
}

pub fn clean_sku(sku: &str) -> String {
    sku.replace('#', "")
}

/// Encode one cell. Strict mode quotes every value; permissive mode quotes
/// only values carrying the delimiter, a quote or a line break. Embedded
/// quotes are doubled whenever the value is quoted.
pub fn encode_cell(mode: FeedMode, value: &str) -> String {
    let needs_quotes = match mode {
        FeedMode::Strict => true,
        FeedMode::Permissive => value.contains([mode.delimiter(), '"', '\n', '\r']),
    };
    if needs_quotes {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
