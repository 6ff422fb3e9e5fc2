//! Option dropdown extraction from item page markup.

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};

use shopfeed_catalog::ProductOption;

static DROPDOWN: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div.bold_option_dropdown").expect("static selector"));
static TITLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("span.bold_option_title").expect("static selector"));
static VALUE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("option").expect("static selector"));

fn text_of(element: ElementRef<'_>) -> String {
    element.text().collect::<String>()
}

/// Read every option dropdown from a page.
///
/// The title loses its required-field asterisk; the first `<option>` of each
/// dropdown is the "choose one" placeholder and is skipped. Dropdowns without
/// a title are ignored. Markup without dropdowns yields no options.
pub fn parse_options(html: &str) -> Vec<ProductOption> {
    let document = Html::parse_document(html);

    document
        .select(&DROPDOWN)
        .filter_map(|dropdown| {
            let title_element = dropdown.select(&TITLE).next()?;
            let title = text_of(title_element).replace('*', "").trim().to_string();
            if title.is_empty() {
                return None;
            }
            let attributes = dropdown
                .select(&VALUE)
                .skip(1)
                .map(|o| text_of(o).trim().to_string())
                .collect();
            Some(ProductOption::new(title, attributes))
        })
        .collect()
}
