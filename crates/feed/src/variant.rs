//! Size-option expansion into per-size variant items.

use regex::Regex;
use tracing::debug;

use shopfeed_catalog::{Item, ProductOption};
use shopfeed_core::{DomainError, DomainResult, Handle, Price, slug};

/// How the attribute text of a size option is turned into a size.
#[derive(Debug, Clone)]
pub struct SizeModifiers {
    /// Group 1 of the first match is a surcharge added to the variant price.
    pub price_attribute_extraction_regex: Option<Regex>,
    /// Applied in order; the first match of each is deleted from the text.
    pub attribute_regexes: Vec<Regex>,
    pub strip_attribute: bool,
}

impl Default for SizeModifiers {
    fn default() -> Self {
        Self {
            price_attribute_extraction_regex: None,
            attribute_regexes: Vec::new(),
            strip_attribute: true,
        }
    }
}

/// Registers an option handle as a size axis.
#[derive(Debug, Clone)]
pub struct SizeSpec {
    option_handle: Handle,
    modifiers: SizeModifiers,
}

/// A cleaned size value and the surcharge found in its raw text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SizeValue {
    pub text: String,
    pub surcharge: Option<Price>,
}

impl SizeSpec {
    pub fn new(option_handle: Handle, modifiers: SizeModifiers) -> Self {
        Self { option_handle, modifiers }
    }

    pub fn option_handle(&self) -> &Handle {
        &self.option_handle
    }

    pub fn modifiers(&self) -> &SizeModifiers {
        &self.modifiers
    }

    pub fn process(&self, raw: &str) -> DomainResult<SizeValue> {
        let modifiers = &self.modifiers;
        let surcharge = match &modifiers.price_attribute_extraction_regex {
            Some(regex) => extract_surcharge(regex, raw)?,
            None => None,
        };

        let mut text = raw.to_string();
        for regex in &modifiers.attribute_regexes {
            let filtered = regex.replacen(&text, 1, "").into_owned();
            if filtered != text {
                debug!(option = %self.option_handle, from = %text, to = %filtered, "size attribute filtered");
                text = filtered;
            }
        }
        if modifiers.strip_attribute {
            text = text.trim().to_string();
        }
        Ok(SizeValue { text, surcharge })
    }
}

fn extract_surcharge(regex: &Regex, raw: &str) -> DomainResult<Option<Price>> {
    let Some(captures) = regex.captures(raw) else {
        return Ok(None);
    };
    let group = captures.get(1).ok_or_else(|| {
        DomainError::validation(format!("price extraction pattern '{}' has no capture group", regex.as_str()))
    })?;
    group.as_str().parse::<Price>().map(Some)
}

type TitleFilter = Box<dyn Fn(&str) -> String + Send + Sync>;

/// Splits an item carrying a registered size option into one item per size.
#[derive(Default)]
pub struct VariantExpander {
    specs: Vec<SizeSpec>,
    title_filters: Vec<(Handle, TitleFilter)>,
}

impl core::fmt::Debug for VariantExpander {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("VariantExpander")
            .field("specs", &self.specs)
            .field("title_filters", &self.title_filters.len())
            .finish()
    }
}

impl VariantExpander {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// Treat options with this handle as a size axis.
    pub fn handle_size(&mut self, option_handle: Handle, modifiers: SizeModifiers) {
        self.specs.push(SizeSpec::new(option_handle, modifiers));
    }

    /// Rewrite the size text shown in variant titles for items that carry
    /// the given option.
    pub fn filter_title_attribute<F>(&mut self, option_handle: Handle, filter: F)
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        self.title_filters.push((option_handle, Box::new(filter)));
    }

    /// First of the item's options registered as a size axis.
    pub fn size_option<'a>(&self, options: &'a [ProductOption]) -> Option<&'a ProductOption> {
        options
            .iter()
            .find(|option| self.specs.iter().any(|spec| spec.option_handle == *option.handle()))
    }

    pub fn spec_for(&self, option_handle: &Handle) -> DomainResult<&SizeSpec> {
        self.specs
            .iter()
            .find(|spec| spec.option_handle == *option_handle)
            .ok_or_else(|| DomainError::missing_size_spec(option_handle.as_str()))
    }

    /// One derived item per attribute of `size`. `item_options` are all the
    /// options of the base item, used to select title filters. The base item
    /// is left untouched.
    pub fn expand(
        &self,
        base: &Item,
        size: &ProductOption,
        item_options: &[ProductOption],
        option_names_in_title: bool,
    ) -> DomainResult<Vec<Item>> {
        let spec = self.spec_for(size.handle())?;
        let mut variants = Vec::with_capacity(size.attributes().len());

        for raw in size.attributes() {
            let value = spec.process(raw)?;
            let value_slug = slug(&value.text);

            let mut variant = base.derive(&value.text);
            if let Some(surcharge) = value.surcharge {
                variant.price = base.price.add(surcharge)?;
                debug!(item = %variant.handle(), from = %base.price, to = %variant.price, "variant price changed");
            }
            variant.size = value.text.clone();
            variant.sku = format!("{}-{}", base.sku, value_slug);
            variant.item_group_id = base.sku.clone();
            variant.mpn = base.sku.clone();

            if option_names_in_title {
                let shown = self.title_text(&value.text, item_options);
                variant.title = format!("{} ({})", base.title, shown);
            }
            variants.push(variant);
        }
        Ok(variants)
    }

    fn title_text(&self, size_text: &str, item_options: &[ProductOption]) -> String {
        let mut text = size_text.to_string();
        for (handle, filter) in &self.title_filters {
            if item_options.iter().any(|o| o.handle() == handle) {
                let filtered = filter(&text);
                debug!(option = %handle, from = %text, to = %filtered, "title attribute filtered");
                text = filtered;
            }
        }
        text
    }
}
