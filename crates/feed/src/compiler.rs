//! Feed compilation: expansion, admission, cleanup, serialization.

use serde::Deserialize;
use tracing::{debug, info, warn};

use shopfeed_catalog::{Collection, Item, ProductOption, StoreResult};
use shopfeed_core::Handle;

use crate::admission::{Admission, AdmissionRule};
use crate::error::FeedError;
use crate::field::Field;
use crate::format::{clean_description, clean_sku, encode_cell, strict_price};
use crate::mapping::{Column, FeedMode, Mapping, Rule};
use crate::variant::VariantExpander;

/// Where the compiler finds an item's options.
pub trait OptionSource {
    fn item_options(&self, item: &Handle) -> StoreResult<Vec<ProductOption>>;
}

impl<S> OptionSource for S
where
    S: shopfeed_catalog::CatalogStore + ?Sized,
{
    fn item_options(&self, item: &Handle) -> StoreResult<Vec<ProductOption>> {
        shopfeed_catalog::CatalogStore::item_options(self, item)
    }
}

/// Caller-facing feed options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FeedSettings {
    pub excluded_handles: Vec<Handle>,
    /// Vendors whose items never enter the feed.
    pub excluded_brands: Vec<String>,
    /// Color for admitted items that have none.
    pub default_color: Option<String>,
    /// Append the size to variant titles: `"{title} ({size})"`.
    pub option_names_in_title: bool,
}

impl FeedSettings {
    pub fn is_excluded(&self, item: &Item) -> bool {
        self.excluded_handles.contains(item.handle()) || self.excluded_brands.contains(&item.vendor)
    }
}

/// What happened to the items of one compilation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedReport {
    pub admitted: usize,
    pub excluded: Vec<Handle>,
    pub rejected: Vec<(Handle, AdmissionRule)>,
    pub warnings: Vec<(Handle, AdmissionRule)>,
    /// Items dropped because their data could not be processed.
    pub failed: Vec<(Handle, String)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedOutput {
    pub payload: String,
    pub report: FeedReport,
}

/// Turns collections into one delimited payload.
#[derive(Debug)]
pub struct FeedCompiler {
    mode: FeedMode,
    mapping: Mapping,
    settings: FeedSettings,
    expander: VariantExpander,
    defaults: Vec<(Field, String)>,
}

struct Run {
    admission: Admission,
    rows: Vec<Item>,
    report: FeedReport,
}

impl FeedCompiler {
    pub fn new(mode: FeedMode) -> Self {
        Self {
            mode,
            mapping: mode.mapping(),
            settings: FeedSettings::default(),
            expander: VariantExpander::new(),
            defaults: Vec::new(),
        }
    }

    pub fn strict() -> Self {
        Self::new(FeedMode::Strict)
    }

    pub fn permissive() -> Self {
        Self::new(FeedMode::Permissive)
    }

    pub fn with_settings(mut self, settings: FeedSettings) -> Self {
        if let Some(color) = &settings.default_color {
            self.set_default(Field::Color, color.clone());
        }
        self.settings = settings;
        self
    }

    pub fn with_expander(mut self, expander: VariantExpander) -> Self {
        self.expander = expander;
        self
    }

    pub fn mode(&self) -> FeedMode {
        self.mode
    }

    pub fn mapping(&self) -> &Mapping {
        &self.mapping
    }

    pub fn expander_mut(&mut self) -> &mut VariantExpander {
        &mut self.expander
    }

    /// Value for an attribute still empty once an item is admitted. A later
    /// default for the same field replaces the earlier one.
    pub fn set_default(&mut self, field: Field, value: impl Into<String>) {
        let value = value.into();
        match self.defaults.iter_mut().find(|(f, _)| *f == field) {
            Some(slot) => slot.1 = value,
            None => self.defaults.push((field, value)),
        }
    }

    pub fn exclude_item(&mut self, handle: Handle) {
        self.settings.excluded_handles.push(handle);
    }

    pub fn exclude_brand(&mut self, vendor: impl Into<String>) {
        self.settings.excluded_brands.push(vendor.into());
    }

    /// Compile every member of every collection, in order.
    ///
    /// Admission failures skip the item and are reported. A configuration
    /// error (an unregistered size option) or a store failure aborts the run.
    pub fn compile<S>(&self, collections: &[Collection], options: &S) -> Result<FeedOutput, FeedError>
    where
        S: OptionSource + ?Sized,
    {
        info!(mode = ?self.mode, collections = collections.len(), "compiling feed");
        let mut run = Run {
            admission: Admission::new(self.mode),
            rows: Vec::new(),
            report: FeedReport::default(),
        };

        for collection in collections {
            for item in collection.items() {
                self.process(item, options, &mut run)?;
            }
        }

        let payload = self.render(&run.rows);
        run.report.admitted = run.rows.len();
        info!(
            admitted = run.report.admitted,
            rejected = run.report.rejected.len(),
            excluded = run.report.excluded.len(),
            "feed compiled"
        );
        Ok(FeedOutput {
            payload,
            report: run.report,
        })
    }

    fn process<S>(&self, item: &Item, options: &S, run: &mut Run) -> Result<(), FeedError>
    where
        S: OptionSource + ?Sized,
    {
        if run.admission.contains(item.handle()) {
            warn!(item = %item.handle(), "skipped item: already in feed");
            run.report.rejected.push((item.handle().clone(), AdmissionRule::ItemNotDuplicate));
            return Ok(());
        }
        if self.settings.is_excluded(item) {
            info!(item = %item.handle(), "skipped item: excluded");
            run.report.excluded.push(item.handle().clone());
            return Ok(());
        }

        let item_options = if self.expander.is_empty() {
            Vec::new()
        } else {
            options.item_options(item.handle())?
        };
        let Some(size) = self.expander.size_option(&item_options) else {
            self.admit(item.clone(), run);
            return Ok(());
        };

        // The base item is judged once and then stands in for its variants.
        if let Err(rule) = run.admission.check(item) {
            reject(item, rule, run);
            return Ok(());
        }
        run.admission.record(item);

        let variants = match self
            .expander
            .expand(item, size, &item_options, self.settings.option_names_in_title)
        {
            Ok(variants) => variants,
            Err(e) if e.is_configuration() => return Err(e.into()),
            Err(e) => {
                warn!(item = %item.handle(), error = %e, "size variants could not be built");
                run.report.failed.push((item.handle().clone(), e.to_string()));
                return Ok(());
            }
        };
        debug!(item = %item.handle(), option = %size.handle(), variants = variants.len(), "expanded size variants");
        for variant in variants {
            self.admit(variant, run);
        }
        Ok(())
    }

    fn admit(&self, mut item: Item, run: &mut Run) {
        let warnings = match run.admission.check(&item) {
            Ok(warnings) => warnings,
            Err(rule) => {
                reject(&item, rule, run);
                return;
            }
        };
        for rule in warnings {
            warn!(item = %item.handle(), rule = rule.name(), "admission warning");
            run.report.warnings.push((item.handle().clone(), rule));
        }

        item.sku = clean_sku(&item.sku);
        for (field, value) in &self.defaults {
            if field.is_empty(&item) {
                if let Err(e) = field.write(&mut item, value) {
                    warn!(item = %item.handle(), field = %field, error = %e, "default value not applied");
                }
            }
        }

        debug!(item = %item.handle(), "adding item to feed");
        run.admission.record(&item);
        run.rows.push(item);
    }

    fn render(&self, rows: &[Item]) -> String {
        let delimiter = self.mode.delimiter().to_string();
        let mut out = self.mapping.header().collect::<Vec<_>>().join(&delimiter);
        out.push('\n');

        for item in rows {
            let cells: Vec<String> = self
                .mapping
                .columns()
                .iter()
                .map(|column| encode_cell(self.mode, &self.cell(column, item)))
                .collect();
            out.push_str(&cells.join(&delimiter));
            out.push('\n');
        }
        out
    }

    fn cell(&self, column: &Column, item: &Item) -> String {
        match &column.rule {
            Rule::Literal(value) => value.clone(),
            Rule::Fallback => self.mode.fallback(&column.name, item),
            Rule::Attr(field) => self.field_text(*field, item),
            Rule::AttrOrFallback(field) => {
                let value = self.field_text(*field, item);
                if value.is_empty() {
                    self.mode.fallback(&column.name, item)
                } else {
                    value
                }
            }
        }
    }

    fn field_text(&self, field: Field, item: &Item) -> String {
        match (self.mode, field) {
            (FeedMode::Strict, Field::Description) => clean_description(&item.description),
            (FeedMode::Strict, Field::Price) => strict_price(item.price),
            _ => field.read(item).into_owned(),
        }
    }
}

fn reject(item: &Item, rule: AdmissionRule, run: &mut Run) {
    warn!(item = %item.handle(), rule = rule.name(), "item failed admission");
    run.report.rejected.push((item.handle().clone(), rule));
}
