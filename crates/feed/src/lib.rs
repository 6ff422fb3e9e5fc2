//! Feed compilation.
//!
//! A [`FeedCompiler`] walks collections in order, expands items carrying a
//! registered size option into variants, admits items through per-mode
//! rules and serializes the admitted rows through a column [`Mapping`].

pub mod admission;
pub mod compiler;
pub mod error;
pub mod field;
pub mod format;
pub mod mapping;
pub mod variant;

pub use admission::{Admission, AdmissionRule};
pub use compiler::{FeedCompiler, FeedOutput, FeedReport, FeedSettings, OptionSource};
pub use error::FeedError;
pub use field::Field;
pub use mapping::{Column, FeedMode, Mapping, Rule};
pub use variant::{SizeModifiers, SizeSpec, SizeValue, VariantExpander};
