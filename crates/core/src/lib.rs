//! `shopfeed-core`: catalog foundation building blocks.
//!
//! This crate contains **pure domain** primitives shared by the catalog, the
//! option scraper and the feed compiler (no infrastructure concerns).

pub mod error;
pub mod handle;
pub mod id;
pub mod price;

pub use error::{DomainError, DomainResult};
pub use handle::{Handle, slug};
pub use id::{CollectionId, ItemId, OptionId};
pub use price::Price;
