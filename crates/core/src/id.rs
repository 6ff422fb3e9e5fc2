//! Surrogate identifiers assigned by the store on first save.

use serde::{Deserialize, Serialize};

/// Row identifier of a stored item.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(i64);

/// Row identifier of a stored collection.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CollectionId(i64);

/// Row identifier of a stored option.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OptionId(i64);

macro_rules! impl_row_id_newtype {
    ($t:ty) => {
        impl $t {
            pub fn from_raw(raw: i64) -> Self {
                Self(raw)
            }

            pub fn as_raw(&self) -> i64 {
                self.0
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<i64> for $t {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl From<$t> for i64 {
            fn from(value: $t) -> Self {
                value.0
            }
        }
    };
}

impl_row_id_newtype!(ItemId);
impl_row_id_newtype!(CollectionId);
impl_row_id_newtype!(OptionId);
