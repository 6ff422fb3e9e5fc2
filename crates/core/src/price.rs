//! Non-negative decimal prices.

use core::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// Item price. Always `>= 0`.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    pub const ZERO: Price = Price(Decimal::ZERO);

    pub fn new(amount: Decimal) -> DomainResult<Self> {
        if amount < Decimal::ZERO {
            return Err(DomainError::validation(format!("price cannot be negative: {amount}")));
        }
        Ok(Self(amount))
    }

    pub fn amount(&self) -> Decimal {
        self.0
    }

    /// A zero price counts as missing for feed admission.
    pub fn is_set(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// Add a surcharge, e.g. one extracted from a size option label.
    pub fn add(self, surcharge: Price) -> DomainResult<Price> {
        self.0
            .checked_add(surcharge.0)
            .map(Price)
            .ok_or_else(|| DomainError::validation(format!("price {self} plus surcharge {surcharge} overflows")))
    }

    /// `1234.5` → `"1,234.50"`. Rounds half away from zero.
    pub fn grouped_two_decimals(&self) -> String {
        let rounded = self.0.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        let fixed = format!("{rounded:.2}");
        let (whole, frac) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

        let digits: Vec<char> = whole.chars().collect();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, c) in digits.iter().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(*c);
        }
        format!("{grouped}.{frac}")
    }
}

impl FromStr for Price {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let amount = Decimal::from_str(s.trim())
            .map_err(|e| DomainError::validation(format!("invalid price '{s}': {e}")))?;
        Self::new(amount)
    }
}

impl core::fmt::Display for Price {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}
