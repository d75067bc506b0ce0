use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PricingError {
    #[error("no price configured for shift {0}")]
    UnknownShift(i32),
}

/// Shift-indexed price and seniority-discount tables.
///
/// Both tables are 1-indexed by shift number: `base_prices[0]` is shift 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceTable {
    pub base_prices: Vec<i64>,
    pub seniority_discounts: Vec<i64>,
    /// Charged when a shift has no configured price
    pub fallback_price: i64,
}

impl Default for PriceTable {
    fn default() -> Self {
        Self {
            base_prices: vec![250, 360, 360, 360],
            seniority_discounts: vec![10, 20, 20, 20],
            fallback_price: 360,
        }
    }
}

impl PriceTable {
    pub fn shift_count(&self) -> usize {
        self.base_prices.len()
    }

    /// List price for a new camper on `shift_nr`
    pub fn base_price(&self, shift_nr: i32) -> Result<i64, PricingError> {
        usize::try_from(shift_nr)
            .ok()
            .and_then(|nr| nr.checked_sub(1))
            .and_then(|idx| self.base_prices.get(idx).copied())
            .ok_or(PricingError::UnknownShift(shift_nr))
    }

    pub fn compute_price(&self, shift_nr: i32, is_old: bool) -> Result<i64, PricingError> {
        let base = self.base_price(shift_nr)?;
        if !is_old {
            return Ok(base);
        }
        let idx = (shift_nr - 1) as usize;
        let discount = self
            .seniority_discounts
            .get(idx)
            .copied()
            .ok_or(PricingError::UnknownShift(shift_nr))?;
        Ok(base - discount)
    }

    /// Price for a registration; an unknown shift is logged and charged the fallback
    pub fn price_or_fallback(&self, shift_nr: i32, is_old: bool) -> i64 {
        match self.compute_price(shift_nr, is_old) {
            Ok(price) => price,
            Err(e) => {
                error!(
                    shift_nr,
                    is_old,
                    fallback = self.fallback_price,
                    "Price table inconsistency: {}, charging fallback price",
                    e
                );
                self.fallback_price
            }
        }
    }

    /// Checks the tables line up and every discount fits inside its price
    pub fn validate(&self) -> Result<(), String> {
        if self.base_prices.is_empty() {
            return Err("base_prices must not be empty".to_string());
        }
        if self.base_prices.len() != self.seniority_discounts.len() {
            return Err(format!(
                "base_prices has {} entries but seniority_discounts has {}",
                self.base_prices.len(),
                self.seniority_discounts.len()
            ));
        }
        for (idx, (base, discount)) in self.base_prices.iter().zip(&self.seniority_discounts).enumerate() {
            if *discount < 0 || discount > base {
                return Err(format!("shift {} has discount {} for price {}", idx + 1, discount, base));
            }
        }
        if self.fallback_price < 0 {
            return Err("fallback_price must not be negative".to_string());
        }
        Ok(())
    }
}
