use std::collections::HashMap;

use rail_common::config::DiscountConfig;

use crate::error::{BookingError, Result};

/// Flat-amount coupon table.
#[derive(Debug, Clone, Default)]
pub struct DiscountBook {
    required: bool,
    codes: HashMap<String, f64>,
}

impl DiscountBook {
    pub fn new(required: bool, codes: HashMap<String, f64>) -> Self {
        Self { required, codes }
    }

    /// Rejects codes whose amount is negative or not a finite number.
    pub fn from_config(config: &DiscountConfig) -> Result<Self> {
        if let Some((code, amount)) = config
            .codes
            .iter()
            .find(|(_, amount)| !amount.is_finite() || **amount < 0.0)
        {
            return Err(BookingError::InvalidDiscount(format!(
                "code {code} has invalid amount {amount}"
            )));
        }
        Ok(Self::new(config.required, config.codes.clone()))
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    /// Reduction granted by `code`. A blank code counts as no code.
    pub fn reduction(&self, code: Option<&str>) -> Result<f64> {
        match code.map(str::trim).filter(|code| !code.is_empty()) {
            Some(code) => self
                .codes
                .get(code)
                .copied()
                .ok_or_else(|| BookingError::InvalidDiscount(format!("unknown code {code}"))),
            None if self.required => Err(BookingError::InvalidDiscount(
                "a discount code is required".to_string(),
            )),
            None => Ok(0.0),
        }
    }

    /// `price` less the coupon amount, never below zero.
    pub fn apply(&self, price: f64, code: Option<&str>) -> Result<f64> {
        let reduction = self.reduction(code)?;
        Ok((price - reduction).max(0.0))
    }
}
