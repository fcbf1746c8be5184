// Pricing and the order path
pub mod coupons;
pub mod orders;
pub mod pricing;

// Catalog and marketing content
pub mod catalog;
pub mod promotions;

use rust_decimal::Decimal;
use validator::ValidationError;

pub(crate) fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("Must not be blank".into());
        Err(err)
    } else {
        Ok(())
    }
}

/// Amounts must be non-negative and fit the `DECIMAL(10, 2)` money columns
pub(crate) fn money_amount(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() && !value.is_zero() {
        let mut err = ValidationError::new("range");
        err.message = Some("Amount must not be negative".into());
        return Err(err);
    }
    if *value > pricing::MAX_MONEY_AMOUNT {
        let mut err = ValidationError::new("range");
        err.message = Some(format!("Amount must not exceed {}", pricing::MAX_MONEY_AMOUNT).into());
        return Err(err);
    }
    Ok(())
}
