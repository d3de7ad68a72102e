//! Write-time validation helpers shared by every aggregate.

use crate::error::{DomainError, DomainResult};
use crate::value_object::Money;

/// Required text field: trimmed, must not be blank.
pub fn required_text(field: &str, value: &str) -> DomainResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DomainError::constraint(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}

/// Price that must be strictly positive.
pub fn positive_price(field: &str, price: Money) -> DomainResult<()> {
    if !price.is_positive() {
        return Err(DomainError::constraint(format!(
            "the {field} must be strictly positive"
        )));
    }
    Ok(())
}
