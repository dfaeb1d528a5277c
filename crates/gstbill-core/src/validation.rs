//! # Validation Module
//!
//! Input validation for requests entering the cart and billing engines.
//! All validators return [`DomainError::InvalidInput`] with a message that
//! names the offending field; business-rule checks (stock, category
//! exclusivity) live with the engines, not here.

use crate::error::DomainError;
use crate::money::GstRate;
use crate::types::{CustomerInfo, SlParty};
use crate::MAX_LINE_QUANTITY;

pub type ValidationResult = Result<(), DomainError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a SKU: non-empty, at most 50 characters, alphanumeric plus
/// hyphen/underscore.
pub fn validate_sku(sku: &str) -> ValidationResult {
    let sku = sku.trim();

    if sku.is_empty() {
        return Err(DomainError::invalid_input("SKU is required"));
    }
    if sku.len() > 50 {
        return Err(DomainError::invalid_input("SKU must be at most 50 characters"));
    }
    if !sku.chars().all(|c| c.is_alphanumeric() || c == '-' || c == '_') {
        return Err(DomainError::invalid_input(
            "SKU must contain only letters, numbers, hyphens, and underscores",
        ));
    }

    Ok(())
}

/// Validates a required name-ish field (category, product, customer...).
pub fn validate_name(field: &str, value: &str) -> ValidationResult {
    let value = value.trim();

    if value.is_empty() {
        return Err(DomainError::invalid_input(format!("{field} is required")));
    }
    if value.len() > 200 {
        return Err(DomainError::invalid_input(format!(
            "{field} must be at most 200 characters"
        )));
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a cart quantity: at least 1, at most [`MAX_LINE_QUANTITY`].
pub fn validate_quantity(quantity: i64) -> ValidationResult {
    if quantity < 1 {
        return Err(DomainError::invalid_input("Quantity must be at least 1"));
    }
    if quantity > MAX_LINE_QUANTITY {
        return Err(DomainError::invalid_input(format!(
            "Quantity must be at most {MAX_LINE_QUANTITY}"
        )));
    }
    Ok(())
}

/// Validates a unit price in paise (strictly positive).
pub fn validate_price_paise(price_paise: i64) -> ValidationResult {
    if price_paise <= 0 {
        return Err(DomainError::invalid_input("Price must be greater than 0"));
    }
    Ok(())
}

/// Validates a GST rate in basis points (0-100%).
pub fn validate_gst_rate_bps(bps: u32) -> ValidationResult {
    if bps > GstRate::MAX_BPS {
        return Err(DomainError::invalid_input("GST rate must be between 0 and 100"));
    }
    Ok(())
}

/// Validates a stock level (never negative).
pub fn validate_stock(stock: i64) -> ValidationResult {
    if stock < 0 {
        return Err(DomainError::invalid_input("Stock cannot be negative"));
    }
    Ok(())
}

// =============================================================================
// Composite Validators
// =============================================================================

/// Required fields for a primary-ledger invoice: customer name and
/// contact. Address stays optional.
pub fn validate_customer(customer: &CustomerInfo) -> ValidationResult {
    if customer.name.trim().is_empty() || customer.contact.trim().is_empty() {
        return Err(DomainError::invalid_input(
            "Customer name and contact are required",
        ));
    }
    Ok(())
}

/// Required fields for an SL invoice party. `label` is "Bill To" or
/// "Ship To" for the error message.
pub fn validate_sl_party(label: &str, party: &SlParty) -> ValidationResult {
    if party.name.trim().is_empty()
        || party.address.trim().is_empty()
        || party.mobile.trim().is_empty()
    {
        return Err(DomainError::invalid_input(format!(
            "{label} details are required (name, address, mobile)"
        )));
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_sku() {
        assert!(validate_sku("PEN-BLUE_01").is_ok());
        assert!(validate_sku("").is_err());
        assert!(validate_sku("has space").is_err());
        assert!(validate_sku(&"A".repeat(51)).is_err());
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("Category name", "Stationery").is_ok());
        let err = validate_name("Category name", "  ").unwrap_err();
        assert!(err.to_string().contains("Category name"));
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(999).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-3).is_err());
        assert!(validate_quantity(1000).is_err());
    }

    #[test]
    fn test_validate_price_and_rate() {
        assert!(validate_price_paise(1).is_ok());
        assert!(validate_price_paise(0).is_err());
        assert!(validate_gst_rate_bps(1800).is_ok());
        assert!(validate_gst_rate_bps(10_000).is_ok());
        assert!(validate_gst_rate_bps(10_001).is_err());
    }

    #[test]
    fn test_validate_customer() {
        let ok = CustomerInfo {
            name: "Asha".to_string(),
            address: None,
            contact: "9876543210".to_string(),
        };
        assert!(validate_customer(&ok).is_ok());

        let missing = CustomerInfo {
            name: "Asha".to_string(),
            address: Some("12 Main Rd".to_string()),
            contact: " ".to_string(),
        };
        assert!(validate_customer(&missing).is_err());
    }

    #[test]
    fn test_validate_sl_party() {
        let party = SlParty {
            name: "Ravi".to_string(),
            address: "".to_string(),
            mobile: "9876543210".to_string(),
        };
        let err = validate_sl_party("Ship To", &party).unwrap_err();
        assert!(err.to_string().contains("Ship To"));
    }
}
