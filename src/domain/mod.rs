//! Storefront domain: cart, orders, catalog and their events.
pub mod aggregates;
pub mod events;
pub mod value_objects;

use validator::ValidationError;

/// Validator for required text fields: rejects empty or whitespace-only input.
pub fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}
