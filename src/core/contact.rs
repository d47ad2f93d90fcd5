//! Contact detail validation for checkout.

use crate::errors::{Error, Field, Result};
use regex::Regex;
use std::sync::LazyLock;

static PHONE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::unwrap_used)]
    Regex::new(r"^[6-9]\d{9}$").unwrap()
});

/// Minimum length of a trimmed customer name.
pub const MIN_NAME_LEN: usize = 2;

/// Validated contact details.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactDetails {
    /// Ten-digit mobile number
    pub phone: String,
    /// Trimmed customer name, when the flow collects one
    pub name: Option<String>,
}

/// Checks a mobile number: ten digits, the first one 6-9.
///
/// # Errors
/// Returns a [`Field::Phone`] validation error.
pub fn validate_phone(number: &str) -> Result<String> {
    if number.is_empty() {
        return Err(Error::validation(Field::Phone, "Phone number is required"));
    }
    if !PHONE_PATTERN.is_match(number) {
        return Err(Error::validation(
            Field::Phone,
            "Please enter a valid 10-digit Indian phone number",
        ));
    }
    Ok(number.to_string())
}

/// Checks a customer name and returns it trimmed.
///
/// # Errors
/// Returns a [`Field::Name`] validation error.
pub fn validate_name(name: &str) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(Error::validation(Field::Name, "Name is required"));
    }
    if trimmed.chars().count() < MIN_NAME_LEN {
        return Err(Error::validation(
            Field::Name,
            "Name must be at least 2 characters long",
        ));
    }
    Ok(trimmed.to_string())
}

/// Validates the phone and, when `name_required`, the name.
///
/// The phone is checked first, so a form with both fields wrong reports the phone.
///
/// # Errors
/// Returns the first field-level validation error.
pub fn validate_contact(
    phone: &str,
    name: Option<&str>,
    name_required: bool,
) -> Result<ContactDetails> {
    let phone = validate_phone(phone)?;
    let name = match name {
        Some(raw) => Some(validate_name(raw)?),
        None if name_required => return Err(Error::validation(Field::Name, "Name is required")),
        None => None,
    };
    Ok(ContactDetails { phone, name })
}
