//! Input validation for contact and template fields.

use std::fmt;

use alert_core::Contact;

/// Validation error types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Invalid phone number format.
    InvalidPhone(String),
    /// Priority outside the accepted range.
    InvalidPriority(u32),
    /// Value too long.
    TooLong {
        field: String,
        max: usize,
        actual: usize,
    },
    /// Empty value where one is required.
    Empty(String),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::InvalidPhone(msg) => write!(f, "Invalid phone number: {}", msg),
            ValidationError::InvalidPriority(p) => {
                write!(f, "Invalid priority {} (must be >= 1)", p)
            }
            ValidationError::TooLong { field, max, actual } => {
                write!(f, "{} is too long ({} chars, max {})", field, actual, max)
            }
            ValidationError::Empty(field) => write!(f, "{} cannot be empty", field),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Maximum allowed length for contact names.
pub const MAX_NAME_LENGTH: usize = 128;

/// Maximum allowed length for relationship labels.
pub const MAX_RELATIONSHIP_LENGTH: usize = 64;

/// Validate a phone number (E.164-leaning format check).
///
/// Accepts an optional leading `+` followed by 7 to 15 digits; spaces
/// and dashes are tolerated and ignored.
pub fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    let phone = phone.trim();

    if phone.is_empty() {
        return Err(ValidationError::Empty("phone".to_string()));
    }

    let digits: String = phone
        .chars()
        .filter(|c| !matches!(c, ' ' | '-'))
        .skip_while(|c| *c == '+')
        .collect();

    if phone.matches('+').count() > 1 || (phone.contains('+') && !phone.starts_with('+')) {
        return Err(ValidationError::InvalidPhone(
            "'+' is only allowed as a leading character".to_string(),
        ));
    }

    if !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::InvalidPhone(
            "must contain only digits after the optional '+'".to_string(),
        ));
    }

    if digits.len() < 7 || digits.len() > 15 {
        return Err(ValidationError::InvalidPhone(format!(
            "expected 7-15 digits, got {}",
            digits.len()
        )));
    }

    Ok(())
}

/// Validate a delivery priority. 1 is the highest priority.
pub fn validate_priority(priority: u32) -> Result<(), ValidationError> {
    if priority == 0 {
        return Err(ValidationError::InvalidPriority(priority));
    }
    Ok(())
}

/// Validate a whole contact record.
pub fn validate_contact(contact: &Contact) -> Result<(), ValidationError> {
    if contact.name.trim().is_empty() {
        return Err(ValidationError::Empty("name".to_string()));
    }
    if contact.name.len() > MAX_NAME_LENGTH {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: MAX_NAME_LENGTH,
            actual: contact.name.len(),
        });
    }
    if contact.relationship.len() > MAX_RELATIONSHIP_LENGTH {
        return Err(ValidationError::TooLong {
            field: "relationship".to_string(),
            max: MAX_RELATIONSHIP_LENGTH,
            actual: contact.relationship.len(),
        });
    }
    validate_phone(&contact.phone)?;
    validate_priority(contact.priority)?;
    Ok(())
}
