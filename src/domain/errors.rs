//! Domain validation errors.

use std::fmt;

/// Errors that can occur during domain value object validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The phone fragment contained no digits at all.
    EmptyPhone,

    /// The phone fragment could not be brought into dispatchable form.
    InvalidPhone(String),

    /// The configured country code is not a 1-3 digit calling code.
    InvalidCountryCode(String),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyPhone => write!(f, "Phone number cannot be empty"),
            Self::InvalidPhone(phone) => write!(f, "Invalid phone number: {}", phone),
            Self::InvalidCountryCode(code) => write!(f, "Invalid country code: {}", code),
        }
    }
}

impl std::error::Error for ValidationError {}
