//! PhoneNumber value object.

use super::errors::ValidationError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Minimum number of national digits a fragment must carry to be considered.
pub const MIN_NATIONAL_DIGITS: usize = 10;

/// A country calling code such as `91`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CountryCode(String);

impl CountryCode {
    /// Create a new CountryCode, accepting an optional leading `+`.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::InvalidCountryCode` unless the code is 1-3 digits.
    pub fn new(code: impl Into<String>) -> Result<Self, ValidationError> {
        let code = code.into();
        let digits = code.trim().trim_start_matches('+');

        if digits.is_empty() || digits.len() > 3 || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(ValidationError::InvalidCountryCode(code));
        }

        Ok(Self(digits.to_string()))
    }

    /// Get the code digits as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for CountryCode {
    fn default() -> Self {
        Self("91".to_string())
    }
}

impl fmt::Display for CountryCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "+{}", self.0)
    }
}

/// A dispatchable phone number: digits only, country code applied.
///
/// # Example
///
/// ```
/// use bulk_dispatch::domain::{CountryCode, PhoneNumber};
///
/// let phone = PhoneNumber::normalize("98765-43210", &CountryCode::default()).unwrap();
/// assert_eq!(phone.as_str(), "919876543210");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Bring a single raw fragment into dispatchable form.
    ///
    /// # Policy
    ///
    /// After stripping every non-digit character:
    /// - 10 digits: the country code is prepended
    /// - country code followed by 10 digits: kept as is
    /// - `0`, country code, 10 digits: the redundant leading zero is dropped
    /// - anything else is rejected
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::EmptyPhone` for a fragment without digits and
    /// `ValidationError::InvalidPhone` for any length the policy does not accept.
    pub fn normalize(raw: &str, country: &CountryCode) -> Result<Self, ValidationError> {
        let digits = digits_only(raw);
        if digits.is_empty() {
            return Err(ValidationError::EmptyPhone);
        }

        let code = country.as_str();
        let full_len = MIN_NATIONAL_DIGITS + code.len();

        if digits.len() == MIN_NATIONAL_DIGITS {
            return Ok(Self(format!("{}{}", code, digits)));
        }
        if digits.len() == full_len && digits.starts_with(code) {
            return Ok(Self(digits));
        }
        if digits.len() == full_len + 1
            && digits.starts_with('0')
            && digits[1..].starts_with(code)
        {
            return Ok(Self(digits[1..].to_string()));
        }

        Err(ValidationError::InvalidPhone(raw.trim().to_string()))
    }

    /// Get the phone number as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Convert into the underlying String.
    pub fn into_inner(self) -> String {
        self.0
    }
}

/// Strip everything but ASCII digits.
pub fn digits_only(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

// Serde support - serialize as string
impl Serialize for PhoneNumber {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.serialize(serializer)
    }
}

// Serde support - deserialize from an already-normalized string
impl<'de> Deserialize<'de> for PhoneNumber {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        if s.len() < MIN_NATIONAL_DIGITS || !s.chars().all(|c| c.is_ascii_digit()) {
            return Err(serde::de::Error::custom(ValidationError::InvalidPhone(s)));
        }
        Ok(PhoneNumber(s))
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn india() -> CountryCode {
        CountryCode::new("91").unwrap()
    }

    #[test]
    fn test_ten_digits_gets_country_code() {
        let phone = PhoneNumber::normalize("9876543210", &india()).unwrap();
        assert_eq!(phone.as_str(), "919876543210");
    }

    #[test]
    fn test_punctuation_is_stripped() {
        let phone = PhoneNumber::normalize("+91 (98765) 432-10", &india()).unwrap();
        assert_eq!(phone.as_str(), "919876543210");
    }

    #[test]
    fn test_already_normalized_is_unchanged() {
        let once = PhoneNumber::normalize("919876543210", &india()).unwrap();
        let twice = PhoneNumber::normalize(once.as_str(), &india()).unwrap();
        assert_eq!(once, twice);
        assert_eq!(twice.as_str(), "919876543210");
    }

    #[test]
    fn test_redundant_leading_zero_dropped() {
        let phone = PhoneNumber::normalize("0919876543210", &india()).unwrap();
        assert_eq!(phone.as_str(), "919876543210");
    }

    #[test]
    fn test_other_lengths_rejected() {
        assert_eq!(
            PhoneNumber::normalize("12345", &india()),
            Err(ValidationError::InvalidPhone("12345".to_string()))
        );
        // 12 digits without the default code prefix
        assert!(PhoneNumber::normalize("449876543210", &india()).is_err());
        // 13 digits not starting with 0 + code
        assert!(PhoneNumber::normalize("1919876543210", &india()).is_err());
        assert!(PhoneNumber::normalize("98765432101234", &india()).is_err());
    }

    #[test]
    fn test_empty_fragment() {
        assert_eq!(
            PhoneNumber::normalize(" - ", &india()),
            Err(ValidationError::EmptyPhone)
        );
    }

    #[test]
    fn test_single_digit_country_code() {
        let us = CountryCode::new("+1").unwrap();
        let phone = PhoneNumber::normalize("415-555-1234", &us).unwrap();
        assert_eq!(phone.as_str(), "14155551234");
        let again = PhoneNumber::normalize("14155551234", &us).unwrap();
        assert_eq!(again, phone);
    }

    #[test]
    fn test_country_code_validation() {
        assert!(CountryCode::new("91").is_ok());
        assert!(CountryCode::new("+44").is_ok());
        assert!(CountryCode::new("").is_err());
        assert!(CountryCode::new("1234").is_err());
        assert!(CountryCode::new("9a").is_err());
        assert_eq!(CountryCode::new("+44").unwrap().to_string(), "+44");
    }

    #[test]
    fn test_phone_serialization() {
        let phone = PhoneNumber::normalize("9876543210", &india()).unwrap();
        let json = serde_json::to_string(&phone).unwrap();
        assert_eq!(json, "\"919876543210\"");

        let back: PhoneNumber = serde_json::from_str(&json).unwrap();
        assert_eq!(back, phone);
    }

    #[test]
    fn test_phone_deserialization_invalid_fails() {
        let result: Result<PhoneNumber, _> = serde_json::from_str("\"+91 98765\"");
        assert!(result.is_err());
    }
}
