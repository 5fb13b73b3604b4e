//! Contact normalization.
//!
//! Turns the raw phone field of a contact into zero or more dispatch targets.
//! A field may hold several numbers separated by commas, each with arbitrary
//! punctuation; every number that survives the country-code policy becomes its
//! own target carrying the same name, fields and message.

use crate::domain::phone::{digits_only, MIN_NATIONAL_DIGITS};
use crate::domain::{CountryCode, PhoneNumber};
use crate::models::contact::is_blank_cell;
use crate::models::Contact;
use tracing::debug;

/// Result of fanning out one contact.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Expansion {
    /// One copy of the contact per dispatchable number, in field order
    pub targets: Vec<Contact>,

    /// Fragments that looked like numbers but failed the country-code policy
    pub rejected: Vec<String>,
}

/// Pure normalizer bound to a default country code.
#[derive(Debug, Clone, Default)]
pub struct ContactNormalizer {
    country: CountryCode,
}

impl ContactNormalizer {
    pub fn new(country: CountryCode) -> Self {
        Self { country }
    }

    pub fn country(&self) -> &CountryCode {
        &self.country
    }

    /// Dispatchable identifiers found in a raw phone field, in field order.
    ///
    /// Fragments shorter than ten digits are dropped, as are fragments the
    /// country-code policy rejects. A number repeated within the same field
    /// is only returned once.
    pub fn identifiers(&self, raw_phone: &str) -> Vec<PhoneNumber> {
        self.split(raw_phone).0
    }

    fn split(&self, raw_phone: &str) -> (Vec<PhoneNumber>, Vec<String>) {
        let mut found: Vec<PhoneNumber> = Vec::new();
        let mut rejected = Vec::new();
        if is_blank_cell(raw_phone) {
            return (found, rejected);
        }

        for fragment in raw_phone.split(',').map(str::trim) {
            if digits_only(fragment).len() < MIN_NATIONAL_DIGITS {
                if !fragment.is_empty() {
                    debug!(fragment = %fragment, "Dropping short phone fragment");
                }
                continue;
            }

            match PhoneNumber::normalize(fragment, &self.country) {
                Ok(phone) if !found.contains(&phone) => found.push(phone),
                Ok(_) => debug!(fragment = %fragment, "Dropping repeated number"),
                Err(e) => {
                    debug!(fragment = %fragment, error = %e, "Rejecting phone fragment");
                    rejected.push(fragment.to_string());
                }
            }
        }
        (found, rejected)
    }

    /// Fan a contact out into one target per dispatchable number.
    ///
    /// Empty targets and no rejected fragments means the field held nothing
    /// resembling a number.
    pub fn expand(&self, contact: &Contact) -> Expansion {
        let (found, rejected) = self.split(&contact.raw_phone);
        Expansion {
            targets: found
                .into_iter()
                .map(|phone| contact.with_normalized(phone.into_inner()))
                .collect(),
            rejected,
        }
    }
}
