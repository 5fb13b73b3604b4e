//! Domain value objects and types.
//!
//! This module contains type-safe wrappers for dispatch identifiers. These
//! value objects validate at construction time so that an unnormalized phone
//! number can never reach the transport.

pub mod errors;
pub mod phone;

pub use errors::ValidationError;
pub use phone::{CountryCode, PhoneNumber};
