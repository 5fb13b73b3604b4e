//! Data models for dispatch runs.
//!
//! This module contains the data structures representing contacts, jobs,
//! per-target attempt results and run summaries.

pub mod contact;
pub mod job;
pub mod outcome;

pub use contact::Contact;
pub use job::{Attachment, DispatchJob, MAX_ATTACHMENT_BYTES};
pub use outcome::{AttemptResult, BatchSummary, Outcome, SessionState};
