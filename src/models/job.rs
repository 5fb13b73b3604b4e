//! Dispatch job model.

use super::contact::{is_blank_cell, Contact};
use crate::error::{DispatchError, DispatchResult};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Largest file the messaging surface accepts as an attachment (64 MiB).
pub const MAX_ATTACHMENT_BYTES: u64 = 64 * 1024 * 1024;

/// A file sent alongside (or instead of) the text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Attachment {
    /// Path to the file on the local machine
    pub path: PathBuf,

    /// Caption used when no other text source resolves
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
}

impl Attachment {
    /// Create an attachment without a caption.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            caption: None,
        }
    }

    /// Set the caption.
    pub fn with_caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = Some(caption.into());
        self
    }
}

/// One unit of work for the dispatch engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct DispatchJob {
    /// Recipients in dispatch order
    pub contacts: Vec<Contact>,

    /// Template with `{field}` placeholders
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,

    /// Message used for every contact that has no message of its own
    #[serde(alias = "message", skip_serializing_if = "Option::is_none")]
    pub literal_message: Option<String>,

    /// Optional file to send
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachment: Option<Attachment>,

    /// Contacts per batch; falls back to the configured default when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_size: Option<usize>,
}

impl DispatchJob {
    /// Create a job from already-parsed contacts.
    pub fn new(contacts: Vec<Contact>) -> Self {
        Self {
            contacts,
            ..Default::default()
        }
    }

    /// Build a job from a plain list of numbers sharing one message.
    ///
    /// Contacts are named `Contact N` after their position in the list; blank
    /// entries are skipped but still consume a position.
    pub fn from_numbers<I, S>(numbers: I, message: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let contacts = numbers
            .into_iter()
            .enumerate()
            .filter(|(_, number)| !number.as_ref().trim().is_empty())
            .map(|(i, number)| Contact::new(number.as_ref().trim(), format!("Contact {}", i + 1)))
            .collect();

        Self {
            contacts,
            literal_message: Some(message.into()),
            ..Default::default()
        }
    }

    /// Set the template.
    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = Some(template.into());
        self
    }

    /// Set the job-level literal message.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.literal_message = Some(message.into());
        self
    }

    /// Set the attachment.
    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachment = Some(attachment);
        self
    }

    /// Set the batch size.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = Some(batch_size);
        self
    }

    /// Template text if it carries anything.
    pub fn template_text(&self) -> Option<&str> {
        self.template.as_deref().filter(|t| !is_blank_cell(t))
    }

    /// Literal message if it carries anything.
    pub fn literal_text(&self) -> Option<&str> {
        self.literal_message.as_deref().filter(|m| !is_blank_cell(m))
    }

    /// Check the job before any session is opened.
    ///
    /// # Errors
    ///
    /// Returns `DispatchError::JobRejected` when no content source is present,
    /// the batch size is zero, or the attachment is missing or too large.
    pub fn validate(&self) -> DispatchResult<()> {
        if self.template_text().is_none()
            && self.literal_text().is_none()
            && self.attachment.is_none()
        {
            return Err(DispatchError::JobRejected(
                "a template, a message or an attachment is required".to_string(),
            ));
        }

        if self.batch_size == Some(0) {
            return Err(DispatchError::JobRejected(
                "batch size must be at least 1".to_string(),
            ));
        }

        if let Some(attachment) = &self.attachment {
            let metadata = std::fs::metadata(&attachment.path).map_err(|e| {
                DispatchError::JobRejected(format!(
                    "attachment {} is not readable: {}",
                    attachment.path.display(),
                    e
                ))
            })?;

            if !metadata.is_file() {
                return Err(DispatchError::JobRejected(format!(
                    "attachment {} is not a file",
                    attachment.path.display()
                )));
            }

            if metadata.len() > MAX_ATTACHMENT_BYTES {
                return Err(DispatchError::JobRejected(format!(
                    "attachment {} is {} bytes, limit is {}",
                    attachment.path.display(),
                    metadata.len(),
                    MAX_ATTACHMENT_BYTES
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_job_without_content_is_rejected() {
        let job = DispatchJob::new(vec![Contact::new("9876543210", "Asha")]);
        assert!(matches!(job.validate(), Err(DispatchError::JobRejected(_))));

        let blank = job.clone().with_message("   ").with_template("nan");
        assert!(matches!(blank.validate(), Err(DispatchError::JobRejected(_))));
    }

    #[test]
    fn test_job_with_any_content_source_is_accepted() {
        let contacts = vec![Contact::new("9876543210", "Asha")];
        assert!(DispatchJob::new(contacts.clone()).with_message("Hi").validate().is_ok());
        assert!(DispatchJob::new(contacts).with_template("Hi {name}").validate().is_ok());
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let job = DispatchJob::new(vec![])
            .with_message("Hi")
            .with_batch_size(0);
        assert!(job.validate().is_err());
    }

    #[test]
    fn test_missing_attachment_rejected() {
        let job = DispatchJob::new(vec![])
            .with_attachment(Attachment::new("/definitely/not/here.png"));
        let err = job.validate().unwrap_err();
        assert!(err.to_string().contains("not readable"));
    }

    #[test]
    fn test_existing_attachment_accepted() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"png").unwrap();

        let job = DispatchJob::new(vec![]).with_attachment(Attachment::new(file.path()));
        assert!(job.validate().is_ok());
    }

    #[test]
    fn test_from_numbers() {
        let job = DispatchJob::from_numbers(vec!["9876543210", " ", "8765432109 "], "Hello");

        assert_eq!(job.contacts.len(), 2);
        assert_eq!(job.contacts[0].display_name, "Contact 1");
        assert_eq!(job.contacts[1].display_name, "Contact 3");
        assert_eq!(job.contacts[1].raw_phone, "8765432109");
        assert_eq!(job.literal_message.as_deref(), Some("Hello"));
    }

    #[test]
    fn test_job_deserialization() {
        let json = r#"{
            "contacts": [{"phone": "9876543210", "name": "Asha"}],
            "message": "Hi {name}",
            "attachment": {"path": "/tmp/flyer.png", "caption": "New stock"},
            "batch_size": 5
        }"#;

        let job: DispatchJob = serde_json::from_str(json).unwrap();
        assert_eq!(job.contacts.len(), 1);
        assert_eq!(job.literal_message.as_deref(), Some("Hi {name}"));
        assert_eq!(job.batch_size, Some(5));
        let attachment = job.attachment.unwrap();
        assert_eq!(attachment.caption.as_deref(), Some("New stock"));
    }
}
