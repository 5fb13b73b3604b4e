//! Content resolution for one target.

use crate::models::{Contact, DispatchJob};
use crate::template;
use crate::transport::OutgoingMessage;

/// Pick the text and attachment to send to `contact`.
///
/// Text precedence: the contact's own message, the rendered template, the
/// job-level message, the attachment caption. Every text source goes through
/// the template renderer so `{name}` and field placeholders work everywhere.
pub fn resolve_content(job: &DispatchJob, contact: &Contact) -> OutgoingMessage {
    let caption = job
        .attachment
        .as_ref()
        .and_then(|a| a.caption.as_deref())
        .filter(|c| !c.trim().is_empty());

    let text = contact
        .custom_message()
        .or_else(|| job.template_text())
        .or_else(|| job.literal_text())
        .or(caption)
        .map(|source| template::render_for(source, contact));

    OutgoingMessage {
        text,
        attachment: job.attachment.as_ref().map(|a| a.path.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Attachment;
    use std::path::PathBuf;

    fn asha() -> Contact {
        Contact::new("9876543210", "Asha").with_field("id", "OUT-1")
    }

    #[test]
    fn test_per_contact_message_wins() {
        let job = DispatchJob::new(vec![])
            .with_template("T {name}")
            .with_message("L");
        let contact = asha().with_message("Own {id}");
        assert_eq!(
            resolve_content(&job, &contact).text.as_deref(),
            Some("Own OUT-1")
        );
    }

    #[test]
    fn test_template_over_literal() {
        let job = DispatchJob::new(vec![])
            .with_template("Hi {name}, order {id} shipped")
            .with_message("L");
        assert_eq!(
            resolve_content(&job, &asha()).text.as_deref(),
            Some("Hi Asha, order OUT-1 shipped")
        );
    }

    #[test]
    fn test_literal_then_caption() {
        let attachment = Attachment::new("/tmp/a.png").with_caption("For {name}");
        let job = DispatchJob::new(vec![]).with_attachment(attachment);
        let message = resolve_content(&job, &asha());
        assert_eq!(message.text.as_deref(), Some("For Asha"));
        assert_eq!(message.attachment, Some(PathBuf::from("/tmp/a.png")));

        let job = job.with_message("Literal");
        assert_eq!(resolve_content(&job, &asha()).text.as_deref(), Some("Literal"));
    }

    #[test]
    fn test_blank_sources_skipped() {
        let job = DispatchJob::new(vec![]).with_template(" ").with_message("Hello");
        let contact = asha().with_message("nan");
        assert_eq!(resolve_content(&job, &contact).text.as_deref(), Some("Hello"));
    }

    #[test]
    fn test_nothing_resolves() {
        let job = DispatchJob::new(vec![]);
        assert!(resolve_content(&job, &asha()).is_empty());
    }
}
