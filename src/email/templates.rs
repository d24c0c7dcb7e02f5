use askama::Template;
use chrono::{DateTime, Utc};

use super::{MailAddresses, OutgoingMail, TransportError};
use crate::models::Submission;

pub const ADMIN_NOTICE_FROM_NAME: &str = "Contact Form";
pub const ADMIN_NOTICE_SUBJECT: &str = "🔔 New Contact Form Submission";
pub const ACKNOWLEDGMENT_SUBJECT: &str = "We received your message";

#[derive(Template)]
#[template(path = "email/admin_notice.html")]
struct AdminNoticeTemplate<'a> {
    name: &'a str,
    email: &'a str,
    message: &'a str,
    submitted_at: String,
    form_id: String,
}

#[derive(Template)]
#[template(path = "email/acknowledgment.html")]
struct AcknowledgmentTemplate<'a> {
    name: &'a str,
    site_name: &'a str,
}

/// `Monday, January 6, 2025 at 14:03:09 UTC`
pub fn format_timestamp(at: &DateTime<Utc>) -> String {
    at.format("%A, %B %-d, %Y at %H:%M:%S UTC").to_string()
}

pub fn render_admin_notice(
    submission: &Submission,
    addresses: &MailAddresses,
) -> Result<OutgoingMail, TransportError> {
    let template = AdminNoticeTemplate {
        name: &submission.name,
        email: &submission.email,
        message: &submission.message,
        submitted_at: format_timestamp(&submission.submitted_at),
        form_id: submission.id.to_string(),
    };
    let html = template
        .render()
        .map_err(|e| format!("Failed to render admin notice: {e}"))?;

    Ok(OutgoingMail {
        from_name: ADMIN_NOTICE_FROM_NAME.to_string(),
        from_address: addresses.from.clone(),
        to: addresses.admin_recipient.clone(),
        reply_to: Some(submission.email.clone()),
        subject: ADMIN_NOTICE_SUBJECT.to_string(),
        html,
    })
}

pub fn render_acknowledgment(
    submission: &Submission,
    addresses: &MailAddresses,
) -> Result<OutgoingMail, TransportError> {
    let template = AcknowledgmentTemplate {
        name: &submission.name,
        site_name: &addresses.site_name,
    };
    let html = template
        .render()
        .map_err(|e| format!("Failed to render acknowledgment: {e}"))?;

    Ok(OutgoingMail {
        from_name: addresses.site_name.clone(),
        from_address: addresses.from.clone(),
        to: submission.email.clone(),
        reply_to: None,
        subject: ACKNOWLEDGMENT_SUBJECT.to_string(),
        html,
    })
}
