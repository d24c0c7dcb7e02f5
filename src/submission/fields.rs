use crate::models::submission::{check_email, check_message, check_name};
use crate::models::FieldError;

use super::parser::ContactPayload;

/// A payload that passed field validation, trimmed and with a lowercased email.
#[derive(Debug, Clone, PartialEq)]
pub struct ContactForm {
    pub name: String,
    pub email: String,
    pub message: String,
}

/// Validate the inbound fields before anything is stored.
///
/// Every field is checked so the caller gets all problems at once.
pub fn validate(payload: ContactPayload) -> Result<ContactForm, Vec<FieldError>> {
    let name = payload.name.unwrap_or_default().trim().to_string();
    let email = payload.email.unwrap_or_default().trim().to_lowercase();
    let message = payload.message.unwrap_or_default().trim().to_string();

    let errors: Vec<FieldError> = [check_name(&name), check_email(&email), check_message(&message)]
        .into_iter()
        .flatten()
        .collect();

    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(ContactForm {
        name,
        email,
        message,
    })
}
