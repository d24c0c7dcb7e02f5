use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const NAME_MIN_CHARS: usize = 2;
pub const NAME_MAX_CHARS: usize = 50;
pub const MESSAGE_MAX_CHARS: usize = 1000;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[a-z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?(?:\.[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?)*\.[a-z]{2,}$",
    )
    .unwrap()
});

/// A persisted contact-form record.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow, Serialize, Deserialize)]
pub struct Submission {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub message: String,
    pub submitted_at: DateTime<Utc>,
}

/// A submission that has not been stored yet and therefore has no id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSubmission {
    pub name: String,
    pub email: String,
    pub message: String,
    pub submitted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &str, message: &str) -> Self {
        Self {
            field: field.to_string(),
            message: message.to_string(),
        }
    }
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl NewSubmission {
    pub fn new(name: &str, email: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            email: email.to_string(),
            message: message.to_string(),
            submitted_at: Utc::now(),
        }
    }

    /// Trim every field and lowercase the email.
    pub fn normalized(self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_lowercase(),
            message: self.message.trim().to_string(),
            submitted_at: self.submitted_at,
        }
    }

    /// Normalize, then check every field. This is the store-side validation
    /// every `SubmissionStore` backend runs before writing.
    pub fn validated(self) -> Result<Self, Vec<FieldError>> {
        let candidate = self.normalized();
        let violations = candidate.violations();
        if violations.is_empty() {
            Ok(candidate)
        } else {
            Err(violations)
        }
    }

    /// Check the field bounds. Expects an already normalized candidate.
    pub fn violations(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        errors.extend(check_name(&self.name));
        errors.extend(check_email(&self.email));
        errors.extend(check_message(&self.message));
        errors
    }
}

pub fn check_name(name: &str) -> Option<FieldError> {
    let len = name.chars().count();
    if len == 0 {
        Some(FieldError::new("name", "Name is required"))
    } else if len < NAME_MIN_CHARS {
        Some(FieldError::new("name", "Name must be at least 2 characters long"))
    } else if len > NAME_MAX_CHARS {
        Some(FieldError::new("name", "Name cannot exceed 50 characters"))
    } else {
        None
    }
}

pub fn check_email(email: &str) -> Option<FieldError> {
    if email.is_empty() {
        Some(FieldError::new("email", "Email is required"))
    } else if !is_valid_email(email) {
        Some(FieldError::new("email", "Please provide a valid email"))
    } else {
        None
    }
}

pub fn check_message(message: &str) -> Option<FieldError> {
    if message.is_empty() {
        Some(FieldError::new("message", "Message is required"))
    } else if message.chars().count() > MESSAGE_MAX_CHARS {
        Some(FieldError::new("message", "Message cannot exceed 1000 characters"))
    } else {
        None
    }
}

/// Syntax check only; expects a lowercased address.
pub fn is_valid_email(email: &str) -> bool {
    if email.len() > 254 {
        return false;
    }
    match email.split_once('@') {
        Some((local, _)) if local.len() > 64 || local.starts_with('.') || local.ends_with('.') || local.contains("..") => false,
        Some(_) => EMAIL_RE.is_match(email),
        None => false,
    }
}
