pub mod submission;

pub use submission::{FieldError, NewSubmission, Submission};
