pub mod submissions;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::models::{NewSubmission, Submission};

pub use submissions::PgSubmissionStore;

/// Durable, write-once storage for contact submissions.
#[async_trait]
pub trait SubmissionStore: Send + Sync {
    /// Validate and persist a candidate, assigning its id.
    ///
    /// Each successful call writes exactly one record. Identical candidates
    /// are stored as distinct records.
    async fn save(&self, candidate: NewSubmission) -> Result<Submission, StoreError>;
}
