use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::SubmissionStore;
use crate::error::StoreError;
use crate::models::{FieldError, NewSubmission, Submission};

pub struct PgSubmissionStore {
    pool: PgPool,
}

impl PgSubmissionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SubmissionStore for PgSubmissionStore {
    async fn save(&self, candidate: NewSubmission) -> Result<Submission, StoreError> {
        let candidate = candidate.validated().map_err(StoreError::Validation)?;
        insert(&self.pool, Uuid::now_v7(), &candidate).await
    }
}

/// Insert a candidate under `id`, mapping constraint violations to store errors.
/// Does not validate; `SubmissionStore::save` does that first.
pub async fn insert(
    pool: &PgPool,
    id: Uuid,
    candidate: &NewSubmission,
) -> Result<Submission, StoreError> {
    create(pool, id, candidate).await.map_err(map_db_error)
}

async fn create(
    pool: &PgPool,
    id: Uuid,
    candidate: &NewSubmission,
) -> Result<Submission, sqlx::Error> {
    sqlx::query_as::<_, Submission>(
        "INSERT INTO contact_submissions (id, name, email, message, submitted_at)
         VALUES ($1, $2, $3, $4, $5) RETURNING *",
    )
    .bind(id)
    .bind(&candidate.name)
    .bind(&candidate.email)
    .bind(&candidate.message)
    .bind(candidate.submitted_at)
    .fetch_one(pool)
    .await
}

pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM contact_submissions")
        .fetch_one(pool)
        .await
}

/// Translate constraint violations into store errors naming the field.
fn map_db_error(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        let constraint = db_err.constraint().unwrap_or_default().to_string();
        if db_err.is_unique_violation() {
            return StoreError::Conflict(constraint_field(&constraint));
        }
        if db_err.is_check_violation() {
            let field = constraint_field(&constraint);
            let message = format!("Invalid value for {field}");
            return StoreError::Validation(vec![FieldError::new(&field, &message)]);
        }
    }
    StoreError::Database(err)
}

/// `contact_submissions_pkey` -> `id`, `contact_submissions_name_check` -> `name`.
pub fn constraint_field(constraint: &str) -> String {
    if constraint.ends_with("_pkey") {
        return "id".to_string();
    }
    let trimmed = constraint
        .strip_prefix("contact_submissions_")
        .unwrap_or(constraint);
    let trimmed = trimmed
        .strip_suffix("_check")
        .or_else(|| trimmed.strip_suffix("_key"))
        .unwrap_or(trimmed);
    trimmed.to_string()
}
