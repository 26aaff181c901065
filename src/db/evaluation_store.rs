use std::fmt;

use async_trait::async_trait;
use sqlx::{Pool, Postgres};
use tracing::debug;
use uuid::Uuid;

use crate::api::evaluation::models::{Evaluation, EvaluationStatus};

use super::models::EvaluationRow;

/// Errors raised by the evaluation store
#[derive(Debug)]
pub enum StoreError {
    /// No row exists for the given identifier
    NotFound(Uuid),

    /// Underlying database operation failed
    Database(sqlx::Error),

    /// A persisted row could not be mapped back into the domain model
    Corrupt(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::NotFound(id) => write!(f, "evaluation not found: {}", id),
            StoreError::Database(e) => write!(f, "database error: {}", e),
            StoreError::Corrupt(detail) => write!(f, "corrupt evaluation row: {}", detail),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        StoreError::Database(e)
    }
}

/// Durable record of evaluation identity, status, and result.
///
/// `create`/`find_by_id`/`update` are plain CRUD (full-row update keyed by
/// identifier, last writer wins). `claim_next` hands the oldest queued row to
/// exactly one caller, flipping it to `processing` in the same statement.
#[async_trait]
pub trait EvaluationStore: Send + Sync {
    async fn create(&self, eval: &Evaluation) -> Result<(), StoreError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Evaluation, StoreError>;
    async fn update(&self, eval: &Evaluation) -> Result<(), StoreError>;
    async fn claim_next(&self) -> Result<Option<Evaluation>, StoreError>;
}

const SELECT_COLUMNS: &str =
    "id, status, cv_path, report_path, result, error, created_at, updated_at";

/// PostgreSQL-backed evaluation store
pub struct PostgresEvaluationStore {
    pool: Pool<Postgres>,
}

impl PostgresEvaluationStore {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EvaluationStore for PostgresEvaluationStore {
    async fn create(&self, eval: &Evaluation) -> Result<(), StoreError> {
        debug!("Creating evaluation {}", eval.id);

        sqlx::query(
            r#"
            INSERT INTO evaluations (id, status, cv_path, report_path, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(eval.id)
        .bind(eval.status.as_str())
        .bind(&eval.cv_path)
        .bind(&eval.report_path)
        .bind(eval.created_at)
        .bind(eval.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Evaluation, StoreError> {
        let row = sqlx::query_as::<_, EvaluationRow>(&format!(
            "SELECT {} FROM evaluations WHERE id = $1",
            SELECT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound(id))?;

        row.into_evaluation()
    }

    async fn update(&self, eval: &Evaluation) -> Result<(), StoreError> {
        debug!("Updating evaluation {} to {}", eval.id, eval.status.as_str());

        sqlx::query(
            r#"
            UPDATE evaluations
            SET status = $2, result = $3, error = $4, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(eval.id)
        .bind(eval.status.as_str())
        .bind(&eval.result)
        .bind(&eval.error)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn claim_next(&self) -> Result<Option<Evaluation>, StoreError> {
        // SKIP LOCKED keeps concurrent workers from claiming the same row
        let row = sqlx::query_as::<_, EvaluationRow>(&format!(
            r#"
            UPDATE evaluations
            SET status = $1, updated_at = NOW()
            WHERE id = (
                SELECT id FROM evaluations
                WHERE status = $2
                ORDER BY created_at
                FOR UPDATE SKIP LOCKED
                LIMIT 1
            )
            RETURNING {}
            "#,
            SELECT_COLUMNS
        ))
        .bind(EvaluationStatus::Processing.as_str())
        .bind(EvaluationStatus::Queued.as_str())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(row.into_evaluation()?)),
            None => Ok(None),
        }
    }
}
