use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use crate::api::evaluation::models::{Evaluation, EvaluationStatus};

use super::evaluation_store::StoreError;

/// Database representation of an evaluation row
#[derive(Debug, FromRow)]
pub struct EvaluationRow {
    pub id: Uuid,
    pub status: String,
    pub cv_path: String,
    pub report_path: String,
    pub result: Option<serde_json::Value>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl EvaluationRow {
    /// Convert into the domain model, rejecting unknown status values
    pub fn into_evaluation(self) -> Result<Evaluation, StoreError> {
        let status = EvaluationStatus::parse(&self.status)
            .ok_or_else(|| StoreError::Corrupt(format!("unknown status '{}'", self.status)))?;

        Ok(Evaluation {
            id: self.id,
            status,
            cv_path: self.cv_path,
            report_path: self.report_path,
            result: self.result,
            error: self.error,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}
