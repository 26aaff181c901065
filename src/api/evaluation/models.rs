use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle state of an evaluation job.
///
/// Transitions are monotonic: `Queued → Processing → {Completed | Failed}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationStatus {
    Queued,
    Processing,
    Completed,
    Failed,
}

impl EvaluationStatus {
    /// Text form stored in the database status column
    pub fn as_str(&self) -> &'static str {
        match self {
            EvaluationStatus::Queued => "queued",
            EvaluationStatus::Processing => "processing",
            EvaluationStatus::Completed => "completed",
            EvaluationStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "queued" => Some(EvaluationStatus::Queued),
            "processing" => Some(EvaluationStatus::Processing),
            "completed" => Some(EvaluationStatus::Completed),
            "failed" => Some(EvaluationStatus::Failed),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, EvaluationStatus::Completed | EvaluationStatus::Failed)
    }
}

/// One evaluation request tracked from submission to terminal outcome
#[derive(Debug, Clone, Serialize)]
pub struct Evaluation {
    pub id: Uuid,
    pub status: EvaluationStatus,
    pub cv_path: String,
    pub report_path: String,
    /// Structured result payload; non-null exactly when status is `Completed`
    pub result: Option<serde_json::Value>,
    /// Failure classification; set only when status is `Failed`
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Evaluation {
    /// Build a freshly submitted evaluation in `Queued` state
    pub fn new(cv_path: String, report_path: String) -> Self {
        let now = Utc::now();
        Evaluation {
            id: Uuid::new_v4(),
            status: EvaluationStatus::Queued,
            cv_path,
            report_path,
            result: None,
            error: None,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_evaluation_is_queued_with_no_result() {
        let eval = Evaluation::new("uploads/cv.txt".into(), "uploads/report.txt".into());
        assert_eq!(eval.status, EvaluationStatus::Queued);
        assert!(eval.result.is_none());
        assert!(eval.error.is_none());
        assert!(!eval.status.is_terminal());
    }

    #[test]
    fn status_round_trips_through_text_form() {
        for status in [
            EvaluationStatus::Queued,
            EvaluationStatus::Processing,
            EvaluationStatus::Completed,
            EvaluationStatus::Failed,
        ] {
            assert_eq!(EvaluationStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(EvaluationStatus::parse("cancelled"), None);
    }
}
