use serde::Serialize;
use uuid::Uuid;

use super::models::{Evaluation, EvaluationStatus};

/// Response for a newly submitted evaluation
#[derive(Serialize)]
pub struct SubmitResponse {
    pub id: Uuid,
    pub status: EvaluationStatus,
}

impl From<&Evaluation> for SubmitResponse {
    fn from(eval: &Evaluation) -> Self {
        SubmitResponse {
            id: eval.id,
            status: eval.status,
        }
    }
}

/// Snapshot returned when polling an evaluation.
///
/// `result` appears only for completed jobs, `error` only for failed ones.
#[derive(Serialize)]
pub struct StatusResponse {
    pub id: Uuid,
    pub status: EvaluationStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<Evaluation> for StatusResponse {
    fn from(eval: Evaluation) -> Self {
        let result = match eval.status {
            EvaluationStatus::Completed => eval.result,
            _ => None,
        };
        let error = match eval.status {
            EvaluationStatus::Failed => eval.error,
            _ => None,
        };

        StatusResponse {
            id: eval.id,
            status: eval.status,
            result,
            error,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn evaluation(status: EvaluationStatus) -> Evaluation {
        let mut eval = Evaluation::new("uploads/cv.txt".into(), "uploads/report.txt".into());
        eval.status = status;
        eval
    }

    #[test]
    fn completed_response_includes_result() {
        let mut eval = evaluation(EvaluationStatus::Completed);
        eval.result = Some(json!({"cv_match_rate": 0.8}));

        let body = serde_json::to_value(StatusResponse::from(eval)).unwrap();
        assert_eq!(body["status"], "completed");
        assert_eq!(body["result"]["cv_match_rate"], 0.8);
        assert!(body.get("error").is_none());
    }

    #[test]
    fn queued_response_omits_result_key() {
        let body = serde_json::to_value(StatusResponse::from(evaluation(EvaluationStatus::Queued)))
            .unwrap();
        assert_eq!(body["status"], "queued");
        assert!(body.get("result").is_none());
        assert!(body.get("error").is_none());
    }

    #[test]
    fn failed_response_includes_error_but_never_result() {
        let mut eval = evaluation(EvaluationStatus::Failed);
        eval.error = Some("provider_quota_exceeded: 429".to_string());
        // A failed job should never carry a result even if one leaked in
        eval.result = Some(json!({"stale": true}));

        let body = serde_json::to_value(StatusResponse::from(eval)).unwrap();
        assert_eq!(body["status"], "failed");
        assert!(body.get("result").is_none());
        assert_eq!(body["error"], "provider_quota_exceeded: 429");
    }
}
