use std::fmt;
use std::sync::Arc;

use actix_web::{HttpResponse, ResponseError};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::api::validation::ErrorResponse;
use crate::db::{EvaluationStore, StoreError};

use super::models::Evaluation;

/// Service-level errors
#[derive(Debug)]
pub enum ServiceError {
    /// Evaluation store operation failed
    Store(StoreError),

    /// No evaluation exists for the requested identifier
    NotFound(Uuid),

    /// Uploaded document failed validation
    InvalidUpload(String),

    /// Uploaded document could not be saved to disk
    UploadFailed(String),
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceError::Store(e) => write!(f, "store error: {}", e),
            ServiceError::NotFound(id) => write!(f, "evaluation not found: {}", id),
            ServiceError::InvalidUpload(msg) => write!(f, "invalid upload: {}", msg),
            ServiceError::UploadFailed(msg) => write!(f, "failed to save upload: {}", msg),
        }
    }
}

impl std::error::Error for ServiceError {}

impl ResponseError for ServiceError {
    fn error_response(&self) -> HttpResponse {
        match self {
            ServiceError::Store(e) => {
                error!("Store error: {}", e);
                HttpResponse::InternalServerError().json(ErrorResponse {
                    error: "Failed to process request".to_string(),
                    fields: serde_json::json!({"message": "Database error occurred"}),
                })
            }
            ServiceError::NotFound(id) => {
                warn!("Evaluation not found: {}", id);
                HttpResponse::NotFound().json(ErrorResponse {
                    error: "Not found".to_string(),
                    fields: serde_json::json!({
                        "message": format!("Evaluation with id {} not found", id)
                    }),
                })
            }
            ServiceError::InvalidUpload(msg) => {
                warn!("Upload validation failed: {}", msg);
                HttpResponse::BadRequest().json(ErrorResponse {
                    error: "Validation failed".to_string(),
                    fields: serde_json::json!({"message": msg}),
                })
            }
            ServiceError::UploadFailed(msg) => {
                error!("Failed to save upload: {}", msg);
                HttpResponse::InternalServerError().json(ErrorResponse {
                    error: "Failed to save uploaded file".to_string(),
                    fields: serde_json::json!({"message": "Storage error occurred"}),
                })
            }
        }
    }
}

/// Evaluation lifecycle entry points used by the HTTP handlers.
///
/// Submission only persists the queued row; the worker pool picks it up, so
/// the caller never blocks on evaluation latency.
pub struct EvaluationService {
    store: Arc<dyn EvaluationStore>,
}

impl EvaluationService {
    pub fn new(store: Arc<dyn EvaluationStore>) -> Self {
        Self { store }
    }

    /// Accept a new evaluation: persist it in `Queued` state and return
    /// immediately with its identifier.
    pub async fn submit(
        &self,
        cv_path: String,
        report_path: String,
    ) -> Result<Evaluation, ServiceError> {
        let eval = Evaluation::new(cv_path, report_path);
        info!("Submitting evaluation {}", eval.id);

        self.store.create(&eval).await.map_err(ServiceError::Store)?;

        info!("Evaluation {} queued", eval.id);
        Ok(eval)
    }

    /// Current snapshot of an evaluation by identifier
    pub async fn get_status(&self, id: Uuid) -> Result<Evaluation, ServiceError> {
        match self.store.find_by_id(id).await {
            Ok(eval) => Ok(eval),
            Err(StoreError::NotFound(id)) => Err(ServiceError::NotFound(id)),
            Err(e) => Err(ServiceError::Store(e)),
        }
    }
}
