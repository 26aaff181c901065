use std::path::{Path, PathBuf};

use actix_multipart::form::{tempfile::TempFile, MultipartForm};
use actix_web::{
    get, post,
    web::{scope, Data, Path as UrlPath, ServiceConfig},
    HttpResponse,
};
use tracing::info;
use uuid::Uuid;

use crate::api::validation::validate_upload;
use crate::config::Config;

use super::dto::{StatusResponse, SubmitResponse};
use super::service::{EvaluationService, ServiceError};

/// Multipart form carrying the two documents to evaluate
#[derive(Debug, MultipartForm)]
pub struct EvaluateForm {
    #[multipart(rename = "cv")]
    pub cv: TempFile,

    #[multipart(rename = "project_report")]
    pub project_report: TempFile,
}

/// Move an uploaded temp file into the upload directory under an
/// identifier-prefixed name, returning the stored path.
fn persist_upload(file: &TempFile, upload_dir: &str) -> Result<String, ServiceError> {
    // Filename was checked by validate_upload
    let original = file.file_name.as_deref().unwrap_or("upload");
    let base = Path::new(original)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("upload");

    let stored: PathBuf = Path::new(upload_dir).join(format!("{}-{}", Uuid::new_v4(), base));

    std::fs::create_dir_all(upload_dir)
        .and_then(|_| std::fs::copy(file.file.path(), &stored))
        .map_err(|e| ServiceError::UploadFailed(e.to_string()))?;

    Ok(stored.to_string_lossy().into_owned())
}

/// Accept a CV and project report for evaluation.
///
/// Returns 202 with the job identifier as soon as the row is durably queued;
/// the evaluation itself runs on the worker pool.
#[post("/evaluate")]
async fn evaluate(
    service: Data<EvaluationService>,
    config: Data<Config>,
    form: MultipartForm<EvaluateForm>,
) -> Result<HttpResponse, ServiceError> {
    validate_upload("cv", form.cv.file_name.as_deref(), form.cv.size)
        .map_err(ServiceError::InvalidUpload)?;
    validate_upload(
        "project_report",
        form.project_report.file_name.as_deref(),
        form.project_report.size,
    )
    .map_err(ServiceError::InvalidUpload)?;

    let cv_path = persist_upload(&form.cv, &config.upload_dir)?;
    let report_path = persist_upload(&form.project_report, &config.upload_dir)?;
    info!("Stored uploads: cv={}, report={}", cv_path, report_path);

    let eval = service.submit(cv_path, report_path).await?;

    Ok(HttpResponse::Accepted().json(SubmitResponse::from(&eval)))
}

/// Poll an evaluation by identifier. The result payload is present only once
/// the job has completed.
#[get("/result/{id}")]
async fn get_result(
    service: Data<EvaluationService>,
    id: UrlPath<Uuid>,
) -> Result<HttpResponse, ServiceError> {
    let eval = service.get_status(id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(StatusResponse::from(eval)))
}

pub fn evaluation_config(config: &mut ServiceConfig) {
    config.service(scope("/api/v1").service(evaluate).service(get_result));
}
