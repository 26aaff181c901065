use serde::Serialize;

use crate::util::file_reader::SUPPORTED_EXTENSIONS;

/// Standard error body returned by every endpoint
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub fields: serde_json::Value,
}

/// Validate one uploaded document before a job is created: the part must
/// carry a filename, be non-empty, and use a supported extension.
pub fn validate_upload(
    field: &str,
    file_name: Option<&str>,
    size: usize,
) -> Result<(), String> {
    let name = match file_name {
        Some(name) if !name.is_empty() => name,
        _ => return Err(format!("{} file is required", field)),
    };

    if size == 0 {
        return Err(format!("{} file is empty", field));
    }

    let ext = name.rsplit('.').next().map(|e| e.to_lowercase());
    match ext {
        Some(ref e) if name.contains('.') && SUPPORTED_EXTENSIONS.contains(&e.as_str()) => Ok(()),
        _ => Err(format!(
            "{} file type not supported, expected one of: {}",
            field,
            SUPPORTED_EXTENSIONS.join(", ")
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_supported_extensions() {
        for name in ["cv.pdf", "cv.txt", "notes.md", "CV.PDF"] {
            assert!(validate_upload("cv", Some(name), 100).is_ok(), "{}", name);
        }
    }

    #[test]
    fn rejects_missing_filename() {
        assert!(validate_upload("cv", None, 100).is_err());
        assert!(validate_upload("cv", Some(""), 100).is_err());
    }

    #[test]
    fn rejects_empty_file() {
        let err = validate_upload("cv", Some("cv.pdf"), 0).unwrap_err();
        assert!(err.contains("empty"));
    }

    #[test]
    fn rejects_unsupported_extension() {
        let err = validate_upload("project_report", Some("report.docx"), 10).unwrap_err();
        assert!(err.contains("not supported"));
    }

    #[test]
    fn rejects_file_without_extension() {
        assert!(validate_upload("cv", Some("resume"), 10).is_err());
    }
}
