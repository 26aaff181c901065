use std::fmt;
use std::path::Path;

/// Errors raised while extracting text from an uploaded document
#[derive(Debug)]
pub enum FileError {
    /// File extension is not one of the supported formats
    UnsupportedFormat(String),

    /// File could not be opened or read
    Io(std::io::Error),

    /// PDF text extraction failed
    Extraction(String),
}

impl fmt::Display for FileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileError::UnsupportedFormat(ext) => write!(f, "unsupported file type: {}", ext),
            FileError::Io(e) => write!(f, "failed to read file: {}", e),
            FileError::Extraction(msg) => write!(f, "failed to extract text: {}", msg),
        }
    }
}

impl std::error::Error for FileError {}

impl From<std::io::Error> for FileError {
    fn from(e: std::io::Error) -> Self {
        FileError::Io(e)
    }
}

/// Extensions the reader knows how to turn into plain text
pub const SUPPORTED_EXTENSIONS: [&str; 3] = ["pdf", "txt", "md"];

/// Reads and extracts text from uploaded documents, dispatched on extension
pub struct FileReader;

impl FileReader {
    pub fn new() -> Self {
        FileReader
    }

    /// Extract plain text from the file at `path`
    pub fn read(&self, path: &str) -> Result<String, FileError> {
        let ext = Path::new(path)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "pdf" => self.read_pdf(path),
            "txt" | "md" => self.read_text(path),
            other => Err(FileError::UnsupportedFormat(format!(".{}", other))),
        }
    }

    fn read_pdf(&self, path: &str) -> Result<String, FileError> {
        pdf_extract::extract_text(path).map_err(|e| FileError::Extraction(e.to_string()))
    }

    fn read_text(&self, path: &str) -> Result<String, FileError> {
        Ok(std::fs::read_to_string(path)?)
    }
}

impl Default for FileReader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn temp_file(name: &str, content: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn reads_plain_text_file() {
        let path = temp_file("file_reader_cv.txt", "Software Engineer, 3 years");
        let reader = FileReader::new();
        let text = reader.read(path.to_str().unwrap()).unwrap();
        assert_eq!(text, "Software Engineer, 3 years");
    }

    #[test]
    fn rejects_unsupported_extension() {
        let reader = FileReader::new();
        let err = reader.read("cv.docx").unwrap_err();
        assert!(matches!(err, FileError::UnsupportedFormat(_)));
    }

    #[test]
    fn missing_file_is_io_error() {
        let reader = FileReader::new();
        let err = reader.read("/nonexistent/cv.txt").unwrap_err();
        assert!(matches!(err, FileError::Io(_)));
    }
}
