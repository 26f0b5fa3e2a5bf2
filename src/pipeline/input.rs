//! Input resolution: turn a user-supplied path or URL into an in-memory
//! [`ResumeDocument`] carrying a declared MIME type.
//!
//! The MIME type is what decides whether a document is processed at all:
//! only PDF and DOCX are accepted, everything else is reported as an
//! unsupported file and never reaches extraction. Local files are typed by
//! extension, falling back to the `%PDF` magic bytes; downloads are typed by
//! URL extension, falling back to the `Content-Type` header.

use crate::error::DocumentError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

/// MIME type of a PDF document.
pub const PDF_MIME: &str = "application/pdf";

/// MIME type of a Word (OOXML) document.
pub const DOCX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// Declared type of anything we could not classify.
pub const UNKNOWN_MIME: &str = "application/octet-stream";

/// The two document kinds the extractor understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Pdf,
    Docx,
}

impl DocumentKind {
    /// Classify a declared MIME type. Parameters (`; charset=…`) are ignored.
    pub fn from_mime(mime: &str) -> Option<Self> {
        let essence = mime.split(';').next().unwrap_or("").trim();
        if essence.eq_ignore_ascii_case(PDF_MIME) {
            Some(DocumentKind::Pdf)
        } else if essence.eq_ignore_ascii_case(DOCX_MIME) {
            Some(DocumentKind::Docx)
        } else {
            None
        }
    }

    /// Classify by file extension (case-insensitive).
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())?;
        match ext.as_str() {
            "pdf" => Some(DocumentKind::Pdf),
            "docx" => Some(DocumentKind::Docx),
            _ => None,
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            DocumentKind::Pdf => PDF_MIME,
            DocumentKind::Docx => DOCX_MIME,
        }
    }
}

/// An uploaded résumé: its display name, declared MIME type and raw bytes.
#[derive(Clone)]
pub struct ResumeDocument {
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl std::fmt::Debug for ResumeDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResumeDocument")
            .field("name", &self.name)
            .field("mime_type", &self.mime_type)
            .field("bytes", &self.bytes.len())
            .finish()
    }
}

impl ResumeDocument {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    /// The accepted kind, or `None` when the declared type is unsupported.
    pub fn kind(&self) -> Option<DocumentKind> {
        DocumentKind::from_mime(&self.mime_type)
    }
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Resolve the input string to an in-memory document.
///
/// Failures are per-document: the caller records them and moves on.
pub async fn resolve_input(input: &str, timeout_secs: u64) -> Result<ResumeDocument, DocumentError> {
    if is_url(input) {
        download_url(input, timeout_secs).await
    } else {
        resolve_local(Path::new(input)).await
    }
}

/// Read a local file and declare its MIME type.
async fn resolve_local(path: &Path) -> Result<ResumeDocument, DocumentError> {
    let bytes = tokio::fs::read(path).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::PermissionDenied => DocumentError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => DocumentError::NotFound {
            path: path.to_path_buf(),
        },
    })?;

    let mime_type = DocumentKind::from_path(path)
        .or_else(|| sniff_kind(&bytes))
        .map(|k| k.mime_type())
        .unwrap_or(UNKNOWN_MIME);

    debug!("Resolved local file: {} ({})", path.display(), mime_type);
    Ok(ResumeDocument::new(display_name(path), mime_type, bytes))
}

/// Download a URL into memory.
async fn download_url(url: &str, timeout_secs: u64) -> Result<ResumeDocument, DocumentError> {
    info!("Downloading résumé from: {}", url);

    let failed = |reason: String| DocumentError::DownloadFailed {
        url: url.to_string(),
        reason,
    };

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| failed(e.to_string()))?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            failed(format!("timed out after {}s", timeout_secs))
        } else {
            failed(e.to_string())
        }
    })?;

    if !response.status().is_success() {
        return Err(failed(format!("HTTP {}", response.status())));
    }

    let filename = extract_filename(url);
    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let bytes = response
        .bytes()
        .await
        .map_err(|e| failed(e.to_string()))?
        .to_vec();

    let mime_type = DocumentKind::from_path(Path::new(&filename))
        .map(|k| k.mime_type().to_string())
        .or(content_type)
        .unwrap_or_else(|| UNKNOWN_MIME.to_string());

    info!("Downloaded {} ({} bytes, {})", filename, bytes.len(), mime_type);
    Ok(ResumeDocument::new(filename, mime_type, bytes))
}

/// Extract a reasonable filename from the URL path.
fn extract_filename(url: &str) -> String {
    if let Ok(parsed) = reqwest::Url::parse(url) {
        if let Some(mut segments) = parsed.path_segments() {
            if let Some(last) = segments.next_back() {
                if !last.is_empty() {
                    return last.to_string();
                }
            }
        }
    }

    "downloaded".to_string()
}

/// File name component, or the whole path when there is none.
fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Recognise a PDF by its magic bytes when the extension is missing.
fn sniff_kind(bytes: &[u8]) -> Option<DocumentKind> {
    if bytes.starts_with(b"%PDF") {
        Some(DocumentKind::Pdf)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_is_url() {
        assert!(is_url("https://example.com/cv.pdf"));
        assert!(is_url("http://example.com/cv.docx"));
        assert!(!is_url("/tmp/cv.pdf"));
        assert!(!is_url("cv.pdf"));
        assert!(!is_url(""));
    }

    #[test]
    fn kind_from_mime() {
        assert_eq!(DocumentKind::from_mime(PDF_MIME), Some(DocumentKind::Pdf));
        assert_eq!(DocumentKind::from_mime(DOCX_MIME), Some(DocumentKind::Docx));
        assert_eq!(
            DocumentKind::from_mime("application/pdf; charset=binary"),
            Some(DocumentKind::Pdf)
        );
        assert_eq!(DocumentKind::from_mime("application/msword"), None);
        assert_eq!(DocumentKind::from_mime("text/plain"), None);
    }

    #[test]
    fn kind_from_path_is_case_insensitive() {
        assert_eq!(
            DocumentKind::from_path(Path::new("/x/Jane.PDF")),
            Some(DocumentKind::Pdf)
        );
        assert_eq!(
            DocumentKind::from_path(Path::new("cv.Docx")),
            Some(DocumentKind::Docx)
        );
        assert_eq!(DocumentKind::from_path(Path::new("cv.doc")), None);
        assert_eq!(DocumentKind::from_path(Path::new("README")), None);
    }

    #[test]
    fn filename_from_url() {
        assert_eq!(extract_filename("https://x.io/cvs/jane.pdf"), "jane.pdf");
        assert_eq!(extract_filename("https://x.io/"), "downloaded");
    }

    #[tokio::test]
    async fn local_pdf_without_extension_is_sniffed() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.write_all(b"%PDF-1.7\n...").unwrap();
        let doc = resolve_input(tmp.path().to_str().unwrap(), 5).await.unwrap();
        assert_eq!(doc.kind(), Some(DocumentKind::Pdf));
    }

    #[tokio::test]
    async fn local_text_file_is_unsupported() {
        let mut tmp = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        tmp.write_all(b"Jane Doe").unwrap();
        let doc = resolve_input(tmp.path().to_str().unwrap(), 5).await.unwrap();
        assert_eq!(doc.mime_type, UNKNOWN_MIME);
        assert_eq!(doc.kind(), None);
        assert!(doc.name.ends_with(".txt"));
    }

    #[tokio::test]
    async fn missing_file_is_not_found() {
        let err = resolve_input("/definitely/not/here.pdf", 5).await.unwrap_err();
        assert!(matches!(err, DocumentError::NotFound { .. }));
    }
}
