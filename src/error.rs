//! Error types for the edgequake-resume2xlsx library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`ResumeError`]: **Fatal**: the run cannot proceed at all (no provider
//!   configured, nothing to process, output could not be written). Returned
//!   as `Err(ResumeError)` from the top-level `summarize*` functions.
//!
//! * [`DocumentError`]: **Non-fatal**: one résumé could not contribute rows
//!   (unsupported type, unreadable file, API failure, empty reply) but the
//!   rest of the batch is unaffected. Stored inside
//!   [`crate::output::DocumentResult`] so callers can report per-file
//!   problems after the run.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the edgequake-resume2xlsx library.
///
/// Per-document failures use [`DocumentError`] and are stored in
/// [`crate::output::DocumentResult`] rather than propagated here.
#[derive(Debug, Error)]
pub enum ResumeError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// The caller supplied an empty list of résumés.
    #[error("No résumé files were given.\nPass one or more PDF/DOCX paths or URLs.")]
    NoInputs,

    // ── LLM errors ────────────────────────────────────────────────────────
    /// The configured provider is not initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    // ── Output errors ─────────────────────────────────────────────────────
    /// Every document was processed but none produced a row.
    #[error("No structured data was extracted from the {total} résumé(s).")]
    NoStructuredData { total: usize },

    /// The table could not be serialised to the requested format.
    #[error("Failed to build {format} export for '{path}': {detail}")]
    ExportFailed {
        path: PathBuf,
        format: String,
        detail: String,
    },

    /// Could not create or write the output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single résumé.
///
/// Stored alongside [`crate::output::DocumentResult`] when a document fails.
/// The run always continues with the next document.
#[derive(Debug, Clone, PartialEq, Error, serde::Serialize, serde::Deserialize)]
pub enum DocumentError {
    /// The input path does not exist.
    #[error("File not found: '{path}'")]
    NotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'")]
    PermissionDenied { path: PathBuf },

    /// HTTP download of a URL input failed.
    #[error("Failed to download '{url}': {reason}")]
    DownloadFailed { url: String, reason: String },

    /// Declared MIME type is neither PDF nor DOCX; never passed to extraction.
    #[error("Unsupported file type for {name} ({mime_type}). Please upload a PDF or DOCX file.")]
    UnsupportedType { name: String, mime_type: String },

    /// PDF/DOCX could not be read (corrupt, encrypted, missing library).
    #[error("Error reading {name}: {detail}")]
    ExtractionFailed { name: String, detail: String },

    /// Extraction succeeded but the document has no visible text.
    #[error("No text could be extracted from {name}.")]
    EmptyText { name: String },

    /// LLM call failed (network, auth, quota) after all attempts.
    #[error("Error communicating with the LLM API for {name} after {attempts} attempt(s): {detail}")]
    CompletionFailed {
        name: String,
        attempts: u32,
        detail: String,
    },

    /// LLM call exceeded the per-call timeout.
    #[error("LLM call for {name} timed out after {secs}s")]
    Timeout { name: String, secs: u64 },

    /// The model answered with an empty reply.
    #[error("No information could be extracted from {name}.")]
    EmptyReply { name: String },
}

impl DocumentError {
    /// Empty text or an empty reply are warnings: the document was readable
    /// and the call succeeded, there was just nothing to tabulate.
    pub fn is_warning(&self) -> bool {
        matches!(
            self,
            DocumentError::EmptyText { .. } | DocumentError::EmptyReply { .. }
        )
    }

    /// True when the document was rejected before extraction.
    pub fn is_unsupported(&self) -> bool {
        matches!(self, DocumentError::UnsupportedType { .. })
    }
}
