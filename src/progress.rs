//! Progress-callback trait for per-document summarisation events.
//!
//! Inject an [`Arc<dyn SummaryProgressCallback>`] via
//! [`crate::config::ExtractionConfigBuilder::progress_callback`] to receive
//! events as the pipeline works through the résumé list.
//!
//! Documents are processed one at a time, so events for one run always arrive
//! in order: `on_run_start`, then a `on_document_start` followed by exactly
//! one `on_document_complete` or `on_document_error` per document, then
//! `on_run_complete`.
//!
//! # Example
//!
//! ```rust
//! use edgequake_resume2xlsx::{ExtractionConfig, SummaryProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct RowCounter {
//!     rows: AtomicUsize,
//! }
//!
//! impl SummaryProgressCallback for RowCounter {
//!     fn on_document_complete(&self, _index: usize, _total: usize, name: &str, rows: usize) {
//!         self.rows.fetch_add(rows, Ordering::SeqCst);
//!         eprintln!("{name}: {rows} row(s)");
//!     }
//! }
//!
//! let counter = Arc::new(RowCounter { rows: AtomicUsize::new(0) });
//!
//! let config = ExtractionConfig::builder()
//!     .progress_callback(counter as Arc<dyn SummaryProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the pipeline as it processes each résumé.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. `index` is 1-based.
pub trait SummaryProgressCallback: Send + Sync {
    /// Called once before the first document.
    fn on_run_start(&self, total_documents: usize) {
        let _ = total_documents;
    }

    /// Called before a document is read.
    fn on_document_start(&self, index: usize, total: usize, name: &str) {
        let _ = (index, total, name);
    }

    /// Called when a document contributed `rows` rows to the summary table.
    fn on_document_complete(&self, index: usize, total: usize, name: &str, rows: usize) {
        let _ = (index, total, name, rows);
    }

    /// Called when a document was skipped, failed, or produced nothing.
    ///
    /// `error` is owned so implementations can move it into a spawned task.
    fn on_document_error(&self, index: usize, total: usize, name: &str, error: String) {
        let _ = (index, total, name, error);
    }

    /// Called once after every document has been attempted.
    fn on_run_complete(&self, total_documents: usize, total_rows: usize) {
        let _ = (total_documents, total_rows);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl SummaryProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ExtractionConfig`].
pub type ProgressCallback = Arc<dyn SummaryProgressCallback>;
