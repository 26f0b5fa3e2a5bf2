//! # edgequake-resume2xlsx
//!
//! Summarise a batch of résumés (PDF or DOCX) into one spreadsheet using an
//! LLM.
//!
//! Each résumé's text is extracted locally, embedded in a fixed extraction
//! prompt and sent to a chat-completion model. The model answers in a
//! labelled plain-text layout (`Name:`, `Education:`, `- Institution:`, …)
//! which a line scanner turns into table rows. Rows of all résumés are
//! concatenated in input order and exported.
//!
//! ## Pipeline Overview
//!
//! ```text
//! résumé (path or URL)
//!  │
//!  ├─ 1. Input    load bytes, declare MIME type; non PDF/DOCX is skipped
//!  ├─ 2. Extract  pdfium (PDF) or word/document.xml (DOCX) → plain text
//!  ├─ 3. Prompt   embed the text in the extraction template
//!  ├─ 4. LLM      one completion call (optional retries)
//!  ├─ 5. Parse    labelled reply → rows, per TableLayout
//!  └─ 6. Export   concatenated table → XLSX / CSV / JSON
//! ```
//!
//! A résumé that fails at any step is reported in
//! [`SummaryOutput::documents`] and contributes no rows; the run goes on.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_resume2xlsx::{summarize_to_file, ExtractionConfig, TableLayout};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider auto-detected from OPENAI_API_KEY / ANTHROPIC_API_KEY / GEMINI_API_KEY
//!     let config = ExtractionConfig::builder()
//!         .layout(TableLayout::PerEntry)
//!         .build()?;
//!     let output = summarize_to_file(
//!         &["jane.pdf", "john.docx"],
//!         "multiple_resumes_summary_data.xlsx",
//!         &config,
//!     )
//!     .await?;
//!     eprintln!("{} rows from {} résumés", output.stats.total_rows, output.stats.total_documents);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `resume2xlsx` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! edgequake-resume2xlsx = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod export;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod stream;
pub mod summarize;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{
    ExtractionConfig, ExtractionConfigBuilder, TableLayout, DEFAULT_MODEL, MAX_RETRIES_LIMIT,
};
pub use error::{DocumentError, ResumeError};
pub use export::{export_table, render_text_table, ExportFormat, DEFAULT_OUTPUT_FILE};
pub use output::{
    DocumentResult, DocumentSummary, EntryRow, ResumeRow, SummaryOutput, SummaryStats,
    SummaryTable, NOT_AVAILABLE,
};
pub use pipeline::input::{DocumentKind, ResumeDocument};
pub use pipeline::llm::{Completion, CompletionClient, LlmCompletionClient};
pub use pipeline::parse::parse_reply;
pub use progress::{NoopProgressCallback, ProgressCallback, SummaryProgressCallback};
pub use stream::{summarize_stream, summarize_stream_with, DocumentStream};
pub use summarize::{summarize, summarize_documents, summarize_sync, summarize_to_file};
