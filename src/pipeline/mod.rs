//! Pipeline stages for résumé summarisation.
//!
//! Each submodule implements exactly one transformation step and is tested
//! on its own.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ extract ──▶ llm ──▶ parse
//! (path/URL) (pdfium/zip) (chat)  (rows)
//! ```
//!
//! 1. [`input`]  : load the user-supplied path or URL and declare a MIME type
//! 2. [`extract`]: PDF or DOCX to plain text; runs in `spawn_blocking`
//! 3. [`llm`]    : send the fixed prompt, with optional retry/backoff; the
//!    only stage with network I/O besides URL downloads
//! 4. [`parse`]  : scan the labelled reply into table rows; never fails

pub mod extract;
pub mod input;
pub mod llm;
pub mod parse;
