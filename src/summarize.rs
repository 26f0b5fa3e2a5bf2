//! Eager (whole-batch) summarisation entry points.
//!
//! Résumés are processed strictly one at a time, in input order, and every
//! per-document problem is recorded in the returned [`SummaryOutput`] rather
//! than aborting the run. Only fatal conditions (no inputs, no provider,
//! output not writable) are returned as `Err`.
//!
//! Use [`crate::stream::summarize_stream`] instead when results should be
//! shown as each résumé finishes.

use crate::config::ExtractionConfig;
use crate::error::{DocumentError, ResumeError};
use crate::export::{export_table, ExportFormat};
use crate::output::{DocumentResult, DocumentSummary, SummaryOutput, SummaryStats, SummaryTable};
use crate::pipeline::input::{self, ResumeDocument};
use crate::pipeline::llm::{self, CompletionClient, LlmCompletionClient};
use crate::pipeline::{extract, parse};
use crate::prompts;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Summarise résumé files or URLs into one table.
///
/// # Errors
/// Returns `Err(ResumeError)` only for fatal errors:
/// - `inputs` is empty
/// - no LLM provider could be resolved
///
/// Unsupported, unreadable or unanswered résumés are reported in
/// `output.documents` and counted in `output.stats`.
pub async fn summarize<S: AsRef<str>>(
    inputs: &[S],
    config: &ExtractionConfig,
) -> Result<SummaryOutput, ResumeError> {
    if inputs.is_empty() {
        return Err(ResumeError::NoInputs);
    }
    info!("Starting summarisation of {} résumé(s)", inputs.len());

    let client = LlmCompletionClient::from_config(config)?;
    debug!("Using model {}", config.model_or_default());

    let mut run = RunState::new(config, inputs.len());
    for (i, input) in inputs.iter().enumerate() {
        let index = i + 1;
        run.document_started(index, display_input(input.as_ref()));
        let summary = summarize_input(&client, index, input.as_ref(), config).await;
        run.record(summary)?;
    }
    Ok(run.finish())
}

/// Summarise documents that are already in memory.
///
/// This is the pipeline itself: each document goes through type check, text
/// extraction, the completion call and the reply parser, and its rows are
/// appended to the running table in order. `client` answers the prompts.
pub async fn summarize_documents(
    documents: Vec<ResumeDocument>,
    client: &dyn CompletionClient,
    config: &ExtractionConfig,
) -> Result<SummaryOutput, ResumeError> {
    let mut run = RunState::new(config, documents.len());
    for (i, document) in documents.iter().enumerate() {
        let index = i + 1;
        run.document_started(index, &document.name);
        let summary = process_document(client, index, document, config).await;
        run.record(summary)?;
    }
    Ok(run.finish())
}

/// Summarise and write the table to `output_path`.
///
/// The format follows the path's extension, defaulting to XLSX. Nothing is
/// written when no résumé produced a row; that case is reported as
/// [`ResumeError::NoStructuredData`].
pub async fn summarize_to_file<S: AsRef<str>>(
    inputs: &[S],
    output_path: impl AsRef<Path>,
    config: &ExtractionConfig,
) -> Result<SummaryOutput, ResumeError> {
    let path = output_path.as_ref();
    let format = ExportFormat::from_path(path).unwrap_or_default();
    let output = summarize(inputs, config).await?.into_result()?;
    export_table(&output.table, path, format).await?;
    Ok(output)
}

/// Synchronous wrapper around [`summarize`].
///
/// Creates a temporary tokio runtime internally.
pub fn summarize_sync<S: AsRef<str>>(
    inputs: &[S],
    config: &ExtractionConfig,
) -> Result<SummaryOutput, ResumeError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| ResumeError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(summarize(inputs, config))
}

// ── Per-document steps ───────────────────────────────────────────────────

/// Resolve one path or URL and run it through the pipeline.
pub(crate) async fn summarize_input(
    client: &dyn CompletionClient,
    index: usize,
    input: &str,
    config: &ExtractionConfig,
) -> DocumentSummary {
    match input::resolve_input(input, config.download_timeout_secs).await {
        Ok(document) => process_document(client, index, &document, config).await,
        Err(error) => {
            let mut result = empty_result(index, display_input(input));
            result.error = Some(error);
            DocumentSummary {
                result,
                table: SummaryTable::empty(config.layout),
            }
        }
    }
}

/// Run one in-memory résumé through type check, extraction, completion and
/// parsing.
pub(crate) async fn process_document(
    client: &dyn CompletionClient,
    index: usize,
    document: &ResumeDocument,
    config: &ExtractionConfig,
) -> DocumentSummary {
    let start = Instant::now();
    let mut result = empty_result(index, &document.name);
    let mut table = SummaryTable::empty(config.layout);

    if let Err(error) = run_document(client, document, config, &mut result, &mut table).await {
        result.error = Some(error);
        table = SummaryTable::empty(config.layout);
    }

    result.rows = table.len();
    result.duration_ms = start.elapsed().as_millis() as u64;
    DocumentSummary { result, table }
}

async fn run_document(
    client: &dyn CompletionClient,
    document: &ResumeDocument,
    config: &ExtractionConfig,
    result: &mut DocumentResult,
    table: &mut SummaryTable,
) -> Result<(), DocumentError> {
    let name = document.name.as_str();

    let kind = document
        .kind()
        .ok_or_else(|| DocumentError::UnsupportedType {
            name: name.to_string(),
            mime_type: document.mime_type.clone(),
        })?;
    result.kind = Some(kind);

    let text = extract::extract_text(document, kind).await?;
    if text.is_empty() {
        return Err(DocumentError::EmptyText {
            name: name.to_string(),
        });
    }

    let prompt = prompts::extraction_prompt(config, &text);
    let system = prompts::system_prompt(config);
    let completion = llm::request_completion(client, name, system, &prompt, config).await?;
    result.input_tokens = completion.input_tokens;
    result.output_tokens = completion.output_tokens;

    let reply = completion.content.trim();
    result.reply = Some(reply.to_string());
    if reply.is_empty() {
        return Err(DocumentError::EmptyReply {
            name: name.to_string(),
        });
    }

    *table = parse::parse_reply(reply, config.layout, config.emit_blank_entry_row);
    Ok(())
}

fn empty_result(index: usize, name: &str) -> DocumentResult {
    DocumentResult {
        index,
        name: name.to_string(),
        kind: None,
        reply: None,
        rows: 0,
        input_tokens: 0,
        output_tokens: 0,
        duration_ms: 0,
        error: None,
    }
}

/// Name shown for an input before it is resolved: the last path segment.
fn display_input(input: &str) -> &str {
    input
        .trim_end_matches('/')
        .rsplit(['/', '\\'])
        .next()
        .filter(|s| !s.is_empty())
        .unwrap_or(input)
}

// ── Run bookkeeping ──────────────────────────────────────────────────────

/// Owns the running table for one run and fires progress events.
struct RunState<'a> {
    config: &'a ExtractionConfig,
    total: usize,
    table: SummaryTable,
    documents: Vec<DocumentResult>,
    start: Instant,
}

impl<'a> RunState<'a> {
    fn new(config: &'a ExtractionConfig, total: usize) -> Self {
        if let Some(ref cb) = config.progress_callback {
            cb.on_run_start(total);
        }
        Self {
            config,
            total,
            table: SummaryTable::empty(config.layout),
            documents: Vec::with_capacity(total),
            start: Instant::now(),
        }
    }

    fn document_started(&self, index: usize, name: &str) {
        debug!("Document {}/{}: {}", index, self.total, name);
        if let Some(ref cb) = self.config.progress_callback {
            cb.on_document_start(index, self.total, name);
        }
    }

    fn record(&mut self, summary: DocumentSummary) -> Result<(), ResumeError> {
        let DocumentSummary { result, table } = summary;
        let cb = self.config.progress_callback.as_ref();

        match result.error {
            None => {
                info!("{}: {} row(s)", result.name, result.rows);
                if let Some(cb) = cb {
                    cb.on_document_complete(result.index, self.total, &result.name, result.rows);
                }
            }
            Some(ref error) => {
                warn!("{}", error);
                if let Some(cb) = cb {
                    cb.on_document_error(result.index, self.total, &result.name, error.to_string());
                }
            }
        }

        self.table.append(table)?;
        self.documents.push(result);
        Ok(())
    }

    fn finish(self) -> SummaryOutput {
        let docs = &self.documents;
        let count = |f: fn(&DocumentError) -> bool| {
            docs.iter()
                .filter(|d| d.error.as_ref().is_some_and(f))
                .count()
        };
        let unsupported = count(DocumentError::is_unsupported);
        let warned = count(DocumentError::is_warning);
        let errored = docs.iter().filter(|d| d.error.is_some()).count();

        let stats = SummaryStats {
            total_documents: self.total,
            processed_documents: docs.len() - errored,
            unsupported_documents: unsupported,
            failed_documents: errored - unsupported - warned,
            warned_documents: warned,
            total_rows: self.table.len(),
            total_input_tokens: docs.iter().map(|d| d.input_tokens as u64).sum(),
            total_output_tokens: docs.iter().map(|d| d.output_tokens as u64).sum(),
            total_duration_ms: self.start.elapsed().as_millis() as u64,
        };

        info!(
            "Summarisation complete: {}/{} résumé(s), {} row(s), {}ms",
            stats.processed_documents, stats.total_documents, stats.total_rows, stats.total_duration_ms
        );
        if let Some(ref cb) = self.config.progress_callback {
            cb.on_run_complete(stats.total_documents, stats.total_rows);
        }

        SummaryOutput {
            table: self.table,
            documents: self.documents,
            stats,
        }
    }
}
