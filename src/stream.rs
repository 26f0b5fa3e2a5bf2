//! Streaming summarisation API: emit each résumé's rows as it finishes.
//!
//! Unlike the eager [`crate::summarize::summarize`], which returns only after
//! the whole batch, [`summarize_stream`] yields one [`DocumentSummary`] per
//! input. Documents are still processed one at a time, so items arrive in
//! input order. Progress callbacks are not fired; the stream itself is the
//! progress signal.

use crate::config::ExtractionConfig;
use crate::error::ResumeError;
use crate::output::DocumentSummary;
use crate::pipeline::llm::{CompletionClient, LlmCompletionClient};
use crate::summarize::summarize_input;
use futures::stream::{self, StreamExt};
use std::pin::Pin;
use std::sync::Arc;
use tokio_stream::Stream;
use tracing::info;

/// A boxed stream of per-résumé results.
pub type DocumentStream = Pin<Box<dyn Stream<Item = DocumentSummary> + Send>>;

/// Summarise résumés, streaming each one's rows as they are ready.
///
/// Per-document failures are carried in `item.result.error`.
///
/// # Returns
/// - `Ok(DocumentStream)`: one item per input, in input order
/// - `Err(ResumeError)`: no inputs, or no provider could be resolved
///
/// # Example
/// ```rust,no_run
/// use edgequake_resume2xlsx::{summarize_stream, ExtractionConfig};
/// use futures::StreamExt;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = ExtractionConfig::default();
/// let mut stream = summarize_stream(&["jane.pdf", "john.docx"], &config)?;
/// while let Some(item) = stream.next().await {
///     match item.result.error {
///         None => println!("{}: {} row(s)", item.result.name, item.table.len()),
///         Some(e) => eprintln!("{e}"),
///     }
/// }
/// # Ok(())
/// # }
/// ```
pub fn summarize_stream<S: AsRef<str>>(
    inputs: &[S],
    config: &ExtractionConfig,
) -> Result<DocumentStream, ResumeError> {
    if inputs.is_empty() {
        return Err(ResumeError::NoInputs);
    }
    let client: Arc<dyn CompletionClient> = Arc::new(LlmCompletionClient::from_config(config)?);
    Ok(summarize_stream_with(inputs, client, config))
}

/// Like [`summarize_stream`] but with a caller-supplied completion client.
pub fn summarize_stream_with<S: AsRef<str>>(
    inputs: &[S],
    client: Arc<dyn CompletionClient>,
    config: &ExtractionConfig,
) -> DocumentStream {
    info!("Starting streaming summarisation of {} résumé(s)", inputs.len());

    let inputs: Vec<String> = inputs.iter().map(|s| s.as_ref().to_string()).collect();
    let config = config.clone();

    let s = stream::iter(inputs.into_iter().enumerate()).then(move |(i, input)| {
        let client = Arc::clone(&client);
        let cfg = config.clone();
        async move { summarize_input(client.as_ref(), i + 1, &input, &cfg).await }
    });

    Box::pin(s)
}
