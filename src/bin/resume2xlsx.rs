//! CLI binary for edgequake-resume2xlsx.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ExtractionConfig`, runs the batch and writes the spreadsheet.

use anyhow::{Context, Result};
use clap::Parser;
use edgequake_resume2xlsx::pipeline::llm::credential_env_var;
use edgequake_resume2xlsx::{
    export_table, render_text_table, summarize, ExportFormat, ExtractionConfig, ProgressCallback,
    SummaryOutput, SummaryProgressCallback, TableLayout, DEFAULT_OUTPUT_FILE,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: one bar for the batch plus a log line per
/// résumé.
struct CliProgressCallback {
    bar: ProgressBar,
    started: Mutex<Option<Instant>>,
    errors: AtomicUsize,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.cyan} {prefix:.bold}  \
                 [{bar:42.green/238}] {pos:>3}/{len} résumés  \
                 ⏱ {elapsed_precise}  {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▉▊▋▌▍▎▏  ")
            .tick_strings(TICKS),
        );
        bar.set_prefix("Summarising");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            started: Mutex::new(None),
            errors: AtomicUsize::new(0),
        })
    }

    fn elapsed_secs(&self) -> f64 {
        self.started
            .lock()
            .ok()
            .and_then(|mut s| s.take())
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }
}

impl SummaryProgressCallback for CliProgressCallback {
    fn on_run_start(&self, total_documents: usize) {
        self.bar.set_length(total_documents as u64);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Summarising {total_documents} résumé(s)…"))
        ));
    }

    fn on_document_start(&self, _index: usize, _total: usize, name: &str) {
        if let Ok(mut s) = self.started.lock() {
            *s = Some(Instant::now());
        }
        self.bar.set_message(name.to_string());
    }

    fn on_document_complete(&self, index: usize, total: usize, name: &str, rows: usize) {
        self.bar.println(format!(
            "  {} {:>3}/{:<3}  {}  {}  {}",
            green("✓"),
            index,
            total,
            name,
            dim(&format!("{rows} row(s)")),
            dim(&format!("{:.1}s", self.elapsed_secs())),
        ));
        self.bar.inc(1);
    }

    fn on_document_error(&self, index: usize, total: usize, _name: &str, error: String) {
        self.errors.fetch_add(1, Ordering::SeqCst);
        let msg = if error.chars().count() > 100 {
            format!("{}\u{2026}", error.chars().take(99).collect::<String>())
        } else {
            error
        };
        self.bar.println(format!(
            "  {} {:>3}/{:<3}  {}  {}",
            red("✗"),
            index,
            total,
            red(&msg),
            dim(&format!("{:.1}s", self.elapsed_secs())),
        ));
        self.bar.inc(1);
    }

    fn on_run_complete(&self, total_documents: usize, total_rows: usize) {
        self.bar.finish_and_clear();
        let failed = self.errors.load(Ordering::SeqCst);
        let mark = if failed == 0 {
            green("✔")
        } else if failed == total_documents {
            red("✘")
        } else {
            yellow("⚠")
        };
        eprintln!(
            "{} {}/{} résumé(s) summarised, {} row(s)",
            mark,
            bold(&(total_documents - failed).to_string()),
            total_documents,
            bold(&total_rows.to_string()),
        );
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Summarise a folder of résumés into the default spreadsheet
  resume2xlsx cvs/*.pdf cvs/*.docx

  # One row per education/work entry
  resume2xlsx --layout per-entry jane.pdf john.docx -o team.xlsx

  # CSV instead of XLSX
  resume2xlsx jane.pdf -o summary.csv

  # Show the table and the raw model replies
  resume2xlsx --print-table --show-replies jane.pdf

  # Use a specific model
  resume2xlsx --provider openai --model gpt-4.1-mini jane.pdf

OUTPUT LAYOUTS:
  per-document  Name | Education | Work Experience | Skills  (one row per résumé)
  per-entry     Name | Institution | Degree | Major | Education Duration |
                Company | Role | Work Duration | Skills    (one row per entry)

ENVIRONMENT VARIABLES:
  RESUME2XLSX_API_KEY     API key for the selected provider
  OPENAI_API_KEY          OpenAI API key
  ANTHROPIC_API_KEY       Anthropic API key
  GEMINI_API_KEY          Google Gemini API key
  EDGEQUAKE_LLM_PROVIDER  Override provider (openai, anthropic, gemini, ollama)
  EDGEQUAKE_MODEL         Override model ID
  PDFIUM_LIB_PATH         Existing libpdfium to use instead of the cached download

When no key is configured for openai, anthropic or gemini and stdin is a
terminal, the key is asked for interactively (input is not echoed).

The PDF engine (~30 MB) is downloaded once, on the first run with PDF input,
and cached for later runs.
"#;

/// Summarise PDF/DOCX résumés into a spreadsheet using an LLM.
#[derive(Parser, Debug)]
#[command(
    name = "resume2xlsx",
    version,
    about = "Summarise PDF/DOCX résumés into a spreadsheet using an LLM",
    long_about = "Extract name, education, work experience and skills from PDF and DOCX \
résumés with a chat-completion model and collect them in one spreadsheet. Supports OpenAI, \
Anthropic, Google Gemini and any OpenAI-compatible endpoint.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Résumé files (PDF or DOCX) or HTTP/HTTPS URLs, processed in order.
    #[arg(required = true)]
    inputs: Vec<String>,

    /// Output file. Format follows the extension unless --format is given.
    #[arg(short, long, env = "RESUME2XLSX_OUTPUT", default_value = DEFAULT_OUTPUT_FILE)]
    output: PathBuf,

    /// Output format: xlsx, csv, json.
    #[arg(long, env = "RESUME2XLSX_FORMAT", value_enum)]
    format: Option<FormatArg>,

    /// Table layout: one row per résumé, or one row per education/work entry.
    #[arg(long, env = "RESUME2XLSX_LAYOUT", value_enum, default_value = "per-document")]
    layout: LayoutArg,

    /// LLM model ID (e.g. gpt-4.1-nano, gpt-4.1-mini).
    #[arg(long, env = "EDGEQUAKE_MODEL")]
    model: Option<String>,

    /// LLM provider: openai, anthropic, gemini, ollama, azure.
    #[arg(long, env = "EDGEQUAKE_PROVIDER")]
    provider: Option<String>,

    /// API key for the provider. Prompted for on a terminal when missing.
    #[arg(long, env = "RESUME2XLSX_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Max LLM output tokens per résumé.
    #[arg(long, env = "RESUME2XLSX_MAX_TOKENS", default_value_t = 800)]
    max_tokens: usize,

    /// LLM temperature (0.0–2.0).
    #[arg(long, env = "RESUME2XLSX_TEMPERATURE", default_value_t = 0.1)]
    temperature: f32,

    /// Retries per résumé on LLM failure (0-10).
    #[arg(
        long,
        env = "RESUME2XLSX_MAX_RETRIES",
        default_value_t = 0,
        value_parser = clap::value_parser!(u32).range(..=10)
    )]
    max_retries: u32,

    /// Per-call LLM timeout in seconds (0 disables).
    #[arg(long, env = "RESUME2XLSX_API_TIMEOUT", default_value_t = 60)]
    api_timeout: u64,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "RESUME2XLSX_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// Path to a text file containing a custom system prompt.
    #[arg(long, env = "RESUME2XLSX_SYSTEM_PROMPT")]
    system_prompt: Option<PathBuf>,

    /// Path to a custom extraction template containing {resume_text}.
    #[arg(long, env = "RESUME2XLSX_PROMPT_TEMPLATE")]
    prompt_template: Option<PathBuf>,

    /// With --layout per-entry, drop résumés that list no education or work entry.
    #[arg(long)]
    no_blank_entry_rows: bool,

    /// Print each model reply to stderr.
    #[arg(long)]
    show_replies: bool,

    /// Print the summary table to stdout.
    #[arg(long)]
    print_table: bool,

    /// Print the full run result (table, per-résumé outcomes, stats) as JSON to stdout.
    #[arg(long)]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "RESUME2XLSX_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "RESUME2XLSX_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "RESUME2XLSX_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum FormatArg {
    Xlsx,
    Csv,
    Json,
}

impl From<FormatArg> for ExportFormat {
    fn from(v: FormatArg) -> Self {
        match v {
            FormatArg::Xlsx => ExportFormat::Xlsx,
            FormatArg::Csv => ExportFormat::Csv,
            FormatArg::Json => ExportFormat::Json,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum LayoutArg {
    PerDocument,
    PerEntry,
}

impl From<LayoutArg> for TableLayout {
    fn from(v: LayoutArg) -> Self {
        match v {
            LayoutArg::PerDocument => TableLayout::PerDocument,
            LayoutArg::PerEntry => TableLayout::PerEntry,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO-level library logs.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Ensure PDFium engine is available ───────────────────────────────────
    // Only PDF input needs it; DOCX-only runs never download.
    if cli.inputs.iter().any(|i| might_be_pdf(i)) && !pdfium_auto::is_pdfium_cached() {
        ensure_pdf_engine(cli.quiet)?;
    }

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn SummaryProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb).await?;

    // ── Run ──────────────────────────────────────────────────────────────
    let output = summarize(&cli.inputs, &config)
        .await
        .context("Summarisation failed")?;

    report_replies(&cli, &output);

    if output.is_empty() {
        if cli.json {
            print_json(&output)?;
        }
        eprintln!("{}", yellow("No structured data was extracted from the resumes."));
        return Ok(());
    }

    let format = cli
        .format
        .map(ExportFormat::from)
        .or_else(|| ExportFormat::from_path(&cli.output))
        .unwrap_or_default();
    export_table(&output.table, &cli.output, format)
        .await
        .context("Export failed")?;

    if cli.json {
        print_json(&output)?;
    } else if cli.print_table {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        handle
            .write_all(render_text_table(&output.table).as_bytes())
            .context("Failed to write to stdout")?;
    }

    if !cli.quiet {
        let stats = &output.stats;
        eprintln!(
            "{}  {} row(s) from {}/{} résumé(s)  {}ms  →  {}",
            green("✔"),
            stats.total_rows,
            stats.processed_documents,
            stats.total_documents,
            stats.total_duration_ms,
            bold(&cli.output.display().to_string()),
        );
        eprintln!(
            "   {} tokens in  /  {} tokens out",
            dim(&stats.total_input_tokens.to_string()),
            dim(&stats.total_output_tokens.to_string()),
        );
    }

    Ok(())
}

/// Raw model replies, for checking what the parser was given.
fn report_replies(cli: &Cli, output: &SummaryOutput) {
    if cli.quiet || !cli.show_replies {
        return;
    }
    for doc in &output.documents {
        if let Some(ref reply) = doc.reply {
            eprintln!("{}\n{}\n", bold(&format!("── {} ──", doc.name)), reply);
        }
    }
}

fn print_json(output: &SummaryOutput) -> Result<()> {
    let json = serde_json::to_string_pretty(output).context("Failed to serialise output")?;
    println!("{json}");
    Ok(())
}

/// Map CLI args to `ExtractionConfig`.
async fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ExtractionConfig> {
    let system_prompt = read_optional(cli.system_prompt.as_ref(), "system prompt").await?;
    let prompt_template = read_optional(cli.prompt_template.as_ref(), "prompt template").await?;

    let mut builder = ExtractionConfig::builder()
        .layout(cli.layout.into())
        .max_tokens(cli.max_tokens)
        .temperature(cli.temperature)
        .max_retries(cli.max_retries)
        .api_timeout_secs(cli.api_timeout)
        .download_timeout_secs(cli.download_timeout)
        .emit_blank_entry_row(!cli.no_blank_entry_rows);

    if let Some(ref model) = cli.model {
        builder = builder.model(model);
    }
    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider);
    }
    if let Some(prompt) = system_prompt {
        builder = builder.system_prompt(prompt);
    }
    if let Some(template) = prompt_template {
        builder = builder.prompt_template(template);
    }
    if let Some(key) = api_key(cli)? {
        builder = builder.api_key(key);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

async fn read_optional(path: Option<&PathBuf>, what: &str) -> Result<Option<String>> {
    match path {
        Some(path) => Ok(Some(
            tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read {} from {:?}", what, path))?,
        )),
        None => Ok(None),
    }
}

/// Anything not plainly a DOCX may turn out to be a PDF.
fn might_be_pdf(input: &str) -> bool {
    !input.to_ascii_lowercase().ends_with(".docx")
}

/// Download and cache pdfium, with a byte progress bar unless quiet.
fn ensure_pdf_engine(quiet: bool) -> Result<()> {
    if quiet {
        tokio::task::block_in_place(|| pdfium_auto::ensure_pdfium_library(None))
            .context("Failed to download PDFium engine")?;
        return Ok(());
    }

    let dl_bar = ProgressBar::new(0);
    dl_bar.set_style(
        ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  [{bar:42.green/238}] {bytes}/{total_bytes}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  "),
    );
    dl_bar.set_prefix("PDF engine");
    dl_bar.enable_steady_tick(Duration::from_millis(80));

    let bar = dl_bar.clone();
    tokio::task::block_in_place(|| {
        pdfium_auto::ensure_pdfium_library(Some(&|downloaded, total| {
            if let Some(t) = total {
                if bar.length().unwrap_or(0) != t {
                    bar.set_length(t);
                }
            }
            bar.set_position(downloaded);
        }))
    })
    .context("Failed to download PDFium engine")?;

    dl_bar.finish_with_message("ready");
    Ok(())
}

/// The key from `--api-key`, or one typed in at the terminal.
///
/// Only providers that take an entered key are asked for one. Returns `None`
/// when that provider's key variable is already set, when the provider needs
/// no key, or when there is no terminal to ask on; provider resolution then
/// runs as usual.
fn api_key(cli: &Cli) -> Result<Option<String>> {
    if let Some(ref key) = cli.api_key {
        return Ok(Some(key.clone()));
    }

    let provider = cli.provider.as_deref().unwrap_or("openai");
    let Some(var) = credential_env_var(provider) else {
        return Ok(None);
    };
    let configured = std::env::var(var).is_ok_and(|v| !v.is_empty())
        || std::env::var("EDGEQUAKE_LLM_PROVIDER").is_ok_and(|v| !v.is_empty());
    if configured || cli.quiet || !io::stdin().is_terminal() {
        return Ok(None);
    }

    let term = console::Term::stderr();
    eprint!("Enter your API key for {} ({}): ", provider, var);
    io::stderr().flush().ok();
    let line = term
        .read_secure_line()
        .context("Failed to read API key")?;
    let key = line.trim();
    if key.is_empty() {
        anyhow::bail!("An API key is required to call {}", provider);
    }
    Ok(Some(key.to_string()))
}
