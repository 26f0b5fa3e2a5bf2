//! Integration tests for the summarisation pipeline.
//!
//! Everything except `live_openai_summary` runs without an LLM: résumés are
//! built in memory and the model is a scripted [`CompletionClient`]. PDF
//! inputs may trigger the one-time pdfium download.
//!
//! `pdf_text_reaches_the_prompt` needs a pdfium library (`PDFIUM_LIB_PATH` or
//! the cached download) and skips itself otherwise.
//!
//! The live test makes a real LLM call and is gated behind `E2E_ENABLED`:
//!   E2E_ENABLED=1 OPENAI_API_KEY=sk-... cargo test --test pipeline -- --nocapture

use async_trait::async_trait;
use edgequake_resume2xlsx::{
    export_table, summarize_documents, summarize_stream_with, Completion, CompletionClient,
    DocumentError, DocumentKind, ExportFormat, ExtractionConfig, ResumeDocument,
    SummaryProgressCallback, SummaryTable, TableLayout, NOT_AVAILABLE,
};
use futures::StreamExt;
use std::collections::VecDeque;
use std::io::{Cursor, Write};
use std::sync::{Arc, Mutex};

// ── Test helpers ─────────────────────────────────────────────────────────────

const JANE_REPLY: &str = "Name: Jane Doe
Education:
    - Institution: MIT
      Degree: BS
      Major: CS
      Duration: 2015-2019
Work Experience:
    - Company: Acme
      Role: Engineer
      Duration: 2019-2022
Skills:
    - Python
    - SQL";

const JOHN_REPLY: &str = "Name: John Roe
Education:
    - Institution: Stanford
      Degree: MS
Work Experience:
    - Company: Initech
      Role: Analyst
    - Company: Globex
      Role: Lead
Skills:
    - Excel";

/// A one-paragraph-per-line DOCX containing `lines` (already XML-escaped).
fn docx(lines: &[&str]) -> Vec<u8> {
    let body: String = lines
        .iter()
        .map(|l| format!("<w:p><w:r><w:t xml:space=\"preserve\">{l}</w:t></w:r></w:p>"))
        .collect();
    let xml = format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
         <w:document xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\">\
         <w:body>{body}</w:body></w:document>"
    );

    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
    zip.start_file("word/document.xml", zip::write::SimpleFileOptions::default())
        .unwrap();
    zip.write_all(xml.as_bytes()).unwrap();
    zip.finish().unwrap().into_inner()
}

/// A one-page PDF showing `text` in Helvetica, with a correct xref table.
fn pdf(text: &str) -> Vec<u8> {
    let content = format!("BT /F1 18 Tf 72 700 Td ({text}) Tj ET");
    let objects = [
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
        "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Contents 4 0 R \
         /Resources << /Font << /F1 5 0 R >> >> >>"
            .to_string(),
        format!(
            "<< /Length {} >>\nstream\n{}\nendstream",
            content.len(),
            content
        ),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>".to_string(),
    ];

    let mut out = b"%PDF-1.4\n".to_vec();
    let mut offsets = Vec::new();
    for (i, body) in objects.iter().enumerate() {
        offsets.push(out.len());
        out.extend_from_slice(format!("{} 0 obj\n{}\nendobj\n", i + 1, body).as_bytes());
    }
    let xref = out.len();
    out.extend_from_slice(format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1).as_bytes());
    for offset in offsets {
        out.extend_from_slice(format!("{offset:010} 00000 n \n").as_bytes());
    }
    out.extend_from_slice(
        format!(
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
            objects.len() + 1,
            xref
        )
        .as_bytes(),
    );
    out
}

fn docx_doc(name: &str, lines: &[&str]) -> ResumeDocument {
    ResumeDocument::new(name, DocumentKind::Docx.mime_type(), docx(lines))
}

/// Answers prompts from a script and records every prompt it was given.
struct ScriptedClient {
    replies: Mutex<VecDeque<Result<String, String>>>,
    prompts: Mutex<Vec<(String, String)>>,
}

impl ScriptedClient {
    fn new(replies: Vec<Result<&str, &str>>) -> Self {
        Self {
            replies: Mutex::new(
                replies
                    .into_iter()
                    .map(|r| r.map(str::to_string).map_err(str::to_string))
                    .collect(),
            ),
            prompts: Mutex::new(Vec::new()),
        }
    }

    fn prompts(&self) -> Vec<(String, String)> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionClient for ScriptedClient {
    async fn complete(&self, system: &str, prompt: &str) -> Result<Completion, String> {
        self.prompts
            .lock()
            .unwrap()
            .push((system.to_string(), prompt.to_string()));
        let next = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err("no scripted reply left".to_string()))?;
        Ok(Completion {
            content: next,
            input_tokens: 100,
            output_tokens: 20,
        })
    }
}

fn per_document(table: &SummaryTable) -> &[edgequake_resume2xlsx::ResumeRow] {
    match table {
        SummaryTable::PerDocument(rows) => rows,
        other => panic!("expected per-document table, got {:?}", other.layout()),
    }
}

fn per_entry(table: &SummaryTable) -> &[edgequake_resume2xlsx::EntryRow] {
    match table {
        SummaryTable::PerEntry(rows) => rows,
        other => panic!("expected per-entry table, got {:?}", other.layout()),
    }
}

// ── Pipeline ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn rows_follow_input_order() {
    let client = ScriptedClient::new(vec![Ok(JANE_REPLY), Ok(JOHN_REPLY)]);
    let docs = vec![
        docx_doc("jane.docx", &["Jane Doe", "MIT 2015-2019"]),
        docx_doc("john.docx", &["John Roe", "Stanford"]),
    ];

    let out = summarize_documents(docs, &client, &ExtractionConfig::default())
        .await
        .unwrap();

    let rows = per_document(&out.table);
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].name, "Jane Doe");
    assert_eq!(rows[0].education, "Institution: MIT");
    assert_eq!(rows[0].work_experience, "Company: Acme");
    assert_eq!(rows[0].skills, "Python\nSQL");
    assert_eq!(rows[1].name, "John Roe");
    assert_eq!(rows[1].work_experience, "Company: Initech\nCompany: Globex");

    assert_eq!(out.stats.processed_documents, 2);
    assert_eq!(out.stats.total_rows, 2);
    assert_eq!(out.stats.total_input_tokens, 200);
    assert!(out.documents.iter().all(|d| d.is_success()));
}

#[tokio::test]
async fn prompt_embeds_extracted_text() {
    let client = ScriptedClient::new(vec![Ok(JANE_REPLY)]);
    let docs = vec![docx_doc("jane.docx", &["Jane Doe", "Rust &amp; SQL"])];
    summarize_documents(docs, &client, &ExtractionConfig::default())
        .await
        .unwrap();

    let prompts = client.prompts();
    assert_eq!(prompts.len(), 1);
    let (system, prompt) = &prompts[0];
    assert_eq!(
        system,
        "You are an assistant that extracts information from resumes."
    );
    assert!(prompt.ends_with("Resume Text:\nJane Doe\nRust & SQL"), "got: {prompt}");
}

#[tokio::test]
async fn per_entry_layout_expands_blocks() {
    let client = ScriptedClient::new(vec![Ok(JANE_REPLY), Ok(JOHN_REPLY)]);
    let docs = vec![
        docx_doc("jane.docx", &["Jane"]),
        docx_doc("john.docx", &["John"]),
    ];
    let config = ExtractionConfig::builder()
        .layout(TableLayout::PerEntry)
        .build()
        .unwrap();

    let out = summarize_documents(docs, &client, &config).await.unwrap();
    let rows = per_entry(&out.table);

    // Jane: 1 row. John: 1 education, 2 work blocks.
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0].institution, "MIT");
    assert_eq!(rows[0].education_duration, "2015-2019");
    assert_eq!(rows[0].work_duration, "2019-2022");
    assert_eq!(rows[0].skills, "Python, SQL");
    assert_eq!(rows[1].name, "John Roe");
    assert_eq!(rows[1].institution, "Stanford");
    assert_eq!(rows[1].company, "Initech");
    assert_eq!(rows[2].institution, "");
    assert_eq!(rows[2].company, "Globex");
    assert_eq!(rows[2].role, "Lead");
    assert_eq!(rows[2].skills, "Excel");
    assert_eq!(out.documents[1].rows, 2);
}

#[tokio::test]
async fn unsupported_file_is_skipped_without_halting() {
    let client = ScriptedClient::new(vec![Ok(JANE_REPLY)]);
    let docs = vec![
        ResumeDocument::new("notes.txt", "text/plain", b"Jane Doe".to_vec()),
        docx_doc("jane.docx", &["Jane"]),
    ];

    let out = summarize_documents(docs, &client, &ExtractionConfig::default())
        .await
        .unwrap();

    assert_eq!(per_document(&out.table).len(), 1);
    assert_eq!(client.prompts().len(), 1);
    assert_eq!(out.stats.unsupported_documents, 1);
    let err = out.documents[0].error.as_ref().unwrap();
    assert!(err.to_string().contains("notes.txt"));
    assert_eq!(out.documents[0].rows, 0);
}

#[tokio::test]
async fn corrupt_docx_is_reported_and_run_continues() {
    let client = ScriptedClient::new(vec![Ok(JANE_REPLY)]);
    let docs = vec![
        ResumeDocument::new("broken.docx", DocumentKind::Docx.mime_type(), b"PK?".to_vec()),
        docx_doc("jane.docx", &["Jane"]),
    ];

    let out = summarize_documents(docs, &client, &ExtractionConfig::default())
        .await
        .unwrap();

    assert!(matches!(
        out.documents[0].error,
        Some(DocumentError::ExtractionFailed { ref name, .. }) if name == "broken.docx"
    ));
    assert_eq!(out.stats.failed_documents, 1);
    assert_eq!(per_document(&out.table)[0].name, "Jane Doe");
}

#[tokio::test]
async fn corrupt_pdf_is_reported_and_run_continues() {
    let client = ScriptedClient::new(vec![Ok(JANE_REPLY)]);
    let docs = vec![
        ResumeDocument::new(
            "broken.pdf",
            DocumentKind::Pdf.mime_type(),
            b"%PDF-1.7\n1 0 obj << /Type /Catalog".to_vec(),
        ),
        docx_doc("jane.docx", &["Jane"]),
    ];

    let out = summarize_documents(docs, &client, &ExtractionConfig::default())
        .await
        .unwrap();

    let err = out.documents[0].error.as_ref().unwrap();
    assert!(
        matches!(err, DocumentError::ExtractionFailed { ref name, .. } if name == "broken.pdf"),
        "got: {err:?}"
    );
    assert!(err.to_string().contains("broken.pdf"));
    assert_eq!(client.prompts().len(), 1);
    assert_eq!(out.stats.failed_documents, 1);
    assert_eq!(per_document(&out.table)[0].name, "Jane Doe");
}

#[tokio::test]
async fn pdf_text_reaches_the_prompt() {
    if !pdfium_auto::is_pdfium_cached() {
        println!("SKIP: no pdfium library (set PDFIUM_LIB_PATH or run the CLI once on a PDF)");
        return;
    }

    let client = ScriptedClient::new(vec![Ok(JANE_REPLY)]);
    let docs = vec![ResumeDocument::new(
        "jane.pdf",
        DocumentKind::Pdf.mime_type(),
        pdf("Jane Doe Software Engineer"),
    )];

    let out = summarize_documents(docs, &client, &ExtractionConfig::default())
        .await
        .unwrap();

    assert!(out.documents[0].is_success(), "got: {:?}", out.documents[0].error);
    let (_, prompt) = &client.prompts()[0];
    assert!(
        prompt.ends_with("Resume Text:\nJane Doe Software Engineer"),
        "got: {prompt}"
    );
    assert_eq!(per_document(&out.table)[0].name, "Jane Doe");
}

#[tokio::test]
async fn empty_text_skips_the_completion_call() {
    let client = ScriptedClient::new(vec![]);
    let docs = vec![docx_doc("blank.docx", &["   ", ""])];

    let out = summarize_documents(docs, &client, &ExtractionConfig::default())
        .await
        .unwrap();

    assert!(client.prompts().is_empty());
    assert!(matches!(
        out.documents[0].error,
        Some(DocumentError::EmptyText { .. })
    ));
    assert_eq!(out.stats.warned_documents, 1);
    assert!(out.is_empty());
}

#[tokio::test]
async fn completion_failure_contributes_no_rows() {
    let client = ScriptedClient::new(vec![Err("401 Unauthorized"), Ok(JOHN_REPLY)]);
    let docs = vec![docx_doc("a.docx", &["A"]), docx_doc("b.docx", &["B"])];

    let out = summarize_documents(docs, &client, &ExtractionConfig::default())
        .await
        .unwrap();

    let rows = per_document(&out.table);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].name, "John Roe");
    let err = out.documents[0].error.as_ref().unwrap();
    assert!(err.to_string().contains("401 Unauthorized"));
    assert!(!err.is_warning());
}

#[tokio::test]
async fn empty_reply_is_a_warning() {
    let client = ScriptedClient::new(vec![Ok("   \n  ")]);
    let docs = vec![docx_doc("quiet.docx", &["Someone"])];

    let out = summarize_documents(docs, &client, &ExtractionConfig::default())
        .await
        .unwrap();

    let err = out.documents[0].error.as_ref().unwrap();
    assert_eq!(err.to_string(), "No information could be extracted from quiet.docx.");
    assert!(err.is_warning());
    assert!(out.is_empty());
    assert!(out.into_result().is_err());
}

#[tokio::test]
async fn unlabelled_reply_still_yields_a_sentinel_row() {
    let client = ScriptedClient::new(vec![Ok("Sorry, I cannot help with that.")]);
    let docs = vec![docx_doc("odd.docx", &["?"])];

    let out = summarize_documents(docs, &client, &ExtractionConfig::default())
        .await
        .unwrap();

    let rows = per_document(&out.table);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].name, NOT_AVAILABLE);
    assert_eq!(rows[0].skills, NOT_AVAILABLE);
}

// ── Progress ─────────────────────────────────────────────────────────────────

#[derive(Default)]
struct EventLog(Mutex<Vec<String>>);

impl SummaryProgressCallback for EventLog {
    fn on_run_start(&self, total: usize) {
        self.0.lock().unwrap().push(format!("run {total}"));
    }
    fn on_document_start(&self, index: usize, _total: usize, name: &str) {
        self.0.lock().unwrap().push(format!("start {index} {name}"));
    }
    fn on_document_complete(&self, index: usize, _total: usize, _name: &str, rows: usize) {
        self.0.lock().unwrap().push(format!("ok {index} {rows}"));
    }
    fn on_document_error(&self, index: usize, _total: usize, _name: &str, _error: String) {
        self.0.lock().unwrap().push(format!("err {index}"));
    }
    fn on_run_complete(&self, total: usize, rows: usize) {
        self.0.lock().unwrap().push(format!("done {total} {rows}"));
    }
}

#[tokio::test]
async fn progress_events_arrive_in_order() {
    let log = Arc::new(EventLog::default());
    let config = ExtractionConfig::builder()
        .progress_callback(log.clone() as Arc<dyn SummaryProgressCallback>)
        .build()
        .unwrap();
    let client = ScriptedClient::new(vec![Ok(JANE_REPLY)]);
    let docs = vec![
        docx_doc("jane.docx", &["Jane"]),
        ResumeDocument::new("x.png", "image/png", vec![0x89]),
    ];

    summarize_documents(docs, &client, &config).await.unwrap();

    assert_eq!(
        *log.0.lock().unwrap(),
        vec![
            "run 2",
            "start 1 jane.docx",
            "ok 1 1",
            "start 2 x.png",
            "err 2",
            "done 2 1",
        ]
    );
}

// ── Streaming ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn stream_yields_one_item_per_input() {
    let dir = tempfile::tempdir().unwrap();
    let jane = dir.path().join("jane.docx");
    std::fs::write(&jane, docx(&["Jane"])).unwrap();
    let notes = dir.path().join("notes.txt");
    std::fs::write(&notes, "plain text").unwrap();

    let client: Arc<dyn CompletionClient> = Arc::new(ScriptedClient::new(vec![Ok(JANE_REPLY)]));
    let inputs = vec![
        jane.to_string_lossy().into_owned(),
        notes.to_string_lossy().into_owned(),
        dir.path().join("missing.pdf").to_string_lossy().into_owned(),
    ];

    let items: Vec<_> = summarize_stream_with(&inputs, client, &ExtractionConfig::default())
        .collect()
        .await;

    assert_eq!(items.len(), 3);
    assert_eq!(items[0].result.index, 1);
    assert_eq!(items[0].table.len(), 1);
    assert!(items[1].result.error.as_ref().unwrap().is_unsupported());
    assert!(matches!(
        items[2].result.error,
        Some(DocumentError::NotFound { .. })
    ));
}

// ── Export ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn exports_round_trip_through_csv() {
    let client = ScriptedClient::new(vec![Ok(JANE_REPLY)]);
    let docs = vec![docx_doc("jane.docx", &["Jane"])];
    let config = ExtractionConfig::builder()
        .layout(TableLayout::PerEntry)
        .build()
        .unwrap();
    let out = summarize_documents(docs, &client, &config).await.unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("summary.csv");
    export_table(&out.table, &path, ExportFormat::Csv)
        .await
        .unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    let mut lines = text.lines();
    assert_eq!(
        lines.next(),
        Some("Name,Institution,Degree,Major,Education Duration,Company,Role,Work Duration,Skills")
    );
    assert_eq!(
        lines.next(),
        Some("Jane Doe,MIT,BS,CS,2015-2019,Acme,Engineer,2019-2022,\"Python, SQL\"")
    );

    let xlsx = dir.path().join("summary.xlsx");
    export_table(&out.table, &xlsx, ExportFormat::Xlsx)
        .await
        .unwrap();
    let bytes = std::fs::read(&xlsx).unwrap();
    assert!(bytes.starts_with(b"PK"));
}

// ── Live ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn live_openai_summary() {
    if std::env::var("E2E_ENABLED").is_err() {
        println!("SKIP: set E2E_ENABLED=1 to run e2e tests");
        return;
    }

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("jane.docx");
    std::fs::write(
        &path,
        docx(&[
            "Jane Doe",
            "Education: Massachusetts Institute of Technology, BSc Computer Science, 2015-2019",
            "Experience: Acme Corp, Software Engineer, 2019-2022",
            "Skills: Python, SQL, Docker",
        ]),
    )
    .unwrap();

    let config = ExtractionConfig::default();
    let out = edgequake_resume2xlsx::summarize(&[path.to_string_lossy().into_owned()], &config)
        .await
        .expect("provider should be configured for e2e runs");

    println!("{}", edgequake_resume2xlsx::render_text_table(&out.table));
    let rows = per_document(&out.table);
    assert_eq!(rows.len(), 1);
    assert!(rows[0].name.contains("Jane"), "got: {:?}", rows[0]);
}
