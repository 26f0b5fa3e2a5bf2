//! Text extraction: turn a PDF or DOCX résumé into plain text.
//!
//! Both backends are CPU-bound and synchronous, so they run inside
//! `tokio::task::spawn_blocking`. The result is trimmed; an all-whitespace
//! document comes back as an empty string and the caller decides what that
//! means.
//!
//! * **PDF**: pdfium via `pdfium-render`, bound through `pdfium-auto`:
//!   `PDFIUM_LIB_PATH` when it exists, else the cached download, else a
//!   first-use download into the cache.
//! * **DOCX**: `word/document.xml` is read out of the zip container and every
//!   `<w:p>` paragraph becomes one line. A paragraph nested in another (a
//!   text box) becomes its own line.

use crate::error::DocumentError;
use crate::pipeline::input::{DocumentKind, ResumeDocument};
use pdfium_render::prelude::*;
use quick_xml::escape::resolve_predefined_entity;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::io::{Cursor, Read};
use tracing::{debug, warn};

/// Extract the visible text of `document`, already classified as `kind`.
pub async fn extract_text(
    document: &ResumeDocument,
    kind: DocumentKind,
) -> Result<String, DocumentError> {
    let name = document.name.clone();
    let bytes = document.bytes.clone();

    let result = tokio::task::spawn_blocking(move || match kind {
        DocumentKind::Pdf => extract_pdf_text(&bytes),
        DocumentKind::Docx => extract_docx_text(&bytes),
    })
    .await
    .map_err(|e| format!("extraction task panicked: {}", e))
    .and_then(|r| r);

    match result {
        Ok(text) => {
            let text = text.trim().to_string();
            debug!("Extracted {} chars from {}", text.len(), name);
            Ok(text)
        }
        Err(detail) => Err(DocumentError::ExtractionFailed { name, detail }),
    }
}

/// Concatenate the text of every page, one page per line block.
fn extract_pdf_text(bytes: &[u8]) -> Result<String, String> {
    let pdfium = pdfium_auto::bind_pdfium_silent().map_err(|e| e.to_string())?;
    let document = pdfium
        .load_pdf_from_byte_slice(bytes, None)
        .map_err(|e| format!("{:?}", e))?;

    let mut text = String::new();
    for (idx, page) in document.pages().iter().enumerate() {
        match page.text() {
            Ok(page_text) => {
                if !text.is_empty() {
                    text.push('\n');
                }
                text.push_str(&page_text.all());
            }
            // An unreadable page contributes nothing, like an empty one.
            Err(e) => warn!("Skipping text of page {}: {:?}", idx + 1, e),
        }
    }
    Ok(text)
}

/// Paragraph texts of `word/document.xml`, newline-joined.
fn extract_docx_text(bytes: &[u8]) -> Result<String, String> {
    let mut archive =
        zip::ZipArchive::new(Cursor::new(bytes)).map_err(|e| format!("not a DOCX archive: {e}"))?;

    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(|e| format!("missing word/document.xml: {e}"))?
        .read_to_string(&mut xml)
        .map_err(|e| format!("unreadable word/document.xml: {e}"))?;

    paragraphs_from_document_xml(&xml).map(|p| p.join("\n"))
}

/// Walk WordprocessingML and collect the text of each `<w:p>`.
///
/// Runs (`<w:t>`) are concatenated, `<w:tab/>` becomes a tab and `<w:br/>` a
/// newline. Empty paragraphs are kept so blank lines survive. Open
/// paragraphs form a stack, so text after a nested paragraph still lands in
/// the outer one.
fn paragraphs_from_document_xml(xml: &str) -> Result<Vec<String>, String> {
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();
    let mut paragraphs = Vec::new();
    let mut open: Vec<String> = Vec::new();
    let mut in_text = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"w:p" => open.push(String::new()),
                b"w:t" => in_text = true,
                _ => {}
            },
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"w:p" => {
                    if let Some(done) = open.pop() {
                        paragraphs.push(done.trim_end().to_string());
                    }
                }
                b"w:t" => in_text = false,
                _ => {}
            },
            // `<w:p/>` is an empty paragraph.
            Ok(Event::Empty(e)) if e.name().as_ref() == b"w:p" => paragraphs.push(String::new()),
            Ok(Event::Empty(e)) => {
                if let Some(current) = open.last_mut() {
                    match e.name().as_ref() {
                        b"w:tab" => current.push('\t'),
                        b"w:br" | b"w:cr" => current.push('\n'),
                        _ => {}
                    }
                }
            }
            Ok(Event::Text(e)) if in_text => {
                if let Some(current) = open.last_mut() {
                    let value = e.xml_content().map_err(|err| err.to_string())?;
                    current.push_str(&value);
                }
            }
            Ok(Event::GeneralRef(e)) if in_text => {
                if let Some(current) = open.last_mut() {
                    if let Some(ch) = e.resolve_char_ref().map_err(|err| err.to_string())? {
                        current.push(ch);
                    } else {
                        let entity = e.decode().map_err(|err| err.to_string())?;
                        if let Some(resolved) = resolve_predefined_entity(&entity) {
                            current.push_str(resolved);
                        }
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(err) => {
                return Err(format!(
                    "malformed XML at byte {}: {}",
                    reader.buffer_position(),
                    err
                ))
            }
            _ => {}
        }

        buf.clear();
    }

    Ok(paragraphs)
}
