//! Output types: parsed rows, the summary table, and per-run statistics.

use crate::config::TableLayout;
use crate::error::{DocumentError, ResumeError};
use crate::pipeline::input::DocumentKind;
use serde::{Deserialize, Serialize};

/// Placeholder for a [`TableLayout::PerDocument`] field the reply did not provide.
pub const NOT_AVAILABLE: &str = "Not available";

/// Column headers for [`TableLayout::PerDocument`].
pub const RESUME_COLUMNS: [&str; 4] = ["Name", "Education", "Work Experience", "Skills"];

/// Column headers for [`TableLayout::PerEntry`].
pub const ENTRY_COLUMNS: [&str; 9] = [
    "Name",
    "Institution",
    "Degree",
    "Major",
    "Education Duration",
    "Company",
    "Role",
    "Work Duration",
    "Skills",
];

/// One row per résumé. Multi-item fields are newline-joined bullet fragments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResumeRow {
    pub name: String,
    pub education: String,
    pub work_experience: String,
    pub skills: String,
}

impl ResumeRow {
    pub fn cells(&self) -> [&str; 4] {
        [
            self.name.as_str(),
            self.education.as_str(),
            self.work_experience.as_str(),
            self.skills.as_str(),
        ]
    }
}

/// One row per education/work block; `name` and `skills` repeat on every row
/// of the same résumé.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryRow {
    pub name: String,
    pub institution: String,
    pub degree: String,
    pub major: String,
    pub education_duration: String,
    pub company: String,
    pub role: String,
    pub work_duration: String,
    pub skills: String,
}

impl EntryRow {
    pub fn cells(&self) -> [&str; 9] {
        [
            self.name.as_str(),
            self.institution.as_str(),
            self.degree.as_str(),
            self.major.as_str(),
            self.education_duration.as_str(),
            self.company.as_str(),
            self.role.as_str(),
            self.work_duration.as_str(),
            self.skills.as_str(),
        ]
    }
}

/// Rows of every résumé, concatenated in arrival order.
///
/// All rows share the shape chosen by [`TableLayout`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "layout", content = "rows", rename_all = "snake_case")]
pub enum SummaryTable {
    PerDocument(Vec<ResumeRow>),
    PerEntry(Vec<EntryRow>),
}

impl SummaryTable {
    /// An empty table of the given layout.
    pub fn empty(layout: TableLayout) -> Self {
        match layout {
            TableLayout::PerDocument => SummaryTable::PerDocument(Vec::new()),
            TableLayout::PerEntry => SummaryTable::PerEntry(Vec::new()),
        }
    }

    pub fn layout(&self) -> TableLayout {
        match self {
            SummaryTable::PerDocument(_) => TableLayout::PerDocument,
            SummaryTable::PerEntry(_) => TableLayout::PerEntry,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            SummaryTable::PerDocument(rows) => rows.len(),
            SummaryTable::PerEntry(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append `other`'s rows after this table's rows (union, not join).
    pub fn append(&mut self, other: SummaryTable) -> Result<(), ResumeError> {
        match (self, other) {
            (SummaryTable::PerDocument(rows), SummaryTable::PerDocument(more)) => {
                rows.extend(more)
            }
            (SummaryTable::PerEntry(rows), SummaryTable::PerEntry(more)) => rows.extend(more),
            (this, other) => {
                return Err(ResumeError::Internal(format!(
                    "cannot append a {:?} table to a {:?} table",
                    other.layout(),
                    this.layout()
                )))
            }
        }
        Ok(())
    }

    /// Column headers for this table's layout.
    pub fn columns(&self) -> &'static [&'static str] {
        match self {
            SummaryTable::PerDocument(_) => &RESUME_COLUMNS,
            SummaryTable::PerEntry(_) => &ENTRY_COLUMNS,
        }
    }

    /// Every row as cells in [`Self::columns`] order.
    pub fn records(&self) -> Vec<Vec<&str>> {
        match self {
            SummaryTable::PerDocument(rows) => rows.iter().map(|r| r.cells().to_vec()).collect(),
            SummaryTable::PerEntry(rows) => rows.iter().map(|r| r.cells().to_vec()).collect(),
        }
    }
}

/// Outcome of processing one résumé.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentResult {
    /// 1-based position in the input list.
    pub index: usize,
    /// File name (or the raw input when it could not be resolved).
    pub name: String,
    /// Detected kind; None when the input was never classified.
    pub kind: Option<DocumentKind>,
    /// The model's raw reply, when one was received.
    pub reply: Option<String>,
    /// Rows this résumé added to the summary table.
    pub rows: usize,
    pub input_tokens: usize,
    pub output_tokens: usize,
    pub duration_ms: u64,
    pub error: Option<DocumentError>,
}

impl DocumentResult {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// One résumé's outcome together with the rows it produced.
///
/// `table` is empty whenever `result.error` is set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentSummary {
    pub result: DocumentResult,
    pub table: SummaryTable,
}

/// Aggregate statistics for a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryStats {
    pub total_documents: usize,
    /// Documents that contributed rows.
    pub processed_documents: usize,
    /// Documents rejected for their file type.
    pub unsupported_documents: usize,
    /// Documents that could not be read or whose LLM call failed.
    pub failed_documents: usize,
    /// Documents with no text or an empty reply.
    pub warned_documents: usize,
    pub total_rows: usize,
    pub total_input_tokens: u64,
    pub total_output_tokens: u64,
    pub total_duration_ms: u64,
}

/// Everything a run produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryOutput {
    pub table: SummaryTable,
    pub documents: Vec<DocumentResult>,
    pub stats: SummaryStats,
}

impl SummaryOutput {
    /// True when no résumé produced any structured data.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Treat an empty table as an error.
    pub fn into_result(self) -> Result<Self, ResumeError> {
        if self.is_empty() {
            Err(ResumeError::NoStructuredData {
                total: self.stats.total_documents,
            })
        } else {
            Ok(self)
        }
    }
}
