//! Reply parser: a line-oriented scanner over the model's free-text answer.
//!
//! The scanner assumes the labelled layout requested by
//! [`crate::prompts::EXTRACTION_TEMPLATE`] but never fails on anything else:
//! lines matching no known prefix are skipped and missing sections degrade to
//! default values.
//!
//! Each line is trimmed and tested against the known prefixes in priority
//! order; the first match wins and a line triggers at most one action.
//! `Name:` never changes the current section. The three section headers
//! (`Education:`, `Work Experience:`, `Skills:`) only switch the section.
//!
//! ## Layouts
//!
//! * [`TableLayout::PerDocument`]: every `-` bullet under a section is
//!   collected verbatim (minus the dash). Continuation lines without a leading
//!   dash (`Degree:`, `Role:`, …) are dropped, so an education entry
//!   contributes only its `Institution: …` bullet. Empty sections become
//!   [`NOT_AVAILABLE`].
//!
//! * [`TableLayout::PerEntry`]: `- Institution:` and `- Company:` open
//!   education and work blocks; continuation lines fill the open block of the
//!   *current section*, so a `Duration:` under `Education:` can never land in
//!   a work block. Blocks are flushed into parallel columns on the next
//!   boundary line and at end of input, then every column is padded with
//!   empty strings to the longest one.

use crate::config::TableLayout;
use crate::output::{EntryRow, ResumeRow, SummaryTable, NOT_AVAILABLE};

/// Sections of the reply, entered via a header line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Education,
    WorkExperience,
    Skills,
}

impl Section {
    /// The section a trimmed line opens, if it is a header.
    fn from_header(line: &str) -> Option<Self> {
        if line.starts_with("Education:") {
            Some(Section::Education)
        } else if line.starts_with("Work Experience:") {
            Some(Section::WorkExperience)
        } else if line.starts_with("Skills:") {
            Some(Section::Skills)
        } else {
            None
        }
    }
}

/// Parse one reply into the rows it contributes under `layout`.
///
/// `emit_blank_entry_row` only affects [`TableLayout::PerEntry`]; see
/// [`parse_entry_rows`].
pub fn parse_reply(reply: &str, layout: TableLayout, emit_blank_entry_row: bool) -> SummaryTable {
    match layout {
        TableLayout::PerDocument => SummaryTable::PerDocument(vec![parse_resume_row(reply)]),
        TableLayout::PerEntry => {
            SummaryTable::PerEntry(parse_entry_rows(reply, emit_blank_entry_row))
        }
    }
}

/// Split on every line boundary a model may emit, not only `\n`.
///
/// `\r\n` yields an extra empty line, which the scanner ignores.
fn reply_lines(reply: &str) -> impl Iterator<Item = &str> {
    reply
        .split([
            '\n', '\r', '\x0b', '\x0c', '\x1c', '\x1d', '\x1e', '\u{85}', '\u{2028}', '\u{2029}',
        ])
        .map(str::trim)
}

/// Text after the first colon, trimmed.
fn value_after_colon(line: &str) -> &str {
    line.split_once(':').map(|(_, v)| v.trim()).unwrap_or("")
}

fn join_or_not_available(items: &[String]) -> String {
    if items.is_empty() {
        NOT_AVAILABLE.to_string()
    } else {
        items.join("\n")
    }
}

/// Collapse a reply into a single row of newline-joined bullet lists.
pub fn parse_resume_row(reply: &str) -> ResumeRow {
    let mut name: Option<String> = None;
    let mut section: Option<Section> = None;
    let mut education = Vec::new();
    let mut work_experience = Vec::new();
    let mut skills = Vec::new();

    for line in reply_lines(reply) {
        if line.starts_with("Name:") {
            name = Some(value_after_colon(line).to_string());
        } else if let Some(header) = Section::from_header(line) {
            section = Some(header);
        } else if let (Some(current), Some(bullet)) = (section, line.strip_prefix('-')) {
            let item = bullet.trim().to_string();
            match current {
                Section::Education => education.push(item),
                Section::WorkExperience => work_experience.push(item),
                Section::Skills => skills.push(item),
            }
        }
    }

    ResumeRow {
        name: name.unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        education: join_or_not_available(&education),
        work_experience: join_or_not_available(&work_experience),
        skills: join_or_not_available(&skills),
    }
}

#[derive(Debug, Default)]
struct EducationBlock {
    institution: String,
    degree: String,
    major: String,
    duration: String,
}

#[derive(Debug, Default)]
struct WorkBlock {
    company: String,
    role: String,
    duration: String,
}

/// Parallel columns filled as blocks are flushed.
///
/// Education columns always share one length, as do work columns, because a
/// flush pushes to all columns of its group at once.
#[derive(Debug, Default)]
struct EntryColumns {
    institution: Vec<String>,
    degree: Vec<String>,
    major: Vec<String>,
    education_duration: Vec<String>,
    company: Vec<String>,
    role: Vec<String>,
    work_duration: Vec<String>,
}

impl EntryColumns {
    fn flush_education(&mut self, block: Option<EducationBlock>) {
        if let Some(b) = block {
            self.institution.push(b.institution);
            self.degree.push(b.degree);
            self.major.push(b.major);
            self.education_duration.push(b.duration);
        }
    }

    fn flush_work(&mut self, block: Option<WorkBlock>) {
        if let Some(b) = block {
            self.company.push(b.company);
            self.role.push(b.role);
            self.work_duration.push(b.duration);
        }
    }

    /// Right-pad every column with empty strings to `len`.
    fn pad_to(&mut self, len: usize) {
        for column in [
            &mut self.institution,
            &mut self.degree,
            &mut self.major,
            &mut self.education_duration,
            &mut self.company,
            &mut self.role,
            &mut self.work_duration,
        ] {
            column.resize(len, String::new());
        }
    }
}

/// Expand a reply into one row per education/work block.
///
/// Row `i` pairs the `i`-th education block with the `i`-th work block; the
/// shorter group is padded with empty cells. `name` (empty when absent) and
/// the `", "`-joined skills repeat on every row.
///
/// A reply with neither education nor work blocks yields one row with blank
/// entry cells when `emit_blank_entry_row` is set, and no rows otherwise.
pub fn parse_entry_rows(reply: &str, emit_blank_entry_row: bool) -> Vec<EntryRow> {
    let mut name = String::new();
    let mut section: Option<Section> = None;
    let mut skills: Vec<String> = Vec::new();
    let mut education: Option<EducationBlock> = None;
    let mut work: Option<WorkBlock> = None;
    let mut columns = EntryColumns::default();

    for line in reply_lines(reply) {
        if line.starts_with("Name:") {
            name = value_after_colon(line).to_string();
        } else if let Some(header) = Section::from_header(line) {
            section = Some(header);
        } else if line.starts_with("- Institution:") {
            columns.flush_education(education.take());
            education = Some(EducationBlock {
                institution: value_after_colon(line).to_string(),
                ..Default::default()
            });
        } else if line.starts_with("- Company:") {
            columns.flush_work(work.take());
            work = Some(WorkBlock {
                company: value_after_colon(line).to_string(),
                ..Default::default()
            });
        } else if section == Some(Section::Education) {
            if let Some(block) = education.as_mut() {
                if line.starts_with("Degree:") {
                    block.degree = value_after_colon(line).to_string();
                } else if line.starts_with("Major:") {
                    block.major = value_after_colon(line).to_string();
                } else if line.starts_with("Duration:") {
                    block.duration = value_after_colon(line).to_string();
                }
            }
        } else if section == Some(Section::WorkExperience) {
            if let Some(block) = work.as_mut() {
                if line.starts_with("Role:") {
                    block.role = value_after_colon(line).to_string();
                } else if line.starts_with("Duration:") {
                    block.duration = value_after_colon(line).to_string();
                }
            }
        } else if section == Some(Section::Skills) {
            if let Some(bullet) = line.strip_prefix('-') {
                skills.push(bullet.trim().to_string());
            }
        }
    }

    // The last block of each group is never followed by a boundary line.
    columns.flush_education(education.take());
    columns.flush_work(work.take());

    let max_len = columns.institution.len().max(columns.company.len());
    let rows = if max_len == 0 && emit_blank_entry_row {
        1
    } else {
        max_len
    };
    columns.pad_to(rows);

    let skills = skills.join(", ");
    let EntryColumns {
        institution,
        degree,
        major,
        education_duration,
        company,
        role,
        work_duration,
    } = columns;

    institution
        .into_iter()
        .zip(degree)
        .zip(major)
        .zip(education_duration)
        .zip(company)
        .zip(role)
        .zip(work_duration)
        .map(
            |((((((institution, degree), major), education_duration), company), role), work_duration)| {
                EntryRow {
                    name: name.clone(),
                    institution,
                    degree,
                    major,
                    education_duration,
                    company,
                    role,
                    work_duration,
                    skills: skills.clone(),
                }
            },
        )
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const JANE: &str = "Name: Jane Doe\nEducation:\n- Institution: MIT\nDegree: BS\nMajor: CS\nDuration: 2015-2019\nWork Experience:\n- Company: Acme\nRole: Engineer\nDuration: 2019-2022\nSkills:\n- Python\n- SQL";

    // ── PerDocument ──────────────────────────────────────────────────────

    #[test]
    fn jane_doe_per_document() {
        let row = parse_resume_row(JANE);
        assert_eq!(row.name, "Jane Doe");
        // Continuation lines lack a dash and are dropped.
        assert_eq!(row.education, "Institution: MIT");
        assert_eq!(row.work_experience, "Company: Acme");
        assert_eq!(row.skills, "Python\nSQL");
    }

    #[test]
    fn missing_everything_is_not_available() {
        let row = parse_resume_row("I could not read this résumé, sorry.");
        assert_eq!(row.name, NOT_AVAILABLE);
        assert_eq!(row.education, NOT_AVAILABLE);
        assert_eq!(row.work_experience, NOT_AVAILABLE);
        assert_eq!(row.skills, NOT_AVAILABLE);
    }

    #[test]
    fn one_bullet_each_and_two_skills() {
        let reply = "Education:\n  - Stanford, BA\nWork Experience:\n  - Initech\nSkills:\n  - Rust\n  - Go";
        let table = parse_reply(reply, TableLayout::PerDocument, true);
        let SummaryTable::PerDocument(rows) = table else {
            panic!("expected per-document rows");
        };
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].education, "Stanford, BA");
        assert!(!rows[0].education.contains('\n'));
        assert_eq!(rows[0].work_experience, "Initech");
        assert_eq!(rows[0].skills, "Rust\nGo");
    }

    #[test]
    fn bullets_before_any_section_are_ignored() {
        let row = parse_resume_row("- stray bullet\nSkills:\n- Rust");
        assert_eq!(row.skills, "Rust");
        assert_eq!(row.education, NOT_AVAILABLE);
    }

    #[test]
    fn empty_name_value_is_kept() {
        assert_eq!(parse_resume_row("Name:").name, "");
        assert_eq!(parse_resume_row("Name: A: B").name, "A: B");
    }

    #[test]
    fn name_does_not_leave_the_section() {
        let row = parse_resume_row("Skills:\n- Rust\nName: Late Name\n- Go");
        assert_eq!(row.name, "Late Name");
        assert_eq!(row.skills, "Rust\nGo");
    }

    #[test]
    fn crlf_and_indentation_are_tolerated() {
        let reply = "  Name: Jane  \r\nSkills:\r\n    -   Python  \r\n";
        let row = parse_resume_row(reply);
        assert_eq!(row.name, "Jane");
        assert_eq!(row.skills, "Python");
    }

    // ── PerEntry ─────────────────────────────────────────────────────────

    #[test]
    fn jane_doe_per_entry() {
        let rows = parse_entry_rows(JANE, true);
        assert_eq!(
            rows,
            vec![EntryRow {
                name: "Jane Doe".into(),
                institution: "MIT".into(),
                degree: "BS".into(),
                major: "CS".into(),
                education_duration: "2015-2019".into(),
                company: "Acme".into(),
                role: "Engineer".into(),
                work_duration: "2019-2022".into(),
                skills: "Python, SQL".into(),
            }]
        );
    }

    #[test]
    fn shorter_group_is_padded() {
        let reply = "Name: Ann\nEducation:\n- Institution: A\nDegree: BS\n- Institution: B\n- Institution: C\nMajor: Math\nWork Experience:\n- Company: X\nRole: Dev";
        let rows = parse_entry_rows(reply, true);
        assert_eq!(rows.len(), 3);
        let institutions: Vec<&str> = rows.iter().map(|r| r.institution.as_str()).collect();
        assert_eq!(institutions, vec!["A", "B", "C"]);
        assert_eq!(rows[0].degree, "BS");
        assert_eq!(rows[1].degree, "");
        assert_eq!(rows[2].major, "Math");
        assert_eq!(rows[0].company, "X");
        assert_eq!(rows[0].role, "Dev");
        assert!(rows[1..].iter().all(|r| r.company.is_empty() && r.role.is_empty()));
        assert!(rows.iter().all(|r| r.name == "Ann"));
    }

    #[test]
    fn row_count_is_longest_group() {
        let reply = "Work Experience:\n- Company: A\n- Company: B\nEducation:\n- Institution: U";
        let rows = parse_entry_rows(reply, true);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].institution, "U");
        assert_eq!(rows[1].institution, "");
        assert_eq!(rows[1].company, "B");
    }

    #[test]
    fn duration_is_routed_by_current_section() {
        // The work block for Acme is still open when Education resumes.
        let reply = "Work Experience:\n- Company: Acme\nDuration: 2019-2022\nEducation:\n- Institution: MIT\nDuration: 2015-2019";
        let rows = parse_entry_rows(reply, true);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].education_duration, "2015-2019");
        assert_eq!(rows[0].work_duration, "2019-2022");
    }

    #[test]
    fn duration_outside_its_section_is_dropped() {
        // Back in Work Experience with only an education block open.
        let reply = "Education:\n- Institution: MIT\nWork Experience:\nDuration: 2001";
        let rows = parse_entry_rows(reply, true);
        assert_eq!(rows[0].education_duration, "");
        assert_eq!(rows[0].work_duration, "");
    }

    #[test]
    fn zero_blocks_emit_blank_row_by_default() {
        let reply = "Name: Solo\nSkills:\n- Rust\n- Go";
        let rows = parse_entry_rows(reply, true);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, "Solo");
        assert_eq!(rows[0].skills, "Rust, Go");
        assert!(rows[0].institution.is_empty() && rows[0].company.is_empty());

        assert!(parse_entry_rows(reply, false).is_empty());
    }

    #[test]
    fn missing_name_is_empty_in_every_row() {
        let rows = parse_entry_rows("Education:\n- Institution: A\n- Institution: B", true);
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.name.is_empty() && r.skills.is_empty()));
    }

    #[test]
    fn parsing_is_idempotent() {
        for layout in [TableLayout::PerDocument, TableLayout::PerEntry] {
            assert_eq!(
                parse_reply(JANE, layout, true),
                parse_reply(JANE, layout, true)
            );
        }
    }

    #[test]
    fn garbage_never_panics() {
        for reply in ["", "\n\n", "-", "- Institution:", "Duration:", "::::", "Name"] {
            let _ = parse_reply(reply, TableLayout::PerDocument, true);
            let _ = parse_reply(reply, TableLayout::PerEntry, false);
        }
    }
}
