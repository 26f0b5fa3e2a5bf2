//! Prompts for LLM-based résumé field extraction.
//!
//! The reply parser in [`crate::pipeline::parse`] depends on the model echoing
//! the exact labelled layout requested here (`Name:`, `Education:`,
//! `- Institution:`, `Work Experience:`, `- Company:`, `Skills:`). Changing a
//! label in [`EXTRACTION_TEMPLATE`] without changing the parser silently
//! empties the corresponding column.
//!
//! Callers can override both prompts via
//! [`crate::config::ExtractionConfig::system_prompt`] and
//! [`crate::config::ExtractionConfig::prompt_template`].

use crate::config::ExtractionConfig;

/// Default system prompt.
pub const SYSTEM_PROMPT: &str = "You are an assistant that extracts information from resumes.";

/// Placeholder replaced by the extracted résumé text.
pub const RESUME_TEXT_PLACEHOLDER: &str = "{resume_text}";

/// Default user prompt template. `{resume_text}` is replaced by the document text.
pub const EXTRACTION_TEMPLATE: &str = r#"Please extract the following information from the resume:

1. Name
2. Education (Institution, Degree, Major, Duration)
3. Work Experience (Company, Role, Duration)
4. Skills (Languages, Frameworks, Tools)

Format the output like this:

Name: <Name>
Education:
    - Institution: <Institution>
      Degree: <Degree>
      Major: <Major>
      Duration: <Duration>
Work Experience:
    - Company: <Company>
      Role: <Role>
      Duration: <Duration>
Skills:
    - <Skill1>
    - <Skill2>
    - <Skill3>

Resume Text:
{resume_text}"#;

/// Embed `resume_text` into the configured (or default) template.
pub fn extraction_prompt(config: &ExtractionConfig, resume_text: &str) -> String {
    config
        .prompt_template
        .as_deref()
        .unwrap_or(EXTRACTION_TEMPLATE)
        .replace(RESUME_TEXT_PLACEHOLDER, resume_text)
}

/// The configured (or default) system prompt.
pub fn system_prompt(config: &ExtractionConfig) -> &str {
    config.system_prompt.as_deref().unwrap_or(SYSTEM_PROMPT)
}
