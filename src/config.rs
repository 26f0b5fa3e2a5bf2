//! Configuration types for résumé summarisation.
//!
//! All run behaviour is controlled through [`ExtractionConfig`], built via its
//! [`ExtractionConfigBuilder`]. Every knob lives in one struct so a config can
//! be cloned into a stream, logged, or diffed between two runs.

use crate::error::ResumeError;
use crate::progress::ProgressCallback;
use crate::prompts::RESUME_TEXT_PLACEHOLDER;
use edgequake_llm::LLMProvider;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Default LLM model when neither the config nor the environment names one.
pub const DEFAULT_MODEL: &str = "gpt-4.1-nano";

/// Largest accepted `max_retries`.
pub const MAX_RETRIES_LIMIT: u32 = 10;

/// Configuration for a résumé summarisation run.
///
/// Built via [`ExtractionConfig::builder()`] or using
/// [`ExtractionConfig::default()`].
///
/// # Example
/// ```rust
/// use edgequake_resume2xlsx::{ExtractionConfig, TableLayout};
///
/// let config = ExtractionConfig::builder()
///     .layout(TableLayout::PerEntry)
///     .model("gpt-4.1-mini")
///     .max_tokens(1200)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ExtractionConfig {
    /// Shape of the summary table. Default: [`TableLayout::PerDocument`].
    pub layout: TableLayout,

    /// LLM model identifier, e.g. "gpt-4.1-nano". If None, uses [`DEFAULT_MODEL`].
    pub model: Option<String>,

    /// LLM provider name (e.g. "openai", "anthropic", "ollama").
    /// If None along with `provider`, the provider is auto-detected.
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// API key entered by the user. The provider named by `provider_name`
    /// (default openai) is built directly from it.
    pub api_key: Option<String>,

    /// Sampling temperature. Default: 0.1.
    pub temperature: f32,

    /// Maximum tokens the LLM may generate per résumé. Default: 800.
    pub max_tokens: usize,

    /// Retries after a failed LLM call. Default: 0 (one call per résumé).
    pub max_retries: u32,

    /// Initial retry delay in milliseconds, doubled per attempt. Default: 500.
    pub retry_backoff_ms: u64,

    /// Per-call LLM timeout in seconds; 0 disables it. Default: 60.
    pub api_timeout_secs: u64,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Custom system prompt. If None, uses [`crate::prompts::SYSTEM_PROMPT`].
    pub system_prompt: Option<String>,

    /// Custom extraction template containing `{resume_text}`.
    /// If None, uses [`crate::prompts::EXTRACTION_TEMPLATE`].
    pub prompt_template: Option<String>,

    /// In [`TableLayout::PerEntry`], emit one blank-entry row for a résumé with
    /// no education or work blocks so its name and skills still appear.
    /// Default: true.
    pub emit_blank_entry_row: bool,

    /// Optional per-document progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            layout: TableLayout::default(),
            model: None,
            provider_name: None,
            provider: None,
            api_key: None,
            temperature: 0.1,
            max_tokens: 800,
            max_retries: 0,
            retry_backoff_ms: 500,
            api_timeout_secs: 60,
            download_timeout_secs: 120,
            system_prompt: None,
            prompt_template: None,
            emit_blank_entry_row: true,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ExtractionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractionConfig")
            .field("layout", &self.layout)
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("max_retries", &self.max_retries)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("emit_blank_entry_row", &self.emit_blank_entry_row)
            .finish()
    }
}

impl ExtractionConfig {
    /// Create a new builder for `ExtractionConfig`.
    pub fn builder() -> ExtractionConfigBuilder {
        ExtractionConfigBuilder {
            config: Self::default(),
        }
    }

    /// The model that will be requested from the provider.
    pub fn model_or_default(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }
}

/// Builder for [`ExtractionConfig`].
pub struct ExtractionConfigBuilder {
    config: ExtractionConfig,
}

impl fmt::Debug for ExtractionConfigBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractionConfigBuilder")
            .field("config", &self.config)
            .finish()
    }
}

impl ExtractionConfigBuilder {
    pub fn layout(mut self, layout: TableLayout) -> Self {
        self.config.layout = layout;
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.config.max_retries = n;
        self
    }

    pub fn retry_backoff_ms(mut self, ms: u64) -> Self {
        self.config.retry_backoff_ms = ms;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = Some(prompt.into());
        self
    }

    pub fn prompt_template(mut self, template: impl Into<String>) -> Self {
        self.config.prompt_template = Some(template.into());
        self
    }

    pub fn emit_blank_entry_row(mut self, v: bool) -> Self {
        self.config.emit_blank_entry_row = v;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ExtractionConfig, ResumeError> {
        let c = &self.config;
        if c.max_tokens == 0 {
            return Err(ResumeError::InvalidConfig(
                "max_tokens must be ≥ 1".into(),
            ));
        }
        if c.max_retries > MAX_RETRIES_LIMIT {
            return Err(ResumeError::InvalidConfig(format!(
                "max_retries must be ≤ {}, got {}",
                MAX_RETRIES_LIMIT, c.max_retries
            )));
        }
        if let Some(ref template) = c.prompt_template {
            if !template.contains(RESUME_TEXT_PLACEHOLDER) {
                return Err(ResumeError::InvalidConfig(format!(
                    "prompt template must contain the {} placeholder",
                    RESUME_TEXT_PLACEHOLDER
                )));
            }
        }
        if matches!(c.api_key.as_deref(), Some(k) if k.trim().is_empty()) {
            return Err(ResumeError::InvalidConfig("API key is empty".into()));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Shape of the summary table produced from each reply.
///
/// | Layout | Rows per résumé | Columns |
/// |--------|-----------------|---------|
/// | `PerDocument` | exactly 1 | Name, Education, Work Experience, Skills |
/// | `PerEntry` | one per education/work block | Name, Institution, Degree, Major, Education Duration, Company, Role, Work Duration, Skills |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableLayout {
    /// One row per résumé; bullet lists newline-joined. (default)
    #[default]
    PerDocument,
    /// One row per education/work block, name and skills repeated on each.
    PerEntry,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = ExtractionConfig::default();
        assert_eq!(c.layout, TableLayout::PerDocument);
        assert_eq!(c.max_tokens, 800);
        assert_eq!(c.max_retries, 0);
        assert!(c.emit_blank_entry_row);
        assert_eq!(c.model_or_default(), DEFAULT_MODEL);
    }

    #[test]
    fn builder_clamps_temperature() {
        let c = ExtractionConfig::builder().temperature(9.0).build().unwrap();
        assert_eq!(c.temperature, 2.0);
    }

    #[test]
    fn builder_rejects_template_without_placeholder() {
        let err = ExtractionConfig::builder()
            .prompt_template("Summarise this résumé.")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("{resume_text}"));
    }

    #[test]
    fn builder_rejects_zero_max_tokens() {
        assert!(ExtractionConfig::builder().max_tokens(0).build().is_err());
    }

    #[test]
    fn builder_caps_max_retries() {
        assert!(ExtractionConfig::builder()
            .max_retries(MAX_RETRIES_LIMIT)
            .build()
            .is_ok());
        let err = ExtractionConfig::builder().max_retries(70).build().unwrap_err();
        assert!(err.to_string().contains("max_retries"));
    }

    #[test]
    fn debug_redacts_api_key() {
        let c = ExtractionConfig::builder()
            .api_key("sk-secret")
            .build()
            .unwrap();
        let dbg = format!("{:?}", c);
        assert!(!dbg.contains("sk-secret"));
        assert!(dbg.contains("<redacted>"));
    }
}
