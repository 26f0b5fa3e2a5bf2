//! LLM interaction: send one résumé prompt and return the model's reply.
//!
//! The pipeline talks to the model through [`CompletionClient`], a
//! single-method seam that takes a system prompt and a user prompt. The
//! production implementation, [`LlmCompletionClient`], wraps an
//! `edgequake_llm` provider; tests substitute a scripted client.
//!
//! ## Retry Strategy
//!
//! By default a résumé gets exactly one call. With `max_retries > 0`, failed
//! or timed-out calls are retried after `retry_backoff_ms * 2^(attempt-1)`,
//! so a 500 ms base gives 500 ms → 1 s → 2 s. A single wait never exceeds
//! [`MAX_BACKOFF_MS`].

use crate::config::ExtractionConfig;
use crate::error::{DocumentError, ResumeError};
use async_trait::async_trait;
use edgequake_llm::{
    AnthropicProvider, ChatMessage, CompletionOptions, GeminiProvider, LLMProvider,
    OpenAIProvider, ProviderFactory,
};
use std::sync::Arc;
use tokio::time::{sleep, timeout, Duration};
use tracing::{debug, info, warn};

/// Upper bound on a single retry wait.
pub const MAX_BACKOFF_MS: u64 = 60_000;

/// A model reply plus the token counts the provider reported.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Completion {
    pub content: String,
    pub input_tokens: usize,
    pub output_tokens: usize,
}

/// Anything that can answer a (system, user) prompt pair.
///
/// Errors are plain strings: the caller wraps them into a
/// [`DocumentError::CompletionFailed`] naming the résumé.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, system: &str, prompt: &str) -> Result<Completion, String>;
}

/// [`CompletionClient`] backed by an `edgequake_llm` provider.
pub struct LlmCompletionClient {
    provider: Arc<dyn LLMProvider>,
    temperature: f32,
    max_tokens: usize,
}

impl std::fmt::Debug for LlmCompletionClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmCompletionClient")
            .field("provider", &"<dyn LLMProvider>")
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

impl LlmCompletionClient {
    pub fn new(provider: Arc<dyn LLMProvider>, config: &ExtractionConfig) -> Self {
        Self {
            provider,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }

    /// Resolve the provider from `config` and wrap it.
    pub fn from_config(config: &ExtractionConfig) -> Result<Self, ResumeError> {
        let provider = resolve_provider(config)?;
        Ok(Self::new(provider, config))
    }

    fn options(&self) -> CompletionOptions {
        CompletionOptions {
            temperature: Some(self.temperature),
            max_tokens: Some(self.max_tokens),
            ..Default::default()
        }
    }
}

#[async_trait]
impl CompletionClient for LlmCompletionClient {
    async fn complete(&self, system: &str, prompt: &str) -> Result<Completion, String> {
        let messages = vec![ChatMessage::system(system), ChatMessage::user(prompt)];
        let options = self.options();
        let response = self
            .provider
            .chat(&messages, Some(&options))
            .await
            .map_err(|e| e.to_string())?;
        Ok(Completion {
            content: response.content,
            input_tokens: response.prompt_tokens,
            output_tokens: response.completion_tokens,
        })
    }
}

/// Send one résumé prompt, retrying per `config`.
///
/// `name` only labels logs and errors. The reply is returned untrimmed; an
/// empty reply is not an error here.
pub async fn request_completion(
    client: &dyn CompletionClient,
    name: &str,
    system: &str,
    prompt: &str,
    config: &ExtractionConfig,
) -> Result<Completion, DocumentError> {
    let attempts = config.max_retries.saturating_add(1);
    let mut last_err: Option<DocumentError> = None;

    for attempt in 0..attempts {
        if attempt > 0 {
            let backoff = backoff_ms(config.retry_backoff_ms, attempt);
            warn!(
                "{}: retry {}/{} after {}ms",
                name, attempt, config.max_retries, backoff
            );
            sleep(Duration::from_millis(backoff)).await;
        }

        let call = client.complete(system, prompt);
        let outcome = if config.api_timeout_secs > 0 {
            match timeout(Duration::from_secs(config.api_timeout_secs), call).await {
                Ok(r) => r,
                Err(_) => {
                    warn!(
                        "{}: attempt {} timed out after {}s",
                        name,
                        attempt + 1,
                        config.api_timeout_secs
                    );
                    last_err = Some(DocumentError::Timeout {
                        name: name.to_string(),
                        secs: config.api_timeout_secs,
                    });
                    continue;
                }
            }
        } else {
            call.await
        };

        match outcome {
            Ok(completion) => {
                debug!(
                    "{}: {} input tokens, {} output tokens",
                    name, completion.input_tokens, completion.output_tokens
                );
                return Ok(completion);
            }
            Err(detail) => {
                warn!("{}: attempt {} failed: {}", name, attempt + 1, detail);
                last_err = Some(DocumentError::CompletionFailed {
                    name: name.to_string(),
                    attempts,
                    detail,
                });
            }
        }
    }

    Err(last_err.unwrap_or_else(|| DocumentError::CompletionFailed {
        name: name.to_string(),
        attempts,
        detail: "Unknown error".to_string(),
    }))
}

/// Wait before retry number `attempt` (1-based), capped at [`MAX_BACKOFF_MS`].
pub fn backoff_ms(base_ms: u64, attempt: u32) -> u64 {
    let factor = 2u64.saturating_pow(attempt.saturating_sub(1));
    base_ms.saturating_mul(factor).min(MAX_BACKOFF_MS)
}

/// Environment variable the provider normally reads its key from.
///
/// `None` means the provider takes no entered key: keyless local servers
/// (ollama, lmstudio) or providers configured through several variables.
pub fn credential_env_var(provider: &str) -> Option<&'static str> {
    match provider.to_ascii_lowercase().as_str() {
        "openai" => Some("OPENAI_API_KEY"),
        "anthropic" => Some("ANTHROPIC_API_KEY"),
        "gemini" | "google" => Some("GEMINI_API_KEY"),
        _ => None,
    }
}

/// Build `provider_name` straight from an entered key, without touching the
/// process environment.
fn provider_with_key(
    provider_name: &str,
    key: &str,
    model: &str,
) -> Result<Arc<dyn LLMProvider>, ResumeError> {
    let provider: Arc<dyn LLMProvider> = match provider_name.to_ascii_lowercase().as_str() {
        "openai" => Arc::new(OpenAIProvider::new(key).with_model(model)),
        "anthropic" => Arc::new(AnthropicProvider::new(key).with_model(model)),
        "gemini" | "google" => Arc::new(GeminiProvider::new(key).with_model(model)),
        _ => {
            return Err(ResumeError::ProviderNotConfigured {
                provider: provider_name.to_string(),
                hint: "An entered API key is only accepted for openai, anthropic and gemini.\n\
                       Configure this provider through its own environment variables."
                    .to_string(),
            })
        }
    };
    Ok(provider)
}

fn create_provider(provider_name: &str, model: &str) -> Result<Arc<dyn LLMProvider>, ResumeError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        ResumeError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}

/// Resolve the LLM provider, from most-specific to least-specific.
///
/// 1. **Pre-built provider** (`config.provider`), used as-is.
/// 2. **Entered credential** (`config.api_key`): `config.provider_name`
///    (default `openai`) is built directly from the key and the configured
///    model.
/// 3. **Named provider** (`config.provider_name`) with keys from the
///    environment.
/// 4. **Environment pair** `EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL`.
/// 5. **`OPENAI_API_KEY`** present: OpenAI with the configured model.
/// 6. **Full auto-detection** via `ProviderFactory::from_env`.
pub fn resolve_provider(config: &ExtractionConfig) -> Result<Arc<dyn LLMProvider>, ResumeError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    let model = config.model_or_default();

    if let Some(ref key) = config.api_key {
        let name = config.provider_name.as_deref().unwrap_or("openai");
        info!("Using entered API key for provider '{}'", name);
        return provider_with_key(name, key, model);
    }

    if let Some(ref name) = config.provider_name {
        return create_provider(name, model);
    }

    if let (Ok(prov), Ok(env_model)) = (
        std::env::var("EDGEQUAKE_LLM_PROVIDER"),
        std::env::var("EDGEQUAKE_MODEL"),
    ) {
        if !prov.is_empty() && !env_model.is_empty() {
            return create_provider(&prov, &env_model);
        }
    }

    if let Ok(openai_key) = std::env::var("OPENAI_API_KEY") {
        if !openai_key.is_empty() {
            return create_provider("openai", model);
        }
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| ResumeError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Pass --api-key, set OPENAI_API_KEY, or configure a provider.\n\
                Error: {}",
                e
            ),
        })?;

    Ok(llm_provider)
}
