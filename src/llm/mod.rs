pub mod provider;
pub mod claude;
pub mod openai;
pub mod prompts;
pub mod parser;

use std::sync::Arc;
use std::time::Duration;

use crate::error::{Error, Result};

pub use provider::{LLMProvider, ProviderKind};
pub use claude::ClaudeProvider;
pub use openai::OpenAIProvider;
pub use prompts::{ChatRequest, JtbdRequest, SubcategoryRequest};

/// Construct the chat provider selected by `kind`. A missing API key is a
/// configuration error; callers treat it as "skip the LLM stages".
pub fn build_provider(
    kind: ProviderKind,
    api_key: Option<&str>,
    model: Option<String>,
    timeout: Duration,
) -> Result<Arc<dyn LLMProvider>> {
    let api_key = api_key
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .ok_or_else(|| {
            Error::Config(format!(
                "{} API key required. Set the {} environment variable.",
                kind,
                kind.api_key_var()
            ))
        })?
        .to_string();

    let provider: Arc<dyn LLMProvider> = match kind {
        ProviderKind::OpenAI => {
            let provider = OpenAIProvider::new(api_key, model, timeout)?;
            tracing::info!("Initialized OpenAI provider with model: {}", provider.model());
            Arc::new(provider)
        }
        ProviderKind::Anthropic => {
            let provider = ClaudeProvider::new(api_key, model, timeout)?;
            tracing::info!("Initialized Claude provider with model: {}", provider.model());
            Arc::new(provider)
        }
    };

    Ok(provider)
}
