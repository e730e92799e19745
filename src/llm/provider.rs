use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::llm::parser::{clean_statement, parse_subcategory_response};
use crate::llm::prompts::{ChatRequest, JtbdRequest, SubcategoryRequest};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    OpenAI,
    Anthropic,
}

impl ProviderKind {
    pub fn api_key_var(&self) -> &'static str {
        match self {
            ProviderKind::OpenAI => "OPENAI_API_KEY",
            ProviderKind::Anthropic => "ANTHROPIC_API_KEY",
        }
    }
}

impl std::str::FromStr for ProviderKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Ok(ProviderKind::OpenAI),
            "anthropic" | "claude" => Ok(ProviderKind::Anthropic),
            other => Err(Error::Config(format!(
                "Unknown provider: {}. Use 'openai' or 'anthropic'",
                other
            ))),
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderKind::OpenAI => write!(f, "openai"),
            ProviderKind::Anthropic => write!(f, "anthropic"),
        }
    }
}

#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Send one chat turn and return the assistant's text.
    async fn chat(&self, request: ChatRequest) -> Result<String>;

    fn name(&self) -> &str;

    /// Raw subcategory labels for a review, before whitelist filtering.
    async fn classify_subcategories(&self, review: &str) -> Result<Vec<String>> {
        let reply = self.chat(SubcategoryRequest::new(review).to_chat()).await?;
        Ok(parse_subcategory_response(&reply))
    }

    async fn synthesize_jtbd(&self, request: &JtbdRequest) -> Result<String> {
        let reply = self.chat(request.to_chat()).await?;
        clean_statement(&reply)
            .ok_or_else(|| Error::LLMApi(format!("Empty JTBD statement from {}", self.name())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Canned(&'static str);

    #[async_trait]
    impl LLMProvider for Canned {
        async fn chat(&self, _request: ChatRequest) -> Result<String> {
            Ok(self.0.to_string())
        }

        fn name(&self) -> &str {
            "canned"
        }
    }

    #[test]
    fn test_provider_kind_parse() {
        assert_eq!("OpenAI".parse::<ProviderKind>().unwrap(), ProviderKind::OpenAI);
        assert_eq!("claude".parse::<ProviderKind>().unwrap(), ProviderKind::Anthropic);
        assert!(matches!(
            "gemini".parse::<ProviderKind>(),
            Err(Error::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_default_classify_parses_reply() {
        let provider = Canned("Here you go: [\"food_taste\"]");
        let labels = provider.classify_subcategories("so bland").await.unwrap();
        assert_eq!(labels, vec!["food_taste"]);
    }

    #[tokio::test]
    async fn test_default_synthesize_rejects_empty() {
        let request = JtbdRequest::new("ok", 3, None);
        assert!(Canned("  \"\"  ").synthesize_jtbd(&request).await.is_err());

        let statement = Canned("\"When I order, I want speed.\"")
            .synthesize_jtbd(&request)
            .await
            .unwrap();
        assert_eq!(statement, "When I order, I want speed.");
    }
}
