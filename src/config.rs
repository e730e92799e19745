use crate::error::{Error, Result};
use crate::llm::ProviderKind;
use std::env;

pub const DEFAULT_SENTIMENT_ENDPOINT: &str =
    "https://api-inference.huggingface.co/models/Anudeep-Narala/fabsa-roberta-sentiment";

#[derive(Debug, Clone)]
pub struct Config {
    pub provider: ProviderKind,
    pub model: Option<String>,
    pub openai_api_key: Option<String>,
    pub anthropic_api_key: Option<String>,
    pub sentiment_endpoint: String,
    pub sentiment_api_token: Option<String>,
    pub batch_size: usize,
    pub request_timeout_secs: u64,
    pub failure_alert_threshold: f64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let provider = match env::var("LLM_PROVIDER") {
            Ok(v) if !v.trim().is_empty() => v.parse()?,
            _ => ProviderKind::OpenAI,
        };

        let model = non_empty_var("LLM_MODEL");
        let openai_api_key = non_empty_var("OPENAI_API_KEY");
        let anthropic_api_key = non_empty_var("ANTHROPIC_API_KEY");

        let sentiment_endpoint = non_empty_var("SENTIMENT_ENDPOINT")
            .unwrap_or_else(|| DEFAULT_SENTIMENT_ENDPOINT.to_string());
        let sentiment_api_token =
            non_empty_var("SENTIMENT_API_TOKEN").or_else(|| non_empty_var("HF_API_TOKEN"));

        let batch_size = env::var("BATCH_SIZE")
            .ok()
            .and_then(|v| v.parse().ok())
            .filter(|&n: &usize| n > 0)
            .unwrap_or(500);

        let request_timeout_secs = env::var("REQUEST_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(60);

        let failure_alert_threshold = match env::var("FAILURE_ALERT_THRESHOLD") {
            Ok(v) => {
                let threshold: f64 = v.parse().map_err(|_| {
                    Error::Config(format!("FAILURE_ALERT_THRESHOLD is not a number: {}", v))
                })?;
                if !(0.0..=1.0).contains(&threshold) {
                    return Err(Error::Config(format!(
                        "FAILURE_ALERT_THRESHOLD must be within [0, 1], got {}",
                        threshold
                    )));
                }
                threshold
            }
            Err(_) => 0.5,
        };

        Ok(Self {
            provider,
            model,
            openai_api_key,
            anthropic_api_key,
            sentiment_endpoint,
            sentiment_api_token,
            batch_size,
            request_timeout_secs,
            failure_alert_threshold,
        })
    }

    /// The API key configured for the selected provider, if any.
    pub fn api_key(&self) -> Option<&str> {
        match self.provider {
            ProviderKind::OpenAI => self.openai_api_key.as_deref(),
            ProviderKind::Anthropic => self.anthropic_api_key.as_deref(),
        }
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Which aspects get a sentiment call for each review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AspectScope {
    /// Score all six aspects.
    #[default]
    All,
    /// Score only the parent aspects of the review's subcategory tags.
    Tagged,
}

impl std::str::FromStr for AspectScope {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "all" => Ok(AspectScope::All),
            "tagged" => Ok(AspectScope::Tagged),
            other => Err(Error::Config(format!(
                "Unknown aspect scope: {}. Use 'all' or 'tagged'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub batch_size: usize,
    pub aspect_scope: AspectScope,
    pub save_checkpoints: bool,
    pub resume: bool,
    pub failure_alert_threshold: f64,
    pub show_progress: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            batch_size: 500,
            aspect_scope: AspectScope::All,
            save_checkpoints: true,
            resume: false,
            failure_alert_threshold: 0.5,
            show_progress: true,
        }
    }
}

impl From<&Config> for PipelineConfig {
    fn from(config: &Config) -> Self {
        Self {
            batch_size: config.batch_size,
            failure_alert_threshold: config.failure_alert_threshold,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aspect_scope_parse() {
        assert_eq!("all".parse::<AspectScope>().unwrap(), AspectScope::All);
        assert_eq!(" Tagged ".parse::<AspectScope>().unwrap(), AspectScope::Tagged);
        assert!("some".parse::<AspectScope>().is_err());
    }

    #[test]
    fn test_pipeline_config_from_config() {
        let config = Config {
            provider: ProviderKind::Anthropic,
            model: None,
            openai_api_key: Some("sk-openai".into()),
            anthropic_api_key: None,
            sentiment_endpoint: DEFAULT_SENTIMENT_ENDPOINT.to_string(),
            sentiment_api_token: None,
            batch_size: 25,
            request_timeout_secs: 60,
            failure_alert_threshold: 0.2,
        };

        assert_eq!(config.api_key(), None);

        let pipeline = PipelineConfig::from(&config);
        assert_eq!(pipeline.batch_size, 25);
        assert_eq!(pipeline.failure_alert_threshold, 0.2);
        assert_eq!(pipeline.aspect_scope, AspectScope::All);
        assert!(pipeline.save_checkpoints);
    }
}
