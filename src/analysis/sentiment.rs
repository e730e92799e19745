use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{Error, Result};
use crate::models::sentiment::{Aspect, SentimentLabel, SentimentPrediction};

/// Review text is cut to this many characters before the aspect suffix; the
/// model itself truncates at 512 tokens.
const MAX_INPUT_CHARS: usize = 2_000;

#[async_trait]
pub trait SentimentClassifier: Send + Sync {
    async fn classify(&self, text: &str, aspect: Aspect) -> Result<SentimentPrediction>;
}

/// Model input for a (review, aspect) pair.
pub fn format_input(text: &str, aspect: Aspect) -> String {
    let text = text.trim();
    let text = match text.char_indices().nth(MAX_INPUT_CHARS) {
        Some((cut, _)) => &text[..cut],
        None => text,
    };
    format!("{} [SEP] {}", text, aspect.as_str())
}

/// Text-classification inference endpoint in the Hugging Face request and
/// response format.
pub struct HttpSentimentClassifier {
    client: Client,
    endpoint: String,
    api_token: Option<String>,
}

#[derive(Serialize)]
struct ClassificationRequest<'a> {
    inputs: &'a str,
    parameters: ClassificationParameters,
}

#[derive(Serialize)]
struct ClassificationParameters {
    top_k: u32,
}

#[derive(Debug, Deserialize)]
struct LabelScore {
    label: String,
    score: f64,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ClassificationResponse {
    Nested(Vec<Vec<LabelScore>>),
    Flat(Vec<LabelScore>),
    Error { error: String },
}

impl HttpSentimentClassifier {
    pub fn new(endpoint: impl Into<String>, api_token: Option<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            api_token,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

fn probabilities(response: ClassificationResponse) -> Result<[f64; 3]> {
    let scores = match response {
        ClassificationResponse::Error { error } => return Err(Error::Classifier(error)),
        ClassificationResponse::Flat(scores) => scores,
        ClassificationResponse::Nested(batches) => batches.into_iter().next().unwrap_or_default(),
    };

    if scores.is_empty() {
        return Err(Error::Classifier("Empty classification response".to_string()));
    }

    let mut probs = [0.0; 3];
    for entry in scores {
        let label = SentimentLabel::from_model_label(&entry.label).ok_or_else(|| {
            Error::Classifier(format!("Unrecognised sentiment label: {}", entry.label))
        })?;
        probs[label as usize] = entry.score;
    }

    Ok(probs)
}

#[async_trait]
impl SentimentClassifier for HttpSentimentClassifier {
    async fn classify(&self, text: &str, aspect: Aspect) -> Result<SentimentPrediction> {
        let input = format_input(text, aspect);
        let body = ClassificationRequest {
            inputs: &input,
            parameters: ClassificationParameters { top_k: 3 },
        };

        let mut request = self.client.post(&self.endpoint).json(&body);
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::Classifier(format!("Failed to send request: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Classifier(format!(
                "Inference endpoint error ({}): {}",
                status, body
            )));
        }

        let parsed: ClassificationResponse = response
            .json()
            .await
            .map_err(|e| Error::Classifier(format!("Failed to parse classifier response: {}", e)))?;

        Ok(SentimentPrediction::from_probabilities(probabilities(parsed)?))
    }
}
