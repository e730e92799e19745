use std::sync::Arc;

use crate::error::Result;
use crate::llm::LLMProvider;
use crate::taxonomy::{self, DEFAULT_SUBCATEGORY};

pub struct SubcategoryExtractor {
    llm: Arc<dyn LLMProvider>,
}

impl SubcategoryExtractor {
    pub fn new(llm: Arc<dyn LLMProvider>) -> Self {
        Self { llm }
    }

    /// Whitelisted tags for a review. Empty text short-circuits to the
    /// default tag; remote errors propagate so the caller can count them.
    pub async fn extract(&self, review: &str) -> Result<Vec<String>> {
        if review.trim().is_empty() {
            return Ok(default_tags());
        }

        let raw = self.llm.classify_subcategories(review).await?;
        Ok(validate_tags(raw))
    }

    pub fn provider_name(&self) -> &str {
        self.llm.name()
    }
}

pub fn default_tags() -> Vec<String> {
    vec![DEFAULT_SUBCATEGORY.to_string()]
}

/// Keep whitelisted labels in first-seen order; an empty result becomes the
/// default tag.
pub fn validate_tags(raw: Vec<String>) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for label in raw {
        let label = taxonomy::normalize_label(&label);
        if !taxonomy::is_known(&label) {
            tracing::debug!("Dropping unknown subcategory: {}", label);
            continue;
        }
        if !tags.contains(&label) {
            tags.push(label);
        }
    }

    if tags.is_empty() {
        return default_tags();
    }
    tags
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::llm::ChatRequest;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Scripted {
        reply: std::result::Result<&'static str, &'static str>,
        calls: AtomicUsize,
    }

    impl Scripted {
        fn ok(reply: &'static str) -> Arc<Self> {
            Arc::new(Self { reply: Ok(reply), calls: AtomicUsize::new(0) })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self { reply: Err("timeout"), calls: AtomicUsize::new(0) })
        }
    }

    #[async_trait]
    impl LLMProvider for Scripted {
        async fn chat(&self, _request: ChatRequest) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.reply
                .map(str::to_string)
                .map_err(|e| Error::LLMApi(e.to_string()))
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    #[test]
    fn test_validate_tags_filters_and_dedupes() {
        let tags = validate_tags(vec![
            "food_quality".into(),
            "cold_food".into(),
            " Driver_Behavior ".into(),
            "food_quality".into(),
        ]);
        assert_eq!(tags, vec!["food_quality", "driver_behavior"]);
    }

    #[test]
    fn test_validate_tags_defaults_when_nothing_survives() {
        assert_eq!(validate_tags(vec!["hallucinated".into()]), vec![DEFAULT_SUBCATEGORY]);
        assert_eq!(validate_tags(Vec::new()), vec![DEFAULT_SUBCATEGORY]);
    }

    #[tokio::test]
    async fn test_empty_review_skips_remote_call() {
        let llm = Scripted::ok(r#"["food_taste"]"#);
        let extractor = SubcategoryExtractor::new(llm.clone());

        assert_eq!(extractor.extract("   ").await.unwrap(), vec![DEFAULT_SUBCATEGORY]);
        assert_eq!(llm.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_non_informative_reply_yields_default() {
        let extractor = SubcategoryExtractor::new(Scripted::ok("I could not find anything specific."));
        assert_eq!(extractor.extract("ok").await.unwrap(), vec![DEFAULT_SUBCATEGORY]);
    }

    #[tokio::test]
    async fn test_prose_wrapped_reply() {
        let extractor = SubcategoryExtractor::new(Scripted::ok(
            "The review mentions: [\"food_quality\", \"driver_behavior\", \"rudeness\"].",
        ));
        let tags = extractor
            .extract("The pizza arrived cold and the cheese was congealed. Driver was rude too.")
            .await
            .unwrap();
        assert_eq!(tags, vec!["food_quality", "driver_behavior"]);
    }

    #[tokio::test]
    async fn test_remote_failure_propagates() {
        let extractor = SubcategoryExtractor::new(Scripted::failing());
        assert!(matches!(extractor.extract("late again").await, Err(Error::LLMApi(_))));
    }
}
