use std::sync::Arc;

use crate::error::Result;
use crate::llm::{JtbdRequest, LLMProvider};
use crate::models::Review;

pub struct JtbdSynthesizer {
    llm: Arc<dyn LLMProvider>,
}

impl JtbdSynthesizer {
    pub fn new(llm: Arc<dyn LLMProvider>) -> Self {
        Self { llm }
    }

    pub fn request_for(review: &Review) -> JtbdRequest {
        JtbdRequest::new(
            review.comment.clone(),
            review.rating,
            review.platform().map(str::to_string),
        )
    }

    pub async fn synthesize(&self, request: &JtbdRequest) -> Result<String> {
        self.llm.synthesize_jtbd(request).await
    }

    pub fn provider_name(&self) -> &str {
        self.llm.name()
    }
}
