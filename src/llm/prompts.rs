use crate::taxonomy::SUBCATEGORIES;

pub const SUBCATEGORY_SYSTEM_PROMPT: &str = "You are a precise classification assistant for food delivery reviews. \
Return only a JSON array of subcategory names, nothing else.";

pub const JTBD_SYSTEM_PROMPT: &str = "You are an expert at creating Jobs-To-Be-Done statements. \
Create clear, actionable JTBD statements that capture customer needs and contexts.";

pub const SUBCATEGORY_TEMPERATURE: f32 = 0.1;
pub const SUBCATEGORY_MAX_TOKENS: u32 = 200;
pub const JTBD_TEMPERATURE: f32 = 0.3;
pub const JTBD_MAX_TOKENS: u32 = 200;

/// A single-turn chat completion request, independent of provider.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub system: Option<String>,
    pub prompt: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

#[derive(Debug, Clone)]
pub struct SubcategoryRequest {
    pub review: String,
}

impl SubcategoryRequest {
    pub fn new(review: impl Into<String>) -> Self {
        Self {
            review: review.into(),
        }
    }

    pub fn to_prompt(&self) -> String {
        let mut prompt = String::from(
            "You are a precise aspect extraction system. Extract ALL subcategories mentioned in this food delivery review.\n\n",
        );

        prompt.push_str("CRITICAL RULES:\n");
        prompt.push_str("1. Each subcategory has STRICT boundaries - do NOT overlap\n");
        prompt.push_str("2. ONLY select a subcategory if the review explicitly discusses that specific aspect\n");
        prompt.push_str("3. A review can have MULTIPLE subcategories\n");
        prompt.push_str("4. If nothing specific is mentioned, return ONLY [\"overall_satisfaction\"]\n\n");

        prompt.push_str("SUBCATEGORY DEFINITIONS (NO OVERLAP ALLOWED):\n\n");
        for def in SUBCATEGORIES {
            prompt.push_str(&format!(
                "- {} ({}): {} Keywords: {}\n",
                def.name, def.aspect, def.definition, def.keywords
            ));
        }

        prompt.push_str("\nEXAMPLES:\n");
        prompt.push_str("- \"Pizza was cold\" -> [\"food_quality\"] (NOT food_taste or food_freshness - temperature is quality)\n");
        prompt.push_str("- \"Tasted bland\" -> [\"food_taste\"] (NOT food_quality - flavor is taste)\n");
        prompt.push_str("- \"Driver was rude but food was great\" -> [\"driver_behavior\", \"food_quality\"] (multiple aspects)\n");
        prompt.push_str("- \"Love this app!\" -> [\"overall_satisfaction\"] (vague, no specifics)\n\n");

        prompt.push_str(&format!("Review to analyze: \"{}\"\n\n", self.review.trim()));
        prompt.push_str("Return ONLY a valid JSON array of subcategories, nothing else.\nJSON array:");
        prompt
    }

    pub fn to_chat(&self) -> ChatRequest {
        ChatRequest {
            system: Some(SUBCATEGORY_SYSTEM_PROMPT.to_string()),
            prompt: self.to_prompt(),
            max_tokens: SUBCATEGORY_MAX_TOKENS,
            temperature: SUBCATEGORY_TEMPERATURE,
        }
    }
}

#[derive(Debug, Clone)]
pub struct JtbdRequest {
    pub review: String,
    pub rating: i32,
    pub platform: Option<String>,
}

impl JtbdRequest {
    pub fn new(review: impl Into<String>, rating: i32, platform: Option<String>) -> Self {
        Self {
            review: review.into(),
            rating,
            platform,
        }
    }

    pub fn to_prompt(&self) -> String {
        let platform = self.platform.as_deref().unwrap_or("Food Delivery Service");

        let mut prompt = String::from(
            "You are an expert at converting customer feedback into Jobs-To-Be-Done (JTBD) statements.\n\n",
        );
        prompt.push_str("A good JTBD statement captures:\n");
        prompt.push_str("1. The situation/context (When...)\n");
        prompt.push_str("2. The desired action/goal (I want to...)\n");
        prompt.push_str("3. The desired outcome (So that...)\n");
        prompt.push_str("4. Any barriers or friction points\n\n");

        prompt.push_str("Customer Review:\n");
        prompt.push_str(&format!("Platform: {}\n", platform));
        prompt.push_str(&format!("Rating: {}/5 stars\n", self.rating));
        prompt.push_str(&format!("Review: \"{}\"\n\n", self.review.trim()));

        prompt.push_str("Your task:\nTransform this review into a clear, actionable JTBD statement that captures what the customer is trying to accomplish, the context, desired outcome, and any obstacles they faced.\n\n");
        prompt.push_str("Format: \"When [situation], I want to [action/goal] so that [desired outcome]. [Optional: Current barrier/issue]\"\n\n");

        prompt.push_str("Examples:\n");
        prompt.push_str("- \"When I'm hungry and need food delivered quickly, I want the app to process my order efficiently so that I can get my meal within the promised time. Currently, the app crashes during checkout causing delays.\"\n");
        prompt.push_str("- \"When I order expensive food for delivery, I want it to arrive hot and fresh so that I get value for my money and enjoy my meal.\"\n");
        prompt.push_str("- \"When I use a food delivery app, I want an intuitive interface with clear navigation so that I can easily find restaurants and complete my order without frustration.\"\n\n");

        prompt.push_str("Your JTBD statement:");
        prompt
    }

    pub fn to_chat(&self) -> ChatRequest {
        ChatRequest {
            system: Some(JTBD_SYSTEM_PROMPT.to_string()),
            prompt: self.to_prompt(),
            max_tokens: JTBD_MAX_TOKENS,
            temperature: JTBD_TEMPERATURE,
        }
    }

    /// Sentence used whenever synthesis fails.
    pub fn fallback(&self) -> String {
        fallback_statement(self.platform.as_deref())
    }
}

pub fn fallback_statement(platform: Option<&str>) -> String {
    let platform = platform
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .unwrap_or("a food delivery service");
    format!("When using {}, I want a better experience.", platform)
}
