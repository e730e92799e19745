use serde::{Deserialize, Serialize};

/// Coarse review dimension. Declaration order is the output column order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Aspect {
    Food,
    Delivery,
    Service,
    Price,
    Interface,
    Overall,
}

impl Aspect {
    pub const ALL: [Aspect; 6] = [
        Aspect::Food,
        Aspect::Delivery,
        Aspect::Service,
        Aspect::Price,
        Aspect::Interface,
        Aspect::Overall,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Aspect::Food => "food",
            Aspect::Delivery => "delivery",
            Aspect::Service => "service",
            Aspect::Price => "price",
            Aspect::Interface => "interface",
            Aspect::Overall => "overall",
        }
    }

    pub fn index(&self) -> usize {
        *self as usize
    }

    /// Header of the score column, e.g. `Food sentiment`.
    pub fn sentiment_column(&self) -> &'static str {
        match self {
            Aspect::Food => "Food sentiment",
            Aspect::Delivery => "Delivery sentiment",
            Aspect::Service => "Service sentiment",
            Aspect::Price => "Price sentiment",
            Aspect::Interface => "Interface sentiment",
            Aspect::Overall => "Overall sentiment",
        }
    }

    /// Header of the tag column, e.g. `food subcategories`.
    pub fn subcategory_column(&self) -> &'static str {
        match self {
            Aspect::Food => "food subcategories",
            Aspect::Delivery => "delivery subcategories",
            Aspect::Service => "service subcategories",
            Aspect::Price => "price subcategories",
            Aspect::Interface => "interface subcategories",
            Aspect::Overall => "overall subcategories",
        }
    }
}

impl std::fmt::Display for Aspect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Negative,
    Neutral,
    Positive,
}

impl SentimentLabel {
    pub const ALL: [SentimentLabel; 3] = [
        SentimentLabel::Negative,
        SentimentLabel::Neutral,
        SentimentLabel::Positive,
    ];

    pub fn from_class_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(SentimentLabel::Negative),
            1 => Some(SentimentLabel::Neutral),
            2 => Some(SentimentLabel::Positive),
            _ => None,
        }
    }

    /// Accepts plain names and the `LABEL_n` form emitted by exported checkpoints.
    pub fn from_model_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "negative" | "neg" | "label_0" => Some(SentimentLabel::Negative),
            "neutral" | "neu" | "label_1" => Some(SentimentLabel::Neutral),
            "positive" | "pos" | "label_2" => Some(SentimentLabel::Positive),
            _ => None,
        }
    }

    /// Label implied by the sign of a stored score.
    pub fn from_score(score: f64) -> Self {
        if score > 0.0 {
            SentimentLabel::Positive
        } else if score < 0.0 {
            SentimentLabel::Negative
        } else {
            SentimentLabel::Neutral
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SentimentLabel::Negative => "negative",
            SentimentLabel::Neutral => "neutral",
            SentimentLabel::Positive => "positive",
        }
    }
}

impl std::fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Classifier verdict for one (review, aspect) pair.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct SentimentPrediction {
    pub label: SentimentLabel,
    pub confidence: f64,
    pub score: f64,
}

impl SentimentPrediction {
    /// Arg-max over `[negative, neutral, positive]` probabilities. Ties resolve to
    /// the lowest class index.
    pub fn from_probabilities(probs: [f64; 3]) -> Self {
        let probs = probs.map(|p| if p.is_finite() { p.clamp(0.0, 1.0) } else { 0.0 });

        let mut best = 0;
        for i in 1..3 {
            if probs[i] > probs[best] {
                best = i;
            }
        }

        if probs[best] <= 0.0 {
            return Self::neutral_default();
        }

        let label = SentimentLabel::from_class_index(best).unwrap_or(SentimentLabel::Neutral);
        let score = match label {
            SentimentLabel::Negative => -probs[0],
            SentimentLabel::Neutral => 0.0,
            SentimentLabel::Positive => probs[2],
        };

        Self {
            label,
            confidence: probs[best],
            score,
        }
    }

    /// Substituted when the classifier call fails.
    pub fn neutral_default() -> Self {
        Self {
            label: SentimentLabel::Neutral,
            confidence: 0.0,
            score: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct AspectSentiment {
    pub aspect: Aspect,
    pub label: SentimentLabel,
    pub score: f64,
}

impl AspectSentiment {
    pub fn new(aspect: Aspect, prediction: &SentimentPrediction) -> Self {
        Self {
            aspect,
            label: prediction.label,
            score: prediction.score,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_sign_matches_label() {
        let negative = SentimentPrediction::from_probabilities([0.7, 0.2, 0.1]);
        assert_eq!(negative.label, SentimentLabel::Negative);
        assert!((negative.score + 0.7).abs() < 1e-12);

        let neutral = SentimentPrediction::from_probabilities([0.2, 0.6, 0.2]);
        assert_eq!(neutral.label, SentimentLabel::Neutral);
        assert_eq!(neutral.score, 0.0);
        assert!((neutral.confidence - 0.6).abs() < 1e-12);

        let positive = SentimentPrediction::from_probabilities([0.05, 0.15, 0.8]);
        assert_eq!(positive.label, SentimentLabel::Positive);
        assert!(positive.score > 0.0 && positive.score <= 1.0);
    }

    #[test]
    fn test_ties_resolve_to_lowest_index() {
        let tie = SentimentPrediction::from_probabilities([0.4, 0.4, 0.2]);
        assert_eq!(tie.label, SentimentLabel::Negative);

        let degenerate = SentimentPrediction::from_probabilities([f64::NAN, 0.0, 0.0]);
        assert_eq!(degenerate.label, SentimentLabel::Neutral);
        assert_eq!(degenerate.score, 0.0);
    }

    #[test]
    fn test_label_parsing() {
        assert_eq!(
            SentimentLabel::from_model_label("LABEL_2"),
            Some(SentimentLabel::Positive)
        );
        assert_eq!(
            SentimentLabel::from_model_label("Negative"),
            Some(SentimentLabel::Negative)
        );
        assert_eq!(SentimentLabel::from_model_label("mixed"), None);
        assert_eq!(SentimentLabel::from_score(0.0), SentimentLabel::Neutral);
        assert_eq!(SentimentLabel::from_score(-0.51), SentimentLabel::Negative);
    }

    #[test]
    fn test_aspect_columns_follow_declaration_order() {
        let indices: Vec<usize> = Aspect::ALL.iter().map(Aspect::index).collect();
        assert_eq!(indices, vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(Aspect::Interface.sentiment_column(), "Interface sentiment");
        assert_eq!(Aspect::Price.subcategory_column(), "price subcategories");
    }
}
