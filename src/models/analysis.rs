use serde::{Deserialize, Serialize};

use super::review::Review;
use super::sentiment::{Aspect, AspectSentiment, SentimentLabel};
use crate::taxonomy;

/// Per-aspect scores, indexed by [`Aspect::index`]. `None` means the aspect was
/// never scored for this review.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct AspectScores([Option<f64>; 6]);

impl AspectScores {
    pub fn get(&self, aspect: Aspect) -> Option<f64> {
        self.0[aspect.index()]
    }

    pub fn set(&mut self, aspect: Aspect, score: f64) {
        self.0[aspect.index()] = Some(score);
    }

    pub fn label(&self, aspect: Aspect) -> Option<SentimentLabel> {
        self.get(aspect).map(SentimentLabel::from_score)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Aspect, Option<f64>)> + '_ {
        Aspect::ALL.iter().map(move |&a| (a, self.get(a)))
    }
}

/// One fully annotated review: the unit written to the output table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisRow {
    pub review: Review,
    pub scores: AspectScores,
    /// Whitelisted subcategory tags in extraction order.
    pub subcategories: Vec<String>,
    pub jtbd: Option<String>,
}

impl AnalysisRow {
    pub fn new(review: Review) -> Self {
        Self {
            review,
            scores: AspectScores::default(),
            subcategories: Vec::new(),
            jtbd: None,
        }
    }

    pub fn record_sentiment(&mut self, sentiment: &AspectSentiment) {
        self.scores.set(sentiment.aspect, sentiment.score);
    }

    /// Tags whose parent is `aspect`, in extraction order.
    pub fn subcategories_for(&self, aspect: Aspect) -> Vec<&str> {
        self.subcategories
            .iter()
            .filter(|tag| taxonomy::parent_aspect(tag) == Some(aspect))
            .map(String::as_str)
            .collect()
    }

    /// Comma-joined cell value for an aspect's subcategory column.
    pub fn subcategory_cell(&self, aspect: Aspect) -> String {
        self.subcategories_for(aspect).join(", ")
    }

    /// Sentiment attached to each tag through its parent aspect. Tags whose
    /// aspect has no score count as neutral.
    pub fn tag_sentiments(&self) -> Vec<(&str, SentimentLabel)> {
        self.subcategories
            .iter()
            .filter_map(|tag| {
                let aspect = taxonomy::parent_aspect(tag)?;
                let label = self.scores.label(aspect).unwrap_or(SentimentLabel::Neutral);
                Some((tag.as_str(), label))
            })
            .collect()
    }
}
