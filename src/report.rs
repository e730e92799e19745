use std::collections::BTreeMap;

use serde::Serialize;

use crate::models::{AnalysisRow, Aspect, SentimentLabel};

pub const TOP_N: usize = 10;
pub const PLATFORM_TOP_N: usize = 3;
/// Subcategories need at least this many pairs to count as a highlight.
pub const HIGHLIGHT_MIN_SUPPORT: usize = 50;
/// Scores within +/- this band count as neutral in the aspect overview.
pub const NEUTRAL_BAND: f64 = 0.3;

const UNKNOWN_PLATFORM: &str = "unknown";

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Report {
    pub overview: Overview,
    pub sentiment_distribution: Vec<LabelShare>,
    pub platform_sentiment: Vec<PlatformSentiment>,
    pub top_subcategories: Vec<SubcategoryCount>,
    pub pain_points: Vec<SubcategoryRate>,
    pub positive_highlights: Vec<SubcategoryRate>,
    pub platform_pain_points: Vec<PlatformPainPoints>,
    pub aspects: Vec<AspectOverview>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Overview {
    pub reviews: usize,
    pub pairs: usize,
    pub unique_subcategories: usize,
    pub platforms: Vec<String>,
    pub mean_rating: Option<f64>,
    pub reviews_per_platform: Vec<SubcategoryCount>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct LabelShare {
    pub label: SentimentLabel,
    pub count: usize,
    pub percentage: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PlatformSentiment {
    pub platform: String,
    pub total: usize,
    pub shares: Vec<LabelShare>,
}

/// A name with a count. Also used for platforms in the overview.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SubcategoryCount {
    pub name: String,
    pub count: usize,
}

/// `count` of `total` pairs carry the ranked label; `rate` is a percentage.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SubcategoryRate {
    pub name: String,
    pub count: usize,
    pub total: usize,
    pub rate: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PlatformPainPoints {
    pub platform: String,
    pub pain_points: Vec<SubcategoryCount>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AspectOverview {
    pub aspect: Aspect,
    pub scored: usize,
    pub mean_score: Option<f64>,
    pub positive: usize,
    pub neutral: usize,
    pub negative: usize,
}

/// Counts per label, indexed in `SentimentLabel::ALL` order.
type LabelCounts = [usize; 3];

fn slot(label: SentimentLabel) -> usize {
    match label {
        SentimentLabel::Negative => 0,
        SentimentLabel::Neutral => 1,
        SentimentLabel::Positive => 2,
    }
}

fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 * 100.0 / whole as f64
    }
}

fn platform_of(row: &AnalysisRow) -> &str {
    row.review.platform().unwrap_or(UNKNOWN_PLATFORM)
}

fn shares(counts: &LabelCounts) -> Vec<LabelShare> {
    let total: usize = counts.iter().sum();
    SentimentLabel::ALL
        .iter()
        .map(|&label| LabelShare {
            label,
            count: counts[slot(label)],
            percentage: percentage(counts[slot(label)], total),
        })
        .collect()
}

/// Highest count first, then name ascending.
fn ranked<'a>(counts: impl IntoIterator<Item = (&'a str, usize)>, limit: usize) -> Vec<SubcategoryCount> {
    let mut entries: Vec<(&str, usize)> = counts.into_iter().filter(|&(_, c)| c > 0).collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    entries
        .into_iter()
        .take(limit)
        .map(|(name, count)| SubcategoryCount {
            name: name.to_string(),
            count,
        })
        .collect()
}

impl Report {
    pub fn from_rows(rows: &[AnalysisRow]) -> Self {
        let mut overall: LabelCounts = [0; 3];
        let mut by_platform: BTreeMap<&str, LabelCounts> = BTreeMap::new();
        let mut by_subcategory: BTreeMap<&str, LabelCounts> = BTreeMap::new();
        let mut platform_negatives: BTreeMap<&str, BTreeMap<&str, usize>> = BTreeMap::new();
        let mut reviews_per_platform: BTreeMap<&str, usize> = BTreeMap::new();
        let mut pairs = 0;

        for row in rows {
            let platform = platform_of(row);
            *reviews_per_platform.entry(platform).or_default() += 1;

            for (tag, label) in row.tag_sentiments() {
                pairs += 1;
                overall[slot(label)] += 1;
                by_platform.entry(platform).or_default()[slot(label)] += 1;
                by_subcategory.entry(tag).or_default()[slot(label)] += 1;
                if label == SentimentLabel::Negative {
                    *platform_negatives
                        .entry(platform)
                        .or_default()
                        .entry(tag)
                        .or_default() += 1;
                }
            }
        }

        let mean_rating = (!rows.is_empty()).then(|| {
            rows.iter().map(|r| r.review.rating as f64).sum::<f64>() / rows.len() as f64
        });

        let overview = Overview {
            reviews: rows.len(),
            pairs,
            unique_subcategories: by_subcategory.len(),
            platforms: reviews_per_platform.keys().map(|p| p.to_string()).collect(),
            mean_rating,
            reviews_per_platform: reviews_per_platform
                .iter()
                .map(|(p, &count)| SubcategoryCount {
                    name: p.to_string(),
                    count,
                })
                .collect(),
        };

        let platform_sentiment = by_platform
            .iter()
            .map(|(platform, counts)| PlatformSentiment {
                platform: platform.to_string(),
                total: counts.iter().sum(),
                shares: shares(counts),
            })
            .collect();

        let top_subcategories = ranked(
            by_subcategory.iter().map(|(name, c)| (*name, c.iter().sum::<usize>())),
            TOP_N,
        );

        let pain_points = ranked(
            by_subcategory
                .iter()
                .map(|(name, c)| (*name, c[slot(SentimentLabel::Negative)])),
            TOP_N,
        )
        .into_iter()
        .map(|entry| {
            let total = by_subcategory
                .get(entry.name.as_str())
                .map(|c| c.iter().sum::<usize>())
                .unwrap_or(entry.count);
            SubcategoryRate {
                rate: percentage(entry.count, total),
                name: entry.name,
                count: entry.count,
                total,
            }
        })
        .collect();

        let mut positive_highlights: Vec<SubcategoryRate> = by_subcategory
            .iter()
            .filter_map(|(name, c)| {
                let total: usize = c.iter().sum();
                if total < HIGHLIGHT_MIN_SUPPORT {
                    return None;
                }
                let positive = c[slot(SentimentLabel::Positive)];
                Some(SubcategoryRate {
                    name: name.to_string(),
                    count: positive,
                    total,
                    rate: percentage(positive, total),
                })
            })
            .collect();
        positive_highlights.sort_by(|a, b| b.rate.total_cmp(&a.rate).then_with(|| a.name.cmp(&b.name)));
        positive_highlights.truncate(TOP_N);

        let platform_pain_points = reviews_per_platform
            .keys()
            .map(|platform| PlatformPainPoints {
                platform: platform.to_string(),
                pain_points: platform_negatives
                    .get(platform)
                    .map(|tags| ranked(tags.iter().map(|(t, &c)| (*t, c)), PLATFORM_TOP_N))
                    .unwrap_or_default(),
            })
            .collect();

        Self {
            overview,
            sentiment_distribution: shares(&overall),
            platform_sentiment,
            top_subcategories,
            pain_points,
            positive_highlights,
            platform_pain_points,
            aspects: aspect_overview(rows),
        }
    }

    pub fn to_json(&self) -> crate::error::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn to_markdown(&self) -> String {
        let mut output = String::new();

        output.push_str("# Review Insights\n\n");

        output.push_str("## Overview\n\n");
        output.push_str("| Metric | Value |\n|--------|-------|\n");
        output.push_str(&format!("| Reviews | {} |\n", self.overview.reviews));
        output.push_str(&format!("| Aspect-Sentiment Pairs | {} |\n", self.overview.pairs));
        output.push_str(&format!(
            "| Unique Subcategories | {} |\n",
            self.overview.unique_subcategories
        ));
        output.push_str(&format!("| Platforms | {} |\n", self.overview.platforms.join(", ")));
        if let Some(mean) = self.overview.mean_rating {
            output.push_str(&format!("| Average Rating | {:.2}/5 |\n", mean));
        }
        for entry in &self.overview.reviews_per_platform {
            output.push_str(&format!("| Reviews ({}) | {} |\n", entry.name, entry.count));
        }

        output.push_str("\n## Sentiment Distribution\n\n");
        output.push_str("| Sentiment | Count | Percentage |\n");
        output.push_str("|-----------|-------|------------|\n");
        for share in &self.sentiment_distribution {
            output.push_str(&format!(
                "| {} | {} | {:.1}% |\n",
                share.label, share.count, share.percentage
            ));
        }

        output.push_str("\n## Platform Comparison\n\n");
        output.push_str("| Platform | Negative | Neutral | Positive | Total |\n");
        output.push_str("|----------|----------|---------|----------|-------|\n");
        for platform in &self.platform_sentiment {
            output.push_str(&format!("| {} |", platform.platform));
            for share in &platform.shares {
                output.push_str(&format!(" {:.1}% |", share.percentage));
            }
            output.push_str(&format!(" {} |\n", platform.total));
        }

        output.push_str(&format!("\n## Top {} Subcategories by Volume\n\n", TOP_N));
        output.push_str("| Rank | Subcategory | Mentions |\n");
        output.push_str("|------|-------------|----------|\n");
        for (rank, entry) in self.top_subcategories.iter().enumerate() {
            output.push_str(&format!("| {} | {} | {} |\n", rank + 1, entry.name, entry.count));
        }

        output.push_str(&format!("\n## Top {} Pain Points\n\n", TOP_N));
        output.push_str("| Rank | Subcategory | Negative Mentions | Negative % |\n");
        output.push_str("|------|-------------|-------------------|------------|\n");
        for (rank, entry) in self.pain_points.iter().enumerate() {
            output.push_str(&format!(
                "| {} | {} | {} | {:.1}% |\n",
                rank + 1,
                entry.name,
                entry.count,
                entry.rate
            ));
        }

        output.push_str(&format!(
            "\n## Positive Highlights (at least {} mentions)\n\n",
            HIGHLIGHT_MIN_SUPPORT
        ));
        if self.positive_highlights.is_empty() {
            output.push_str("_No subcategory has enough mentions._\n");
        } else {
            output.push_str("| Rank | Subcategory | Positive % | Positive/Total |\n");
            output.push_str("|------|-------------|------------|----------------|\n");
            for (rank, entry) in self.positive_highlights.iter().enumerate() {
                output.push_str(&format!(
                    "| {} | {} | {:.1}% | {}/{} |\n",
                    rank + 1,
                    entry.name,
                    entry.rate,
                    entry.count,
                    entry.total
                ));
            }
        }

        output.push_str("\n## Platform-Specific Pain Points\n");
        for platform in &self.platform_pain_points {
            output.push_str(&format!("\n### {}\n\n", platform.platform.to_uppercase()));
            if platform.pain_points.is_empty() {
                output.push_str("_No negative mentions._\n");
                continue;
            }
            output.push_str("| Rank | Pain Point | Mentions |\n");
            output.push_str("|------|------------|----------|\n");
            for (rank, entry) in platform.pain_points.iter().enumerate() {
                output.push_str(&format!("| {} | {} | {} |\n", rank + 1, entry.name, entry.count));
            }
        }

        output.push_str("\n## Aspect Sentiment\n\n");
        output.push_str("| Aspect | Mean Score | Positive | Neutral | Negative |\n");
        output.push_str("|--------|------------|----------|---------|----------|\n");
        for aspect in &self.aspects {
            let mean = aspect
                .mean_score
                .map(|m| format!("{:.3}", m))
                .unwrap_or_else(|| "n/a".to_string());
            output.push_str(&format!(
                "| {} | {} | {} | {} | {} |\n",
                aspect.aspect, mean, aspect.positive, aspect.neutral, aspect.negative
            ));
        }

        output
    }
}

fn aspect_overview(rows: &[AnalysisRow]) -> Vec<AspectOverview> {
    Aspect::ALL
        .iter()
        .map(|&aspect| {
            let scores: Vec<f64> = rows.iter().filter_map(|r| r.scores.get(aspect)).collect();
            let mean_score =
                (!scores.is_empty()).then(|| scores.iter().sum::<f64>() / scores.len() as f64);
            AspectOverview {
                aspect,
                scored: scores.len(),
                mean_score,
                positive: scores.iter().filter(|&&s| s > NEUTRAL_BAND).count(),
                neutral: scores
                    .iter()
                    .filter(|&&s| (-NEUTRAL_BAND..=NEUTRAL_BAND).contains(&s))
                    .count(),
                negative: scores.iter().filter(|&&s| s < -NEUTRAL_BAND).count(),
            }
        })
        .collect()
}
