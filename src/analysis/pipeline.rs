use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;

use crate::analysis::extractor::{default_tags, SubcategoryExtractor};
use crate::analysis::jtbd::JtbdSynthesizer;
use crate::analysis::sentiment::SentimentClassifier;
use crate::config::{AspectScope, PipelineConfig};
use crate::error::Result;
use crate::llm::LLMProvider;
use crate::models::{AnalysisRow, Aspect, AspectSentiment, Review, SentimentPrediction};
use crate::storage::{write_analysis, CheckpointStore};
use crate::taxonomy;

/// Per-stage call and failure counts for one run.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct RunStats {
    pub reviews_processed: usize,
    pub reviews_resumed: usize,
    pub sentiment_calls: usize,
    pub sentiment_failures: usize,
    pub subcategory_calls: usize,
    pub subcategory_failures: usize,
    pub jtbd_calls: usize,
    pub jtbd_failures: usize,
    pub checkpoints_written: usize,
}

fn rate(failures: usize, calls: usize) -> f64 {
    if calls == 0 {
        0.0
    } else {
        failures as f64 / calls as f64
    }
}

impl RunStats {
    pub fn failure_rates(&self) -> [(&'static str, f64); 3] {
        [
            ("sentiment", rate(self.sentiment_failures, self.sentiment_calls)),
            ("subcategory", rate(self.subcategory_failures, self.subcategory_calls)),
            ("jtbd", rate(self.jtbd_failures, self.jtbd_calls)),
        ]
    }

    /// Stages whose failure rate is above `threshold`.
    pub fn alerts(&self, threshold: f64) -> Vec<(&'static str, f64)> {
        self.failure_rates()
            .into_iter()
            .filter(|&(_, r)| r > threshold)
            .collect()
    }
}

#[derive(Debug)]
pub struct PipelineOutput {
    pub rows: Vec<AnalysisRow>,
    pub stats: RunStats,
}

pub struct AnalysisPipeline {
    classifier: Arc<dyn SentimentClassifier>,
    extractor: Option<SubcategoryExtractor>,
    synthesizer: Option<JtbdSynthesizer>,
    checkpoints: Option<CheckpointStore>,
    config: PipelineConfig,
}

impl AnalysisPipeline {
    /// `llm` is `None` when the provider could not be built; both LLM stages
    /// are then skipped for the whole run.
    pub fn new(
        classifier: Arc<dyn SentimentClassifier>,
        llm: Option<Arc<dyn LLMProvider>>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            classifier,
            extractor: llm.clone().map(SubcategoryExtractor::new),
            synthesizer: llm.map(JtbdSynthesizer::new),
            checkpoints: None,
            config,
        }
    }

    pub fn with_checkpoints(mut self, store: CheckpointStore) -> Self {
        self.checkpoints = Some(store);
        self
    }

    pub fn skip_subcategories(mut self) -> Self {
        self.extractor = None;
        self
    }

    pub fn skip_jtbd(mut self) -> Self {
        self.synthesizer = None;
        self
    }

    /// Process every review, then write the final table to `output`.
    pub async fn run(&self, reviews: &[Review], output: &Path) -> Result<PipelineOutput> {
        let result = self.process_reviews(reviews).await?;
        write_analysis(output, &result.rows)?;
        tracing::info!("Saved {} rows to {}", result.rows.len(), output.display());
        Ok(result)
    }

    pub async fn process_reviews(&self, reviews: &[Review]) -> Result<PipelineOutput> {
        let mut stats = RunStats::default();
        let mut rows: Vec<AnalysisRow> = Vec::with_capacity(reviews.len());

        if self.config.resume {
            if let Some(store) = &self.checkpoints {
                if let Some(restored) = store.restore(reviews)? {
                    stats.reviews_resumed = restored.len();
                    rows = restored;
                }
            }
        }

        match &self.extractor {
            Some(extractor) => tracing::info!("Subcategory extraction via {}", extractor.provider_name()),
            None => tracing::warn!("Subcategory extraction disabled; every review gets the default tag"),
        }
        match &self.synthesizer {
            Some(synthesizer) => tracing::info!("JTBD synthesis via {}", synthesizer.provider_name()),
            None => tracing::warn!("JTBD synthesis disabled; statements will be left empty"),
        }

        let pb = self.progress_bar(reviews.len() as u64);
        pb.set_position(rows.len() as u64);

        let batch_size = self.config.batch_size.max(1);
        let start = rows.len();

        for (idx, review) in reviews.iter().enumerate().skip(start) {
            let started = Instant::now();
            let row = self.process_review(review, &mut stats).await;
            rows.push(row);
            stats.reviews_processed += 1;
            pb.inc(1);

            if (idx + 1) % 10 == 0 {
                tracing::debug!(
                    "Processed {}/{} reviews ({:.2}s for the last one)",
                    idx + 1,
                    reviews.len(),
                    started.elapsed().as_secs_f64()
                );
            }

            if self.config.save_checkpoints && (idx + 1) % batch_size == 0 {
                if let Some(store) = &self.checkpoints {
                    let path = store.save(&rows)?;
                    stats.checkpoints_written += 1;
                    tracing::info!("Checkpoint saved at {} reviews: {}", idx + 1, path.display());
                }
            }
        }

        pb.finish_with_message("Analysis complete");
        self.report_failures(&stats);

        Ok(PipelineOutput { rows, stats })
    }

    /// Annotate a single review. Stage failures are counted and replaced with
    /// their defaults; this never fails.
    pub async fn process_review(&self, review: &Review, stats: &mut RunStats) -> AnalysisRow {
        let mut row = AnalysisRow::new(review.clone());

        match self.config.aspect_scope {
            AspectScope::All => {
                self.score_aspects(review, &Aspect::ALL, &mut row, stats).await;
                row.subcategories = self.extract_subcategories(review, stats).await;
            }
            AspectScope::Tagged => {
                row.subcategories = self.extract_subcategories(review, stats).await;
                let mut aspects: Vec<Aspect> = row
                    .subcategories
                    .iter()
                    .filter_map(|tag| taxonomy::parent_aspect(tag))
                    .collect();
                aspects.sort();
                aspects.dedup();
                self.score_aspects(review, &aspects, &mut row, stats).await;
            }
        }

        row.jtbd = self.synthesize_jtbd(review, stats).await;
        row
    }

    async fn score_aspects(
        &self,
        review: &Review,
        aspects: &[Aspect],
        row: &mut AnalysisRow,
        stats: &mut RunStats,
    ) {
        for &aspect in aspects {
            stats.sentiment_calls += 1;
            let prediction = match self.classifier.classify(&review.comment, aspect).await {
                Ok(prediction) => prediction,
                Err(e) => {
                    stats.sentiment_failures += 1;
                    log_stage_failure("sentiment", &review.id, &e);
                    SentimentPrediction::neutral_default()
                }
            };
            row.record_sentiment(&AspectSentiment::new(aspect, &prediction));
        }
    }

    async fn extract_subcategories(&self, review: &Review, stats: &mut RunStats) -> Vec<String> {
        let Some(extractor) = &self.extractor else {
            return default_tags();
        };

        stats.subcategory_calls += 1;
        match extractor.extract(&review.comment).await {
            Ok(tags) => tags,
            Err(e) => {
                stats.subcategory_failures += 1;
                log_stage_failure("subcategory", &review.id, &e);
                default_tags()
            }
        }
    }

    async fn synthesize_jtbd(&self, review: &Review, stats: &mut RunStats) -> Option<String> {
        let synthesizer = self.synthesizer.as_ref()?;

        stats.jtbd_calls += 1;
        let request = JtbdSynthesizer::request_for(review);
        match synthesizer.synthesize(&request).await {
            Ok(statement) => Some(statement),
            Err(e) => {
                stats.jtbd_failures += 1;
                log_stage_failure("jtbd", &review.id, &e);
                Some(request.fallback())
            }
        }
    }

    fn report_failures(&self, stats: &RunStats) {
        tracing::info!(
            "Processed {} reviews ({} resumed); failures: sentiment {}/{}, subcategory {}/{}, jtbd {}/{}",
            stats.reviews_processed,
            stats.reviews_resumed,
            stats.sentiment_failures,
            stats.sentiment_calls,
            stats.subcategory_failures,
            stats.subcategory_calls,
            stats.jtbd_failures,
            stats.jtbd_calls,
        );

        for (stage, failure_rate) in stats.alerts(self.config.failure_alert_threshold) {
            tracing::error!(
                "{} stage failed for {:.0}% of calls; output for that stage is mostly defaults",
                stage,
                failure_rate * 100.0
            );
        }
    }

    fn progress_bar(&self, len: u64) -> ProgressBar {
        if !self.config.show_progress {
            return ProgressBar::hidden();
        }

        let pb = ProgressBar::new(len);
        match ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} reviews")
        {
            Ok(style) => pb.set_style(style.progress_chars("#>-")),
            Err(e) => tracing::debug!("Progress template rejected: {}", e),
        }
        pb
    }
}

fn log_stage_failure(stage: &str, review_id: &str, error: &crate::error::Error) {
    if error.is_remote() {
        tracing::warn!("{} call failed for review {}: {}", stage, review_id, error);
    } else {
        tracing::debug!("{} output unusable for review {}: {}", stage, review_id, error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::llm::ChatRequest;
    use crate::models::SentimentLabel;
    use crate::storage::read_analysis;
    use crate::taxonomy::DEFAULT_SUBCATEGORY;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Keyword classifier: negative on complaint words, positive on praise.
    #[derive(Default)]
    struct KeywordClassifier {
        calls: Mutex<Vec<(String, Aspect)>>,
        fail_on: Option<&'static str>,
    }

    #[async_trait]
    impl SentimentClassifier for KeywordClassifier {
        async fn classify(&self, text: &str, aspect: Aspect) -> Result<SentimentPrediction> {
            self.calls.lock().unwrap().push((text.to_string(), aspect));
            if self.fail_on.is_some_and(|needle| text.contains(needle)) {
                return Err(Error::Classifier("connection reset".into()));
            }

            let lower = text.to_lowercase();
            let relevant = match aspect {
                Aspect::Food => lower.contains("pizza") || lower.contains("food"),
                Aspect::Delivery => lower.contains("driver") || lower.contains("late"),
                _ => false,
            };
            let probs = if !relevant {
                [0.1, 0.8, 0.1]
            } else if lower.contains("cold") || lower.contains("rude") || lower.contains("late") {
                [0.9, 0.07, 0.03]
            } else {
                [0.05, 0.1, 0.85]
            };
            Ok(SentimentPrediction::from_probabilities(probs))
        }
    }

    /// Chat provider that answers from the prompt kind, failing on demand.
    struct FakeLlm {
        fail_on: Option<&'static str>,
    }

    #[async_trait]
    impl LLMProvider for FakeLlm {
        async fn chat(&self, request: ChatRequest) -> Result<String> {
            if self.fail_on.is_some_and(|needle| request.prompt.contains(needle)) {
                return Err(Error::LLMApi("429 Too Many Requests".into()));
            }

            if let Some((_, review)) = request.prompt.split_once("Review to analyze:") {
                let mut tags = Vec::new();
                if review.contains("arrived cold") {
                    tags.push("\"food_quality\"");
                }
                if review.contains("Driver was rude") {
                    tags.push("\"driver_behavior\"");
                }
                Ok(format!("Sure: [{}]", tags.join(", ")))
            } else {
                Ok("\"When I order dinner, I want it to arrive hot so that I can enjoy it.\"".into())
            }
        }

        fn name(&self) -> &str {
            "fake"
        }
    }

    fn review(id: &str, comment: &str) -> Review {
        Review {
            id: id.into(),
            source: "doordash".into(),
            app_type: "android".into(),
            timestamp: "2024-04-01".into(),
            comment: comment.into(),
            rating: 2,
        }
    }

    fn config() -> PipelineConfig {
        PipelineConfig {
            batch_size: 2,
            show_progress: false,
            ..PipelineConfig::default()
        }
    }

    fn pipeline(
        classifier: KeywordClassifier,
        llm: Option<FakeLlm>,
        config: PipelineConfig,
    ) -> AnalysisPipeline {
        let llm = llm.map(|l| Arc::new(l) as Arc<dyn LLMProvider>);
        AnalysisPipeline::new(Arc::new(classifier), llm, config)
    }

    const PIZZA: &str = "The pizza arrived cold and the cheese was congealed. Driver was rude too.";

    #[tokio::test]
    async fn test_end_to_end_pizza_review() {
        let pipeline = pipeline(KeywordClassifier::default(), Some(FakeLlm { fail_on: None }), config());
        let output = pipeline.process_reviews(&[review("1", PIZZA)]).await.unwrap();

        let row = &output.rows[0];
        assert!(row.subcategories.contains(&"food_quality".to_string()));
        assert!(row.subcategories.contains(&"driver_behavior".to_string()));
        assert!(!row.subcategories.contains(&"food_taste".to_string()));
        assert!(row.scores.get(Aspect::Food).unwrap() < 0.0);
        assert!(row.scores.get(Aspect::Delivery).unwrap() < 0.0);
        assert!(row.jtbd.as_deref().unwrap().starts_with("When"));

        for (_, score) in row.scores.iter() {
            let score = score.unwrap();
            assert!((-1.0..=1.0).contains(&score));
        }
        assert_eq!(row.scores.label(Aspect::Price), Some(SentimentLabel::Neutral));
        assert_eq!(row.scores.get(Aspect::Price), Some(0.0));
    }

    #[tokio::test]
    async fn test_all_scope_scores_every_aspect_once() {
        let classifier = KeywordClassifier::default();
        let pipeline = pipeline(classifier, Some(FakeLlm { fail_on: None }), config());
        let mut stats = RunStats::default();
        pipeline.process_review(&review("1", PIZZA), &mut stats).await;

        assert_eq!(stats.sentiment_calls, 6);
        assert_eq!(stats.subcategory_calls, 1);
        assert_eq!(stats.jtbd_calls, 1);
    }

    #[tokio::test]
    async fn test_tagged_scope_scores_distinct_parents_only() {
        let config = PipelineConfig {
            aspect_scope: AspectScope::Tagged,
            ..config()
        };
        let pipeline = pipeline(KeywordClassifier::default(), Some(FakeLlm { fail_on: None }), config);
        let mut stats = RunStats::default();
        let row = pipeline.process_review(&review("1", PIZZA), &mut stats).await;

        assert_eq!(stats.sentiment_calls, 2);
        assert!(row.scores.get(Aspect::Food).unwrap() < 0.0);
        assert!(row.scores.get(Aspect::Delivery).unwrap() < 0.0);
        assert_eq!(row.scores.get(Aspect::Interface), None);

        for tag in &row.subcategories {
            let parent = taxonomy::parent_aspect(tag).unwrap();
            assert!(row.scores.get(parent).is_some());
        }
    }

    #[tokio::test]
    async fn test_failures_never_drop_rows() {
        let classifier = KeywordClassifier {
            fail_on: Some("BROKEN"),
            ..Default::default()
        };
        let llm = FakeLlm { fail_on: Some("BROKEN") };
        let pipeline = pipeline(classifier, Some(llm), config());

        let reviews = vec![
            review("1", PIZZA),
            review("2", "BROKEN review text"),
            review("3", "Food was great"),
        ];
        let output = pipeline.process_reviews(&reviews).await.unwrap();

        assert_eq!(output.rows.len(), reviews.len());
        let failed = &output.rows[1];
        assert_eq!(failed.subcategories, vec![DEFAULT_SUBCATEGORY]);
        assert_eq!(
            failed.jtbd.as_deref(),
            Some("When using doordash, I want a better experience.")
        );
        for (_, score) in failed.scores.iter() {
            assert_eq!(score, Some(0.0));
        }

        assert_eq!(output.stats.sentiment_failures, 6);
        assert_eq!(output.stats.subcategory_failures, 1);
        assert_eq!(output.stats.jtbd_failures, 1);
        assert_eq!(output.stats.alerts(0.5), Vec::new());
        assert_eq!(output.stats.alerts(0.3).len(), 3);
    }

    #[tokio::test]
    async fn test_llm_stages_skipped_without_provider() {
        let pipeline = pipeline(KeywordClassifier::default(), None, config());
        let output = pipeline.process_reviews(&[review("1", PIZZA)]).await.unwrap();

        assert_eq!(output.rows[0].subcategories, vec![DEFAULT_SUBCATEGORY]);
        assert_eq!(output.rows[0].jtbd, None);
        assert_eq!(output.stats.subcategory_calls, 0);
        assert_eq!(output.stats.jtbd_calls, 0);
    }

    #[tokio::test]
    async fn test_checkpoint_holds_exactly_n_rows() {
        let dir = tempfile::tempdir().unwrap();
        let store = CheckpointStore::new(dir.path().join("checkpoints"), "run");
        let pipeline = pipeline(KeywordClassifier::default(), Some(FakeLlm { fail_on: None }), config())
            .with_checkpoints(store);

        let reviews: Vec<Review> = (1..=5)
            .map(|i| review(&i.to_string(), "Food was great"))
            .collect();
        let output = pipeline.run(&reviews, &dir.path().join("run.csv")).await.unwrap();

        assert_eq!(output.stats.checkpoints_written, 2);
        let cp2 = read_analysis(dir.path().join("checkpoints/run_checkpoint_2.csv")).unwrap();
        let cp4 = read_analysis(dir.path().join("checkpoints/run_checkpoint_4.csv")).unwrap();
        assert_eq!(cp2.len(), 2);
        assert_eq!(cp4.len(), 4);
        assert!(!dir.path().join("checkpoints/run_checkpoint_5.csv").exists());
        assert_eq!(read_analysis(dir.path().join("run.csv")).unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_resume_continues_after_checkpoint() {
        let dir = tempfile::tempdir().unwrap();
        let reviews: Vec<Review> = (1..=5)
            .map(|i| review(&i.to_string(), "Food was great"))
            .collect();

        let store = CheckpointStore::new(dir.path(), "run");
        let first = AnalysisPipeline::new(Arc::new(KeywordClassifier::default()), None, config())
            .with_checkpoints(store);
        first.process_reviews(&reviews[..3]).await.unwrap();

        let classifier = Arc::new(KeywordClassifier::default());
        let resumed = AnalysisPipeline::new(
            classifier.clone(),
            None,
            PipelineConfig {
                resume: true,
                ..config()
            },
        )
        .with_checkpoints(CheckpointStore::new(dir.path(), "run"));
        let output = resumed.process_reviews(&reviews).await.unwrap();

        assert_eq!(output.stats.reviews_resumed, 2);
        assert_eq!(output.stats.reviews_processed, 3);
        assert_eq!(output.rows.len(), 5);
        let ids: Vec<&str> = output.rows.iter().map(|r| r.review.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "3", "4", "5"]);
        // Only rows 3..=5 reach the classifier again.
        assert_eq!(classifier.calls.lock().unwrap().len(), 3 * 6);
    }
}
