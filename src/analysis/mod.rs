pub mod extractor;
pub mod jtbd;
pub mod pipeline;
pub mod sentiment;

pub use extractor::SubcategoryExtractor;
pub use jtbd::JtbdSynthesizer;
pub use pipeline::{AnalysisPipeline, PipelineOutput, RunStats};
pub use sentiment::{HttpSentimentClassifier, SentimentClassifier};
