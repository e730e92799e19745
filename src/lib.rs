pub mod config;
pub mod error;
pub mod models;
pub mod llm;
pub mod taxonomy;
pub mod analysis;
pub mod storage;
pub mod report;

pub use config::{AspectScope, Config, PipelineConfig};
pub use error::{Error, Result};
pub use llm::{build_provider, ClaudeProvider, LLMProvider, OpenAIProvider, ProviderKind};
pub use analysis::{AnalysisPipeline, HttpSentimentClassifier, PipelineOutput, RunStats};
pub use storage::CheckpointStore;
pub use report::Report;
