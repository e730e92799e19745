use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("LLM API error: {0}")]
    LLMApi(String),

    #[error("Sentiment classifier error: {0}")]
    Classifier(String),

    #[error("Failed to parse response: {0}")]
    ParseError(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Failures caused by a remote collaborator rather than local state.
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            Error::LLMApi(_) | Error::Classifier(_) | Error::Network(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_classification() {
        assert!(Error::LLMApi("down".into()).is_remote());
        assert!(Error::Classifier("503".into()).is_remote());
        assert!(!Error::Config("missing key".into()).is_remote());
        assert!(!Error::ParseError("bad json".into()).is_remote());
    }
}
