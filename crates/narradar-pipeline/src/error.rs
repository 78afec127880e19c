use thiserror::Error;

/// Errors from the analysis pipeline and the narrative extractor.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The extraction backend answered, but unusably (bad status, empty or
    /// malformed reply).
    #[error("narrative extraction failed: {0}")]
    Extraction(String),

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}
