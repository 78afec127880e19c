use thiserror::Error;

/// Errors produced by collectors and the shared fetch helper.
#[derive(Debug, Error)]
pub enum CollectorError {
    /// Network or TLS failure from the underlying HTTP client, after all
    /// fetch attempts were exhausted.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The source answered, but with a status the collector cannot use.
    #[error("unexpected status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    /// The response body could not be deserialized into the expected shape.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// The request body cannot be cloned for retrying (streaming body).
    #[error("request cannot be retried: body is not cloneable")]
    UncloneableRequest,
}
