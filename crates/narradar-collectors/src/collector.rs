use async_trait::async_trait;
use chrono::Utc;
use narradar_core::types::{Signal, SignalSource, SignalStrength};

use crate::error::CollectorError;

/// What one collector invocation hands back: not-yet-identified signals plus
/// the raw captured payload, kept for audit and never interpreted upstream.
#[derive(Debug, Clone)]
pub struct CollectorOutput {
    pub signals: Vec<Signal>,
    pub raw: serde_json::Value,
}

/// One unit responsible for producing signals from exactly one external
/// source. The source's wire protocol is entirely its own business.
#[async_trait]
pub trait Collector: Send + Sync {
    /// Source identifier used for attribution and raw-data keying.
    fn source(&self) -> SignalSource;

    /// Human-readable name used for logging.
    fn name(&self) -> &str;

    /// Produce signals from the source.
    ///
    /// # Errors
    ///
    /// Returns [`CollectorError`] when the source cannot be reached after
    /// retries or its response cannot be used.
    async fn collect(&self) -> Result<CollectorOutput, CollectorError>;
}

/// Builds a signal with the strength derived from its score and the
/// detection timestamp stamped now.
#[must_use]
pub fn build_signal(
    source: SignalSource,
    title: impl Into<String>,
    description: impl Into<String>,
    score: f64,
    metadata: serde_json::Map<String, serde_json::Value>,
    url: Option<String>,
) -> Signal {
    Signal {
        source,
        title: title.into(),
        description: description.into(),
        url,
        strength: SignalStrength::from_score(score),
        score,
        metadata,
        detected_at: Utc::now(),
    }
}
