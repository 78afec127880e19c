//! Concurrent fan-out over the collector registry.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use narradar_core::types::{CollectorFailure, Signal, SignalSource};

use crate::collector::Collector;

/// Merged outcome of one fan-out over every configured collector.
#[derive(Debug, Default)]
pub struct CollectionOutcome {
    /// All collected signals, ranked by descending score. Equal scores keep
    /// their dispatch order (stable sort).
    pub signals: Vec<Signal>,
    /// Raw captured payloads keyed by source, for audit only.
    pub raw: HashMap<SignalSource, serde_json::Value>,
    /// One entry per failed collector, with the source retained.
    pub failures: Vec<CollectorFailure>,
}

/// Owns the fixed set of collectors and runs them as one settle-all batch.
pub struct CollectorManager {
    collectors: Vec<Arc<dyn Collector>>,
}

impl CollectorManager {
    #[must_use]
    pub fn new(collectors: Vec<Arc<dyn Collector>>) -> Self {
        Self { collectors }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.collectors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.collectors.is_empty()
    }

    /// Runs every collector concurrently and merges the results.
    ///
    /// One collector failing — or panicking — never cancels or affects the
    /// others; its failure is captured under its source and the rest of the
    /// batch proceeds. This function itself never fails: a batch where every
    /// collector failed still returns normally, with empty signals and a
    /// non-empty failure list.
    pub async fn collect_all(&self) -> CollectionOutcome {
        tracing::info!(
            collectors = self.collectors.len(),
            "starting signal collection"
        );

        let mut handles = Vec::with_capacity(self.collectors.len());
        for collector in &self.collectors {
            let collector = Arc::clone(collector);
            handles.push(tokio::spawn(async move {
                let started = Instant::now();
                let source = collector.source();
                let result = collector.collect().await;
                let elapsed = started.elapsed();
                match &result {
                    Ok(output) => tracing::info!(
                        collector = collector.name(),
                        signals = output.signals.len(),
                        elapsed_secs = elapsed.as_secs_f64(),
                        "collector finished"
                    ),
                    Err(err) => tracing::warn!(
                        collector = collector.name(),
                        error = %err,
                        elapsed_secs = elapsed.as_secs_f64(),
                        "collector failed"
                    ),
                }
                (source, result)
            }));
        }

        let mut outcome = CollectionOutcome::default();

        // Join in dispatch order so equal-score signals rank deterministically.
        for (handle, collector) in handles.into_iter().zip(&self.collectors) {
            match handle.await {
                Ok((source, Ok(output))) => {
                    outcome.signals.extend(output.signals);
                    outcome.raw.insert(source, output.raw);
                }
                Ok((source, Err(err))) => {
                    outcome.failures.push(CollectorFailure {
                        source,
                        message: err.to_string(),
                    });
                }
                Err(join_err) => {
                    outcome.failures.push(CollectorFailure {
                        source: collector.source(),
                        message: format!("collector task aborted: {join_err}"),
                    });
                }
            }
        }

        // Stable: equal-score signals retain their arrival order.
        outcome
            .signals
            .sort_by(|a, b| b.score.total_cmp(&a.score));

        tracing::info!(
            signals = outcome.signals.len(),
            failures = outcome.failures.len(),
            "signal collection complete"
        );

        outcome
    }
}
