//! The analysis pipeline: collect signals from every source, extract
//! narratives and build ideas, and assemble the run snapshot.

mod error;
mod extract;

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use chrono::{DateTime, Datelike, Utc};

use narradar_collectors::CollectorManager;
use narradar_core::types::{AnalysisSnapshot, Narrative, RunMetadata, Signal};

pub use error::PipelineError;
pub use extract::{LlmExtractor, NarrativeExtractor};

/// At most this many supporting signals are attached to one narrative.
const SIGNALS_PER_NARRATIVE: usize = 10;

/// A thing that produces one full analysis snapshot per invocation.
#[async_trait]
pub trait AnalysisPipeline: Send + Sync {
    /// # Errors
    ///
    /// Returns [`PipelineError`] only when narrative extraction fails;
    /// collector failures are folded into the snapshot instead.
    async fn run(&self) -> Result<AnalysisSnapshot, PipelineError>;
}

/// Production pipeline: collector fan-out followed by narrative extraction.
pub struct SignalPipeline {
    manager: CollectorManager,
    extractor: Arc<dyn NarrativeExtractor>,
}

impl SignalPipeline {
    #[must_use]
    pub fn new(manager: CollectorManager, extractor: Arc<dyn NarrativeExtractor>) -> Self {
        Self { manager, extractor }
    }
}

#[async_trait]
impl AnalysisPipeline for SignalPipeline {
    async fn run(&self) -> Result<AnalysisSnapshot, PipelineError> {
        let started_at = Utc::now();
        let clock = Instant::now();
        tracing::info!(collectors = self.manager.len(), "analysis run started");

        let outcome = self.manager.collect_all().await;
        for source in outcome.raw.keys() {
            tracing::debug!(source = %source, "raw payload captured");
        }

        let mut narratives = self.extractor.extract(&outcome.signals).await?;
        attach_signals(&mut narratives, &outcome.signals);

        let completed_at = Utc::now();
        let duration_ms = u64::try_from(clock.elapsed().as_millis()).unwrap_or(u64::MAX);
        let idea_count = narratives.iter().map(|n| n.ideas.len()).sum();

        let metadata = RunMetadata {
            started_at,
            completed_at,
            duration_ms,
            signal_count: outcome.signals.len(),
            narrative_count: narratives.len(),
            idea_count,
        };

        tracing::info!(
            signals = metadata.signal_count,
            narratives = metadata.narrative_count,
            ideas = metadata.idea_count,
            failures = outcome.failures.len(),
            duration_ms,
            "analysis run complete"
        );

        Ok(AnalysisSnapshot {
            narratives,
            all_signals: outcome.signals,
            errors: outcome.failures,
            metadata,
        })
    }
}

/// Attaches each narrative's supporting signals: a signal supports a
/// narrative when its title or description mentions one of the narrative's
/// tags. Signals arrive ranked, so attachment preserves that ranking.
fn attach_signals(narratives: &mut [Narrative], signals: &[Signal]) {
    for narrative in narratives.iter_mut() {
        let tags: Vec<String> = narrative.tags.iter().map(|t| t.to_lowercase()).collect();
        narrative.signals = signals
            .iter()
            .filter(|signal| {
                let haystack =
                    format!("{} {}", signal.title, signal.description).to_lowercase();
                tags.iter().any(|tag| haystack.contains(tag))
            })
            .take(SIGNALS_PER_NARRATIVE)
            .cloned()
            .collect();
    }
}

/// Names the half-month window a run belongs to, e.g. `2026-08A`.
#[must_use]
pub fn fortnight_period(at: DateTime<Utc>) -> String {
    let half = if at.day() <= 15 { 'A' } else { 'B' };
    format!("{}-{:02}{half}", at.year(), at.month())
}

/// Derives a URL-safe slug from a title: lowercase alphanumeric runs joined
/// by single dashes.
#[must_use]
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut last_dash = true;
    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }
    slug.trim_end_matches('-').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use narradar_collectors::{build_signal, Collector, CollectorError, CollectorOutput};
    use narradar_core::types::{
        NarrativeStatus, SignalSource, TrendDirection,
    };
    use uuid::Uuid;

    #[test]
    fn slugify_basic_cases() {
        assert_eq!(slugify("DeFi Lending Revival"), "defi-lending-revival");
        assert_eq!(slugify("  AI x Crypto!!"), "ai-x-crypto");
        assert_eq!(slugify("already-a-slug"), "already-a-slug");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn fortnight_period_splits_on_the_15th() {
        let first = Utc.with_ymd_and_hms(2026, 8, 15, 12, 0, 0).unwrap();
        let second = Utc.with_ymd_and_hms(2026, 8, 16, 12, 0, 0).unwrap();
        assert_eq!(fortnight_period(first), "2026-08A");
        assert_eq!(fortnight_period(second), "2026-08B");
    }

    fn test_narrative(tags: Vec<String>) -> Narrative {
        let now = Utc::now();
        Narrative {
            id: Uuid::new_v4(),
            title: "t".into(),
            slug: "t".into(),
            description: String::new(),
            explanation: String::new(),
            status: NarrativeStatus::Emerging,
            confidence_score: 50.0,
            trend_direction: TrendDirection::Stable,
            tags,
            signals: vec![],
            ideas: vec![],
            detected_at: now,
            updated_at: now,
            period: fortnight_period(now),
        }
    }

    #[test]
    fn attach_signals_matches_on_tags() {
        let mut narratives = vec![test_narrative(vec!["lending".into()])];
        let signals = vec![
            build_signal(
                SignalSource::Onchain,
                "LendFast TVL up",
                "lending growth on solana",
                72.0,
                serde_json::Map::new(),
                None,
            ),
            build_signal(
                SignalSource::News,
                "NFT marketplace launches",
                "collectibles",
                60.0,
                serde_json::Map::new(),
                None,
            ),
        ];
        attach_signals(&mut narratives, &signals);
        assert_eq!(narratives[0].signals.len(), 1);
        assert_eq!(narratives[0].signals[0].title, "LendFast TVL up");
    }

    struct StubCollector;

    #[async_trait]
    impl Collector for StubCollector {
        fn source(&self) -> SignalSource {
            SignalSource::Social
        }

        fn name(&self) -> &str {
            "stub"
        }

        async fn collect(&self) -> Result<CollectorOutput, CollectorError> {
            Ok(CollectorOutput {
                signals: vec![build_signal(
                    SignalSource::Social,
                    "lending chatter",
                    "everyone is talking about lending",
                    64.0,
                    serde_json::Map::new(),
                    None,
                )],
                raw: serde_json::json!({}),
            })
        }
    }

    struct StubExtractor;

    #[async_trait]
    impl NarrativeExtractor for StubExtractor {
        async fn extract(&self, _signals: &[Signal]) -> Result<Vec<Narrative>, PipelineError> {
            Ok(vec![test_narrative(vec!["lending".into()])])
        }
    }

    struct FailingExtractor;

    #[async_trait]
    impl NarrativeExtractor for FailingExtractor {
        async fn extract(&self, _signals: &[Signal]) -> Result<Vec<Narrative>, PipelineError> {
            Err(PipelineError::Extraction("model unavailable".into()))
        }
    }

    #[tokio::test]
    async fn run_assembles_snapshot_metadata() {
        let manager = CollectorManager::new(vec![Arc::new(StubCollector) as Arc<dyn Collector>]);
        let pipeline = SignalPipeline::new(manager, Arc::new(StubExtractor));

        let snapshot = pipeline.run().await.expect("run succeeds");
        assert_eq!(snapshot.metadata.signal_count, 1);
        assert_eq!(snapshot.metadata.narrative_count, 1);
        assert_eq!(snapshot.metadata.idea_count, 0);
        assert!(snapshot.errors.is_empty());
        assert_eq!(snapshot.narratives[0].signals.len(), 1);
        assert!(snapshot.metadata.completed_at >= snapshot.metadata.started_at);
    }

    #[tokio::test]
    async fn run_aborts_when_extraction_fails() {
        let manager = CollectorManager::new(vec![Arc::new(StubCollector) as Arc<dyn Collector>]);
        let pipeline = SignalPipeline::new(manager, Arc::new(FailingExtractor));
        assert!(matches!(
            pipeline.run().await,
            Err(PipelineError::Extraction(_))
        ));
    }
}
