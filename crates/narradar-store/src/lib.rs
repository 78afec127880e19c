//! The analysis store: single-flight execution gate, snapshot cache, and
//! durable rehydration/persistence.
//!
//! The store is an explicitly constructed object handed to whoever needs it
//! (HTTP state, scheduler) — there is no hidden global. Its in-memory state
//! lives for the process's lifetime and is lost on restart, at which point
//! [`AnalysisStore::load_from_database`] reconstructs the last persisted
//! snapshot.

mod rehydrate;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use narradar_core::types::AnalysisSnapshot;
use narradar_db::{DbError, NewReport};

/// Process-wide analysis state: the last good snapshot, the time it was
/// cached, and the mutual-exclusion gate for runs.
#[derive(Default)]
pub struct AnalysisStore {
    /// Replaced as a whole `Arc`; readers see the prior or the new snapshot
    /// in full, never a partially constructed one.
    snapshot: RwLock<Option<Arc<AnalysisSnapshot>>>,
    last_analyzed_at: RwLock<Option<DateTime<Utc>>>,
    analyzing: AtomicBool,
}

/// Holds the Idle→Running transition; dropping it transitions back to Idle.
///
/// Because release happens in `Drop`, the gate is guaranteed to open again
/// on every exit path of a run, including errors and panics.
pub struct RunGuard<'a> {
    store: &'a AnalysisStore,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.store.analyzing.store(false, Ordering::SeqCst);
    }
}

impl AnalysisStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The last cached snapshot, if any.
    #[must_use]
    pub fn cached_result(&self) -> Option<Arc<AnalysisSnapshot>> {
        self.snapshot
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    /// Replaces the cached snapshot wholesale (last writer wins) and stamps
    /// the last-analyzed time.
    pub fn set_cached_result(&self, snapshot: AnalysisSnapshot) {
        *self
            .snapshot
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = Some(Arc::new(snapshot));
        *self
            .last_analyzed_at
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = Some(Utc::now());
    }

    #[must_use]
    pub fn is_analyzing(&self) -> bool {
        self.analyzing.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn last_analyzed_at(&self) -> Option<DateTime<Utc>> {
        *self
            .last_analyzed_at
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Attempts the Idle→Running transition.
    ///
    /// The swap is a single compare-exchange, so two simultaneous starts
    /// cannot both win. Returns `None` when a run is already active — the
    /// caller must refuse, not queue.
    #[must_use]
    pub fn try_begin_analysis(&self) -> Option<RunGuard<'_>> {
        self.analyzing
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| RunGuard { store: self })
    }

    /// Rehydrates the cache from the most recent persisted report.
    ///
    /// Returns `true` when a snapshot was reconstructed and cached. Returns
    /// `false` — leaving the cache exactly as it was — when no report exists,
    /// the latest report has no narratives, or the storage call fails (the
    /// failure is logged, never raised).
    pub async fn load_from_database(&self, pool: &PgPool) -> bool {
        match narradar_db::find_latest_report(pool).await {
            Ok(Some(tree)) => {
                if tree.narratives.is_empty() {
                    return false;
                }
                tracing::info!(
                    generated_at = %tree.report.generated_at,
                    narratives = tree.narratives.len(),
                    "rehydrating analysis from database"
                );
                self.set_cached_result(rehydrate::snapshot_from_tree(&tree));
                true
            }
            Ok(None) => false,
            Err(err) => {
                tracing::warn!(error = %err, "could not load analysis from database");
                false
            }
        }
    }

    /// Persists a snapshot as a report tree: one report row, then one
    /// narrative (with its ideas) per round trip.
    ///
    /// Best-effort by contract: callers log an `Err` and carry on — a
    /// persistence failure must never fail the analysis that already
    /// completed in memory.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if any write fails. Narratives written before the
    /// failure remain (each narrative is its own transaction).
    pub async fn save_to_database(
        &self,
        pool: &PgPool,
        snapshot: &AnalysisSnapshot,
    ) -> Result<Uuid, DbError> {
        let meta = &snapshot.metadata;
        let report = narradar_db::create_report(
            pool,
            &NewReport {
                period: meta.completed_at.to_rfc3339(),
                summary: format!(
                    "Analysis of {} signals identifying {} narratives.",
                    meta.signal_count, meta.narrative_count
                ),
                total_signals: i32::try_from(meta.signal_count).unwrap_or(i32::MAX),
                started_at: meta.started_at,
                completed_at: meta.completed_at,
            },
        )
        .await?;

        for narrative in &snapshot.narratives {
            narradar_db::create_narrative(pool, narrative, report.id).await?;
        }

        tracing::info!(
            report = %report.public_id,
            narratives = snapshot.narratives.len(),
            "analysis persisted"
        );
        Ok(report.public_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use narradar_core::types::RunMetadata;

    fn empty_snapshot() -> AnalysisSnapshot {
        let now = Utc::now();
        AnalysisSnapshot {
            narratives: vec![],
            all_signals: vec![],
            errors: vec![],
            metadata: RunMetadata {
                started_at: now,
                completed_at: now,
                duration_ms: 42,
                signal_count: 0,
                narrative_count: 0,
                idea_count: 0,
            },
        }
    }

    #[test]
    fn cache_starts_empty() {
        let store = AnalysisStore::new();
        assert!(store.cached_result().is_none());
        assert!(store.last_analyzed_at().is_none());
        assert!(!store.is_analyzing());
    }

    #[test]
    fn set_then_get_returns_same_snapshot_and_stamps_time() {
        let store = AnalysisStore::new();
        let before = Utc::now();
        store.set_cached_result(empty_snapshot());

        let cached = store.cached_result().expect("snapshot cached");
        assert_eq!(cached.metadata.duration_ms, 42);

        let stamped = store.last_analyzed_at().expect("time stamped");
        assert!(stamped >= before);
    }

    #[test]
    fn second_begin_is_refused_while_guard_held() {
        let store = AnalysisStore::new();
        let guard = store.try_begin_analysis().expect("gate was idle");
        assert!(store.is_analyzing());
        assert!(store.try_begin_analysis().is_none());
        drop(guard);
        assert!(!store.is_analyzing());
        assert!(store.try_begin_analysis().is_some());
    }

    #[tokio::test]
    async fn gate_releases_when_run_panics() {
        let store = Arc::new(AnalysisStore::new());
        let for_task = Arc::clone(&store);
        let handle = tokio::spawn(async move {
            let _guard = for_task.try_begin_analysis().expect("gate was idle");
            panic!("run blew up");
        });
        assert!(handle.await.is_err());
        assert!(!store.is_analyzing(), "guard must release on panic unwind");
    }

    #[test]
    fn last_writer_wins() {
        let store = AnalysisStore::new();
        store.set_cached_result(empty_snapshot());
        let mut second = empty_snapshot();
        second.metadata.duration_ms = 99;
        store.set_cached_result(second);
        assert_eq!(store.cached_result().unwrap().metadata.duration_ms, 99);
    }
}
