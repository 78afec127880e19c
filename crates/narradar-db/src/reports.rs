//! Database operations for `reports`, `narratives`, and `ideas`.
//!
//! Only the three operations the analysis store needs: persist a report,
//! persist a narrative with its ideas, and fetch the latest report tree.

use chrono::{DateTime, Utc};
use narradar_core::types::Narrative;
use sqlx::PgPool;
use uuid::Uuid;

use crate::slug::storage_slug;
use crate::DbError;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `reports` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ReportRow {
    pub id: i64,
    pub public_id: Uuid,
    pub period: String,
    pub summary: String,
    pub total_signals: i32,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub generated_at: DateTime<Utc>,
}

/// A row from the `narratives` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct NarrativeRow {
    pub id: Uuid,
    pub report_id: i64,
    pub title: String,
    /// Logical slug; stable across runs.
    pub slug: String,
    /// Storage-unique slug; logical slug plus random suffix.
    pub storage_slug: String,
    pub description: String,
    pub explanation: String,
    pub status: String,
    pub confidence_score: f64,
    pub trend_direction: String,
    pub tags: serde_json::Value,
    pub period: String,
    pub detected_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// A row from the `ideas` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct IdeaRow {
    pub id: Uuid,
    pub narrative_id: Uuid,
    pub title: String,
    pub slug: String,
    pub storage_slug: String,
    pub description: String,
    pub problem: String,
    pub solution: String,
    pub target_audience: String,
    pub feasibility: String,
    pub category: String,
    pub technical_requirements: serde_json::Value,
    pub potential_challenges: serde_json::Value,
    pub score: f64,
    pub created_at: DateTime<Utc>,
}

/// A narrative row together with its idea rows.
#[derive(Debug, Clone)]
pub struct NarrativeTree {
    pub narrative: NarrativeRow,
    pub ideas: Vec<IdeaRow>,
}

/// A report row with its full nested narrative/idea tree.
#[derive(Debug, Clone)]
pub struct ReportTree {
    pub report: ReportRow,
    pub narratives: Vec<NarrativeTree>,
}

/// Input for [`create_report`].
#[derive(Debug, Clone)]
pub struct NewReport {
    pub period: String,
    pub summary: String,
    pub total_signals: i32,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

/// Creates a new report row.
///
/// Generates a UUID in Rust and binds it to `public_id`. Returns the full
/// newly-created row.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn create_report(pool: &PgPool, report: &NewReport) -> Result<ReportRow, DbError> {
    let public_id = Uuid::new_v4();

    let row = sqlx::query_as::<_, ReportRow>(
        "INSERT INTO reports (public_id, period, summary, total_signals, started_at, completed_at) \
         VALUES ($1, $2, $3, $4, $5, $6) \
         RETURNING id, public_id, period, summary, total_signals, \
                   started_at, completed_at, generated_at",
    )
    .bind(public_id)
    .bind(&report.period)
    .bind(&report.summary)
    .bind(report.total_signals)
    .bind(report.started_at)
    .bind(report.completed_at)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Persists one narrative and, in the same transaction, its ideas.
///
/// Storage slugs are derived from the logical slugs via
/// [`crate::slug::storage_slug`]; the logical slug is stored alongside so
/// reads need no string surgery.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any insert fails; the transaction rolls back.
pub async fn create_narrative(
    pool: &PgPool,
    narrative: &Narrative,
    report_id: i64,
) -> Result<Uuid, DbError> {
    let mut tx = pool.begin().await?;

    sqlx::query(
        "INSERT INTO narratives \
         (id, report_id, title, slug, storage_slug, description, explanation, status, \
          confidence_score, trend_direction, tags, period, detected_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)",
    )
    .bind(narrative.id)
    .bind(report_id)
    .bind(&narrative.title)
    .bind(&narrative.slug)
    .bind(storage_slug(&narrative.slug))
    .bind(&narrative.description)
    .bind(&narrative.explanation)
    .bind(narrative.status.as_str())
    .bind(narrative.confidence_score)
    .bind(narrative.trend_direction.as_str())
    .bind(serde_json::json!(narrative.tags))
    .bind(&narrative.period)
    .bind(narrative.detected_at)
    .bind(narrative.updated_at)
    .execute(&mut *tx)
    .await?;

    for idea in &narrative.ideas {
        sqlx::query(
            "INSERT INTO ideas \
             (id, narrative_id, title, slug, storage_slug, description, problem, solution, \
              target_audience, feasibility, category, technical_requirements, \
              potential_challenges, score) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)",
        )
        .bind(idea.id)
        .bind(narrative.id)
        .bind(&idea.title)
        .bind(&idea.slug)
        .bind(storage_slug(&idea.slug))
        .bind(&idea.description)
        .bind(&idea.problem)
        .bind(&idea.solution)
        .bind(&idea.target_audience)
        .bind(idea.feasibility.as_str())
        .bind(idea.category.as_str())
        .bind(serde_json::json!(idea.technical_requirements))
        .bind(serde_json::json!(idea.potential_challenges))
        .bind(idea.score)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(narrative.id)
}

/// Fetches the most recently generated report with its nested narratives
/// and each narrative's ideas.
///
/// Returns `Ok(None)` when no report exists yet.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any query fails.
pub async fn find_latest_report(pool: &PgPool) -> Result<Option<ReportTree>, DbError> {
    let Some(report) = sqlx::query_as::<_, ReportRow>(
        "SELECT id, public_id, period, summary, total_signals, \
                started_at, completed_at, generated_at \
         FROM reports ORDER BY generated_at DESC LIMIT 1",
    )
    .fetch_optional(pool)
    .await?
    else {
        return Ok(None);
    };

    let narrative_rows = sqlx::query_as::<_, NarrativeRow>(
        "SELECT id, report_id, title, slug, storage_slug, description, explanation, status, \
                confidence_score, trend_direction, tags, period, detected_at, updated_at, created_at \
         FROM narratives WHERE report_id = $1 ORDER BY confidence_score DESC",
    )
    .bind(report.id)
    .fetch_all(pool)
    .await?;

    // One round trip per narrative; report trees are small.
    let mut narratives = Vec::with_capacity(narrative_rows.len());
    for narrative in narrative_rows {
        let ideas = sqlx::query_as::<_, IdeaRow>(
            "SELECT id, narrative_id, title, slug, storage_slug, description, problem, solution, \
                    target_audience, feasibility, category, technical_requirements, \
                    potential_challenges, score, created_at \
             FROM ideas WHERE narrative_id = $1 ORDER BY score DESC",
        )
        .bind(narrative.id)
        .fetch_all(pool)
        .await?;

        narratives.push(NarrativeTree { narrative, ideas });
    }

    Ok(Some(ReportTree { report, narratives }))
}
