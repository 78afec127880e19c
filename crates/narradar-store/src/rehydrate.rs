//! Reconstructing an in-memory snapshot from a persisted report tree.

use narradar_core::types::{
    AnalysisSnapshot, BuildIdea, Feasibility, IdeaCategory, Narrative, NarrativeStatus,
    RunMetadata, TrendDirection,
};
use narradar_db::{IdeaRow, NarrativeTree, ReportTree};

/// Rebuilds a snapshot from the persisted tree.
///
/// Scalar fields and identities are copied. Signal sequences come back
/// empty — the persisted schema retains no per-signal detail — and the
/// duration is unknowable, so it is fixed at 0. Narrative and idea counts
/// are recomputed from the reconstructed structure; the signal count is the
/// one value copied from the report row because it cannot be derived.
pub(crate) fn snapshot_from_tree(tree: &ReportTree) -> AnalysisSnapshot {
    let narratives: Vec<Narrative> = tree.narratives.iter().map(narrative_from_rows).collect();
    let idea_count = narratives.iter().map(|n| n.ideas.len()).sum();

    AnalysisSnapshot {
        metadata: RunMetadata {
            started_at: tree.report.started_at,
            completed_at: tree.report.completed_at,
            duration_ms: 0,
            signal_count: usize::try_from(tree.report.total_signals).unwrap_or(0),
            narrative_count: narratives.len(),
            idea_count,
        },
        narratives,
        all_signals: vec![],
        errors: vec![],
    }
}

fn narrative_from_rows(tree: &NarrativeTree) -> Narrative {
    let row = &tree.narrative;
    Narrative {
        id: row.id,
        title: row.title.clone(),
        slug: row.slug.clone(),
        description: row.description.clone(),
        explanation: row.explanation.clone(),
        status: row.status.parse().unwrap_or(NarrativeStatus::Emerging),
        confidence_score: row.confidence_score,
        trend_direction: row
            .trend_direction
            .parse()
            .unwrap_or(TrendDirection::Stable),
        tags: string_list(&row.tags),
        signals: vec![],
        ideas: tree.ideas.iter().map(idea_from_row).collect(),
        detected_at: row.detected_at,
        updated_at: row.updated_at,
        period: row.period.clone(),
    }
}

fn idea_from_row(row: &IdeaRow) -> BuildIdea {
    BuildIdea {
        id: row.id,
        title: row.title.clone(),
        slug: row.slug.clone(),
        description: row.description.clone(),
        problem: row.problem.clone(),
        solution: row.solution.clone(),
        target_audience: row.target_audience.clone(),
        feasibility: row.feasibility.parse().unwrap_or(Feasibility::Medium),
        category: row.category.parse().unwrap_or(IdeaCategory::Other),
        technical_requirements: string_list(&row.technical_requirements),
        potential_challenges: string_list(&row.potential_challenges),
        narrative_id: row.narrative_id,
        score: row.score,
        created_at: row.created_at,
    }
}

fn string_list(value: &serde_json::Value) -> Vec<String> {
    serde_json::from_value(value.clone()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use narradar_db::{NarrativeRow, ReportRow};
    use uuid::Uuid;

    fn report_row() -> ReportRow {
        let now = Utc::now();
        ReportRow {
            id: 1,
            public_id: Uuid::new_v4(),
            period: now.to_rfc3339(),
            summary: "Analysis of 37 signals identifying 2 narratives.".into(),
            total_signals: 37,
            started_at: now,
            completed_at: now,
            generated_at: now,
        }
    }

    fn narrative_row(slug: &str, status: &str) -> NarrativeRow {
        let now = Utc::now();
        NarrativeRow {
            id: Uuid::new_v4(),
            report_id: 1,
            title: "DeFi lending revival".into(),
            slug: slug.into(),
            storage_slug: format!("{slug}-x3k9qa"),
            description: "desc".into(),
            explanation: "expl".into(),
            status: status.into(),
            confidence_score: 72.5,
            trend_direction: "up".into(),
            tags: serde_json::json!(["defi", "lending"]),
            period: "2026-H2".into(),
            detected_at: now,
            updated_at: now,
            created_at: now,
        }
    }

    fn idea_row(narrative_id: Uuid) -> IdeaRow {
        IdeaRow {
            id: Uuid::new_v4(),
            narrative_id,
            title: "Rate aggregator".into(),
            slug: "rate-aggregator".into(),
            storage_slug: "rate-aggregator-9qw2bb".into(),
            description: "desc".into(),
            problem: "problem".into(),
            solution: "solution".into(),
            target_audience: "traders".into(),
            feasibility: "high".into(),
            category: "defi".into(),
            technical_requirements: serde_json::json!(["indexer"]),
            potential_challenges: serde_json::json!(["liquidity"]),
            score: 81.0,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn rebuilds_counts_and_leaves_signals_empty() {
        let narrative = narrative_row("defi-lending", "accelerating");
        let ideas = vec![idea_row(narrative.id), idea_row(narrative.id)];
        let tree = ReportTree {
            report: report_row(),
            narratives: vec![NarrativeTree { narrative, ideas }],
        };

        let snapshot = snapshot_from_tree(&tree);
        assert_eq!(snapshot.metadata.narrative_count, 1);
        assert_eq!(snapshot.metadata.idea_count, 2);
        assert_eq!(snapshot.metadata.signal_count, 37);
        assert_eq!(snapshot.metadata.duration_ms, 0);
        assert!(snapshot.all_signals.is_empty());
        assert!(snapshot.narratives[0].signals.is_empty());
        assert!(snapshot.errors.is_empty());
    }

    #[test]
    fn logical_slug_survives_round_trip() {
        let narrative = narrative_row("defi-lending", "emerging");
        let tree = ReportTree {
            report: report_row(),
            narratives: vec![NarrativeTree {
                narrative,
                ideas: vec![],
            }],
        };
        let snapshot = snapshot_from_tree(&tree);
        assert_eq!(snapshot.narratives[0].slug, "defi-lending");
    }

    #[test]
    fn unknown_status_falls_back_to_emerging() {
        let narrative = narrative_row("x", "renaissance");
        let tree = ReportTree {
            report: report_row(),
            narratives: vec![NarrativeTree {
                narrative,
                ideas: vec![],
            }],
        };
        let snapshot = snapshot_from_tree(&tree);
        assert_eq!(snapshot.narratives[0].status, NarrativeStatus::Emerging);
    }

    #[test]
    fn idea_fields_map_through() {
        let narrative = narrative_row("defi-lending", "established");
        let narrative_id = narrative.id;
        let tree = ReportTree {
            report: report_row(),
            narratives: vec![NarrativeTree {
                narrative,
                ideas: vec![idea_row(narrative_id)],
            }],
        };
        let idea = &snapshot_from_tree(&tree).narratives[0].ideas[0];
        assert_eq!(idea.feasibility, Feasibility::High);
        assert_eq!(idea.category, IdeaCategory::Defi);
        assert_eq!(idea.technical_requirements, vec!["indexer".to_string()]);
        assert_eq!(idea.narrative_id, narrative_id);
    }
}
