//! Domain types shared across the workspace.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Where a signal was observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalSource {
    Onchain,
    Github,
    Social,
    News,
}

impl SignalSource {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SignalSource::Onchain => "onchain",
            SignalSource::Github => "github",
            SignalSource::Social => "social",
            SignalSource::News => "news",
        }
    }
}

impl std::fmt::Display for SignalSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SignalSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "onchain" => Ok(SignalSource::Onchain),
            "github" => Ok(SignalSource::Github),
            "social" => Ok(SignalSource::Social),
            "news" => Ok(SignalSource::News),
            other => Err(format!("unknown signal source: {other}")),
        }
    }
}

/// Normalized strength band derived from a signal's score.
///
/// Always the image of the score under [`SignalStrength::from_score`];
/// never set independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalStrength {
    Weak,
    Moderate,
    Strong,
    VeryStrong,
}

impl SignalStrength {
    /// Maps a 0–100 score to a strength band.
    ///
    /// Thresholds are fixed: `>= 80` very strong, `>= 60` strong,
    /// `>= 40` moderate, below that weak.
    #[must_use]
    pub fn from_score(score: f64) -> Self {
        if score >= 80.0 {
            SignalStrength::VeryStrong
        } else if score >= 60.0 {
            SignalStrength::Strong
        } else if score >= 40.0 {
            SignalStrength::Moderate
        } else {
            SignalStrength::Weak
        }
    }
}

/// One observed unit of activity evidence from a single source.
///
/// Collector-produced signals carry no identity; an id is assigned only
/// when a signal crosses into durable storage or a display representation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Signal {
    pub source: SignalSource,
    pub title: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub strength: SignalStrength,
    /// Expected range 0–100; not enforced.
    pub score: f64,
    pub metadata: serde_json::Map<String, serde_json::Value>,
    pub detected_at: DateTime<Utc>,
}

/// Lifecycle stage of a narrative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NarrativeStatus {
    Emerging,
    Accelerating,
    Established,
    Fading,
}

impl NarrativeStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            NarrativeStatus::Emerging => "emerging",
            NarrativeStatus::Accelerating => "accelerating",
            NarrativeStatus::Established => "established",
            NarrativeStatus::Fading => "fading",
        }
    }
}

impl std::str::FromStr for NarrativeStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "emerging" => Ok(NarrativeStatus::Emerging),
            "accelerating" => Ok(NarrativeStatus::Accelerating),
            "established" => Ok(NarrativeStatus::Established),
            "fading" => Ok(NarrativeStatus::Fading),
            other => Err(format!("unknown narrative status: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Up,
    Down,
    Stable,
}

impl TrendDirection {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            TrendDirection::Up => "up",
            TrendDirection::Down => "down",
            TrendDirection::Stable => "stable",
        }
    }
}

impl std::str::FromStr for TrendDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "up" => Ok(TrendDirection::Up),
            "down" => Ok(TrendDirection::Down),
            "stable" => Ok(TrendDirection::Stable),
            other => Err(format!("unknown trend direction: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Feasibility {
    Low,
    Medium,
    High,
}

impl Feasibility {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Feasibility::Low => "low",
            Feasibility::Medium => "medium",
            Feasibility::High => "high",
        }
    }
}

impl std::str::FromStr for Feasibility {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Feasibility::Low),
            "medium" => Ok(Feasibility::Medium),
            "high" => Ok(Feasibility::High),
            other => Err(format!("unknown feasibility: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdeaCategory {
    Defi,
    Nft,
    Infrastructure,
    Tooling,
    Social,
    Gaming,
    Payments,
    Dao,
    Ai,
    Other,
}

impl IdeaCategory {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            IdeaCategory::Defi => "defi",
            IdeaCategory::Nft => "nft",
            IdeaCategory::Infrastructure => "infrastructure",
            IdeaCategory::Tooling => "tooling",
            IdeaCategory::Social => "social",
            IdeaCategory::Gaming => "gaming",
            IdeaCategory::Payments => "payments",
            IdeaCategory::Dao => "dao",
            IdeaCategory::Ai => "ai",
            IdeaCategory::Other => "other",
        }
    }
}

impl std::str::FromStr for IdeaCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "defi" => Ok(IdeaCategory::Defi),
            "nft" => Ok(IdeaCategory::Nft),
            "infrastructure" => Ok(IdeaCategory::Infrastructure),
            "tooling" => Ok(IdeaCategory::Tooling),
            "social" => Ok(IdeaCategory::Social),
            "gaming" => Ok(IdeaCategory::Gaming),
            "payments" => Ok(IdeaCategory::Payments),
            "dao" => Ok(IdeaCategory::Dao),
            "ai" => Ok(IdeaCategory::Ai),
            "other" => Ok(IdeaCategory::Other),
            other => Err(format!("unknown idea category: {other}")),
        }
    }
}

/// A concrete product/tooling idea derived from a narrative.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildIdea {
    pub id: Uuid,
    pub title: String,
    /// Logical slug — stable across runs; the storage-unique form is a
    /// persistence concern (see `narradar-db`).
    pub slug: String,
    pub description: String,
    pub problem: String,
    pub solution: String,
    pub target_audience: String,
    pub feasibility: Feasibility,
    pub category: IdeaCategory,
    pub technical_requirements: Vec<String>,
    pub potential_challenges: Vec<String>,
    pub narrative_id: Uuid,
    pub score: f64,
    pub created_at: DateTime<Utc>,
}

/// A named theme of ecosystem activity, with its supporting signals and
/// the build ideas derived from it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Narrative {
    pub id: Uuid,
    pub title: String,
    /// Logical slug — stable across runs.
    pub slug: String,
    pub description: String,
    pub explanation: String,
    pub status: NarrativeStatus,
    pub confidence_score: f64,
    pub trend_direction: TrendDirection,
    pub tags: Vec<String>,
    pub signals: Vec<Signal>,
    pub ideas: Vec<BuildIdea>,
    pub detected_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub period: String,
}

/// A collector failure with its originating source retained.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectorFailure {
    pub source: SignalSource,
    pub message: String,
}

/// Bookkeeping for one completed analysis run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunMetadata {
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub signal_count: usize,
    pub narrative_count: usize,
    pub idea_count: usize,
}

/// The immutable result of one completed analysis run.
///
/// Replaced wholesale on the next run; never mutated in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisSnapshot {
    pub narratives: Vec<Narrative>,
    /// All collected signals, ranked by descending score.
    pub all_signals: Vec<Signal>,
    pub errors: Vec<CollectorFailure>,
    pub metadata: RunMetadata,
}
