//! Narrative extraction: turning ranked signals into narratives and build
//! ideas.
//!
//! The rest of the system only depends on the [`NarrativeExtractor`] trait;
//! [`LlmExtractor`] is the production implementation, speaking to any
//! OpenAI-compatible chat-completions endpoint.

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use narradar_core::types::{
    BuildIdea, Feasibility, IdeaCategory, Narrative, NarrativeStatus, Signal, TrendDirection,
};

use crate::error::PipelineError;
use crate::{fortnight_period, slugify};

/// How many top-ranked signals are put in front of the model.
const PROMPT_SIGNAL_LIMIT: usize = 40;

const SYSTEM_PROMPT: &str = "You are a crypto ecosystem analyst. Given ranked \
activity signals, identify the emerging narratives they support and concrete \
build ideas for each. Reply with a JSON array only, no prose. Each element: \
{\"title\", \"description\", \"explanation\", \"status\" \
(emerging|accelerating|established|fading), \"confidenceScore\" (0-100), \
\"trendDirection\" (up|down|stable), \"tags\" (string array), \"ideas\": \
[{\"title\", \"description\", \"problem\", \"solution\", \"targetAudience\", \
\"feasibility\" (low|medium|high), \"category\" (defi|nft|infrastructure|\
tooling|social|gaming|payments|dao|ai|other), \"technicalRequirements\", \
\"potentialChallenges\", \"score\" (0-100)}]}";

/// Produces narratives (with nested build ideas) from ranked signals.
#[async_trait]
pub trait NarrativeExtractor: Send + Sync {
    /// # Errors
    ///
    /// Returns [`PipelineError`] when extraction fails; this is the only
    /// failure allowed to abort an analysis run.
    async fn extract(&self, signals: &[Signal]) -> Result<Vec<Narrative>, PipelineError>;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NarrativeDraft {
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    explanation: String,
    status: NarrativeStatus,
    confidence_score: f64,
    trend_direction: TrendDirection,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    ideas: Vec<IdeaDraft>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IdeaDraft {
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    problem: String,
    #[serde(default)]
    solution: String,
    #[serde(default)]
    target_audience: String,
    feasibility: Feasibility,
    category: IdeaCategory,
    #[serde(default)]
    technical_requirements: Vec<String>,
    #[serde(default)]
    potential_challenges: Vec<String>,
    confidence_score: Option<f64>,
    score: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: String,
}

/// OpenAI-compatible chat-completions extractor.
pub struct LlmExtractor {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl LlmExtractor {
    #[must_use]
    pub fn new(client: reqwest::Client, base_url: String, api_key: String, model: String) -> Self {
        Self {
            client,
            base_url,
            api_key,
            model,
        }
    }

    fn signal_digest(signals: &[Signal]) -> String {
        signals
            .iter()
            .take(PROMPT_SIGNAL_LIMIT)
            .map(|s| {
                format!(
                    "[{}] {} (score {:.0}): {}",
                    s.source,
                    s.title,
                    s.score,
                    s.description.chars().take(160).collect::<String>()
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[async_trait]
impl NarrativeExtractor for LlmExtractor {
    async fn extract(&self, signals: &[Signal]) -> Result<Vec<Narrative>, PipelineError> {
        let body = serde_json::json!({
            "model": self.model,
            "temperature": 0.7,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": Self::signal_digest(signals) },
            ],
        });

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PipelineError::Extraction(format!(
                "chat completion returned {status}: {}",
                body.chars().take(200).collect::<String>()
            )));
        }

        let chat: ChatResponse = response.json().await?;
        let content = chat
            .choices
            .first()
            .map(|c| c.message.content.as_str())
            .ok_or_else(|| PipelineError::Extraction("empty choices in reply".into()))?;

        let drafts: Vec<NarrativeDraft> = serde_json::from_str(strip_code_fence(content))
            .map_err(|e| PipelineError::Deserialize {
                context: "narrative drafts".into(),
                source: e,
            })?;

        tracing::info!(narratives = drafts.len(), "narratives extracted");
        Ok(drafts.into_iter().map(materialize).collect())
    }
}

/// Models often wrap JSON in a markdown fence despite instructions.
fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// Turns a draft into a domain narrative: ids, slugs, and timestamps are
/// assigned here.
fn materialize(draft: NarrativeDraft) -> Narrative {
    let now = Utc::now();
    let narrative_id = Uuid::new_v4();
    let ideas = draft
        .ideas
        .into_iter()
        .map(|idea| {
            let score = idea.score.or(idea.confidence_score).unwrap_or(50.0);
            BuildIdea {
                id: Uuid::new_v4(),
                slug: slugify(&idea.title),
                title: idea.title,
                description: idea.description,
                problem: idea.problem,
                solution: idea.solution,
                target_audience: idea.target_audience,
                feasibility: idea.feasibility,
                category: idea.category,
                technical_requirements: idea.technical_requirements,
                potential_challenges: idea.potential_challenges,
                narrative_id,
                score,
                created_at: now,
            }
        })
        .collect();

    Narrative {
        id: narrative_id,
        slug: slugify(&draft.title),
        title: draft.title,
        description: draft.description,
        explanation: draft.explanation,
        status: draft.status,
        confidence_score: draft.confidence_score,
        trend_direction: draft.trend_direction,
        tags: draft.tags,
        signals: vec![],
        ideas,
        detected_at: now,
        updated_at: now,
        period: fortnight_period(now),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use narradar_core::types::SignalSource;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn drafts_json() -> &'static str {
        r#"[{
            "title": "DeFi Lending Revival",
            "description": "Lending TVL is climbing again",
            "explanation": "Multiple protocols show double-digit TVL growth",
            "status": "accelerating",
            "confidenceScore": 78,
            "trendDirection": "up",
            "tags": ["defi", "lending"],
            "ideas": [{
                "title": "Rate Aggregator",
                "description": "Compare lending rates",
                "problem": "Fragmented rates",
                "solution": "One dashboard",
                "targetAudience": "yield farmers",
                "feasibility": "high",
                "category": "defi",
                "technicalRequirements": ["indexer"],
                "potentialChallenges": ["stale data"],
                "score": 82
            }]
        }]"#
    }

    #[test]
    fn strip_code_fence_handles_fenced_and_bare() {
        assert_eq!(strip_code_fence("[1]"), "[1]");
        assert_eq!(strip_code_fence("```json\n[1]\n```"), "[1]");
        assert_eq!(strip_code_fence("```\n[1]\n```"), "[1]");
    }

    #[test]
    fn materialize_links_ideas_to_their_narrative() {
        let drafts: Vec<NarrativeDraft> = serde_json::from_str(drafts_json()).unwrap();
        let narrative = materialize(drafts.into_iter().next().unwrap());
        assert_eq!(narrative.slug, "defi-lending-revival");
        assert_eq!(narrative.ideas.len(), 1);
        assert_eq!(narrative.ideas[0].narrative_id, narrative.id);
        assert_eq!(narrative.ideas[0].slug, "rate-aggregator");
        assert_eq!(narrative.ideas[0].score, 82.0);
    }

    #[tokio::test]
    async fn extract_parses_chat_reply() {
        let server = MockServer::start().await;
        let reply = serde_json::json!({
            "choices": [
                { "message": { "content": format!("```json\n{}\n```", drafts_json()) } }
            ]
        });
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&reply))
            .mount(&server)
            .await;

        let extractor = LlmExtractor::new(
            reqwest::Client::new(),
            server.uri(),
            "test-key".into(),
            "test-model".into(),
        );

        let signals = vec![narradar_collectors::build_signal(
            SignalSource::Onchain,
            "LendFast TVL up 12.5% over 7d",
            "lending growth",
            72.0,
            serde_json::Map::new(),
            None,
        )];
        let narratives = extractor.extract(&signals).await.expect("extraction works");
        assert_eq!(narratives.len(), 1);
        assert_eq!(narratives[0].status, NarrativeStatus::Accelerating);
    }

    #[tokio::test]
    async fn extract_degraded_status_is_an_extraction_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
            .mount(&server)
            .await;

        let extractor = LlmExtractor::new(
            reqwest::Client::new(),
            server.uri(),
            "test-key".into(),
            "test-model".into(),
        );

        let result = extractor.extract(&[]).await;
        assert!(matches!(result, Err(PipelineError::Extraction(_))));
    }
}
