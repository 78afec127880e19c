//! Repository activity collector backed by the GitHub search API.

use chrono::{DateTime, Duration, Utc};
use narradar_core::types::{Signal, SignalSource};
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use serde::Deserialize;

use crate::collector::{build_signal, Collector, CollectorOutput};
use crate::error::CollectorError;
use crate::fetch::{fetch_with_retry, RetryPolicy};

const MAX_SIGNALS: usize = 15;
/// Only repositories pushed within this window count as active.
const ACTIVE_WINDOW_DAYS: i64 = 14;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    total_count: u64,
    #[serde(default)]
    items: Vec<Repo>,
}

#[derive(Debug, Deserialize)]
struct Repo {
    full_name: String,
    html_url: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    stargazers_count: u64,
    #[serde(default)]
    forks_count: u64,
    created_at: DateTime<Utc>,
}

/// Collects repository-momentum signals for the ecosystem's topic.
pub struct GithubCollector {
    client: reqwest::Client,
    base_url: String,
    ecosystem: String,
    token: Option<String>,
    policy: RetryPolicy,
}

impl GithubCollector {
    #[must_use]
    pub fn new(
        client: reqwest::Client,
        base_url: String,
        ecosystem: String,
        token: Option<String>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            client,
            base_url,
            ecosystem,
            token,
            policy,
        }
    }

    fn search_url(&self) -> String {
        let pushed_after = (Utc::now() - Duration::days(ACTIVE_WINDOW_DAYS)).format("%Y-%m-%d");
        let query = format!("topic:{} pushed:>{pushed_after}", self.ecosystem);
        let encoded = utf8_percent_encode(&query, NON_ALPHANUMERIC).to_string();
        format!(
            "{}/search/repositories?q={encoded}&sort=stars&order=desc&per_page={MAX_SIGNALS}",
            self.base_url
        )
    }
}

/// Scores a repository on star count and youth.
///
/// Stars contribute logarithmically; repositories younger than 90 days get a
/// freshness bonus so a fast-rising new project outranks a dormant giant.
fn repo_score(stars: u64, age_days: i64) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    let star_component = ((stars + 1) as f64).log10() * 18.0;
    let freshness = if age_days < 90 { 15.0 } else { 0.0 };
    (20.0 + star_component + freshness).clamp(0.0, 100.0)
}

#[async_trait::async_trait]
impl Collector for GithubCollector {
    fn source(&self) -> SignalSource {
        SignalSource::Github
    }

    fn name(&self) -> &str {
        "Repository Activity"
    }

    async fn collect(&self) -> Result<CollectorOutput, CollectorError> {
        let url = self.search_url();
        let mut builder = self
            .client
            .get(&url)
            .header("Accept", "application/vnd.github+json");
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }
        let request = builder.build().map_err(CollectorError::from)?;

        let response = fetch_with_retry(&self.client, request, self.policy).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(CollectorError::UnexpectedStatus {
                status: status.as_u16(),
                url,
            });
        }

        let body = response.text().await?;
        let search: SearchResponse =
            serde_json::from_str(&body).map_err(|e| CollectorError::Deserialize {
                context: "search/repositories".into(),
                source: e,
            })?;

        let now = Utc::now();
        let signals: Vec<Signal> = search
            .items
            .iter()
            .take(MAX_SIGNALS)
            .map(|repo| {
                let age_days = (now - repo.created_at).num_days();
                let score = repo_score(repo.stargazers_count, age_days);

                let mut metadata = serde_json::Map::new();
                metadata.insert("stars".into(), serde_json::json!(repo.stargazers_count));
                metadata.insert("forks".into(), serde_json::json!(repo.forks_count));
                metadata.insert("age_days".into(), serde_json::json!(age_days));

                build_signal(
                    SignalSource::Github,
                    format!("{} gaining traction", repo.full_name),
                    repo.description
                        .clone()
                        .unwrap_or_else(|| format!("active {} repository", self.ecosystem)),
                    score,
                    metadata,
                    Some(repo.html_url.clone()),
                )
            })
            .collect();

        let raw = serde_json::json!({
            "endpoint": url,
            "total_count": search.total_count,
            "returned": search.items.len(),
        });

        Ok(CollectorOutput { signals, raw })
    }
}
