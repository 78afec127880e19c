//! News coverage collector backed by a crypto news aggregation API.

use chrono::{DateTime, Utc};
use narradar_core::types::{Signal, SignalSource};
use serde::Deserialize;

use crate::collector::{build_signal, Collector, CollectorOutput};
use crate::error::CollectorError;
use crate::fetch::{fetch_with_retry, RetryPolicy};

const MAX_SIGNALS: usize = 15;

#[derive(Debug, Deserialize)]
struct NewsResponse {
    #[serde(rename = "Data", default)]
    data: Vec<Article>,
}

#[derive(Debug, Deserialize)]
struct Article {
    title: String,
    url: String,
    #[serde(default)]
    body: String,
    #[serde(default)]
    source: String,
    /// Unix seconds.
    #[serde(default)]
    published_on: i64,
}

/// Collects coverage signals from recent ecosystem news.
pub struct NewsCollector {
    client: reqwest::Client,
    base_url: String,
    ecosystem: String,
    api_key: Option<String>,
    policy: RetryPolicy,
}

impl NewsCollector {
    #[must_use]
    pub fn new(
        client: reqwest::Client,
        base_url: String,
        ecosystem: String,
        api_key: Option<String>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            client,
            base_url,
            ecosystem,
            api_key,
            policy,
        }
    }
}

/// Scores an article by freshness, with a bonus when the ecosystem is named
/// in the headline rather than buried in the body.
fn coverage_score(published_at: Option<DateTime<Utc>>, headline_mentions_ecosystem: bool) -> f64 {
    let hours_old = published_at
        .map(|t| (Utc::now() - t).num_hours().max(0))
        .unwrap_or(72);
    #[allow(clippy::cast_precision_loss)]
    let freshness = (72.0 - hours_old as f64).clamp(0.0, 72.0) / 72.0 * 50.0;
    let headline_bonus = if headline_mentions_ecosystem { 20.0 } else { 0.0 };
    (20.0 + freshness + headline_bonus).clamp(0.0, 100.0)
}

#[async_trait::async_trait]
impl Collector for NewsCollector {
    fn source(&self) -> SignalSource {
        SignalSource::News
    }

    fn name(&self) -> &str {
        "News Coverage"
    }

    async fn collect(&self) -> Result<CollectorOutput, CollectorError> {
        let url = format!(
            "{}/data/v2/news/?categories={}",
            self.base_url, self.ecosystem
        );
        let mut builder = self.client.get(&url);
        if let Some(key) = &self.api_key {
            builder = builder.header("authorization", format!("Apikey {key}"));
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
        let news: NewsResponse =
            serde_json::from_str(&body).map_err(|e| CollectorError::Deserialize {
                context: "news listing".into(),
                source: e,
            })?;

        let ecosystem = self.ecosystem.to_lowercase();
        let signals: Vec<Signal> = news
            .data
            .iter()
            .take(MAX_SIGNALS)
            .map(|article| {
                let published_at = DateTime::<Utc>::from_timestamp(article.published_on, 0);
                let in_headline = article.title.to_lowercase().contains(&ecosystem);
                let score = coverage_score(published_at, in_headline);

                let mut metadata = serde_json::Map::new();
                metadata.insert("outlet".into(), serde_json::json!(article.source));
                if let Some(published) = published_at {
                    metadata.insert(
                        "published_at".into(),
                        serde_json::json!(published.to_rfc3339()),
                    );
                }

                build_signal(
                    SignalSource::News,
                    article.title.clone(),
                    article.body.chars().take(280).collect::<String>(),
                    score,
                    metadata,
                    Some(article.url.clone()),
                )
            })
            .collect();

        let raw = serde_json::json!({
            "endpoint": url,
            "articles": news.data.len(),
        });

        Ok(CollectorOutput { signals, raw })
    }
}
