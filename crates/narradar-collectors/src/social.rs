//! Social chatter collector backed by a subreddit's public JSON listing.

use narradar_core::types::{Signal, SignalSource};
use serde::Deserialize;

use crate::collector::{build_signal, Collector, CollectorOutput};
use crate::error::CollectorError;
use crate::fetch::{fetch_with_retry, RetryPolicy};

const MAX_SIGNALS: usize = 20;

#[derive(Debug, Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Debug, Deserialize)]
struct ListingData {
    #[serde(default)]
    children: Vec<Child>,
}

#[derive(Debug, Deserialize)]
struct Child {
    data: Post,
}

#[derive(Debug, Deserialize)]
struct Post {
    title: String,
    permalink: String,
    #[serde(default)]
    ups: i64,
    #[serde(default)]
    num_comments: i64,
    #[serde(default)]
    selftext: String,
}

/// Collects engagement signals from the ecosystem's community forum.
pub struct SocialCollector {
    client: reqwest::Client,
    base_url: String,
    ecosystem: String,
    policy: RetryPolicy,
}

impl SocialCollector {
    #[must_use]
    pub fn new(
        client: reqwest::Client,
        base_url: String,
        ecosystem: String,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            client,
            base_url,
            ecosystem,
            policy,
        }
    }
}

/// Scores a post by engagement: upvotes plus double-weighted comments,
/// logarithmically so a 10k-upvote outlier does not flatten everything else.
fn engagement_score(ups: i64, comments: i64) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    let engagement = (ups.max(0) + comments.max(0) * 2) as f64;
    (25.0 + (engagement + 1.0).log10() * 20.0).clamp(0.0, 100.0)
}

#[async_trait::async_trait]
impl Collector for SocialCollector {
    fn source(&self) -> SignalSource {
        SignalSource::Social
    }

    fn name(&self) -> &str {
        "Social Chatter"
    }

    async fn collect(&self) -> Result<CollectorOutput, CollectorError> {
        let url = format!(
            "{}/r/{}/hot.json?limit={MAX_SIGNALS}",
            self.base_url, self.ecosystem
        );
        let request = self
            .client
            .get(&url)
            .build()
            .map_err(CollectorError::from)?;

        let response = fetch_with_retry(&self.client, request, self.policy).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(CollectorError::UnexpectedStatus {
                status: status.as_u16(),
                url,
            });
        }

        let body = response.text().await?;
        let listing: Listing =
            serde_json::from_str(&body).map_err(|e| CollectorError::Deserialize {
                context: "subreddit listing".into(),
                source: e,
            })?;

        let signals: Vec<Signal> = listing
            .data
            .children
            .iter()
            .take(MAX_SIGNALS)
            .map(|child| {
                let post = &child.data;
                let score = engagement_score(post.ups, post.num_comments);

                let mut metadata = serde_json::Map::new();
                metadata.insert("ups".into(), serde_json::json!(post.ups));
                metadata.insert("comments".into(), serde_json::json!(post.num_comments));

                let description = if post.selftext.is_empty() {
                    format!("community discussion in r/{}", self.ecosystem)
                } else {
                    post.selftext.chars().take(280).collect()
                };

                build_signal(
                    SignalSource::Social,
                    post.title.clone(),
                    description,
                    score,
                    metadata,
                    Some(format!("https://www.reddit.com{}", post.permalink)),
                )
            })
            .collect();

        let raw = serde_json::json!({
            "endpoint": url,
            "posts": listing.data.children.len(),
        });

        Ok(CollectorOutput { signals, raw })
    }
}
