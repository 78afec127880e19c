//! On-chain activity collector backed by a DeFiLlama-style public API.

use narradar_core::types::{Signal, SignalSource};
use serde::Deserialize;

use crate::collector::{build_signal, Collector, CollectorOutput};
use crate::error::CollectorError;
use crate::fetch::{fetch_with_retry, RetryPolicy};

const MAX_SIGNALS: usize = 15;

#[derive(Debug, Deserialize)]
struct Protocol {
    name: String,
    #[serde(default)]
    chains: Vec<String>,
    #[serde(default)]
    tvl: Option<f64>,
    #[serde(default)]
    change_7d: Option<f64>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    url: Option<String>,
}

/// Collects TVL-movement signals for protocols deployed on the configured
/// ecosystem's chain.
pub struct OnchainCollector {
    client: reqwest::Client,
    base_url: String,
    ecosystem: String,
    policy: RetryPolicy,
}

impl OnchainCollector {
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

    fn to_signal(&self, protocol: &Protocol) -> Signal {
        let change = protocol.change_7d.unwrap_or(0.0);
        let tvl = protocol.tvl.unwrap_or(0.0);
        let score = movement_score(change, tvl);
        let direction = if change >= 0.0 { "up" } else { "down" };

        let mut metadata = serde_json::Map::new();
        metadata.insert("tvl".into(), serde_json::json!(tvl));
        metadata.insert("change_7d".into(), serde_json::json!(change));
        if let Some(category) = &protocol.category {
            metadata.insert("category".into(), serde_json::json!(category));
        }

        build_signal(
            SignalSource::Onchain,
            format!("{} TVL {direction} {:.1}% over 7d", protocol.name, change.abs()),
            format!(
                "{} on {} moved to ${:.0}k TVL",
                protocol.name,
                self.ecosystem,
                tvl / 1_000.0
            ),
            score,
            metadata,
            protocol.url.clone(),
        )
    }
}

/// Scores a protocol's 7-day TVL movement, weighted slightly by its size.
///
/// A flat small protocol lands around 30; a large protocol moving double
/// digits clears the very-strong threshold.
fn movement_score(change_7d: f64, tvl: f64) -> f64 {
    let movement = change_7d.abs().min(50.0);
    let size_bonus = if tvl > 0.0 {
        (tvl.log10() - 5.0).clamp(0.0, 3.0) * 5.0
    } else {
        0.0
    };
    (30.0 + movement + size_bonus).clamp(0.0, 100.0)
}

#[async_trait::async_trait]
impl Collector for OnchainCollector {
    fn source(&self) -> SignalSource {
        SignalSource::Onchain
    }

    fn name(&self) -> &str {
        "On-chain Activity"
    }

    async fn collect(&self) -> Result<CollectorOutput, CollectorError> {
        let url = format!("{}/protocols", self.base_url);
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
        let protocols: Vec<Protocol> =
            serde_json::from_str(&body).map_err(|e| CollectorError::Deserialize {
                context: "protocols".into(),
                source: e,
            })?;

        let ecosystem = self.ecosystem.to_lowercase();
        let mut relevant: Vec<&Protocol> = protocols
            .iter()
            .filter(|p| p.chains.iter().any(|c| c.to_lowercase() == ecosystem))
            .collect();
        relevant.sort_by(|a, b| {
            b.tvl
                .unwrap_or(0.0)
                .total_cmp(&a.tvl.unwrap_or(0.0))
        });

        let signals: Vec<Signal> = relevant
            .iter()
            .take(MAX_SIGNALS)
            .map(|p| self.to_signal(p))
            .collect();

        let raw = serde_json::json!({
            "endpoint": url,
            "total_protocols": protocols.len(),
            "ecosystem_protocols": relevant.len(),
        });

        Ok(CollectorOutput { signals, raw })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn movement_score_rewards_larger_swings() {
        assert!(movement_score(25.0, 1e6) > movement_score(5.0, 1e6));
        assert!(movement_score(-25.0, 1e6) > movement_score(5.0, 1e6));
    }

    #[test]
    fn movement_score_stays_in_range() {
        assert!(movement_score(500.0, 1e12) <= 100.0);
        assert!(movement_score(0.0, 0.0) >= 0.0);
    }

    #[tokio::test]
    async fn collect_filters_to_ecosystem_chain() {
        let server = MockServer::start().await;
        let body = serde_json::json!([
            {
                "name": "LendFast",
                "chains": ["Solana"],
                "tvl": 2_500_000.0,
                "change_7d": 12.5,
                "category": "Lending"
            },
            {
                "name": "OtherChainDex",
                "chains": ["Ethereum"],
                "tvl": 9_000_000.0,
                "change_7d": 3.0
            }
        ]);
        Mock::given(method("GET"))
            .and(path("/protocols"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&body))
            .mount(&server)
            .await;

        let collector = OnchainCollector::new(
            reqwest::Client::new(),
            server.uri(),
            "solana".into(),
            RetryPolicy {
                max_attempts: 1,
                backoff_base: std::time::Duration::ZERO,
            },
        );

        let output = collector.collect().await.expect("collect succeeds");
        assert_eq!(output.signals.len(), 1);
        assert_eq!(output.signals[0].source, SignalSource::Onchain);
        assert!(output.signals[0].title.contains("LendFast"));
        assert_eq!(output.raw["ecosystem_protocols"], serde_json::json!(1));
    }

    #[tokio::test]
    async fn collect_rejects_degraded_final_response() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/protocols"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let collector = OnchainCollector::new(
            reqwest::Client::new(),
            server.uri(),
            "solana".into(),
            RetryPolicy {
                max_attempts: 2,
                backoff_base: std::time::Duration::ZERO,
            },
        );

        let result = collector.collect().await;
        assert!(matches!(
            result,
            Err(CollectorError::UnexpectedStatus { status: 503, .. })
        ));
    }
}
