//! Signal collectors for Narradar.
//!
//! One collector per external source (on-chain activity, repository activity,
//! social chatter, news coverage), each behind the [`Collector`] trait with a
//! shared retry-capable fetch helper. [`CollectorManager`] fans the whole
//! registry out concurrently and merges results, isolating per-source
//! failures.

mod collector;
mod error;
mod fetch;
mod github;
mod manager;
mod news;
mod onchain;
mod social;

use std::sync::Arc;
use std::time::Duration;

pub use collector::{build_signal, Collector, CollectorOutput};
pub use error::CollectorError;
pub use fetch::{fetch_with_retry, RetryPolicy};
pub use github::GithubCollector;
pub use manager::{CollectionOutcome, CollectorManager};
pub use news::NewsCollector;
pub use onchain::OnchainCollector;
pub use social::SocialCollector;

use narradar_core::AppConfig;

/// Builds the default registry: one collector per supported source, all
/// sharing one HTTP client configured from `config`.
///
/// # Errors
///
/// Returns [`CollectorError::Http`] if the underlying `reqwest::Client`
/// cannot be constructed.
pub fn build_registry(config: &AppConfig) -> Result<Vec<Arc<dyn Collector>>, CollectorError> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.collector_request_timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .user_agent(config.collector_user_agent.clone())
        .build()?;

    let policy = RetryPolicy {
        max_attempts: config.collector_max_attempts,
        backoff_base: Duration::from_secs(config.collector_backoff_base_secs),
    };

    Ok(vec![
        Arc::new(OnchainCollector::new(
            client.clone(),
            config.onchain_base_url.clone(),
            config.ecosystem.clone(),
            policy,
        )),
        Arc::new(GithubCollector::new(
            client.clone(),
            config.github_base_url.clone(),
            config.ecosystem.clone(),
            config.github_token.clone(),
            policy,
        )),
        Arc::new(SocialCollector::new(
            client.clone(),
            config.social_base_url.clone(),
            config.ecosystem.clone(),
            policy,
        )),
        Arc::new(NewsCollector::new(
            client,
            config.news_base_url.clone(),
            config.ecosystem.clone(),
            config.news_api_key.clone(),
            policy,
        )),
    ])
}
