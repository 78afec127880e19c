use std::net::SocketAddr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    /// Ecosystem keyword driving collector queries (e.g. "solana").
    pub ecosystem: String,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub collector_request_timeout_secs: u64,
    pub collector_user_agent: String,
    /// Total fetch attempts per collector request (not additional retries).
    pub collector_max_attempts: u32,
    pub collector_backoff_base_secs: u64,
    pub onchain_base_url: String,
    pub github_base_url: String,
    pub github_token: Option<String>,
    pub social_base_url: String,
    pub news_base_url: String,
    pub news_api_key: Option<String>,
    pub llm_base_url: String,
    pub llm_api_key: Option<String>,
    pub llm_model: String,
    /// Cron expression for the periodic analysis job.
    pub analysis_cron: String,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("ecosystem", &self.ecosystem)
            .field("database_url", &"[redacted]")
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field(
                "collector_request_timeout_secs",
                &self.collector_request_timeout_secs,
            )
            .field("collector_user_agent", &self.collector_user_agent)
            .field("collector_max_attempts", &self.collector_max_attempts)
            .field(
                "collector_backoff_base_secs",
                &self.collector_backoff_base_secs,
            )
            .field("onchain_base_url", &self.onchain_base_url)
            .field("github_base_url", &self.github_base_url)
            .field(
                "github_token",
                &self.github_token.as_ref().map(|_| "[redacted]"),
            )
            .field("social_base_url", &self.social_base_url)
            .field("news_base_url", &self.news_base_url)
            .field(
                "news_api_key",
                &self.news_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("llm_base_url", &self.llm_base_url)
            .field(
                "llm_api_key",
                &self.llm_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("llm_model", &self.llm_model)
            .field("analysis_cron", &self.analysis_cron)
            .finish()
    }
}
