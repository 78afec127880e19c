use thiserror::Error;

use crate::app_config::{AppConfig, Environment};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the
/// process, without touching `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// The parsing/validation logic is decoupled from the actual environment so it
/// can be tested with a pure `HashMap` lookup — no `set_var`/`remove_var`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default =
        |var: &str, default: &str| -> String { lookup(var).unwrap_or_else(|_| default.to_string()) };

    let parse_addr = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let database_url = require("DATABASE_URL")?;
    let env = parse_environment(&or_default("NARRADAR_ENV", "development"));
    let bind_addr = parse_addr("NARRADAR_BIND_ADDR", "0.0.0.0:3000")?;
    let log_level = or_default("NARRADAR_LOG_LEVEL", "info");
    let ecosystem = or_default("NARRADAR_ECOSYSTEM", "solana");

    let db_max_connections = parse_u32("NARRADAR_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_u32("NARRADAR_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_u64("NARRADAR_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    let collector_request_timeout_secs =
        parse_u64("NARRADAR_COLLECTOR_REQUEST_TIMEOUT_SECS", "30")?;
    let collector_user_agent = or_default(
        "NARRADAR_COLLECTOR_USER_AGENT",
        "narradar/0.1 (narrative-radar)",
    );
    let collector_max_attempts = parse_u32("NARRADAR_COLLECTOR_MAX_ATTEMPTS", "3")?;
    let collector_backoff_base_secs = parse_u64("NARRADAR_COLLECTOR_BACKOFF_BASE_SECS", "1")?;

    let onchain_base_url = or_default("NARRADAR_ONCHAIN_BASE_URL", "https://api.llama.fi");
    let github_base_url = or_default("NARRADAR_GITHUB_BASE_URL", "https://api.github.com");
    let github_token = lookup("NARRADAR_GITHUB_TOKEN").ok();
    let social_base_url = or_default("NARRADAR_SOCIAL_BASE_URL", "https://www.reddit.com");
    let news_base_url = or_default("NARRADAR_NEWS_BASE_URL", "https://min-api.cryptocompare.com");
    let news_api_key = lookup("NARRADAR_NEWS_API_KEY").ok();

    let llm_base_url = or_default("NARRADAR_LLM_BASE_URL", "https://api.groq.com/openai/v1");
    let llm_api_key = lookup("NARRADAR_LLM_API_KEY").ok();
    let llm_model = or_default("NARRADAR_LLM_MODEL", "llama-3.3-70b-versatile");

    let analysis_cron = or_default("NARRADAR_ANALYSIS_CRON", "0 0 */12 * * *");

    Ok(AppConfig {
        database_url,
        env,
        bind_addr,
        log_level,
        ecosystem,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        collector_request_timeout_secs,
        collector_user_agent,
        collector_max_attempts,
        collector_backoff_base_secs,
        onchain_base_url,
        github_base_url,
        github_token,
        social_base_url,
        news_base_url,
        news_api_key,
        llm_base_url,
        llm_api_key,
        llm_model,
        analysis_cron,
    })
}

/// Parse a string into an `Environment` variant.
///
/// Unrecognized values default to `Environment::Development`.
fn parse_environment(s: &str) -> Environment {
    match s {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;
