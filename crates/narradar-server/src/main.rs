mod api;
mod middleware;
mod scheduler;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use crate::api::{build_app, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = narradar_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = narradar_db::PoolConfig::from_app_config(&config);
    let pool = narradar_db::connect_pool(&config.database_url, pool_config).await?;
    narradar_db::run_migrations(&pool).await?;

    let collectors = narradar_collectors::build_registry(&config)?;
    let manager = narradar_collectors::CollectorManager::new(collectors);

    let llm_api_key = config.llm_api_key.clone().unwrap_or_else(|| {
        tracing::warn!("NARRADAR_LLM_API_KEY not set; extraction requests will be unauthenticated");
        String::new()
    });
    let extractor = Arc::new(narradar_pipeline::LlmExtractor::new(
        reqwest::Client::new(),
        config.llm_base_url.clone(),
        llm_api_key,
        config.llm_model.clone(),
    ));
    let pipeline: Arc<dyn narradar_pipeline::AnalysisPipeline> =
        Arc::new(narradar_pipeline::SignalPipeline::new(manager, extractor));

    let state = AppState {
        pool,
        store: Arc::new(narradar_store::AnalysisStore::new()),
        pipeline,
    };

    if state.store.load_from_database(&state.pool).await {
        tracing::info!("warmed analysis cache from the latest stored report");
    }

    let _scheduler = scheduler::build_scheduler(state.clone(), &config.analysis_cron).await?;

    let app = build_app(state);
    tracing::info!(addr = %config.bind_addr, env = %config.env, "narradar listening");
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
