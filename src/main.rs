use std::sync::Arc;

use bettor::api::router::create_router;
use bettor::config::AppConfig;
use bettor::db::{self, MemoryRepository, PgRepository, Repository};
use bettor::engine::MarketEngine;
use bettor::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env()?;
    init_tracing(config.log_json);

    let repo: Arc<dyn Repository> = match &config.database_url {
        Some(url) => {
            tracing::info!("Connecting to database...");
            let pool = db::init_pool(url).await?;
            tracing::info!("Database connected, migrations applied");
            Arc::new(PgRepository::new(pool))
        }
        None => {
            tracing::warn!("DATABASE_URL not set: using in-memory repository, state is lost on exit");
            Arc::new(MemoryRepository::new())
        }
    };

    if config.page_token_secret.is_none() {
        tracing::warn!("PAGE_TOKEN_SECRET not set: page tokens are invalidated on restart");
    }
    if config.api_token.is_none() {
        tracing::warn!("API_TOKEN not set: ledger API is unauthenticated");
    }

    let metrics_handle = bettor::metrics::init_metrics()?;
    let engine = Arc::new(MarketEngine::new(repo, &config));

    let addr = format!("{}:{}", config.host, config.port);
    let state = AppState {
        engine,
        config,
        metrics_handle,
    };
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {addr}");
    axum::serve(listener, router).await?;

    Ok(())
}

fn init_tracing(json: bool) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let registry = tracing_subscriber::registry().with(EnvFilter::from_default_env());
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}
