use std::sync::Arc;

use bettor::api::router::create_router;
use bettor::config::AppConfig;
use bettor::db::{MemoryRepository, Repository};
use bettor::engine::MarketEngine;
use bettor::models::{BetType, Market, NewBet, NewMarket, NewOutcome, NewUser, User};
use bettor::AppState;
use uuid::Uuid;

#[allow(dead_code)]
pub fn test_config() -> AppConfig {
    AppConfig {
        page_token_secret: Some("test-secret".into()),
        ..AppConfig::default()
    }
}

/// Engine over a fresh in-memory repository. The repository handle is
/// returned for fault injection.
#[allow(dead_code)]
pub fn setup_engine_with(config: &AppConfig) -> (Arc<MarketEngine>, Arc<MemoryRepository>) {
    let repo = Arc::new(MemoryRepository::new());
    let dyn_repo: Arc<dyn Repository> = repo.clone();
    (Arc::new(MarketEngine::new(dyn_repo, config)), repo)
}

#[allow(dead_code)]
pub fn setup_engine() -> (Arc<MarketEngine>, Arc<MemoryRepository>) {
    setup_engine_with(&test_config())
}

#[allow(dead_code)]
pub fn build_test_app(config: AppConfig) -> (axum::Router, Arc<MarketEngine>) {
    let (engine, _repo) = setup_engine_with(&config);
    let state = AppState {
        engine: Arc::clone(&engine),
        config,
        metrics_handle: bettor::metrics::detached_handle(),
    };
    (create_router(state), engine)
}

#[allow(dead_code)]
pub async fn seed_user(engine: &MarketEngine, centipoints: u64) -> User {
    engine
        .create_user(Some(NewUser {
            username: format!("user-{}", &Uuid::new_v4().to_string()[..8]),
            centipoints,
        }))
        .await
        .expect("Failed to seed user")
}

/// Seed an open market with one outcome per title.
#[allow(dead_code)]
pub async fn seed_market(engine: &MarketEngine, creator: &User, outcomes: &[&str]) -> Market {
    engine
        .create_market(Some(NewMarket {
            title: "Who wins the final?".into(),
            creator: creator.id,
            outcomes: Some(
                outcomes
                    .iter()
                    .map(|t| NewOutcome {
                        title: (*t).to_string(),
                    })
                    .collect(),
            ),
        }))
        .await
        .expect("Failed to seed market")
}

#[allow(dead_code)]
pub fn outcome_id(market: &Market, title: &str) -> Uuid {
    market
        .pool
        .as_ref()
        .and_then(|p| p.outcomes.iter().find(|o| o.title == title))
        .map(|o| o.id)
        .expect("outcome not in market")
}

#[allow(dead_code)]
pub fn bet_on(user: &User, market: &Market, outcome_id: Uuid, centipoints: u64) -> Option<NewBet> {
    Some(NewBet {
        user_id: user.id,
        market_id: market.id,
        centipoints,
        bet_type: Some(BetType::Outcome { outcome_id }),
    })
}
