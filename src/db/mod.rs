pub mod bet_repo;
pub mod market_repo;
pub mod memory;
pub mod postgres;
pub mod user_repo;

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{Bet, Market, MarketStatus, User};

pub use memory::MemoryRepository;
pub use postgres::PgRepository;

pub async fn init_pool(database_url: &str) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;

    // Verify connectivity
    sqlx::query("SELECT 1").execute(&pool).await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    Ok(pool)
}

#[derive(Debug, Clone, Default)]
pub struct ListUsersArgs {
    pub greater_than_id: Option<Uuid>,
    pub limit: usize,
}

#[derive(Debug, Clone, Default)]
pub struct ListMarketsArgs {
    pub greater_than_id: Option<Uuid>,
    pub status: Option<MarketStatus>,
    pub limit: usize,
}

#[derive(Debug, Clone, Default)]
pub struct ListBetsArgs {
    pub greater_than_id: Option<Uuid>,
    pub market_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    pub limit: usize,
}

/// Persistence backend consumed by the market engine.
///
/// Single-key reads and writes are assumed linearizable; there are no
/// multi-key transactions. Listings are ordered by id ascending, return ids
/// strictly greater than `greater_than_id`, and report whether more rows
/// follow the returned page.
#[async_trait]
pub trait Repository: Send + Sync {
    async fn ping(&self) -> anyhow::Result<()>;

    async fn get_user(&self, id: Uuid) -> anyhow::Result<Option<User>>;
    async fn create_user(&self, user: &User) -> anyhow::Result<()>;
    async fn update_user(&self, user: &User) -> anyhow::Result<()>;
    async fn list_users(&self, args: &ListUsersArgs) -> anyhow::Result<(Vec<User>, bool)>;

    async fn get_market(&self, id: Uuid) -> anyhow::Result<Option<Market>>;
    async fn create_market(&self, market: &Market) -> anyhow::Result<()>;
    async fn update_market(&self, market: &Market) -> anyhow::Result<()>;
    async fn list_markets(&self, args: &ListMarketsArgs) -> anyhow::Result<(Vec<Market>, bool)>;

    async fn get_bet(&self, id: Uuid) -> anyhow::Result<Option<Bet>>;
    async fn create_bet(&self, bet: &Bet) -> anyhow::Result<()>;
    async fn update_bet(&self, bet: &Bet) -> anyhow::Result<()>;
    async fn list_bets(&self, args: &ListBetsArgs) -> anyhow::Result<(Vec<Bet>, bool)>;
}
