use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{Bet, Market, User};

use super::{bet_repo, market_repo, user_repo};
use super::{ListBetsArgs, ListMarketsArgs, ListUsersArgs, Repository};

/// Postgres-backed repository. Each call is its own statement; nothing is
/// wrapped in a transaction.
#[derive(Clone)]
pub struct PgRepository {
    pool: PgPool,
}

impl PgRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Repository for PgRepository {
    async fn ping(&self) -> anyhow::Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn get_user(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        user_repo::get_user(&self.pool, id).await
    }

    async fn create_user(&self, user: &User) -> anyhow::Result<()> {
        user_repo::insert_user(&self.pool, user).await
    }

    async fn update_user(&self, user: &User) -> anyhow::Result<()> {
        user_repo::update_user(&self.pool, user).await
    }

    async fn list_users(&self, args: &ListUsersArgs) -> anyhow::Result<(Vec<User>, bool)> {
        user_repo::list_users(&self.pool, args.greater_than_id, args.limit).await
    }

    async fn get_market(&self, id: Uuid) -> anyhow::Result<Option<Market>> {
        market_repo::get_market(&self.pool, id).await
    }

    async fn create_market(&self, market: &Market) -> anyhow::Result<()> {
        market_repo::insert_market(&self.pool, market).await
    }

    async fn update_market(&self, market: &Market) -> anyhow::Result<()> {
        market_repo::update_market(&self.pool, market).await
    }

    async fn list_markets(&self, args: &ListMarketsArgs) -> anyhow::Result<(Vec<Market>, bool)> {
        market_repo::list_markets(&self.pool, args.greater_than_id, args.status, args.limit).await
    }

    async fn get_bet(&self, id: Uuid) -> anyhow::Result<Option<Bet>> {
        bet_repo::get_bet(&self.pool, id).await
    }

    async fn create_bet(&self, bet: &Bet) -> anyhow::Result<()> {
        bet_repo::insert_bet(&self.pool, bet).await
    }

    async fn update_bet(&self, bet: &Bet) -> anyhow::Result<()> {
        bet_repo::update_bet(&self.pool, bet).await
    }

    async fn list_bets(&self, args: &ListBetsArgs) -> anyhow::Result<(Vec<Bet>, bool)> {
        bet_repo::list_bets(
            &self.pool,
            args.greater_than_id,
            args.market_id,
            args.user_id,
            args.limit,
        )
        .await
    }
}
