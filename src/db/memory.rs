use std::collections::BTreeMap;
use std::ops::Bound;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::{Bet, Market, User};

use super::{ListBetsArgs, ListMarketsArgs, ListUsersArgs, Repository};

/// In-process repository. Backs tests and database-less deployments.
#[derive(Default)]
pub struct MemoryRepository {
    inner: RwLock<Tables>,
}

#[derive(Default)]
struct Tables {
    users: BTreeMap<Uuid, User>,
    markets: BTreeMap<Uuid, Market>,
    bets: BTreeMap<Uuid, Bet>,
    /// Remaining successful writes before every write fails. `None` = unlimited.
    write_budget: Option<usize>,
}

impl Tables {
    fn spend_write(&mut self) -> anyhow::Result<()> {
        match self.write_budget.as_mut() {
            Some(0) => anyhow::bail!("storage unavailable"),
            Some(n) => {
                *n -= 1;
                Ok(())
            }
            None => Ok(()),
        }
    }
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Let the next `n` writes succeed and fail every write after that.
    pub async fn fail_writes_after(&self, n: usize) {
        self.inner.write().await.write_budget = Some(n);
    }

    pub async fn clear_write_failures(&self) {
        self.inner.write().await.write_budget = None;
    }
}

fn page<'a, T: Clone + 'a>(
    rows: impl Iterator<Item = &'a T>,
    limit: usize,
) -> (Vec<T>, bool) {
    let mut out: Vec<T> = rows.take(limit + 1).cloned().collect();
    let has_more = out.len() > limit;
    out.truncate(limit);
    (out, has_more)
}

fn after<V>(
    map: &BTreeMap<Uuid, V>,
    greater_than_id: Option<Uuid>,
) -> impl Iterator<Item = &V> {
    let lower = match greater_than_id {
        Some(id) => Bound::Excluded(id),
        None => Bound::Unbounded,
    };
    map.range((lower, Bound::Unbounded)).map(|(_, v)| v)
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn ping(&self) -> anyhow::Result<()> {
        Ok(())
    }

    async fn get_user(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        Ok(self.inner.read().await.users.get(&id).cloned())
    }

    async fn create_user(&self, user: &User) -> anyhow::Result<()> {
        let mut tables = self.inner.write().await;
        tables.spend_write()?;
        if tables.users.contains_key(&user.id) {
            anyhow::bail!("user {} already exists", user.id);
        }
        tables.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn update_user(&self, user: &User) -> anyhow::Result<()> {
        let mut tables = self.inner.write().await;
        tables.spend_write()?;
        match tables.users.get_mut(&user.id) {
            Some(slot) => {
                *slot = user.clone();
                Ok(())
            }
            None => anyhow::bail!("user {} does not exist", user.id),
        }
    }

    async fn list_users(&self, args: &ListUsersArgs) -> anyhow::Result<(Vec<User>, bool)> {
        let tables = self.inner.read().await;
        Ok(page(after(&tables.users, args.greater_than_id), args.limit))
    }

    async fn get_market(&self, id: Uuid) -> anyhow::Result<Option<Market>> {
        Ok(self.inner.read().await.markets.get(&id).cloned())
    }

    async fn create_market(&self, market: &Market) -> anyhow::Result<()> {
        let mut tables = self.inner.write().await;
        tables.spend_write()?;
        if tables.markets.contains_key(&market.id) {
            anyhow::bail!("market {} already exists", market.id);
        }
        tables.markets.insert(market.id, market.clone());
        Ok(())
    }

    async fn update_market(&self, market: &Market) -> anyhow::Result<()> {
        let mut tables = self.inner.write().await;
        tables.spend_write()?;
        match tables.markets.get_mut(&market.id) {
            Some(slot) => {
                *slot = market.clone();
                Ok(())
            }
            None => anyhow::bail!("market {} does not exist", market.id),
        }
    }

    async fn list_markets(&self, args: &ListMarketsArgs) -> anyhow::Result<(Vec<Market>, bool)> {
        let tables = self.inner.read().await;
        let rows = after(&tables.markets, args.greater_than_id)
            .filter(|m| args.status.map_or(true, |s| m.status == s));
        Ok(page(rows, args.limit))
    }

    async fn get_bet(&self, id: Uuid) -> anyhow::Result<Option<Bet>> {
        Ok(self.inner.read().await.bets.get(&id).cloned())
    }

    async fn create_bet(&self, bet: &Bet) -> anyhow::Result<()> {
        let mut tables = self.inner.write().await;
        tables.spend_write()?;
        if tables.bets.contains_key(&bet.id) {
            anyhow::bail!("bet {} already exists", bet.id);
        }
        tables.bets.insert(bet.id, bet.clone());
        Ok(())
    }

    async fn update_bet(&self, bet: &Bet) -> anyhow::Result<()> {
        let mut tables = self.inner.write().await;
        tables.spend_write()?;
        match tables.bets.get_mut(&bet.id) {
            Some(slot) => {
                *slot = bet.clone();
                Ok(())
            }
            None => anyhow::bail!("bet {} does not exist", bet.id),
        }
    }

    async fn list_bets(&self, args: &ListBetsArgs) -> anyhow::Result<(Vec<Bet>, bool)> {
        let tables = self.inner.read().await;
        let rows = after(&tables.bets, args.greater_than_id)
            .filter(|b| args.market_id.map_or(true, |id| b.market_id == id))
            .filter(|b| args.user_id.map_or(true, |id| b.user_id == id));
        Ok(page(rows, args.limit))
    }
}
