use chrono::Utc;
use metrics::counter;
use uuid::Uuid;

use crate::api::ws_types::WsMessage;
use crate::db::ListBetsArgs;
use crate::errors::AppError;
use crate::models::{Bet, MarketStatus, NewBet};
use crate::pagination::BetFilter;

use super::{MarketEngine, Page};

#[derive(Debug, Clone, Default)]
pub struct ListBetsRequest {
    pub market_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    pub page_size: Option<usize>,
    pub page_token: Option<String>,
}

impl ListBetsRequest {
    fn filter(&self) -> BetFilter {
        BetFilter {
            market_id: self.market_id,
            user_id: self.user_id,
        }
    }
}

impl MarketEngine {
    /// Place a wager on an open market.
    ///
    /// Every precondition is checked before the first write. The writes are
    /// then committed in order: bet, debited user, credited market.
    pub async fn create_bet(&self, new_bet: Option<NewBet>) -> Result<Bet, AppError> {
        let _guard = self.mutation_lock.write().await;

        let new_bet = new_bet.ok_or_else(|| AppError::invalid("bet is required"))?;

        let now = Utc::now();
        let mut user = self
            .repo
            .get_user(new_bet.user_id)
            .await?
            .ok_or_else(|| AppError::invalid(format!("user {} not found", new_bet.user_id)))?;
        if user.centipoints < new_bet.centipoints {
            return Err(AppError::invalid("user does not have enough balance"));
        }

        let mut market = self
            .repo
            .get_market(new_bet.market_id)
            .await?
            .ok_or_else(|| AppError::invalid(format!("market {} not found", new_bet.market_id)))?;
        if market.status != MarketStatus::Open {
            return Err(AppError::invalid("market is not open"));
        }

        let bet_type = new_bet
            .bet_type
            .ok_or_else(|| AppError::invalid("bet type is required"))?;
        let bet = Bet {
            id: Uuid::new_v4(),
            user_id: new_bet.user_id,
            market_id: new_bet.market_id,
            centipoints: new_bet.centipoints,
            bet_type,
            settled_centipoints: 0,
            created_at: now,
            updated_at: now,
            settled_at: None,
        };

        let pool = market
            .pool
            .as_mut()
            .ok_or_else(|| AppError::invalid("market does not have a pool"))?;
        let outcome = pool
            .outcome_mut(bet.outcome_id())
            .ok_or_else(|| AppError::invalid("outcome not found in market"))?;

        bet.validate()?;

        outcome.centipoints = outcome
            .centipoints
            .checked_add(bet.centipoints)
            .ok_or_else(|| AppError::invalid("outcome total would overflow"))?;
        if pool.total_centipoints().is_none() {
            return Err(AppError::invalid("pool total would overflow"));
        }
        user.centipoints -= bet.centipoints;
        user.updated_at = now;
        market.updated_at = now;

        // writes
        self.repo.create_bet(&bet).await?;
        self.repo.update_user(&user).await?;
        self.repo.update_market(&market).await?;

        counter!("bets_placed_total").increment(1);
        counter!("centipoints_wagered_total").increment(bet.centipoints);
        tracing::info!(
            bet_id = %bet.id,
            market_id = %bet.market_id,
            user_id = %bet.user_id,
            outcome_id = %bet.outcome_id(),
            centipoints = bet.centipoints,
            balance = user.centipoints,
            "Bet placed"
        );
        self.publish(WsMessage::BetPlaced(bet.clone()));

        Ok(bet)
    }

    pub async fn get_bet(&self, id: Uuid) -> Result<Bet, AppError> {
        self.repo
            .get_bet(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("bet {id} not found")))
    }

    pub async fn list_bets(&self, req: ListBetsRequest) -> Result<Page<Bet>, AppError> {
        let filter = req.filter();
        let cursor = self.tokens.resume(req.page_token.as_deref(), &filter)?;
        let limit = self.page_sizes.resolve(req.page_size);

        let (bets, has_more) = self
            .repo
            .list_bets(&ListBetsArgs {
                greater_than_id: cursor,
                market_id: filter.market_id,
                user_id: filter.user_id,
                limit,
            })
            .await?;

        let next_page_token = match bets.last() {
            Some(last) if has_more => self.tokens.encode(last.id, &filter)?,
            _ => String::new(),
        };
        Ok(Page {
            items: bets,
            next_page_token,
        })
    }
}
