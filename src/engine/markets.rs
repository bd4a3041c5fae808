use chrono::Utc;
use metrics::counter;
use uuid::Uuid;

use crate::api::ws_types::WsMessage;
use crate::db::ListMarketsArgs;
use crate::errors::AppError;
use crate::models::{Market, MarketStatus, NewMarket, Outcome, Pool};
use crate::pagination::MarketFilter;

use super::{MarketEngine, Page};

#[derive(Debug, Clone, Default)]
pub struct ListMarketsRequest {
    pub status: Option<MarketStatus>,
    pub page_size: Option<usize>,
    pub page_token: Option<String>,
}

impl ListMarketsRequest {
    /// The request with its pagination fields stripped.
    fn filter(&self) -> MarketFilter {
        MarketFilter {
            status: self.status,
        }
    }
}

impl MarketEngine {
    /// Create a new market. Status is forced to `Open`, outcomes get fresh
    /// ids and zero tallies, and any winner or settlement data is dropped.
    pub async fn create_market(&self, new_market: Option<NewMarket>) -> Result<Market, AppError> {
        let new_market = new_market.ok_or_else(|| AppError::invalid("market is required"))?;

        let now = Utc::now();
        let market = Market {
            id: Uuid::new_v4(),
            title: new_market.title,
            creator: new_market.creator,
            status: MarketStatus::Open,
            pool: new_market.outcomes.map(|outcomes| Pool {
                outcomes: outcomes
                    .into_iter()
                    .map(|o| Outcome {
                        id: Uuid::new_v4(),
                        title: o.title,
                        centipoints: 0,
                    })
                    .collect(),
                winner_id: None,
            }),
            created_at: now,
            updated_at: now,
            settled_at: None,
        };

        if self.repo.get_user(market.creator).await?.is_none() {
            return Err(AppError::invalid(format!(
                "creator {} not found",
                market.creator
            )));
        }

        market.validate()?;

        self.repo.create_market(&market).await?;

        counter!("markets_created_total").increment(1);
        tracing::info!(
            market_id = %market.id,
            creator = %market.creator,
            outcomes = market.pool.as_ref().map_or(0, |p| p.outcomes.len()),
            "Market created"
        );
        self.publish(WsMessage::MarketCreated(market.clone()));

        Ok(market)
    }

    pub async fn get_market(&self, id: Uuid) -> Result<Market, AppError> {
        let _guard = self.mutation_lock.read().await;

        self.repo
            .get_market(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("market {id} not found")))
    }

    pub async fn list_markets(&self, req: ListMarketsRequest) -> Result<Page<Market>, AppError> {
        let filter = req.filter();
        let cursor = self.tokens.resume(req.page_token.as_deref(), &filter)?;
        let limit = self.page_sizes.resolve(req.page_size);

        let (markets, has_more) = self
            .repo
            .list_markets(&ListMarketsArgs {
                greater_than_id: cursor,
                status: filter.status,
                limit,
            })
            .await?;

        let next_page_token = match markets.last() {
            Some(last) if has_more => self.tokens.encode(last.id, &filter)?,
            _ => String::new(),
        };
        Ok(Page {
            items: markets,
            next_page_token,
        })
    }

    /// Stop accepting bets. Only an `Open` market can be locked.
    pub async fn lock_market(&self, id: Uuid) -> Result<Market, AppError> {
        let _guard = self.mutation_lock.write().await;

        let mut market = self
            .repo
            .get_market(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("market {id} not found")))?;
        if market.status != MarketStatus::Open {
            return Err(AppError::invalid("market is not open"));
        }
        market.status = MarketStatus::BetsLocked;
        market.updated_at = Utc::now();

        self.repo.update_market(&market).await?;

        counter!("markets_locked_total").increment(1);
        tracing::info!(market_id = %market.id, "Market locked");
        self.publish(WsMessage::MarketLocked(market.clone()));

        Ok(market)
    }
}
