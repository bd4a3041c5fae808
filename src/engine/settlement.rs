use std::collections::HashSet;
use std::time::Instant;

use anyhow::Context;
use chrono::Utc;
use metrics::{counter, histogram};
use serde::Serialize;
use uuid::Uuid;

use crate::api::ws_types::WsMessage;
use crate::db::ListBetsArgs;
use crate::errors::AppError;
use crate::models::{Bet, Market, MarketStatus};

use super::MarketEngine;

/// Payout multiplier `total / winner_total`, kept as an integer fraction so
/// settlement amounts are exact and reproducible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PayoutRatio {
    pub numerator: u64,
    pub denominator: u64,
}

impl PayoutRatio {
    pub fn new(total: u64, winner_total: u64) -> Self {
        Self {
            numerator: total,
            denominator: winner_total,
        }
    }

    /// `floor(amount * total / winner_total)`. Zero when nobody backed the winner.
    pub fn apply(&self, amount: u64) -> u64 {
        if self.denominator == 0 {
            return 0;
        }
        let scaled = u128::from(amount) * u128::from(self.numerator) / u128::from(self.denominator);
        u64::try_from(scaled).unwrap_or(u64::MAX)
    }
}

/// Result of a settlement, broadcast to event subscribers.
#[derive(Debug, Clone, Serialize)]
pub struct SettlementSummary {
    pub market: Market,
    pub total_centipoints: u64,
    pub paid_out_centipoints: u64,
    /// Pool value lost to floor rounding; not redistributed.
    pub remainder_centipoints: u64,
    pub winning_bets: usize,
}

impl MarketEngine {
    /// Settle a locked market and pay out the pool to bets on `winner_id`.
    ///
    /// Write order: for each bet (id ascending) the owner is credited and
    /// persisted, then the bet; the market is persisted last. A failure
    /// mid-way leaves the market `BetsLocked`. Bets that already carry a
    /// settlement time were paid by an earlier attempt and are not credited
    /// again, so a retry completes the remaining payouts.
    pub async fn settle_market(
        &self,
        market_id: Uuid,
        winner_id: Option<Uuid>,
    ) -> Result<Market, AppError> {
        let _guard = self.mutation_lock.write().await;
        let started = Instant::now();

        let mut market = self
            .repo
            .get_market(market_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("market {market_id} not found")))?;
        if market.status != MarketStatus::BetsLocked {
            return Err(AppError::invalid("market is not locked"));
        }

        let winner_id = winner_id.ok_or_else(|| AppError::invalid("winner is required"))?;
        let pool = market
            .pool
            .as_mut()
            .ok_or_else(|| AppError::invalid("market has no pool"))?;
        let winner_total = pool
            .outcome(winner_id)
            .map(|o| o.centipoints)
            .ok_or_else(|| AppError::invalid("winner is not in pool"))?;
        let total = pool
            .total_centipoints()
            .ok_or_else(|| AppError::invalid("pool total overflows"))?;
        pool.winner_id = Some(winner_id);

        let now = Utc::now();
        market.status = MarketStatus::Settled;
        market.updated_at = now;
        market.settled_at = Some(now);

        let mut paid_out: u64 = 0;
        let mut winning_bets = 0;
        if total > 0 {
            let ratio = PayoutRatio::new(total, winner_total);
            let mut bets = self.collect_market_bets(market_id).await?;

            // Bets stamped by an earlier, interrupted attempt were already paid.
            let mut newly_settled = HashSet::new();
            for bet in bets.iter_mut().filter(|b| b.settled_at.is_none()) {
                bet.updated_at = now;
                bet.settled_at = Some(now);
                if bet.outcome_id() == winner_id {
                    bet.settled_centipoints = ratio.apply(bet.centipoints);
                }
                newly_settled.insert(bet.id);
            }

            for bet in &bets {
                if bet.outcome_id() == winner_id {
                    winning_bets += 1;
                    paid_out = paid_out.saturating_add(bet.settled_centipoints);
                }
                if !newly_settled.contains(&bet.id) {
                    tracing::debug!(bet_id = %bet.id, "Bet already settled, skipping credit");
                    continue;
                }

                let mut user = self
                    .repo
                    .get_user(bet.user_id)
                    .await?
                    .with_context(|| format!("user {} of bet {} not found", bet.user_id, bet.id))?;
                user.centipoints = user
                    .centipoints
                    .checked_add(bet.settled_centipoints)
                    .with_context(|| format!("balance of user {} would overflow", user.id))?;
                user.updated_at = now;

                self.repo.update_user(&user).await?;
                self.repo.update_bet(bet).await?;
            }
        } else {
            tracing::info!(market_id = %market_id, "No bets placed, skipping payout");
        }

        self.repo.update_market(&market).await?;

        let remainder = total.saturating_sub(paid_out);
        counter!("markets_settled_total").increment(1);
        counter!("centipoints_paid_out_total").increment(paid_out);
        counter!("settlement_remainder_centipoints_total").increment(remainder);
        histogram!("settlement_duration_seconds").record(started.elapsed().as_secs_f64());

        if remainder > 0 {
            tracing::warn!(
                market_id = %market_id,
                remainder,
                "Settlement remainder not redistributed"
            );
        }
        tracing::info!(
            market_id = %market_id,
            winner_id = %winner_id,
            total,
            paid_out,
            winning_bets,
            "Market settled"
        );
        self.publish(WsMessage::MarketSettled(SettlementSummary {
            market: market.clone(),
            total_centipoints: total,
            paid_out_centipoints: paid_out,
            remainder_centipoints: remainder,
            winning_bets,
        }));

        Ok(market)
    }

    /// Every bet on a market, id ascending, read page by page.
    async fn collect_market_bets(&self, market_id: Uuid) -> Result<Vec<Bet>, AppError> {
        let mut bets = Vec::new();
        let mut greater_than_id = None;
        loop {
            let (page, has_more) = self
                .repo
                .list_bets(&ListBetsArgs {
                    greater_than_id,
                    market_id: Some(market_id),
                    user_id: None,
                    limit: self.settlement_page_size,
                })
                .await?;
            let Some(last) = page.last() else {
                break;
            };
            greater_than_id = Some(last.id);
            bets.extend(page);
            if !has_more {
                break;
            }
        }
        Ok(bets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ratio_floors_proportional_share() {
        // A: 300 wagered, B: 100 wagered, A wins.
        let ratio = PayoutRatio::new(400, 300);
        assert_eq!(ratio.apply(150), 200);
        assert_eq!(ratio.apply(100), 133);
        assert_eq!(ratio.apply(50), 66);
    }

    #[test]
    fn sole_winner_takes_whole_pool() {
        assert_eq!(PayoutRatio::new(1000, 200).apply(200), 1000);
    }

    #[test]
    fn unbacked_winner_pays_nothing() {
        assert_eq!(PayoutRatio::new(500, 0).apply(100), 0);
    }

    #[test]
    fn large_amounts_do_not_overflow() {
        let ratio = PayoutRatio::new(u64::MAX, u64::MAX / 2);
        assert_eq!(ratio.apply(u64::MAX / 2), u64::MAX);
    }
}
