//! Market engine: lifecycle transitions, wager placement and settlement.
//!
//! Every mutating operation that touches balances or market state
//! (`lock_market`, `settle_market`, `create_bet`) runs under a single
//! engine-wide write lock, so no two of them interleave anywhere in the
//! system. `get_market` takes the lock for read so it never observes a
//! market mid-mutation. Market status is always re-read from the
//! repository; caller-supplied status is never trusted.
//!
//! Multi-entity writes are ordered sequences of independent commits. A
//! repository failure part-way through is surfaced as-is and earlier writes
//! stay committed.

mod bets;
mod markets;
mod settlement;
mod users;

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{broadcast, RwLock};

use crate::api::ws_types::WsMessage;
use crate::config::AppConfig;
use crate::db::Repository;
use crate::pagination::{PageSizes, PageTokenCodec};

pub use bets::ListBetsRequest;
pub use markets::ListMarketsRequest;
pub use settlement::{PayoutRatio, SettlementSummary};
pub use users::ListUsersRequest;

/// One page of a listing. `next_page_token` is empty on the last page.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_page_token: String,
}

pub struct MarketEngine {
    repo: Arc<dyn Repository>,
    mutation_lock: RwLock<()>,
    tokens: PageTokenCodec,
    page_sizes: PageSizes,
    settlement_page_size: usize,
    events: broadcast::Sender<WsMessage>,
}

impl MarketEngine {
    pub fn new(repo: Arc<dyn Repository>, config: &AppConfig) -> Self {
        let tokens = match &config.page_token_secret {
            Some(secret) => PageTokenCodec::new(secret),
            None => PageTokenCodec::ephemeral(),
        };
        let (events, _) = broadcast::channel(256);

        Self {
            repo,
            mutation_lock: RwLock::new(()),
            tokens,
            page_sizes: PageSizes {
                default: config.default_page_size,
                max: config.max_page_size,
            },
            settlement_page_size: config.settlement_page_size,
            events,
        }
    }

    pub fn repository(&self) -> &Arc<dyn Repository> {
        &self.repo
    }

    /// Subscribe to events for every committed ledger mutation.
    pub fn subscribe(&self) -> broadcast::Receiver<WsMessage> {
        self.events.subscribe()
    }

    fn publish(&self, msg: WsMessage) {
        // No subscribers is not an error.
        let _ = self.events.send(msg);
    }
}
