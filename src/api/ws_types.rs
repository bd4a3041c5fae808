use serde::Serialize;
use uuid::Uuid;

use crate::engine::SettlementSummary;
use crate::models::{Bet, Market};

/// Messages broadcast to all connected WebSocket clients.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum WsMessage {
    #[serde(rename = "market_created")]
    MarketCreated(Market),

    #[serde(rename = "bet_placed")]
    BetPlaced(Bet),

    #[serde(rename = "market_locked")]
    MarketLocked(Market),

    #[serde(rename = "market_settled")]
    MarketSettled(SettlementSummary),
}

impl WsMessage {
    /// The market an event concerns.
    pub fn market_id(&self) -> Uuid {
        match self {
            WsMessage::MarketCreated(m) | WsMessage::MarketLocked(m) => m.id,
            WsMessage::BetPlaced(b) => b.market_id,
            WsMessage::MarketSettled(s) => s.market.id,
        }
    }
}
