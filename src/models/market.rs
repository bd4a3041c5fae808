use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::{check_title, ValidationError, MAX_POOL_OUTCOMES, MIN_POOL_OUTCOMES};

/// Market lifecycle. Transitions only move forward:
/// `Open -> BetsLocked -> Settled`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MarketStatus {
    Open,
    BetsLocked,
    Settled,
}

impl MarketStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MarketStatus::Open => "OPEN",
            MarketStatus::BetsLocked => "BETS_LOCKED",
            MarketStatus::Settled => "SETTLED",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "OPEN" => Some(MarketStatus::Open),
            "BETS_LOCKED" => Some(MarketStatus::BetsLocked),
            "SETTLED" => Some(MarketStatus::Settled),
            _ => None,
        }
    }
}

impl fmt::Display for MarketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One mutually exclusive result of a market. `centipoints` is the running
/// sum of every wager placed on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    pub id: Uuid,
    pub title: String,
    pub centipoints: u64,
}

/// Pari-mutuel pool: stakes on losing outcomes fund the winners.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pool {
    pub outcomes: Vec<Outcome>,
    pub winner_id: Option<Uuid>,
}

impl Pool {
    pub fn outcome(&self, id: Uuid) -> Option<&Outcome> {
        self.outcomes.iter().find(|o| o.id == id)
    }

    pub fn outcome_mut(&mut self, id: Uuid) -> Option<&mut Outcome> {
        self.outcomes.iter_mut().find(|o| o.id == id)
    }

    /// Sum of all wagers across every outcome. `None` if it does not fit in a `u64`.
    pub fn total_centipoints(&self) -> Option<u64> {
        self.outcomes
            .iter()
            .try_fold(0u64, |acc, o| acc.checked_add(o.centipoints))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Market {
    pub id: Uuid,
    pub title: String,
    pub creator: Uuid,
    pub status: MarketStatus,
    pub pool: Option<Pool>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub settled_at: Option<DateTime<Utc>>,
}

impl Market {
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_title("title", &self.title)?;
        if self.creator.is_nil() {
            return Err(ValidationError::Required { field: "creator" });
        }
        if let Some(pool) = &self.pool {
            let got = pool.outcomes.len();
            if !(MIN_POOL_OUTCOMES..=MAX_POOL_OUTCOMES).contains(&got) {
                return Err(ValidationError::OutcomeCount {
                    min: MIN_POOL_OUTCOMES,
                    max: MAX_POOL_OUTCOMES,
                    got,
                });
            }
            for outcome in &pool.outcomes {
                check_title("outcome title", &outcome.title)?;
            }
        }
        Ok(())
    }
}

/// Template submitted to create a market. Identity, status, timestamps and
/// outcome tallies are always assigned by the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewMarket {
    pub title: String,
    pub creator: Uuid,
    #[serde(default)]
    pub outcomes: Option<Vec<NewOutcome>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOutcome {
    pub title: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn market_with_outcomes(n: usize) -> Market {
        let now = Utc::now();
        Market {
            id: Uuid::new_v4(),
            title: "Will it rain?".into(),
            creator: Uuid::new_v4(),
            status: MarketStatus::Open,
            pool: Some(Pool {
                outcomes: (0..n)
                    .map(|i| Outcome {
                        id: Uuid::new_v4(),
                        title: format!("outcome {i}"),
                        centipoints: 0,
                    })
                    .collect(),
                winner_id: None,
            }),
            created_at: now,
            updated_at: now,
            settled_at: None,
        }
    }

    #[test]
    fn status_round_trips_through_str() {
        for status in [MarketStatus::Open, MarketStatus::BetsLocked, MarketStatus::Settled] {
            assert_eq!(MarketStatus::from_str(status.as_str()), Some(status));
        }
        assert_eq!(MarketStatus::from_str("bets_locked"), Some(MarketStatus::BetsLocked));
        assert_eq!(MarketStatus::from_str("closed"), None);
    }

    #[test]
    fn validate_rejects_single_outcome_pool() {
        let err = market_with_outcomes(1).validate().unwrap_err();
        assert!(matches!(err, ValidationError::OutcomeCount { got: 1, .. }));
        assert!(market_with_outcomes(2).validate().is_ok());
    }

    #[test]
    fn validate_rejects_blank_title() {
        let mut market = market_with_outcomes(2);
        market.title = "   ".into();
        assert_eq!(
            market.validate(),
            Err(ValidationError::Required { field: "title" })
        );
    }

    #[test]
    fn pool_total_sums_outcomes() {
        let mut market = market_with_outcomes(2);
        let pool = market.pool.as_mut().unwrap();
        pool.outcomes[0].centipoints = 300;
        pool.outcomes[1].centipoints = 100;
        assert_eq!(pool.total_centipoints(), Some(400));
    }

    #[test]
    fn pool_total_reports_overflow() {
        let mut market = market_with_outcomes(2);
        let pool = market.pool.as_mut().unwrap();
        pool.outcomes[0].centipoints = u64::MAX / 2 + 1;
        pool.outcomes[1].centipoints = u64::MAX / 2 + 1;
        assert_eq!(pool.total_centipoints(), None);
    }
}
