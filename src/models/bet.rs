use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ValidationError;

/// What a wager is placed on. Only pool outcomes exist today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BetType {
    Outcome { outcome_id: Uuid },
}

/// A user's wager. Only the settlement fields change after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bet {
    pub id: Uuid,
    pub user_id: Uuid,
    pub market_id: Uuid,
    pub centipoints: u64,
    pub bet_type: BetType,
    pub settled_centipoints: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub settled_at: Option<DateTime<Utc>>,
}

impl Bet {
    pub fn outcome_id(&self) -> Uuid {
        match self.bet_type {
            BetType::Outcome { outcome_id } => outcome_id,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.user_id.is_nil() {
            return Err(ValidationError::Required { field: "user_id" });
        }
        if self.market_id.is_nil() {
            return Err(ValidationError::Required { field: "market_id" });
        }
        if self.centipoints == 0 {
            return Err(ValidationError::NotPositive {
                field: "centipoints",
            });
        }
        Ok(())
    }
}

/// Template submitted to place a wager.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBet {
    pub user_id: Uuid,
    pub market_id: Uuid,
    pub centipoints: u64,
    #[serde(default)]
    pub bet_type: Option<BetType>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bet_type_uses_tagged_json() {
        let id = Uuid::nil();
        let json = serde_json::to_value(BetType::Outcome { outcome_id: id }).unwrap();
        assert_eq!(json["kind"], "outcome");
        assert_eq!(json["outcome_id"], id.to_string());
    }

    #[test]
    fn zero_wager_is_rejected() {
        let now = Utc::now();
        let bet = Bet {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            market_id: Uuid::new_v4(),
            centipoints: 0,
            bet_type: BetType::Outcome {
                outcome_id: Uuid::new_v4(),
            },
            settled_centipoints: 0,
            created_at: now,
            updated_at: now,
            settled_at: None,
        };
        assert_eq!(
            bet.validate(),
            Err(ValidationError::NotPositive {
                field: "centipoints"
            })
        );
    }
}
