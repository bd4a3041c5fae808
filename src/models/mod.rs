pub mod bet;
pub mod market;
pub mod user;

pub use bet::{Bet, BetType, NewBet};
pub use market::{Market, MarketStatus, NewMarket, NewOutcome, Outcome, Pool};
pub use user::{NewUser, User};

/// Longest title or username accepted anywhere in the ledger.
pub const MAX_TITLE_LEN: usize = 1024;
pub const MIN_POOL_OUTCOMES: usize = 2;
pub const MAX_POOL_OUTCOMES: usize = 64;

/// Structural validation failure of an entity about to be persisted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{field} is required")]
    Required { field: &'static str },

    #[error("{field} must be at most {max} characters")]
    TooLong { field: &'static str, max: usize },

    #[error("pool must have between {min} and {max} outcomes, got {got}")]
    OutcomeCount { min: usize, max: usize, got: usize },

    #[error("{field} must be greater than zero")]
    NotPositive { field: &'static str },
}

pub(crate) fn check_title(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required { field });
    }
    if value.chars().count() > MAX_TITLE_LEN {
        return Err(ValidationError::TooLong {
            field,
            max: MAX_TITLE_LEN,
        });
    }
    Ok(())
}
