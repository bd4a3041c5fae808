use anyhow::Context;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::models::{Bet, BetType};

use super::user_repo::to_db_points;

/// Database row for the bets table.
#[derive(Debug, Clone, FromRow)]
struct BetRow {
    id: Uuid,
    user_id: Uuid,
    market_id: Uuid,
    centipoints: i64,
    outcome_id: Uuid,
    settled_centipoints: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    settled_at: Option<DateTime<Utc>>,
}

impl TryFrom<BetRow> for Bet {
    type Error = anyhow::Error;

    fn try_from(row: BetRow) -> anyhow::Result<Self> {
        Ok(Bet {
            id: row.id,
            user_id: row.user_id,
            market_id: row.market_id,
            centipoints: u64::try_from(row.centipoints)
                .with_context(|| format!("bet {} has a negative wager", row.id))?,
            bet_type: BetType::Outcome {
                outcome_id: row.outcome_id,
            },
            settled_centipoints: u64::try_from(row.settled_centipoints)
                .with_context(|| format!("bet {} has a negative payout", row.id))?,
            created_at: row.created_at,
            updated_at: row.updated_at,
            settled_at: row.settled_at,
        })
    }
}

pub async fn get_bet(pool: &PgPool, id: Uuid) -> anyhow::Result<Option<Bet>> {
    let row = sqlx::query_as::<_, BetRow>("SELECT * FROM bets WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    row.map(Bet::try_from).transpose()
}

pub async fn insert_bet(pool: &PgPool, bet: &Bet) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO bets (id, user_id, market_id, centipoints, outcome_id,
                          settled_centipoints, created_at, updated_at, settled_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        "#,
    )
    .bind(bet.id)
    .bind(bet.user_id)
    .bind(bet.market_id)
    .bind(to_db_points(bet.centipoints)?)
    .bind(bet.outcome_id())
    .bind(to_db_points(bet.settled_centipoints)?)
    .bind(bet.created_at)
    .bind(bet.updated_at)
    .bind(bet.settled_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Only the settlement columns of a bet are mutable.
pub async fn update_bet(pool: &PgPool, bet: &Bet) -> anyhow::Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE bets
        SET settled_centipoints = $2, updated_at = $3, settled_at = $4
        WHERE id = $1
        "#,
    )
    .bind(bet.id)
    .bind(to_db_points(bet.settled_centipoints)?)
    .bind(bet.updated_at)
    .bind(bet.settled_at)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        anyhow::bail!("bet {} does not exist", bet.id);
    }
    Ok(())
}

pub async fn list_bets(
    pool: &PgPool,
    greater_than_id: Option<Uuid>,
    market_id: Option<Uuid>,
    user_id: Option<Uuid>,
    limit: usize,
) -> anyhow::Result<(Vec<Bet>, bool)> {
    let rows = sqlx::query_as::<_, BetRow>(
        r#"
        SELECT * FROM bets
        WHERE ($1::uuid IS NULL OR id > $1)
          AND ($2::uuid IS NULL OR market_id = $2)
          AND ($3::uuid IS NULL OR user_id = $3)
        ORDER BY id ASC
        LIMIT $4
        "#,
    )
    .bind(greater_than_id)
    .bind(market_id)
    .bind(user_id)
    .bind(limit as i64 + 1)
    .fetch_all(pool)
    .await?;

    let mut bets = rows
        .into_iter()
        .map(Bet::try_from)
        .collect::<anyhow::Result<Vec<_>>>()?;
    let has_more = bets.len() > limit;
    bets.truncate(limit);
    Ok((bets, has_more))
}
