use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::models::{Market, MarketStatus, Pool};

/// Database row for the markets table. The pool (outcomes and winner) is
/// stored as a single JSONB document.
#[derive(Debug, Clone, FromRow)]
struct MarketRow {
    id: Uuid,
    title: String,
    creator: Uuid,
    status: String,
    pool: Option<Json<Pool>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    settled_at: Option<DateTime<Utc>>,
}

impl TryFrom<MarketRow> for Market {
    type Error = anyhow::Error;

    fn try_from(row: MarketRow) -> anyhow::Result<Self> {
        let status = MarketStatus::from_str(&row.status)
            .ok_or_else(|| anyhow::anyhow!("market {} has unknown status {}", row.id, row.status))?;
        Ok(Market {
            id: row.id,
            title: row.title,
            creator: row.creator,
            status,
            pool: row.pool.map(|Json(pool)| pool),
            created_at: row.created_at,
            updated_at: row.updated_at,
            settled_at: row.settled_at,
        })
    }
}

pub async fn get_market(pool: &PgPool, id: Uuid) -> anyhow::Result<Option<Market>> {
    let row = sqlx::query_as::<_, MarketRow>("SELECT * FROM markets WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    row.map(Market::try_from).transpose()
}

pub async fn insert_market(pool: &PgPool, market: &Market) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO markets (id, title, creator, status, pool, created_at, updated_at, settled_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        "#,
    )
    .bind(market.id)
    .bind(&market.title)
    .bind(market.creator)
    .bind(market.status.as_str())
    .bind(market.pool.as_ref().map(Json))
    .bind(market.created_at)
    .bind(market.updated_at)
    .bind(market.settled_at)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn update_market(pool: &PgPool, market: &Market) -> anyhow::Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE markets
        SET title = $2, status = $3, pool = $4, updated_at = $5, settled_at = $6
        WHERE id = $1
        "#,
    )
    .bind(market.id)
    .bind(&market.title)
    .bind(market.status.as_str())
    .bind(market.pool.as_ref().map(Json))
    .bind(market.updated_at)
    .bind(market.settled_at)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        anyhow::bail!("market {} does not exist", market.id);
    }
    Ok(())
}

/// Markets with id > `greater_than_id`, optionally filtered by status.
pub async fn list_markets(
    pool: &PgPool,
    greater_than_id: Option<Uuid>,
    status: Option<MarketStatus>,
    limit: usize,
) -> anyhow::Result<(Vec<Market>, bool)> {
    let rows = sqlx::query_as::<_, MarketRow>(
        r#"
        SELECT * FROM markets
        WHERE ($1::uuid IS NULL OR id > $1)
          AND ($2::text IS NULL OR status = $2)
        ORDER BY id ASC
        LIMIT $3
        "#,
    )
    .bind(greater_than_id)
    .bind(status.map(|s| s.as_str()))
    .bind(limit as i64 + 1)
    .fetch_all(pool)
    .await?;

    let mut markets = rows
        .into_iter()
        .map(Market::try_from)
        .collect::<anyhow::Result<Vec<_>>>()?;
    let has_more = markets.len() > limit;
    markets.truncate(limit);
    Ok((markets, has_more))
}
