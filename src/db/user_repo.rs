use anyhow::Context;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::models::User;

/// Database row for the users table.
#[derive(Debug, Clone, FromRow)]
struct UserRow {
    id: Uuid,
    username: String,
    centipoints: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = anyhow::Error;

    fn try_from(row: UserRow) -> anyhow::Result<Self> {
        Ok(User {
            id: row.id,
            username: row.username,
            centipoints: u64::try_from(row.centipoints)
                .with_context(|| format!("user {} has a negative balance", row.id))?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

pub(crate) fn to_db_points(value: u64) -> anyhow::Result<i64> {
    i64::try_from(value).context("centipoints exceed storable range")
}

pub async fn get_user(pool: &PgPool, id: Uuid) -> anyhow::Result<Option<User>> {
    let row = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    row.map(User::try_from).transpose()
}

pub async fn insert_user(pool: &PgPool, user: &User) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO users (id, username, centipoints, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(user.id)
    .bind(&user.username)
    .bind(to_db_points(user.centipoints)?)
    .bind(user.created_at)
    .bind(user.updated_at)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn update_user(pool: &PgPool, user: &User) -> anyhow::Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE users
        SET username = $2, centipoints = $3, updated_at = $4
        WHERE id = $1
        "#,
    )
    .bind(user.id)
    .bind(&user.username)
    .bind(to_db_points(user.centipoints)?)
    .bind(user.updated_at)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        anyhow::bail!("user {} does not exist", user.id);
    }
    Ok(())
}

/// Users with id > `greater_than_id`, id ascending. Fetches one extra row to
/// report whether another page follows.
pub async fn list_users(
    pool: &PgPool,
    greater_than_id: Option<Uuid>,
    limit: usize,
) -> anyhow::Result<(Vec<User>, bool)> {
    let rows = sqlx::query_as::<_, UserRow>(
        r#"
        SELECT * FROM users
        WHERE ($1::uuid IS NULL OR id > $1)
        ORDER BY id ASC
        LIMIT $2
        "#,
    )
    .bind(greater_than_id)
    .bind(limit as i64 + 1)
    .fetch_all(pool)
    .await?;

    let mut users = rows
        .into_iter()
        .map(User::try_from)
        .collect::<anyhow::Result<Vec<_>>>()?;
    let has_more = users.len() > limit;
    users.truncate(limit);
    Ok((users, has_more))
}
