use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::engine::ListMarketsRequest;
use crate::errors::AppError;
use crate::models::{Market, MarketStatus, NewMarket};
use crate::AppState;

use super::{ApiResponse, ListResponse};

// ---------------------------------------------------------------------------
// DTOs
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct ListMarketsQuery {
    pub status: Option<String>,
    pub page_size: Option<usize>,
    pub page_token: Option<String>,
}

#[derive(Deserialize)]
pub struct SettleMarketRequest {
    #[serde(default)]
    pub winner_id: Option<Uuid>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/markets: create a market
pub async fn create(
    State(state): State<AppState>,
    Json(body): Json<Option<NewMarket>>,
) -> Result<Json<ApiResponse<Market>>, AppError> {
    let market = state.engine.create_market(body).await?;
    Ok(Json(ApiResponse::ok(market)))
}

/// GET /api/markets/{id}
pub async fn detail(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Market>>, AppError> {
    let market = state.engine.get_market(id).await?;
    Ok(Json(ApiResponse::ok(market)))
}

/// GET /api/markets?status=OPEN&page_size=25&page_token=...
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListMarketsQuery>,
) -> Result<Json<ListResponse<Market>>, AppError> {
    let status = match query.status.as_deref().filter(|s| !s.is_empty()) {
        Some(raw) => Some(
            MarketStatus::from_str(raw)
                .ok_or_else(|| AppError::invalid(format!("unknown market status {raw}")))?,
        ),
        None => None,
    };

    let page = state
        .engine
        .list_markets(ListMarketsRequest {
            status,
            page_size: query.page_size,
            page_token: query.page_token,
        })
        .await?;
    Ok(Json(page.into()))
}

/// POST /api/markets/{id}/lock: stop accepting bets
pub async fn lock(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Market>>, AppError> {
    let market = state.engine.lock_market(id).await?;
    Ok(Json(ApiResponse::ok(market)))
}

/// POST /api/markets/{id}/settle: declare the winner and pay out
pub async fn settle(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<SettleMarketRequest>,
) -> Result<Json<ApiResponse<Market>>, AppError> {
    let market = state.engine.settle_market(id, body.winner_id).await?;
    Ok(Json(ApiResponse::ok(market)))
}
