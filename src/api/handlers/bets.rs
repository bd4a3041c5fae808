use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::engine::ListBetsRequest;
use crate::errors::AppError;
use crate::models::{Bet, NewBet};
use crate::AppState;

use super::{ApiResponse, ListResponse};

#[derive(Deserialize)]
pub struct ListBetsQuery {
    pub market_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    pub page_size: Option<usize>,
    pub page_token: Option<String>,
}

/// POST /api/bets: place a wager
pub async fn create(
    State(state): State<AppState>,
    Json(body): Json<Option<NewBet>>,
) -> Result<Json<ApiResponse<Bet>>, AppError> {
    let bet = state.engine.create_bet(body).await?;
    Ok(Json(ApiResponse::ok(bet)))
}

/// GET /api/bets/{id}
pub async fn detail(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Bet>>, AppError> {
    let bet = state.engine.get_bet(id).await?;
    Ok(Json(ApiResponse::ok(bet)))
}

/// GET /api/bets?market_id=...&user_id=...
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListBetsQuery>,
) -> Result<Json<ListResponse<Bet>>, AppError> {
    let page = state
        .engine
        .list_bets(ListBetsRequest {
            market_id: query.market_id,
            user_id: query.user_id,
            page_size: query.page_size,
            page_token: query.page_token,
        })
        .await?;
    Ok(Json(page.into()))
}
