use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::engine::ListUsersRequest;
use crate::errors::AppError;
use crate::models::{NewUser, User};
use crate::AppState;

use super::{ApiResponse, ListResponse};

#[derive(Deserialize)]
pub struct ListUsersQuery {
    pub page_size: Option<usize>,
    pub page_token: Option<String>,
}

/// POST /api/users
pub async fn create(
    State(state): State<AppState>,
    Json(body): Json<Option<NewUser>>,
) -> Result<Json<ApiResponse<User>>, AppError> {
    let user = state.engine.create_user(body).await?;
    Ok(Json(ApiResponse::ok(user)))
}

/// GET /api/users/{id}
pub async fn detail(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<User>>, AppError> {
    let user = state.engine.get_user(id).await?;
    Ok(Json(ApiResponse::ok(user)))
}

/// GET /api/users
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListUsersQuery>,
) -> Result<Json<ListResponse<User>>, AppError> {
    let page = state
        .engine
        .list_users(ListUsersRequest {
            page_size: query.page_size,
            page_token: query.page_token,
        })
        .await?;
    Ok(Json(page.into()))
}
