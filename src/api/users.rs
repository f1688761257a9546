use axum::{
    Extension, Json,
    extract::{Query, State},
};
use serde::Deserialize;
use std::sync::Arc;

use super::auth::AuthUser;
use super::{ApiError, ApiResponse, AppState, LoginAttemptDto};
use crate::services::{UpdateRequest, UserView};

#[derive(Deserialize)]
pub struct AttemptsQuery {
    #[serde(default = "default_limit")]
    pub limit: u64,
}

const fn default_limit() -> u64 {
    50
}

/// GET /users
pub async fn list_users(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<UserView>>>, ApiError> {
    let users = state.user_service.list().await?;

    Ok(Json(ApiResponse::success(users)))
}

/// PUT /users
/// Updates a profile. The authenticated caller is recorded as the acting
/// identity on the updated row.
pub async fn update_user(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(acting)): Extension<AuthUser>,
    Json(payload): Json<UpdateRequest>,
) -> Result<Json<ApiResponse<UserView>>, ApiError> {
    let user = state.user_service.update(payload, &acting).await?;

    Ok(Json(ApiResponse::success(user)))
}

/// GET /users/sessions
/// Most recent sign-in attempts, newest first.
pub async fn login_attempts(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AttemptsQuery>,
) -> Result<Json<ApiResponse<Vec<LoginAttemptDto>>>, ApiError> {
    let attempts = state
        .store
        .recent_login_attempts(query.limit)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to load sign-in history: {e}")))?;

    let dtos = attempts
        .into_iter()
        .map(|row| LoginAttemptDto {
            id: row.id,
            username: row.username,
            country: row.country,
            user_agent: row.user_agent,
            origin: row.origin,
            success: row.success,
            created_at: row.created_at,
        })
        .collect();

    Ok(Json(ApiResponse::success(dtos)))
}
