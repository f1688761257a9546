use axum::{
    Json,
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::IntoResponse,
};
use serde::Deserialize;
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState, TokenResponse};
use crate::constants::{UNKNOWN_COUNTRY, messages};
use crate::db::LoginAttempt;
use crate::services::ResetLinkView;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Deserialize)]
pub struct SignInRequest {
    pub username: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct ResetLinkRequest {
    pub email: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub token: String,
    pub new_password: String,
}

/// Username of the authenticated caller, inserted into request extensions
/// by `auth_middleware`.
#[derive(Clone)]
pub struct AuthUser(pub String);

// ============================================================================
// Middleware
// ============================================================================

/// Bearer-token middleware for the protected routes. The token is the JWT
/// issued by sign-in; a valid one puts the caller's username into the
/// request extensions.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<impl IntoResponse, ApiError> {
    let token = extract_bearer_token(&headers)
        .ok_or_else(|| ApiError::Unauthorized("Missing bearer token".to_string()))?;

    let claims = state
        .token_issuer
        .verify(&token)
        .map_err(|_| ApiError::Unauthorized("Invalid or expired token".to_string()))?;

    request.extensions_mut().insert(AuthUser(claims.sub));

    Ok(next.run(request).await)
}

fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    if let Some(auth_header) = headers.get("Authorization")
        && let Ok(auth_str) = auth_header.to_str()
        && let Some(token) = auth_str.strip_prefix("Bearer ")
    {
        return Some(token.trim().to_string());
    }

    None
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /auth/signin
/// Authenticate with username and password, returns a signed token on
/// success. Every attempt is recorded in the audit trail, failures too.
pub async fn signin(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<SignInRequest>,
) -> Result<Json<ApiResponse<TokenResponse>>, ApiError> {
    if payload.username.is_empty() {
        return Err(ApiError::validation("Username is required"));
    }
    if payload.password.is_empty() {
        return Err(ApiError::validation("Password is required"));
    }

    let is_valid = state
        .store
        .verify_user_password(&payload.username, &payload.password)
        .await
        .map_err(|e| ApiError::internal(format!("Authentication error: {e}")))?;

    record_attempt(&state, &payload.username, &headers, is_valid).await;

    if !is_valid {
        return Err(ApiError::Unauthorized("Invalid credentials".to_string()));
    }

    let user = state
        .store
        .get_user_by_username(&payload.username)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to get user: {e}")))?
        .ok_or_else(|| ApiError::Unauthorized("Invalid credentials".to_string()))?;

    let token = state
        .token_issuer
        .issue(&user.username)
        .map_err(|e| ApiError::internal(format!("Failed to issue token: {e}")))?;

    Ok(Json(ApiResponse::success(TokenResponse {
        username: user.username,
        token,
        roles: user.roles.iter().map(|r| r.name().to_string()).collect(),
    })))
}

/// POST /auth/signup
/// Self-service registration. The registrant is recorded as the acting
/// identity on their own row.
pub async fn signup(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<crate::services::RegisterRequest>,
) -> Result<Json<ApiResponse<crate::services::UserView>>, ApiError> {
    let acting = payload.username.clone();
    let user = state.user_service.register(payload, &acting).await?;

    Ok(Json(ApiResponse::success(user)))
}

/// POST /auth/reset-link
/// Issues (or refreshes) the reset link for the given email. The response
/// is success-shaped even for an unknown address so the endpoint cannot be
/// used to probe which emails are registered.
pub async fn send_reset_link(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ResetLinkRequest>,
) -> Result<Json<ApiResponse<ResetLinkView>>, ApiError> {
    if payload.email.is_empty() {
        return Err(ApiError::validation("Email is required"));
    }

    let link = state.reset_service.generate_reset_link(&payload.email).await?;

    Ok(Json(match link {
        Some(view) => ApiResponse::success(view),
        None => ApiResponse::message(messages::SUCCESS),
    }))
}

/// GET /auth/reset-link/{token}
/// Reports whether a reset link is usable. Success means the link IS
/// valid; an unknown or expired token gets the invalid-link message.
pub async fn validate_reset_link(
    State(state): State<Arc<AppState>>,
    axum::extract::Path(token): axum::extract::Path<String>,
) -> Result<Json<ApiResponse<bool>>, ApiError> {
    let valid = state.reset_service.is_link_valid(&token).await?;

    let response = if valid {
        ApiResponse::success(true)
    } else {
        ApiResponse {
            data: Some(false),
            ..ApiResponse::error(404, messages::INVALID_LINK)
        }
    };

    Ok(Json(response))
}

/// POST /auth/reset-password
/// Consumes a valid reset link and stores the new password.
pub async fn reset_password(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    state
        .reset_service
        .reset_password(&payload.token, &payload.new_password)
        .await?;

    Ok(Json(ApiResponse::message(messages::SUCCESS)))
}

// ============================================================================
// Helpers
// ============================================================================

/// Records a sign-in attempt. Audit failures are logged but never fail the
/// sign-in itself.
async fn record_attempt(state: &AppState, username: &str, headers: &HeaderMap, success: bool) {
    let attempt = LoginAttempt {
        username: username.to_string(),
        country: country_from_headers(headers),
        user_agent: header_value(headers, "User-Agent"),
        origin: header_value(headers, "Origin"),
        success,
    };

    if let Err(e) = state.store.record_login_attempt(&attempt).await {
        tracing::error!("Failed to record sign-in attempt: {e}");
    }
}

/// Derives a country code from the first `Accept-Language` tag, e.g.
/// `en-US` yields `US`. Anything unparseable falls back to UNKNOWN.
fn country_from_headers(headers: &HeaderMap) -> String {
    header_value(headers, "Accept-Language")
        .as_deref()
        .and_then(|langs| langs.split(',').next())
        .and_then(|tag| tag.trim().split(';').next())
        .and_then(|tag| tag.split('-').nth(1))
        .map(|region| region.trim().to_ascii_uppercase())
        .filter(|region| region.len() == 2 && region.chars().all(|c| c.is_ascii_alphabetic()))
        .unwrap_or_else(|| UNKNOWN_COUNTRY.to_string())
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with_language(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("Accept-Language", HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn country_comes_from_first_language_tag() {
        let headers = headers_with_language("en-US,en;q=0.9,de-DE;q=0.8");
        assert_eq!(country_from_headers(&headers), "US");
    }

    #[test]
    fn lowercase_region_is_uppercased() {
        let headers = headers_with_language("pt-br");
        assert_eq!(country_from_headers(&headers), "BR");
    }

    #[test]
    fn language_without_region_is_unknown() {
        let headers = headers_with_language("en");
        assert_eq!(country_from_headers(&headers), UNKNOWN_COUNTRY);
    }

    #[test]
    fn missing_header_is_unknown() {
        assert_eq!(country_from_headers(&HeaderMap::new()), UNKNOWN_COUNTRY);
    }

    #[test]
    fn wildcard_is_unknown() {
        let headers = headers_with_language("*");
        assert_eq!(country_from_headers(&headers), UNKNOWN_COUNTRY);
    }
}
