use axum::{
    Json, Router,
    extract::State,
    http::HeaderValue,
    middleware,
    routing::{get, post, put},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::db::Store;
use crate::services::{
    PasswordPolicy, ResetService, SeaOrmResetService, SeaOrmUserService, TokenIssuer, UserService,
};

pub mod auth;
mod error;
mod types;
mod users;

pub use error::ApiError;
pub use types::*;

#[derive(Clone)]
pub struct AppState {
    pub store: Store,

    pub config: Config,

    pub token_issuer: TokenIssuer,

    pub user_service: Arc<dyn UserService>,

    pub reset_service: Arc<dyn ResetService>,
}

pub async fn create_app_state_from_config(config: Config) -> anyhow::Result<Arc<AppState>> {
    let store = Store::with_pool_options(
        &config.general.database_path,
        config.general.max_db_connections,
        config.general.min_db_connections,
    )
    .await?;

    let policy = PasswordPolicy::new(config.security.password.clone());

    let token_issuer = TokenIssuer::new(
        &config.security.jwt_secret,
        config.security.token_ttl_minutes,
    );

    let user_service = Arc::new(SeaOrmUserService::new(
        store.clone(),
        policy.clone(),
        config.security.clone(),
    ));

    let reset_service = Arc::new(SeaOrmResetService::new(
        store.clone(),
        policy,
        config.security.clone(),
        config.reset.link_ttl_hours,
    ));

    Ok(Arc::new(AppState {
        store,
        config,
        token_issuer,
        user_service,
        reset_service,
    }))
}

/// GET /health
/// Liveness probe; verifies the database connection answers.
async fn health(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<&'static str>>, ApiError> {
    state
        .store
        .ping()
        .await
        .map_err(|e| ApiError::DatabaseError(e.to_string()))?;

    Ok(Json(ApiResponse::success("OK")))
}

pub fn router(state: Arc<AppState>) -> Router {
    let cors_origins = state.config.server.cors_allowed_origins.clone();

    let protected_routes = create_protected_router(state.clone());

    let api_router = Router::new()
        .merge(protected_routes)
        .route("/auth/signin", post(auth::signin))
        .route("/auth/signup", post(auth::signup))
        .route("/auth/reset-link", post(auth::send_reset_link))
        .route("/auth/reset-link/{token}", get(auth::validate_reset_link))
        .route("/auth/reset-password", post(auth::reset_password))
        .route("/health", get(health))
        .with_state(state);

    let cors_layer = if cors_origins.contains(&"*".to_string()) {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    Router::new()
        .nest("/api", api_router)
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
}

fn create_protected_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/users", get(users::list_users))
        .route("/users", put(users::update_user))
        .route("/users/sessions", get(users::login_attempts))
        .route_layer(middleware::from_fn_with_state(state, auth::auth_middleware))
}
