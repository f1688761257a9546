use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use crescendo::config::Config;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

/// Bootstrap admin seeded by migration (must match m20240101_initial.rs)
const ADMIN_USERNAME: &str = "admin";
const ADMIN_PASSWORD: &str = "ChangeMe123";

async fn spawn_app() -> Router {
    let mut config = Config::default();
    config.general.database_path = "sqlite::memory:".to_string();

    let state = crescendo::api::create_app_state_from_config(config)
        .await
        .expect("Failed to create app state");
    crescendo::api::router(state)
}

async fn body_json(response: axum::response::Response) -> Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("Content-Type", "application/json")
        .body(Body::from(serde_json::to_string(body).unwrap()))
        .unwrap()
}

fn signup_payload(username: &str, email: &str, mobile: &str) -> Value {
    json!({
        "firstName": "Nina",
        "lastName": "Harper",
        "username": username,
        "email": email,
        "mobile": mobile,
        "password": "Sonata99x"
    })
}

async fn signin(app: &Router, username: &str, password: &str) -> axum::response::Response {
    app.clone()
        .oneshot(post_json(
            "/api/auth/signin",
            &json!({ "username": username, "password": password }),
        ))
        .await
        .unwrap()
}

/// Signs in and returns the bearer token.
async fn signin_token(app: &Router, username: &str, password: &str) -> String {
    let response = signin(app, username, password).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    body["data"]["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn health_reports_a_live_database() {
    let app = spawn_app().await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["statusMessage"], "SUCCESS");
    assert_eq!(body["data"], "OK");
}

#[tokio::test]
async fn signin_with_seeded_admin_returns_token_and_roles() {
    let app = spawn_app().await;

    let response = signin(&app, ADMIN_USERNAME, ADMIN_PASSWORD).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["statusCode"], 200);
    assert_eq!(body["statusMessage"], "SUCCESS");
    assert_eq!(body["data"]["username"], ADMIN_USERNAME);
    assert!(body["data"]["token"].as_str().is_some_and(|t| !t.is_empty()));
    assert!(
        body["data"]["roles"]
            .as_array()
            .unwrap()
            .contains(&json!("ROLE_ADMIN"))
    );
}

#[tokio::test]
async fn signin_with_wrong_password_is_unauthorized() {
    let app = spawn_app().await;

    let response = signin(&app, ADMIN_USERNAME, "wrong-password").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn failed_signins_show_up_in_the_audit_trail() {
    let app = spawn_app().await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/auth/signin")
                .header("Content-Type", "application/json")
                .header("Accept-Language", "en-US,en;q=0.9")
                .body(Body::from(
                    json!({ "username": ADMIN_USERNAME, "password": "nope" }).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let token = signin_token(&app, ADMIN_USERNAME, ADMIN_PASSWORD).await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/users/sessions")
                .header("Authorization", format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let attempts = body["data"].as_array().unwrap();
    assert!(attempts.len() >= 2);

    let failed = attempts
        .iter()
        .find(|a| a["success"] == json!(false))
        .expect("failed attempt should be recorded");
    assert_eq!(failed["username"], ADMIN_USERNAME);
    assert_eq!(failed["country"], "US");
}

#[tokio::test]
async fn signup_defaults_to_base_user_role_and_allows_signin() {
    let app = spawn_app().await;

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/auth/signup",
            &signup_payload("nharper", "nina@example.com", "5551230001"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["data"]["username"], "nharper");
    assert_eq!(body["data"]["roles"], json!(["ROLE_USER"]));
    assert_eq!(body["data"]["createdBy"], "nharper");

    let response = signin(&app, "nharper", "Sonata99x").await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn duplicate_checks_report_username_before_email_before_mobile() {
    let app = spawn_app().await;

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/auth/signup",
            &signup_payload("dupe", "dupe@example.com", "5551230002"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Same username, email and mobile: username wins.
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/auth/signup",
            &signup_payload("dupe", "dupe@example.com", "5551230002"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = body_json(response).await;
    assert_eq!(body["statusMessage"], "username already registered");

    // New username, duplicate email and mobile: email wins.
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/auth/signup",
            &signup_payload("other", "dupe@example.com", "5551230002"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = body_json(response).await;
    assert_eq!(body["statusMessage"], "email already registered");

    // Only the mobile collides.
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/auth/signup",
            &signup_payload("other", "other@example.com", "5551230002"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = body_json(response).await;
    assert_eq!(body["statusMessage"], "mobile already registered");
}

#[tokio::test]
async fn weak_password_is_rejected_with_the_policy_message() {
    let app = spawn_app().await;

    let mut payload = signup_payload("weakpw", "weak@example.com", "5551230003");
    payload["password"] = json!("short");

    let response = app
        .clone()
        .oneshot(post_json("/api/auth/signup", &payload))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    let message = body["statusMessage"].as_str().unwrap();
    assert_eq!(message, Config::default().security.password.invalid_message);
}

#[tokio::test]
async fn unknown_role_id_fails_registration() {
    let app = spawn_app().await;

    let mut payload = signup_payload("roled", "roled@example.com", "5551230004");
    payload["roles"] = json!([1, 42]);

    let response = app
        .clone()
        .oneshot(post_json("/api/auth/signup", &payload))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["statusMessage"], "Unknown role id: 42");

    // No partial user: the rejected registration left nothing behind.
    let response = signin(&app, "roled", "Sonata99x").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let token = signin_token(&app, ADMIN_USERNAME, ADMIN_PASSWORD).await;
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/users")
                .header("Authorization", format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let body = body_json(response).await;
    assert!(
        body["data"]
            .as_array()
            .unwrap()
            .iter()
            .all(|u| u["username"] != "roled")
    );
}

#[tokio::test]
async fn protected_routes_require_a_valid_bearer_token() {
    let app = spawn_app().await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/users")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/users")
                .header("Authorization", "Bearer not-a-token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let token = signin_token(&app, ADMIN_USERNAME, ADMIN_PASSWORD).await;
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/users")
                .header("Authorization", format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let users = body["data"].as_array().unwrap();
    assert!(users.iter().any(|u| u["username"] == ADMIN_USERNAME));
    // Password material never leaves the service.
    assert!(users.iter().all(|u| u.get("passwordHash").is_none()));
}

#[tokio::test]
async fn update_excludes_own_row_from_duplicate_checks() {
    let app = spawn_app().await;
    let token = signin_token(&app, ADMIN_USERNAME, ADMIN_PASSWORD).await;

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/auth/signup",
            &signup_payload("taken", "taken@example.com", "5551230005"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let put = |payload: Value, token: String| {
        Request::builder()
            .method("PUT")
            .uri("/api/users")
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {token}"))
            .body(Body::from(payload.to_string()))
            .unwrap()
    };

    // Keeping the admin's own email is not a conflict.
    let response = app
        .clone()
        .oneshot(put(
            json!({
                "id": 1,
                "firstName": "Site",
                "lastName": "Admin",
                "email": "admin@crescendo.local",
                "mobile": "0000000000"
            }),
            token.clone(),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["data"]["firstName"], "Site");
    assert_eq!(body["data"]["updatedBy"], ADMIN_USERNAME);

    // Another user's email is.
    let response = app
        .clone()
        .oneshot(put(
            json!({
                "id": 1,
                "firstName": "Site",
                "lastName": "Admin",
                "email": "taken@example.com",
                "mobile": "0000000000"
            }),
            token.clone(),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // Unknown id.
    let response = app
        .clone()
        .oneshot(put(
            json!({
                "id": 999,
                "firstName": "Ghost",
                "lastName": "User",
                "email": "ghost@example.com",
                "mobile": "5550000000"
            }),
            token,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn reset_link_for_unknown_email_is_success_shaped_without_data() {
    let app = spawn_app().await;

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/auth/reset-link",
            &json!({ "email": "nobody@example.com" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["statusCode"], 200);
    assert!(body.get("data").is_none());
}

#[tokio::test]
async fn reset_link_is_refreshed_in_place_and_old_token_dies() {
    let app = spawn_app().await;

    let request_link = |app: &Router| {
        app.clone().oneshot(post_json(
            "/api/auth/reset-link",
            &json!({ "email": "admin@crescendo.local" }),
        ))
    };

    let response = request_link(&app).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let first = body_json(response).await;
    let first_token = first["data"]["token"].as_str().unwrap().to_string();

    let response = request_link(&app).await.unwrap();
    let second = body_json(response).await;
    let second_token = second["data"]["token"].as_str().unwrap().to_string();
    assert_ne!(first_token, second_token);

    // Only the refreshed token validates.
    let validate = |app: &Router, token: &str| {
        app.clone().oneshot(
            Request::builder()
                .uri(format!("/api/auth/reset-link/{token}"))
                .body(Body::empty())
                .unwrap(),
        )
    };

    let body = body_json(validate(&app, &first_token).await.unwrap()).await;
    assert_eq!(body["data"], json!(false));
    assert_eq!(body["statusMessage"], "Link is not valid");

    let body = body_json(validate(&app, &second_token).await.unwrap()).await;
    assert_eq!(body["data"], json!(true));
    assert_eq!(body["statusMessage"], "SUCCESS");
}

#[tokio::test]
async fn reset_password_consumes_the_link_and_changes_the_credential() {
    let app = spawn_app().await;

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/auth/reset-link",
            &json!({ "email": "admin@crescendo.local" }),
        ))
        .await
        .unwrap();
    let body = body_json(response).await;
    let token = body["data"]["token"].as_str().unwrap().to_string();

    // Policy applies on this path too, with the same message.
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/auth/reset-password",
            &json!({ "token": token, "newPassword": "short" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(
        body["statusMessage"].as_str().unwrap(),
        Config::default().security.password.invalid_message
    );

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/auth/reset-password",
            &json!({ "token": token, "newPassword": "Encore123" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Single use: the consumed link no longer works.
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/auth/reset-password",
            &json!({ "token": token, "newPassword": "Encore456" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // Old credential is gone, new one signs in.
    let response = signin(&app, ADMIN_USERNAME, ADMIN_PASSWORD).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = signin(&app, ADMIN_USERNAME, "Encore123").await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn garbage_reset_token_cannot_reset_anything() {
    let app = spawn_app().await;

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/auth/reset-password",
            &json!({ "token": "no-such-token", "newPassword": "Encore123" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = body_json(response).await;
    assert_eq!(body["statusMessage"], "Link is not valid");
}
