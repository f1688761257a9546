use serde::Serialize;

use crate::constants::messages;

/// Uniform response envelope. Every endpoint wraps its payload in this
/// shape so clients can branch on `statusCode` without inspecting HTTP
/// status lines.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub status_code: u16,
    pub status_message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            status_code: 200,
            status_message: messages::SUCCESS.to_string(),
            data: Some(data),
        }
    }

    /// Success envelope without a payload, carrying only a message.
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            status_code: 200,
            status_message: message.into(),
            data: None,
        }
    }

    pub fn error(status_code: u16, message: impl Into<String>) -> Self {
        Self {
            status_code,
            status_message: message.into(),
            data: None,
        }
    }
}

/// Payload returned by a successful sign-in.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub username: String,
    pub token: String,
    pub roles: Vec<String>,
}

/// One row of the sign-in audit trail.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginAttemptDto {
    pub id: i64,
    pub username: String,
    pub country: String,
    pub user_agent: Option<String>,
    pub origin: Option<String>,
    pub success: bool,
    pub created_at: String,
}
