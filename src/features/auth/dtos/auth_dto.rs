use serde::{Deserialize, Serialize};
use validator::Validate;

/// Request DTO for session login
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoginRequestDto {
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Request DTO for creating an account
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RegisterRequestDto {
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,

    /// Required by servers with invite-only registration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invite_code: Option<String>,
}

/// Request DTO for changing the current user's password
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ChangePasswordRequestDto {
    #[validate(length(min = 1, message = "Current password is required"))]
    pub old_password: String,

    #[validate(length(min = 1, message = "New password is required"))]
    pub new_password: String,
}

/// Plain `{message}` acknowledgement
#[derive(Debug, Clone, Deserialize)]
pub struct MessageResponseDto {
    #[serde(default)]
    pub message: String,
}
