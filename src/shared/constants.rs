// =============================================================================
// ENDPOINTS
// =============================================================================

pub const CSRF_TOKEN_PATH: &str = "/api/csrf-token";
pub const PUBLIC_CONFIG_PATH: &str = "/api/public/config";
pub const UPLOAD_PATH: &str = "/api/upload";
pub const IMAGES_PATH: &str = "/api/images";
pub const AUTH_REGISTER_PATH: &str = "/api/auth/register";
pub const AUTH_LOGIN_PATH: &str = "/api/auth/login";
pub const AUTH_LOGOUT_PATH: &str = "/api/auth/logout";
pub const AUTH_ME_PATH: &str = "/api/auth/me";
pub const AUTH_STATS_PATH: &str = "/api/auth/stats";
pub const AUTH_PASSWORD_PATH: &str = "/api/auth/password";

/// Public prefix under which stored images are served
pub const IMAGE_URL_PREFIX: &str = "/i/";

/// Header carrying the anti-forgery token on mutating requests
pub const CSRF_HEADER_NAME: &str = "X-CSRFToken";

// =============================================================================
// UPLOAD QUALITY
// =============================================================================

pub const MIN_QUALITY: u8 = 1;
pub const MAX_QUALITY: u8 = 100;

// =============================================================================
// MESSAGES
// =============================================================================

/// Fallback when an error response carries no `error` field
pub const UNKNOWN_ERROR_MESSAGE: &str = "Unknown error";

/// Shown when no response was received at all
pub const NETWORK_ERROR_MESSAGE: &str = "Network interrupted";
