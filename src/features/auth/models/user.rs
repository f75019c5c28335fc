use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::shared::types::format_size;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    #[default]
    #[serde(other)]
    User,
}

/// The logged-in account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub role: UserRole,
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
    #[serde(default = "default_active")]
    pub is_active: bool,
    /// Personal quota; None means the global quota applies
    #[serde(default)]
    pub quota_bytes: Option<u64>,
}

fn default_active() -> bool {
    true
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

/// Storage usage of the logged-in account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserStats {
    pub used_bytes: u64,
    pub image_count: u64,
    pub quota_bytes: u64,
}

impl UserStats {
    /// Share of the quota in use, 0-100
    pub fn usage_percent(&self) -> f64 {
        if self.quota_bytes == 0 {
            return 100.0;
        }
        (self.used_bytes as f64 / self.quota_bytes as f64 * 100.0).min(100.0)
    }

    pub fn summary(&self) -> String {
        format!(
            "{} images, {} of {} used ({:.1}%)",
            self.image_count,
            format_size(self.used_bytes),
            format_size(self.quota_bytes),
            self.usage_percent()
        )
    }
}
