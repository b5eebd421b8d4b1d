use crate::entities::{UserStatus, user_entity};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RegisterRequest {
    #[schema(example = "sita@example.com")]
    pub email: String,
    #[schema(example = "+9779812345678")]
    pub phone: Option<String>,
    #[schema(example = "Sita Sharma")]
    pub full_name: String,
    #[schema(example = "Passw0rdX")]
    pub password: String,
    /// Code of the user who invited this one
    #[schema(example = "K7QX2M9A")]
    pub referral_code: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    #[schema(example = "sita@example.com")]
    pub email: String,
    #[schema(example = "Passw0rdX")]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RefreshTokenRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UpdateProfileRequest {
    #[schema(example = "Sita Sharma")]
    pub full_name: Option<String>,
    #[schema(example = "+9779812345678")]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: i64,
    pub email: String,
    pub phone: Option<String>,
    pub full_name: String,
    pub status: UserStatus,
    pub is_staff: bool,
    pub referral_code: String,
    pub referred_by: Option<i64>,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<user_entity::Model> for UserResponse {
    fn from(user: user_entity::Model) -> Self {
        Self {
            id: user.id,
            email: user.email,
            phone: user.phone,
            full_name: user.full_name,
            status: user.status,
            is_staff: user.is_staff,
            referral_code: user.referral_code,
            referred_by: user.referred_by,
            last_login_at: user.last_login_at,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AuthResponse {
    pub user: UserResponse,
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct UserListQuery {
    pub page: Option<u64>,
    pub page_size: Option<u64>,
    /// ACTIVE, BANNED or INACTIVE
    pub status: Option<String>,
    /// Matches email or full name
    pub search: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SetUserStatusRequest {
    pub status: UserStatus,
    pub reason: Option<String>,
}
