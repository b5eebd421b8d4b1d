use crate::entities::{ReferralStatus, referral_entity};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ReferralCodeInfo {
    pub referral_code: String,
    pub inviter_id: i64,
    pub inviter_name: String,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ReferralListQuery {
    pub page: Option<u64>,
    pub page_size: Option<u64>,
    /// PENDING, COMPLETED or EXPIRED
    pub status: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReferralResponse {
    pub id: i64,
    pub inviter_id: i64,
    pub invitee_id: i64,
    pub referral_code: String,
    pub status: ReferralStatus,
    pub inviter_points_awarded: i64,
    pub invitee_points_awarded: i64,
    pub first_rental_completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl From<referral_entity::Model> for ReferralResponse {
    fn from(r: referral_entity::Model) -> Self {
        Self {
            id: r.id,
            inviter_id: r.inviter_id,
            invitee_id: r.invitee_id,
            referral_code: r.referral_code,
            status: r.status,
            inviter_points_awarded: r.inviter_points_awarded,
            invitee_points_awarded: r.invitee_points_awarded,
            first_rental_completed: r.first_rental_completed,
            completed_at: r.completed_at,
            expires_at: r.expires_at,
            created_at: r.created_at,
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct ReferralStatsResponse {
    pub referral_code: String,
    pub total_referrals: u64,
    pub pending: u64,
    pub completed: u64,
    pub expired: u64,
    /// Points earned as inviter
    pub points_earned: i64,
}
