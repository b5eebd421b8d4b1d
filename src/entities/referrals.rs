use crate::error::{AppError, AppResult};
use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema, DeriveActiveEnum, EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "String(Some(16))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReferralStatus {
    #[sea_orm(string_value = "PENDING")]
    Pending,
    #[sea_orm(string_value = "COMPLETED")]
    Completed,
    #[sea_orm(string_value = "EXPIRED")]
    Expired,
}

impl ReferralStatus {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.to_ascii_uppercase().as_str() {
            "PENDING" => Some(ReferralStatus::Pending),
            "COMPLETED" => Some(ReferralStatus::Completed),
            "EXPIRED" => Some(ReferralStatus::Expired),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "referrals")]
pub struct Model {
    #[sea_orm(primary_key)]
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
    pub updated_at: DateTime<Utc>,
}

impl Model {
    /// A pending referral whose window has closed.
    pub fn is_past_expiry(&self, now: DateTime<Utc>) -> bool {
        self.status == ReferralStatus::Pending && now > self.expires_at
    }

    /// Rejects completion of anything that is not a live PENDING referral.
    pub fn check_completable(&self, now: DateTime<Utc>) -> AppResult<()> {
        match self.status {
            ReferralStatus::Completed => Err(AppError::service(
                "referral_already_completed",
                "Referral has already been completed",
            )),
            ReferralStatus::Expired => {
                Err(AppError::service("referral_expired", "Referral has expired"))
            }
            ReferralStatus::Pending if now > self.expires_at => {
                Err(AppError::service("referral_expired", "Referral has expired"))
            }
            ReferralStatus::Pending => Ok(()),
        }
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn referral(status: ReferralStatus, expires_in_days: i64) -> Model {
        let now = Utc::now();
        Model {
            id: 7,
            inviter_id: 1,
            invitee_id: 2,
            referral_code: "ABCD1234".into(),
            status,
            inviter_points_awarded: 0,
            invitee_points_awarded: 0,
            first_rental_completed: false,
            completed_at: None,
            expires_at: now + Duration::days(expires_in_days),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_pending_referral_is_completable() {
        let r = referral(ReferralStatus::Pending, 30);
        assert!(r.check_completable(Utc::now()).is_ok());
        assert!(!r.is_past_expiry(Utc::now()));
    }

    #[test]
    fn test_completed_referral_rejected() {
        let r = referral(ReferralStatus::Completed, 30);
        let err = r.check_completable(Utc::now()).unwrap_err();
        assert_eq!(err.code(), "referral_already_completed");
    }

    #[test]
    fn test_expired_status_rejected() {
        let r = referral(ReferralStatus::Expired, 30);
        let err = r.check_completable(Utc::now()).unwrap_err();
        assert_eq!(err.code(), "referral_expired");
    }

    #[test]
    fn test_pending_past_expiry_rejected() {
        let r = referral(ReferralStatus::Pending, -1);
        assert!(r.is_past_expiry(Utc::now()));
        let err = r.check_completable(Utc::now()).unwrap_err();
        assert_eq!(err.code(), "referral_expired");
    }

    #[test]
    fn test_completed_referral_never_past_expiry() {
        let r = referral(ReferralStatus::Completed, -1);
        assert!(!r.is_past_expiry(Utc::now()));
    }
}
