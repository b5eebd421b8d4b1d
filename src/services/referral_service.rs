use crate::config::RewardsConfig;
use crate::entities::{
    PointsSource, ReferralStatus, RentalStatus, UserStatus, referral_entity as referrals,
    rental_entity as rentals, user_entity as users,
};
use crate::error::{AppError, AppResult};
use crate::models::{
    PaginatedResponse, PaginationParams, ReferralCodeInfo, ReferralListQuery, ReferralResponse,
    ReferralStatsResponse,
};
use crate::services::{PointsEntry, PointsService};
use actix_web::http::StatusCode;
use chrono::{DateTime, Duration, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    IntoActiveModel, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};

#[derive(Clone)]
pub struct ReferralService {
    pool: DatabaseConnection,
    points_service: PointsService,
    rewards: RewardsConfig,
}

impl ReferralService {
    pub fn new(pool: DatabaseConnection, points_service: PointsService, rewards: RewardsConfig) -> Self {
        Self {
            pool,
            points_service,
            rewards,
        }
    }

    pub async fn validate_code(&self, code: &str) -> AppResult<ReferralCodeInfo> {
        let inviter = self.find_inviter(code).await?;
        Ok(ReferralCodeInfo {
            referral_code: inviter.referral_code,
            inviter_id: inviter.id,
            inviter_name: inviter.full_name,
        })
    }

    /// Owner of an invitation code. Banned accounts cannot invite.
    pub async fn find_inviter(&self, code: &str) -> AppResult<users::Model> {
        let normalized = code.trim().to_uppercase();
        let inviter = users::Entity::find()
            .filter(users::Column::ReferralCode.eq(normalized))
            .one(&self.pool)
            .await?;
        match inviter {
            Some(user) if user.status != UserStatus::Banned => Ok(user),
            _ => Err(AppError::service(
                "invalid_referral_code",
                "Referral code does not exist",
            )),
        }
    }

    pub async fn create_referral_tx(
        &self,
        txn: &DatabaseTransaction,
        inviter_id: i64,
        invitee_id: i64,
        code: &str,
    ) -> AppResult<referrals::Model> {
        if inviter_id == invitee_id {
            return Err(AppError::service(
                "self_referral",
                "You cannot use your own referral code",
            ));
        }

        let existing = referrals::Entity::find()
            .filter(referrals::Column::InviterId.eq(inviter_id))
            .filter(referrals::Column::InviteeId.eq(invitee_id))
            .one(txn)
            .await?;
        if existing.is_some() {
            return Err(
                AppError::service("referral_exists", "Referral already exists")
                    .with_status(StatusCode::CONFLICT),
            );
        }

        let now = Utc::now();
        let referral = referrals::ActiveModel {
            inviter_id: Set(inviter_id),
            invitee_id: Set(invitee_id),
            referral_code: Set(code.trim().to_uppercase()),
            status: Set(ReferralStatus::Pending),
            inviter_points_awarded: Set(0),
            invitee_points_awarded: Set(0),
            first_rental_completed: Set(false),
            expires_at: Set(referral_expiry(now, self.rewards.referral_expiry_days)),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(txn)
        .await?;

        log::info!(
            "Referral created: id={}, inviter_id={}, invitee_id={}",
            referral.id,
            inviter_id,
            invitee_id
        );
        Ok(referral)
    }

    /// Awards both sides and closes the referral. An expired referral is
    /// flipped to EXPIRED before the error is returned.
    pub async fn complete_referral(&self, referral_id: i64) -> AppResult<ReferralResponse> {
        let txn = self.pool.begin().await?;
        let referral = referrals::Entity::find_by_id(referral_id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound("Referral not found".to_string()))?;

        let now = Utc::now();
        if let Err((next_status, e)) = completion_outcome(&referral, now) {
            if let Some(status) = next_status {
                let mut am = referral.into_active_model();
                am.status = Set(status);
                am.updated_at = Set(now);
                am.update(&txn).await?;
                txn.commit().await?;
                log::info!("Referral expired on completion attempt: id={referral_id}");
            }
            return Err(e);
        }

        let inviter_points = self.rewards.referral_inviter_points;
        let invitee_points = self.rewards.referral_invitee_points;

        if inviter_points > 0 {
            self.points_service
                .award_points_tx(
                    &txn,
                    referral.inviter_id,
                    inviter_points,
                    PointsEntry::new(PointsSource::ReferralInviter, "Referral reward")
                        .referral(referral.id),
                )
                .await?;
        }
        if invitee_points > 0 {
            self.points_service
                .award_points_tx(
                    &txn,
                    referral.invitee_id,
                    invitee_points,
                    PointsEntry::new(PointsSource::ReferralInvitee, "Welcome referral reward")
                        .referral(referral.id),
                )
                .await?;
        }

        let mut am = referral.into_active_model();
        am.status = Set(ReferralStatus::Completed);
        am.inviter_points_awarded = Set(inviter_points);
        am.invitee_points_awarded = Set(invitee_points);
        am.first_rental_completed = Set(true);
        am.completed_at = Set(Some(now));
        am.updated_at = Set(now);
        let completed = am.update(&txn).await?;

        txn.commit().await?;

        log::info!(
            "Referral completed: id={}, inviter_id={} (+{}), invitee_id={} (+{})",
            completed.id,
            completed.inviter_id,
            inviter_points,
            completed.invitee_id,
            invitee_points
        );
        Ok(completed.into())
    }

    /// Completes the invitee's pending referral once their first rental is done.
    pub async fn process_first_rental(
        &self,
        invitee_id: i64,
    ) -> AppResult<Option<ReferralResponse>> {
        let completed_rentals = rentals::Entity::find()
            .filter(rentals::Column::UserId.eq(invitee_id))
            .filter(rentals::Column::Status.eq(RentalStatus::Completed))
            .count(&self.pool)
            .await?;
        if !qualifies_for_first_rental_reward(completed_rentals) {
            return Ok(None);
        }

        let pending = referrals::Entity::find()
            .filter(referrals::Column::InviteeId.eq(invitee_id))
            .filter(referrals::Column::Status.eq(ReferralStatus::Pending))
            .one(&self.pool)
            .await?;
        let Some(referral) = pending else {
            return Ok(None);
        };

        match self.complete_referral(referral.id).await {
            Ok(done) => Ok(Some(done)),
            Err(e) if matches!(e.code(), "referral_expired" | "referral_already_completed") => {
                log::info!(
                    "Referral not completed after first rental: id={}, reason={}",
                    referral.id,
                    e.code()
                );
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// PENDING referrals past their window become EXPIRED.
    pub async fn expire_referrals(&self) -> AppResult<u64> {
        let now = Utc::now();
        let result = referrals::Entity::update_many()
            .col_expr(referrals::Column::Status, Expr::value(ReferralStatus::Expired))
            .col_expr(referrals::Column::UpdatedAt, Expr::value(now))
            .filter(referrals::Column::Status.eq(ReferralStatus::Pending))
            .filter(referrals::Column::ExpiresAt.lt(now))
            .exec(&self.pool)
            .await?;
        Ok(result.rows_affected)
    }

    pub async fn my_referrals(
        &self,
        user_id: i64,
        query: &ReferralListQuery,
    ) -> AppResult<PaginatedResponse<ReferralResponse>> {
        let select = referrals::Entity::find().filter(referrals::Column::InviterId.eq(user_id));
        self.paginate(select, query).await
    }

    pub async fn referral_stats(&self, user_id: i64) -> AppResult<ReferralStatsResponse> {
        let user = users::Entity::find_by_id(user_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        let mut stats = ReferralStatsResponse {
            referral_code: user.referral_code,
            ..Default::default()
        };

        for status in [
            ReferralStatus::Pending,
            ReferralStatus::Completed,
            ReferralStatus::Expired,
        ] {
            let n = referrals::Entity::find()
                .filter(referrals::Column::InviterId.eq(user_id))
                .filter(referrals::Column::Status.eq(status))
                .count(&self.pool)
                .await?;
            match status {
                ReferralStatus::Pending => stats.pending = n,
                ReferralStatus::Completed => stats.completed = n,
                ReferralStatus::Expired => stats.expired = n,
            }
        }
        stats.total_referrals = stats.pending + stats.completed + stats.expired;

        let awarded: Vec<i64> = referrals::Entity::find()
            .select_only()
            .column(referrals::Column::InviterPointsAwarded)
            .filter(referrals::Column::InviterId.eq(user_id))
            .filter(referrals::Column::Status.eq(ReferralStatus::Completed))
            .into_tuple()
            .all(&self.pool)
            .await?;
        stats.points_earned = awarded.iter().sum();

        Ok(stats)
    }

    pub async fn list_referrals(
        &self,
        query: &ReferralListQuery,
    ) -> AppResult<PaginatedResponse<ReferralResponse>> {
        self.paginate(referrals::Entity::find(), query).await
    }

    async fn paginate(
        &self,
        mut select: sea_orm::Select<referrals::Entity>,
        query: &ReferralListQuery,
    ) -> AppResult<PaginatedResponse<ReferralResponse>> {
        let params = PaginationParams::new(query.page, query.page_size);
        if let Some(raw) = query.status.as_deref() {
            let status = ReferralStatus::parse(raw).ok_or_else(|| {
                AppError::ValidationError(format!("Unknown referral status: {raw}"))
            })?;
            select = select.filter(referrals::Column::Status.eq(status));
        }

        let total = select.clone().count(&self.pool).await?;
        let rows = select
            .order_by_desc(referrals::Column::CreatedAt)
            .offset(params.get_offset())
            .limit(params.get_limit())
            .all(&self.pool)
            .await?;

        Ok(PaginatedResponse::new(
            rows.into_iter().map(Into::into).collect(),
            &params,
            total,
        ))
    }
}

/// Decides whether a referral may be completed at `now`. A refusal carries
/// the status the row must be moved to before the error is returned.
pub fn completion_outcome(
    referral: &referrals::Model,
    now: DateTime<Utc>,
) -> Result<(), (Option<ReferralStatus>, AppError)> {
    referral.check_completable(now).map_err(|e| {
        let next = referral
            .is_past_expiry(now)
            .then_some(ReferralStatus::Expired);
        (next, e)
    })
}

/// Only the invitee's very first completed rental triggers the reward.
pub fn qualifies_for_first_rental_reward(completed_rentals: u64) -> bool {
    completed_rentals == 1
}

pub fn referral_expiry(created_at: DateTime<Utc>, expiry_days: i64) -> DateTime<Utc> {
    created_at + Duration::days(expiry_days.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_referral_expiry_window() {
        let now = Utc::now();
        assert_eq!(referral_expiry(now, 30), now + Duration::days(30));
    }

    #[test]
    fn test_referral_expiry_has_minimum_of_one_day() {
        let now = Utc::now();
        assert_eq!(referral_expiry(now, 0), now + Duration::days(1));
    }

    fn referral(status: ReferralStatus, expires_at: DateTime<Utc>) -> referrals::Model {
        let created = expires_at - Duration::days(30);
        referrals::Model {
            id: 11,
            inviter_id: 1,
            invitee_id: 2,
            referral_code: "INVITE01".into(),
            status,
            inviter_points_awarded: 0,
            invitee_points_awarded: 0,
            first_rental_completed: false,
            completed_at: None,
            expires_at,
            created_at: created,
            updated_at: created,
        }
    }

    #[test]
    fn test_pending_referral_completes() {
        let now = Utc::now();
        let r = referral(ReferralStatus::Pending, now + Duration::days(3));
        assert!(completion_outcome(&r, now).is_ok());
    }

    #[test]
    fn test_lapsed_pending_referral_flips_to_expired() {
        let now = Utc::now();
        let r = referral(ReferralStatus::Pending, now - Duration::seconds(1));
        let (next, err) = completion_outcome(&r, now).unwrap_err();
        assert_eq!(next, Some(ReferralStatus::Expired));
        assert_eq!(err.code(), "referral_expired");
    }

    #[test]
    fn test_closed_referrals_keep_their_status() {
        let now = Utc::now();
        let done = referral(ReferralStatus::Completed, now - Duration::days(1));
        let (next, err) = completion_outcome(&done, now).unwrap_err();
        assert_eq!(next, None);
        assert_eq!(err.code(), "referral_already_completed");

        let expired = referral(ReferralStatus::Expired, now - Duration::days(1));
        let (next, err) = completion_outcome(&expired, now).unwrap_err();
        assert_eq!(next, None);
        assert_eq!(err.code(), "referral_expired");
    }

    #[test]
    fn test_only_first_completed_rental_qualifies() {
        assert!(!qualifies_for_first_rental_reward(0));
        assert!(qualifies_for_first_rental_reward(1));
        assert!(!qualifies_for_first_rental_reward(2));
    }
}
