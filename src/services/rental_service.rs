use crate::config::RewardsConfig;
use crate::entities::{
    PointsSource, PowerBankStatus, RentalStatus, TransactionType, UserStatus,
    power_bank_entity as power_banks, rental_entity as rentals,
    rental_package_entity as packages, station_entity as stations,
    station_slot_entity as slots, user_entity as users,
};
use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::services::station_service::rentable_power_banks;
use crate::services::{LateFeeService, PointsEntry, PointsService, ReferralService, WalletService};
use crate::utils::generate_rental_code;
use actix_web::http::StatusCode;
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    IntoActiveModel, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use std::collections::HashSet;

/// Result of closing a rental at a station.
#[derive(Debug, Clone)]
pub struct ReturnOutcome {
    pub rental: rentals::Model,
    pub fee_charged: bool,
}

fn invalid_state(rental: &rentals::Model, next: RentalStatus) -> AppError {
    AppError::service(
        "invalid_rental_state",
        format!("Rental {} cannot move from {} to {}", rental.rental_code, rental.status, next),
    )
    .with_status(StatusCode::CONFLICT)
}

fn ensure_transition(rental: &rentals::Model, next: RentalStatus) -> AppResult<()> {
    if rental.status.can_transition_to(next) {
        Ok(())
    } else {
        Err(invalid_state(rental, next))
    }
}

fn ensure_user_may_rent(user: &users::Model) -> AppResult<()> {
    match user.status {
        UserStatus::Active => Ok(()),
        UserStatus::Banned => Err(AppError::service("user_banned", "Account has been banned")
            .with_status(StatusCode::FORBIDDEN)),
        UserStatus::Inactive => Err(AppError::service("user_inactive", "Account is inactive")
            .with_status(StatusCode::FORBIDDEN)),
    }
}

/// Due time for a rental that starts at `started_at`.
pub fn due_time(started_at: DateTime<Utc>, duration_minutes: i32) -> DateTime<Utc> {
    started_at + Duration::minutes(i64::from(duration_minutes))
}

/// One failing rental is logged and skipped so the rest of the sweep runs.
fn stale_sweep_count(rental_id: i64, outcome: AppResult<bool>) -> u64 {
    match outcome {
        Ok(true) => 1,
        Ok(false) => 0,
        Err(e) => {
            log::error!("Failed to cancel stale rental {rental_id}: {e}");
            0
        }
    }
}

#[derive(Clone)]
pub struct RentalService {
    pool: DatabaseConnection,
    wallet_service: WalletService,
    points_service: PointsService,
    referral_service: ReferralService,
    late_fee_service: LateFeeService,
    rewards: RewardsConfig,
}

impl RentalService {
    pub fn new(
        pool: DatabaseConnection,
        wallet_service: WalletService,
        points_service: PointsService,
        referral_service: ReferralService,
        late_fee_service: LateFeeService,
        rewards: RewardsConfig,
    ) -> Self {
        Self {
            pool,
            wallet_service,
            points_service,
            referral_service,
            late_fee_service,
            rewards,
        }
    }

    /// Reserves the best power bank at a station and charges the package price.
    /// The rental stays PENDING until the station reports the bank has left.
    pub async fn start_rental(
        &self,
        user_id: i64,
        request: StartRentalRequest,
    ) -> AppResult<RentalResponse> {
        let txn = self.pool.begin().await?;

        let user = users::Entity::find_by_id(user_id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
        ensure_user_may_rent(&user)?;

        let open = rentals::Entity::find()
            .filter(rentals::Column::UserId.eq(user_id))
            .filter(rentals::Column::Status.is_in(RentalStatus::OPEN))
            .count(&txn)
            .await?;
        if open > 0 {
            return Err(
                AppError::service("active_rental_exists", "You already have an active rental")
                    .with_status(StatusCode::CONFLICT),
            );
        }

        let unpaid: Vec<rentals::Model> = rentals::Entity::find()
            .filter(rentals::Column::UserId.eq(user_id))
            .filter(rentals::Column::LateFeePaid.eq(false))
            .filter(rentals::Column::LateFee.gt(Decimal::ZERO))
            .all(&txn)
            .await?;
        if !unpaid.is_empty() {
            let total: Decimal = unpaid.iter().map(|r| r.late_fee).sum();
            return Err(AppError::service(
                "outstanding_dues",
                format!("Please pay outstanding late fees of NPR {total} first"),
            )
            .with_status(StatusCode::PAYMENT_REQUIRED)
            .with_details(serde_json::json!({
                "amount": total.to_string(),
                "rental_ids": unpaid.iter().map(|r| r.id).collect::<Vec<_>>(),
            })));
        }

        let station = stations::Entity::find()
            .filter(stations::Column::SerialNumber.eq(request.station_serial.as_str()))
            .one(&txn)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Station {} not found", request.station_serial))
            })?;
        if !station.accepts_rentals() {
            return Err(AppError::service(
                "station_unavailable",
                "Station is offline or under maintenance",
            ));
        }

        let package = packages::Entity::find_by_id(request.package_id)
            .filter(packages::Column::IsActive.eq(true))
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound("Rental package not found".to_string()))?;

        let station_slots = slots::Entity::find()
            .filter(slots::Column::StationId.eq(station.id))
            .all(&txn)
            .await?;
        let bank_ids: Vec<i64> = station_slots.iter().filter_map(|s| s.power_bank_id).collect();
        let banks = if bank_ids.is_empty() {
            Vec::new()
        } else {
            power_banks::Entity::find()
                .filter(power_banks::Column::Id.is_in(bank_ids))
                .lock_exclusive()
                .all(&txn)
                .await?
        };
        let (slot, bank) = rentable_power_banks(&station_slots, &banks)
            .first()
            .map(|(s, b)| ((*s).clone(), (*b).clone()))
            .ok_or_else(|| {
                AppError::service("no_power_bank_available", "No power bank available at this station")
            })?;

        let now = Utc::now();
        let rental = rentals::ActiveModel {
            rental_code: Set(generate_rental_code()),
            user_id: Set(user_id),
            station_id: Set(station.id),
            slot_id: Set(slot.id),
            power_bank_id: Set(bank.id),
            package_id: Set(package.id),
            status: Set(RentalStatus::Pending),
            amount_paid: Set(package.price),
            rate_per_minute: Set(package.rate_per_minute()),
            overdue_minutes: Set(0),
            late_fee: Set(Decimal::ZERO),
            late_fee_paid: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        self.wallet_service
            .debit_tx(
                &txn,
                user_id,
                package.price,
                TransactionType::Rental,
                Some(rental.id),
                &format!("Rental {} ({})", rental.rental_code, package.name),
            )
            .await?;

        let mut bank_am = bank.into_active_model();
        bank_am.status = Set(PowerBankStatus::Rented);
        bank_am.last_updated = Set(now);
        bank_am.update(&txn).await?;

        txn.commit().await?;

        log::info!(
            "Rental started: code={}, user_id={}, station={}, slot={}, power_bank_id={}",
            rental.rental_code,
            user_id,
            station.serial_number,
            slot.slot_number,
            rental.power_bank_id
        );
        Ok(rental.into())
    }

    /// PENDING -> ACTIVE once the bank is out of the station.
    pub async fn activate_rental_tx(
        &self,
        txn: &DatabaseTransaction,
        rental: rentals::Model,
        now: DateTime<Utc>,
    ) -> AppResult<rentals::Model> {
        ensure_transition(&rental, RentalStatus::Active)?;
        let package = packages::Entity::find_by_id(rental.package_id)
            .one(txn)
            .await?
            .ok_or_else(|| AppError::NotFound("Rental package not found".to_string()))?;

        let mut am = rental.into_active_model();
        am.status = Set(RentalStatus::Active);
        am.started_at = Set(Some(now));
        am.due_at = Set(Some(due_time(now, package.duration_minutes)));
        am.updated_at = Set(now);
        let active = am.update(txn).await?;

        power_banks::Entity::update_many()
            .col_expr(power_banks::Column::CurrentStationId, Expr::value(Option::<i64>::None))
            .col_expr(power_banks::Column::CurrentSlotId, Expr::value(Option::<i64>::None))
            .col_expr(power_banks::Column::LastUpdated, Expr::value(now))
            .filter(power_banks::Column::Id.eq(active.power_bank_id))
            .exec(txn)
            .await?;

        log::info!(
            "Rental activated: code={}, due_at={:?}",
            active.rental_code,
            active.due_at
        );
        Ok(active)
    }

    /// Activates PENDING rentals at `station_id` whose bank is no longer in a slot.
    pub async fn activate_departed_tx(
        &self,
        txn: &DatabaseTransaction,
        station_id: i64,
        banks_in_slots: &HashSet<i64>,
        now: DateTime<Utc>,
    ) -> AppResult<usize> {
        let pending = rentals::Entity::find()
            .filter(rentals::Column::StationId.eq(station_id))
            .filter(rentals::Column::Status.eq(RentalStatus::Pending))
            .lock_exclusive()
            .all(txn)
            .await?;

        let mut activated = 0;
        for rental in pending {
            if banks_in_slots.contains(&rental.power_bank_id) {
                continue;
            }
            self.activate_rental_tx(txn, rental, now).await?;
            activated += 1;
        }
        Ok(activated)
    }

    pub async fn cancel_rental(&self, user_id: i64, rental_id: i64) -> AppResult<RentalResponse> {
        let txn = self.pool.begin().await?;
        let rental = self.lock_user_rental(&txn, user_id, rental_id).await?;
        let cancelled = self.cancel_pending_tx(&txn, rental, "Cancelled by user").await?;
        txn.commit().await?;
        Ok(cancelled.into())
    }

    async fn cancel_pending_tx(
        &self,
        txn: &DatabaseTransaction,
        rental: rentals::Model,
        reason: &str,
    ) -> AppResult<rentals::Model> {
        ensure_transition(&rental, RentalStatus::Cancelled)?;
        let now = Utc::now();

        if rental.amount_paid > Decimal::ZERO {
            self.wallet_service
                .credit_tx(
                    txn,
                    rental.user_id,
                    rental.amount_paid,
                    TransactionType::Refund,
                    Some(rental.id),
                    &format!("Refund for rental {}: {reason}", rental.rental_code),
                )
                .await?;
        }

        power_banks::Entity::update_many()
            .col_expr(power_banks::Column::Status, Expr::value(PowerBankStatus::Available))
            .col_expr(power_banks::Column::LastUpdated, Expr::value(now))
            .filter(power_banks::Column::Id.eq(rental.power_bank_id))
            .filter(power_banks::Column::Status.eq(PowerBankStatus::Rented))
            .exec(txn)
            .await?;

        let mut am = rental.into_active_model();
        am.status = Set(RentalStatus::Cancelled);
        am.ended_at = Set(Some(now));
        am.updated_at = Set(now);
        let cancelled = am.update(txn).await?;

        log::info!(
            "Rental cancelled: code={}, refund={}, reason={}",
            cancelled.rental_code,
            cancelled.amount_paid,
            reason
        );
        Ok(cancelled)
    }

    /// Closes the open rental of a bank that was just put back into a slot.
    /// Returns `None` when the bank had no ACTIVE/OVERDUE rental.
    pub async fn return_rental_tx(
        &self,
        txn: &DatabaseTransaction,
        power_bank_id: i64,
        return_station_id: i64,
        now: DateTime<Utc>,
    ) -> AppResult<Option<ReturnOutcome>> {
        let rental = rentals::Entity::find()
            .filter(rentals::Column::PowerBankId.eq(power_bank_id))
            .filter(rentals::Column::Status.is_in([RentalStatus::Active, RentalStatus::Overdue]))
            .lock_exclusive()
            .one(txn)
            .await?;
        let Some(rental) = rental else {
            return Ok(None);
        };
        ensure_transition(&rental, RentalStatus::Completed)?;

        let overdue_minutes = rental.overdue_minutes_at(now);
        let config = self.late_fee_service.current_config(txn).await?;
        // the return itself must still go through
        let late_fee = config
            .calculate_late_fee(rental.rate_per_minute, overdue_minutes)
            .unwrap_or_else(|e| {
                log::error!(
                    "Late fee not computable: code={}, overdue_minutes={}, error={}",
                    rental.rental_code,
                    overdue_minutes,
                    e
                );
                Decimal::ZERO
            });

        let mut fee_charged = false;
        if late_fee > Decimal::ZERO {
            match self
                .wallet_service
                .debit_tx(
                    txn,
                    rental.user_id,
                    late_fee,
                    TransactionType::Fine,
                    Some(rental.id),
                    &format!(
                        "Late fee for rental {} ({} min overdue)",
                        rental.rental_code, overdue_minutes
                    ),
                )
                .await
            {
                Ok(_) => fee_charged = true,
                Err(e) if e.code() == "insufficient_balance" || e.code() == "wallet_inactive" => {
                    log::warn!(
                        "Late fee left unpaid: code={}, fee={}, reason={}",
                        rental.rental_code,
                        late_fee,
                        e.code()
                    );
                }
                Err(e) => return Err(e),
            }
        }

        let user_id = rental.user_id;
        let mut am = rental.into_active_model();
        am.status = Set(RentalStatus::Completed);
        am.return_station_id = Set(Some(return_station_id));
        am.ended_at = Set(Some(now));
        am.overdue_minutes = Set(overdue_minutes);
        am.late_fee = Set(late_fee);
        am.late_fee_paid = Set(late_fee.is_zero() || fee_charged);
        am.updated_at = Set(now);
        let completed = am.update(txn).await?;

        if self.rewards.rental_completion_points > 0 {
            self.points_service
                .award_points_tx(
                    txn,
                    user_id,
                    self.rewards.rental_completion_points,
                    PointsEntry::new(
                        PointsSource::RentalComplete,
                        format!("Rental {} completed", completed.rental_code),
                    )
                    .rental(completed.id),
                )
                .await?;
        }

        log::info!(
            "Rental completed: code={}, overdue_minutes={}, late_fee={}, fee_charged={}",
            completed.rental_code,
            overdue_minutes,
            late_fee,
            fee_charged
        );
        Ok(Some(ReturnOutcome {
            rental: completed,
            fee_charged,
        }))
    }

    /// Follow-up work once a return has been committed.
    pub async fn after_rental_completed(&self, user_id: i64) {
        match self.referral_service.process_first_rental(user_id).await {
            Ok(Some(referral)) => log::info!(
                "First rental completed referral: referral_id={}, invitee_id={}",
                referral.id,
                user_id
            ),
            Ok(None) => {}
            Err(e) => log::error!("Referral processing failed for user {user_id}: {e}"),
        }
    }

    pub async fn pay_late_fee(&self, user_id: i64, rental_id: i64) -> AppResult<RentalResponse> {
        let txn = self.pool.begin().await?;
        let rental = self.lock_user_rental(&txn, user_id, rental_id).await?;
        if !rental.has_outstanding_fee() {
            return Err(AppError::service(
                "no_outstanding_fee",
                "This rental has no unpaid late fee",
            ));
        }

        self.wallet_service
            .debit_tx(
                &txn,
                user_id,
                rental.late_fee,
                TransactionType::Fine,
                Some(rental.id),
                &format!("Late fee for rental {}", rental.rental_code),
            )
            .await?;

        let mut am = rental.into_active_model();
        am.late_fee_paid = Set(true);
        am.updated_at = Set(Utc::now());
        let paid = am.update(&txn).await?;
        txn.commit().await?;

        log::info!(
            "Late fee paid: code={}, amount={}",
            paid.rental_code,
            paid.late_fee
        );
        Ok(paid.into())
    }

    pub async fn list_rentals(
        &self,
        user_id: i64,
        query: &RentalListQuery,
    ) -> AppResult<PaginatedResponse<RentalResponse>> {
        let select = rentals::Entity::find().filter(rentals::Column::UserId.eq(user_id));
        self.paginate(select, query).await
    }

    pub async fn list_all_rentals(
        &self,
        query: &RentalListQuery,
    ) -> AppResult<PaginatedResponse<RentalResponse>> {
        self.paginate(rentals::Entity::find(), query).await
    }

    pub async fn rental_detail(&self, user_id: i64, rental_id: i64) -> AppResult<RentalResponse> {
        let rental = rentals::Entity::find_by_id(rental_id)
            .filter(rentals::Column::UserId.eq(user_id))
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Rental not found".to_string()))?;
        Ok(rental.into())
    }

    pub async fn active_rental(&self, user_id: i64) -> AppResult<Option<RentalResponse>> {
        let rental = rentals::Entity::find()
            .filter(rentals::Column::UserId.eq(user_id))
            .filter(rentals::Column::Status.is_in(RentalStatus::OPEN))
            .order_by_desc(rentals::Column::CreatedAt)
            .one(&self.pool)
            .await?;
        Ok(rental.map(Into::into))
    }

    /// ACTIVE rentals past their due time become OVERDUE.
    pub async fn mark_overdue(&self) -> AppResult<u64> {
        let now = Utc::now();
        let result = rentals::Entity::update_many()
            .col_expr(rentals::Column::Status, Expr::value(RentalStatus::Overdue))
            .col_expr(rentals::Column::UpdatedAt, Expr::value(now))
            .filter(rentals::Column::Status.eq(RentalStatus::Active))
            .filter(rentals::Column::DueAt.lt(now))
            .exec(&self.pool)
            .await?;
        Ok(result.rows_affected)
    }

    /// PENDING rentals the station never released are cancelled and refunded.
    pub async fn cancel_stale_pending(&self, timeout_minutes: i64) -> AppResult<u64> {
        let cutoff = Utc::now() - Duration::minutes(timeout_minutes.max(1));
        let stale_ids: Vec<i64> = rentals::Entity::find()
            .select_only()
            .column(rentals::Column::Id)
            .filter(rentals::Column::Status.eq(RentalStatus::Pending))
            .filter(rentals::Column::CreatedAt.lt(cutoff))
            .into_tuple()
            .all(&self.pool)
            .await?;

        let mut cancelled = 0;
        for id in stale_ids {
            cancelled += stale_sweep_count(id, self.cancel_stale_one(id).await);
        }
        Ok(cancelled)
    }

    async fn cancel_stale_one(&self, id: i64) -> AppResult<bool> {
        let txn = self.pool.begin().await?;
        let rental = rentals::Entity::find_by_id(id)
            .lock_exclusive()
            .one(&txn)
            .await?;
        match rental {
            Some(r) if r.status == RentalStatus::Pending => {
                self.cancel_pending_tx(&txn, r, "Power bank was not collected")
                    .await?;
                txn.commit().await?;
                Ok(true)
            }
            _ => {
                txn.rollback().await?;
                Ok(false)
            }
        }
    }

    async fn lock_user_rental(
        &self,
        txn: &DatabaseTransaction,
        user_id: i64,
        rental_id: i64,
    ) -> AppResult<rentals::Model> {
        rentals::Entity::find_by_id(rental_id)
            .filter(rentals::Column::UserId.eq(user_id))
            .lock_exclusive()
            .one(txn)
            .await?
            .ok_or_else(|| AppError::NotFound("Rental not found".to_string()))
    }

    async fn paginate(
        &self,
        mut select: sea_orm::Select<rentals::Entity>,
        query: &RentalListQuery,
    ) -> AppResult<PaginatedResponse<RentalResponse>> {
        let params = PaginationParams::new(query.page, query.page_size);
        if let Some(raw) = query.status.as_deref() {
            let status = RentalStatus::parse(raw).ok_or_else(|| {
                AppError::ValidationError(format!("Unknown rental status: {raw}"))
            })?;
            select = select.filter(rentals::Column::Status.eq(status));
        }

        let total = select.clone().count(&self.pool).await?;
        let rows = select
            .order_by_desc(rentals::Column::CreatedAt)
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

#[cfg(test)]
mod tests {
    use super::*;

    fn rental(status: RentalStatus) -> rentals::Model {
        let now = Utc::now();
        rentals::Model {
            id: 3,
            rental_code: "RNT-20251018-AAAAAA".into(),
            user_id: 1,
            station_id: 1,
            return_station_id: None,
            slot_id: 1,
            power_bank_id: 1,
            package_id: 1,
            status,
            amount_paid: Decimal::from(50),
            rate_per_minute: Decimal::new(8333, 4),
            started_at: None,
            due_at: None,
            ended_at: None,
            overdue_minutes: 0,
            late_fee: Decimal::ZERO,
            late_fee_paid: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_due_time_adds_package_duration() {
        let start = Utc::now();
        assert_eq!(due_time(start, 240), start + Duration::hours(4));
    }

    #[test]
    fn test_only_pending_can_be_cancelled() {
        assert!(ensure_transition(&rental(RentalStatus::Pending), RentalStatus::Cancelled).is_ok());
        let err = ensure_transition(&rental(RentalStatus::Active), RentalStatus::Cancelled)
            .unwrap_err();
        assert_eq!(err.code(), "invalid_rental_state");
        assert_eq!(err.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_completion_from_active_or_overdue() {
        assert!(ensure_transition(&rental(RentalStatus::Active), RentalStatus::Completed).is_ok());
        assert!(ensure_transition(&rental(RentalStatus::Overdue), RentalStatus::Completed).is_ok());
        assert!(
            ensure_transition(&rental(RentalStatus::Pending), RentalStatus::Completed).is_err()
        );
    }

    #[test]
    fn test_banned_user_cannot_rent() {
        let now = Utc::now();
        let user = users::Model {
            id: 1,
            email: "a@b.np".into(),
            phone: None,
            full_name: "Test".into(),
            password_hash: String::new(),
            status: UserStatus::Banned,
            is_staff: false,
            referral_code: "ABCDEFGH".into(),
            referred_by: None,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        };
        assert_eq!(ensure_user_may_rent(&user).unwrap_err().code(), "user_banned");
    }

    #[test]
    fn test_failed_stale_rental_does_not_stop_sweep() {
        let outcomes = vec![
            (1, Ok(true)),
            (
                2,
                Err(AppError::service("wallet_inactive", "Wallet is disabled")),
            ),
            (3, Ok(false)),
            (4, Ok(true)),
        ];
        let cancelled: u64 = outcomes
            .into_iter()
            .map(|(id, outcome)| stale_sweep_count(id, outcome))
            .sum();
        assert_eq!(cancelled, 2);
    }
}
