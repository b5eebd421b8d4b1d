use crate::entities::{
    PointsSource, PointsTransactionType, points_transaction_entity as points_tx,
    user_points_entity as accounts,
};
use crate::error::{AppError, AppResult};
use crate::models::{
    PaginatedResponse, PaginationParams, PointsHistoryQuery, PointsSummaryResponse,
    PointsTransactionResponse,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    IntoActiveModel, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};

/// What a ledger row is for; the amount is passed separately.
#[derive(Debug, Clone)]
pub struct PointsEntry {
    pub source: PointsSource,
    pub description: String,
    pub related_rental_id: Option<i64>,
    pub related_referral_id: Option<i64>,
}

impl PointsEntry {
    pub fn new(source: PointsSource, description: impl Into<String>) -> Self {
        Self {
            source,
            description: description.into(),
            related_rental_id: None,
            related_referral_id: None,
        }
    }

    pub fn rental(mut self, rental_id: i64) -> Self {
        self.related_rental_id = Some(rental_id);
        self
    }

    pub fn referral(mut self, referral_id: i64) -> Self {
        self.related_referral_id = Some(referral_id);
        self
    }
}

/// Balance after applying `delta`. Only admin adjustments may go below zero.
pub fn next_balance(current: i64, delta: i64, allow_negative: bool) -> AppResult<i64> {
    let next = current
        .checked_add(delta)
        .ok_or_else(|| AppError::ValidationError("Points value out of range".into()))?;
    if next < 0 && !allow_negative {
        return Err(AppError::service(
            "insufficient_points",
            format!("Insufficient points: balance {current}, required {}", -delta),
        )
        .with_details(serde_json::json!({
            "current_points": current,
            "required_points": -delta,
        })));
    }
    Ok(next)
}

/// Lifetime total only grows with earned points.
pub fn next_total(total: i64, delta: i64, transaction_type: PointsTransactionType) -> i64 {
    match transaction_type {
        PointsTransactionType::Earned if delta > 0 => total.saturating_add(delta),
        _ => total,
    }
}

#[derive(Clone)]
pub struct PointsService {
    pool: DatabaseConnection,
}

impl PointsService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    pub async fn get_summary(&self, user_id: i64) -> AppResult<PointsSummaryResponse> {
        let account = accounts::Entity::find()
            .filter(accounts::Column::UserId.eq(user_id))
            .one(&self.pool)
            .await?;
        match account {
            Some(a) => Ok(a.into()),
            None => Ok(PointsSummaryResponse {
                current_points: 0,
                total_points: 0,
                last_updated: Utc::now(),
            }),
        }
    }

    pub async fn get_history(
        &self,
        user_id: i64,
        query: &PointsHistoryQuery,
    ) -> AppResult<PaginatedResponse<PointsTransactionResponse>> {
        let params = PaginationParams::new(query.page, query.page_size);

        let mut select = points_tx::Entity::find().filter(points_tx::Column::UserId.eq(user_id));
        if let Some(raw) = query.transaction_type.as_deref() {
            let tx_type = PointsTransactionType::parse(raw).ok_or_else(|| {
                AppError::ValidationError(format!("Unknown points transaction type: {raw}"))
            })?;
            select = select.filter(points_tx::Column::TransactionType.eq(tx_type));
        }

        let total = select.clone().count(&self.pool).await?;
        let rows = select
            .order_by_desc(points_tx::Column::CreatedAt)
            .order_by_desc(points_tx::Column::Id)
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

    pub async fn award_points_tx(
        &self,
        txn: &DatabaseTransaction,
        user_id: i64,
        points: i64,
        entry: PointsEntry,
    ) -> AppResult<points_tx::Model> {
        if points <= 0 {
            return Err(AppError::ValidationError(
                "Points to award must be positive".into(),
            ));
        }
        self.record_tx(txn, user_id, points, PointsTransactionType::Earned, entry, false)
            .await
    }

    /// Spends points inside the caller's transaction; never goes below zero.
    pub async fn deduct_points_tx(
        &self,
        txn: &DatabaseTransaction,
        user_id: i64,
        points: i64,
        entry: PointsEntry,
    ) -> AppResult<points_tx::Model> {
        if points <= 0 {
            return Err(AppError::ValidationError(
                "Points to deduct must be positive".into(),
            ));
        }
        self.record_tx(txn, user_id, -points, PointsTransactionType::Spent, entry, false)
            .await
    }

    /// Signed staff correction. The balance may end up negative.
    pub async fn admin_adjust(
        &self,
        user_id: i64,
        points: i64,
        reason: &str,
    ) -> AppResult<PointsTransactionResponse> {
        if points == 0 {
            return Err(AppError::ValidationError(
                "Adjustment must not be zero".into(),
            ));
        }
        if reason.trim().is_empty() {
            return Err(AppError::ValidationError(
                "Adjustment reason is required".into(),
            ));
        }

        let txn = self.pool.begin().await?;
        let row = self
            .record_tx(
                &txn,
                user_id,
                points,
                PointsTransactionType::Adjustment,
                PointsEntry::new(PointsSource::AdminAdjustment, reason.trim()),
                true,
            )
            .await?;
        txn.commit().await?;

        log::info!(
            "Points adjusted by staff: user_id={}, points={}, balance_after={}",
            user_id,
            points,
            row.balance_after
        );
        Ok(row.into())
    }

    /// Creates the points account if missing and returns it locked for update.
    pub async fn ensure_account_tx(
        &self,
        txn: &DatabaseTransaction,
        user_id: i64,
    ) -> AppResult<accounts::Model> {
        if let Some(account) = accounts::Entity::find()
            .filter(accounts::Column::UserId.eq(user_id))
            .lock_exclusive()
            .one(txn)
            .await?
        {
            return Ok(account);
        }
        let account = accounts::ActiveModel {
            user_id: Set(user_id),
            current_points: Set(0),
            total_points: Set(0),
            last_updated: Set(Utc::now()),
            ..Default::default()
        }
        .insert(txn)
        .await?;
        Ok(account)
    }

    async fn record_tx(
        &self,
        txn: &DatabaseTransaction,
        user_id: i64,
        delta: i64,
        transaction_type: PointsTransactionType,
        entry: PointsEntry,
        allow_negative: bool,
    ) -> AppResult<points_tx::Model> {
        let account = self.ensure_account_tx(txn, user_id).await?;
        let balance_before = account.current_points;
        let balance_after = next_balance(balance_before, delta, allow_negative)?;
        let total_after = next_total(account.total_points, delta, transaction_type);
        let now = Utc::now();

        let row = points_tx::ActiveModel {
            user_id: Set(user_id),
            transaction_type: Set(transaction_type),
            source: Set(entry.source),
            points: Set(delta),
            balance_before: Set(balance_before),
            balance_after: Set(balance_after),
            description: Set(entry.description),
            related_rental_id: Set(entry.related_rental_id),
            related_referral_id: Set(entry.related_referral_id),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(txn)
        .await?;

        let mut am = account.into_active_model();
        am.current_points = Set(balance_after);
        am.total_points = Set(total_after);
        am.last_updated = Set(now);
        am.update(txn).await?;

        Ok(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_award_increases_balance() {
        assert_eq!(next_balance(10, 50, false).unwrap(), 60);
    }

    #[test]
    fn test_deduct_within_balance() {
        assert_eq!(next_balance(100, -100, false).unwrap(), 0);
    }

    #[test]
    fn test_deduct_beyond_balance_fails() {
        let err = next_balance(30, -50, false).unwrap_err();
        assert_eq!(err.code(), "insufficient_points");
    }

    #[test]
    fn test_admin_adjustment_may_go_negative() {
        assert_eq!(next_balance(30, -50, true).unwrap(), -20);
    }

    #[test]
    fn test_overflow_is_rejected() {
        assert!(next_balance(i64::MAX, 1, true).is_err());
    }

    #[test]
    fn test_total_grows_only_with_awards() {
        assert_eq!(next_total(100, 50, PointsTransactionType::Earned), 150);
        assert_eq!(next_total(100, -50, PointsTransactionType::Spent), 100);
        assert_eq!(next_total(100, 40, PointsTransactionType::Adjustment), 100);
        assert_eq!(next_total(100, -40, PointsTransactionType::Adjustment), 100);
    }

    #[test]
    fn test_entry_builder() {
        let entry = PointsEntry::new(PointsSource::RentalComplete, "Rental completed")
            .rental(9)
            .referral(3);
        assert_eq!(entry.related_rental_id, Some(9));
        assert_eq!(entry.related_referral_id, Some(3));
    }
}
