use crate::entities::{
    ReferralStatus, RentalStatus, StationStatus, TransactionStatus, TransactionType,
    referral_entity as referrals, rental_entity as rentals, station_entity as stations,
    transaction_entity as transactions, user_entity as users,
};
use crate::error::AppResult;
use crate::models::DashboardResponse;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QuerySelect,
};

/// Rental and fine income minus refunds paid back the same day.
pub fn net_revenue(gross: Decimal, refunds: Decimal) -> Decimal {
    gross - refunds
}

/// Midnight UTC of the day containing `now`.
pub fn start_of_day(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive()
        .and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc())
        .unwrap_or(now)
}

#[derive(Clone)]
pub struct AdminService {
    pool: DatabaseConnection,
}

impl AdminService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    pub async fn dashboard(&self) -> AppResult<DashboardResponse> {
        let total_users = users::Entity::find().count(&self.pool).await?;
        let active_rentals = rentals::Entity::find()
            .filter(rentals::Column::Status.eq(RentalStatus::Active))
            .count(&self.pool)
            .await?;
        let overdue_rentals = rentals::Entity::find()
            .filter(rentals::Column::Status.eq(RentalStatus::Overdue))
            .count(&self.pool)
            .await?;
        let total_stations = stations::Entity::find().count(&self.pool).await?;
        let stations_online = stations::Entity::find()
            .filter(stations::Column::Status.eq(StationStatus::Online))
            .count(&self.pool)
            .await?;
        let pending_referrals = referrals::Entity::find()
            .filter(referrals::Column::Status.eq(ReferralStatus::Pending))
            .count(&self.pool)
            .await?;

        let since = start_of_day(Utc::now());
        let gross = self
            .success_total_since(&[TransactionType::Rental, TransactionType::Fine], since)
            .await?;
        let refunds = self
            .success_total_since(&[TransactionType::Refund], since)
            .await?;

        Ok(DashboardResponse {
            total_users,
            active_rentals,
            overdue_rentals,
            stations_online,
            total_stations,
            revenue_today: net_revenue(gross, refunds),
            pending_referrals,
        })
    }

    /// Sum of SUCCESS transactions of the given types created at or after `since`.
    async fn success_total_since(
        &self,
        types: &[TransactionType],
        since: DateTime<Utc>,
    ) -> AppResult<Decimal> {
        let total: Option<Option<Decimal>> = transactions::Entity::find()
            .select_only()
            .column_as(Expr::col(transactions::Column::Amount).sum(), "total")
            .filter(transactions::Column::Status.eq(TransactionStatus::Success))
            .filter(transactions::Column::TransactionType.is_in(types.iter().copied()))
            .filter(transactions::Column::CreatedAt.gte(since))
            .into_tuple()
            .one(&self.pool)
            .await?;
        Ok(total.flatten().unwrap_or(Decimal::ZERO))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_start_of_day() {
        let now = Utc.with_ymd_and_hms(2025, 10, 18, 17, 45, 12).unwrap();
        assert_eq!(
            start_of_day(now),
            Utc.with_ymd_and_hms(2025, 10, 18, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_refunds_reduce_revenue() {
        let gross = Decimal::new(50000, 2);
        assert_eq!(net_revenue(gross, Decimal::new(12050, 2)), Decimal::new(37950, 2));
        assert_eq!(net_revenue(gross, Decimal::ZERO), gross);
        assert_eq!(
            net_revenue(Decimal::ZERO, Decimal::from(40)),
            Decimal::from(-40)
        );
    }
}
