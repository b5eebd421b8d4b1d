use chrono::{DateTime, Utc};
use rust_decimal::RoundingStrategy;
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "rental_packages")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub name: String,
    pub duration_minutes: i32,
    pub price: Decimal,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Model {
    /// Normal per-minute rate, the base for late fee calculation.
    pub fn rate_per_minute(&self) -> Decimal {
        if self.duration_minutes <= 0 {
            return Decimal::ZERO;
        }
        (self.price / Decimal::from(self.duration_minutes))
            .round_dp_with_strategy(4, RoundingStrategy::MidpointAwayFromZero)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn package(duration: i32, price: i64) -> Model {
        Model {
            id: 1,
            name: "test".into(),
            duration_minutes: duration,
            price: Decimal::from(price),
            is_active: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_rate_per_minute() {
        assert_eq!(package(60, 120).rate_per_minute(), Decimal::from(2));
        // 50 / 60 = 0.8333..
        assert_eq!(package(60, 50).rate_per_minute(), Decimal::new(8333, 4));
    }

    #[test]
    fn test_rate_per_minute_zero_duration() {
        assert_eq!(package(0, 50).rate_per_minute(), Decimal::ZERO);
    }
}
