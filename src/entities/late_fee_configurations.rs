use crate::error::{AppError, AppResult};
use chrono::{DateTime, Utc};
use rust_decimal::RoundingStrategy;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema, DeriveActiveEnum, EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "String(Some(16))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LateFeeType {
    /// normal rate x multiplier per overdue minute
    #[sea_orm(string_value = "MULTIPLIER")]
    Multiplier,
    /// fixed amount per overdue hour
    #[sea_orm(string_value = "FLAT_RATE")]
    FlatRate,
    /// multiplier part + flat part
    #[sea_orm(string_value = "COMPOUND")]
    Compound,
}

impl std::fmt::Display for LateFeeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LateFeeType::Multiplier => write!(f, "MULTIPLIER"),
            LateFeeType::FlatRate => write!(f, "FLAT_RATE"),
            LateFeeType::Compound => write!(f, "COMPOUND"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "late_fee_configurations")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub name: String,
    pub fee_type: LateFeeType,
    pub multiplier: Decimal,
    pub flat_rate_per_hour: Decimal,
    pub grace_period_minutes: i32,
    pub max_daily_rate: Option<Decimal>,
    pub is_active: bool,
    pub applicable_package_types: Json,
    pub metadata: Json,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Model {
    /// Policy used when no configuration is active: 2x the normal rate, no
    /// grace period, no cap. Never persisted (id 0).
    pub fn builtin_default() -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            name: "Default".to_string(),
            fee_type: LateFeeType::Multiplier,
            multiplier: Decimal::new(20, 1),
            flat_rate_per_hour: Decimal::ZERO,
            grace_period_minutes: 0,
            max_daily_rate: None,
            is_active: false,
            applicable_package_types: Json::Array(vec![]),
            metadata: Json::Object(Default::default()),
            created_at: now,
            updated_at: now,
        }
    }

    /// Late fee for a rental returned `overdue_minutes` after its due time.
    ///
    /// The grace period is subtracted first; the optional daily cap is applied
    /// pro rata over the effective overdue hours. Result is rounded to paisa
    /// (2 decimal places).
    pub fn calculate_late_fee(
        &self,
        normal_rate_per_minute: Decimal,
        overdue_minutes: i64,
    ) -> AppResult<Decimal> {
        let effective = overdue_minutes
            .saturating_sub(i64::from(self.grace_period_minutes))
            .max(0);
        if effective == 0 {
            return Ok(Decimal::ZERO);
        }

        let minutes = Decimal::from(effective);
        let hours = minutes / Decimal::from(60);

        let multiplier_part = normal_rate_per_minute
            .checked_mul(self.multiplier)
            .and_then(|v| v.checked_mul(minutes));
        let flat_part = self.flat_rate_per_hour.checked_mul(hours);

        let fee = match self.fee_type {
            LateFeeType::Multiplier => multiplier_part,
            LateFeeType::FlatRate => flat_part,
            LateFeeType::Compound => multiplier_part
                .zip(flat_part)
                .and_then(|(m, f)| m.checked_add(f)),
        };
        let mut fee = fee.ok_or_else(fee_overflow)?;

        if let Some(max_daily) = self.max_daily_rate {
            let cap = (max_daily / Decimal::from(24))
                .checked_mul(hours)
                .ok_or_else(fee_overflow)?;
            fee = fee.min(cap);
        }

        Ok(fee.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
    }

    /// Human readable summary, e.g. "2.0x normal rate after 15 min grace period".
    pub fn get_description(&self) -> String {
        let mut multiplier = self.multiplier.round_dp(1);
        multiplier.rescale(1);
        let mut flat = self.flat_rate_per_hour.round_dp(2);
        flat.rescale(2);

        let mut description = match self.fee_type {
            LateFeeType::Multiplier => format!("{multiplier}x normal rate"),
            LateFeeType::FlatRate => format!("NPR {flat} per overdue hour"),
            LateFeeType::Compound => {
                format!("{multiplier}x normal rate + NPR {flat} per overdue hour")
            }
        };

        if self.grace_period_minutes > 0 {
            description.push_str(&format!(
                " after {} min grace period",
                self.grace_period_minutes
            ));
        }
        if let Some(max_daily) = self.max_daily_rate {
            let mut max_daily = max_daily.round_dp(2);
            max_daily.rescale(2);
            description.push_str(&format!(", capped at NPR {max_daily}/day"));
        }
        description
    }
}

fn fee_overflow() -> AppError {
    AppError::service("late_fee_overflow", "Late fee exceeds the representable range")
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(fee_type: LateFeeType) -> Model {
        Model {
            fee_type,
            ..Model::builtin_default()
        }
    }

    fn dec(n: i64) -> Decimal {
        Decimal::from(n)
    }

    #[test]
    fn test_zero_overdue_is_free_for_any_grace() {
        for grace in [0, 5, 15, 120] {
            let cfg = Model {
                grace_period_minutes: grace,
                ..config(LateFeeType::Multiplier)
            };
            assert_eq!(cfg.calculate_late_fee(dec(2), 0).unwrap(), Decimal::ZERO);
        }
    }

    #[test]
    fn test_grace_period_longer_than_overdue() {
        let cfg = Model {
            grace_period_minutes: 15,
            ..config(LateFeeType::Multiplier)
        };
        assert_eq!(cfg.calculate_late_fee(dec(2), 10).unwrap(), Decimal::ZERO);
        assert_eq!(cfg.calculate_late_fee(dec(2), 15).unwrap(), Decimal::ZERO);
        // one minute past grace: 2 * 2.0 * 1
        assert_eq!(cfg.calculate_late_fee(dec(2), 16).unwrap(), dec(4));
    }

    #[test]
    fn test_negative_overdue_is_free() {
        let cfg = config(LateFeeType::Compound);
        assert_eq!(cfg.calculate_late_fee(dec(2), -30).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn test_multiplier_fee() {
        let cfg = config(LateFeeType::Multiplier);
        assert_eq!(cfg.multiplier, Decimal::new(20, 1));
        assert_eq!(cfg.calculate_late_fee(dec(2), 60).unwrap(), dec(240));
    }

    #[test]
    fn test_flat_rate_fee() {
        let cfg = Model {
            flat_rate_per_hour: dec(100),
            ..config(LateFeeType::FlatRate)
        };
        assert_eq!(cfg.calculate_late_fee(dec(2), 120).unwrap(), dec(200));
        // 90 minutes -> 1.5 hours
        assert_eq!(cfg.calculate_late_fee(dec(2), 90).unwrap(), dec(150));
    }

    #[test]
    fn test_compound_fee_sums_both_parts() {
        let cfg = Model {
            flat_rate_per_hour: dec(100),
            ..config(LateFeeType::Compound)
        };
        // 240 (multiplier) + 100 (one flat hour)
        assert_eq!(cfg.calculate_late_fee(dec(2), 60).unwrap(), dec(340));
    }

    #[test]
    fn test_daily_cap_applies_pro_rata() {
        let cfg = Model {
            max_daily_rate: Some(dec(240)),
            ..config(LateFeeType::Multiplier)
        };
        // uncapped 240, cap = 240 / 24 * 1h = 10
        assert_eq!(cfg.calculate_late_fee(dec(2), 60).unwrap(), dec(10));
        // 2h -> cap 20
        assert_eq!(cfg.calculate_late_fee(dec(2), 120).unwrap(), dec(20));
    }

    #[test]
    fn test_daily_cap_not_reached() {
        let cfg = Model {
            max_daily_rate: Some(dec(24_000)),
            ..config(LateFeeType::Multiplier)
        };
        assert_eq!(cfg.calculate_late_fee(dec(2), 60).unwrap(), dec(240));
    }

    #[test]
    fn test_grace_then_cap() {
        let cfg = Model {
            grace_period_minutes: 30,
            max_daily_rate: Some(dec(480)),
            ..config(LateFeeType::Multiplier)
        };
        // effective 60 min, uncapped 240, cap 480 / 24 * 1 = 20
        assert_eq!(cfg.calculate_late_fee(dec(2), 90).unwrap(), dec(20));
    }

    #[test]
    fn test_result_rounded_to_two_places() {
        let cfg = Model {
            flat_rate_per_hour: dec(100),
            ..config(LateFeeType::FlatRate)
        };
        // 100 * 7 / 60 = 11.666..
        assert_eq!(cfg.calculate_late_fee(dec(2), 7).unwrap(), Decimal::new(1167, 2));
    }

    #[test]
    fn test_fractional_rate() {
        let cfg = config(LateFeeType::Multiplier);
        // 0.8333 * 2 * 30 = 49.998
        assert_eq!(
            cfg.calculate_late_fee(Decimal::new(8333, 4), 30).unwrap(),
            Decimal::new(5000, 2)
        );
    }

    #[test]
    fn test_description_formats_multiplier() {
        let cfg = Model {
            grace_period_minutes: 15,
            ..config(LateFeeType::Multiplier)
        };
        assert_eq!(cfg.get_description(), "2.0x normal rate after 15 min grace period");
    }

    #[test]
    fn test_description_compound_with_cap() {
        let cfg = Model {
            multiplier: Decimal::new(150, 2),
            flat_rate_per_hour: dec(25),
            max_daily_rate: Some(dec(500)),
            ..config(LateFeeType::Compound)
        };
        assert_eq!(
            cfg.get_description(),
            "1.5x normal rate + NPR 25.00 per overdue hour, capped at NPR 500.00/day"
        );
    }

    #[test]
    fn test_description_flat_rate() {
        let cfg = Model {
            flat_rate_per_hour: Decimal::new(505, 1),
            ..config(LateFeeType::FlatRate)
        };
        assert_eq!(cfg.get_description(), "NPR 50.50 per overdue hour");
    }

    #[test]
    fn test_huge_inputs_report_overflow() {
        let cfg = config(LateFeeType::Multiplier);
        let err = cfg
            .calculate_late_fee(dec(100_000_000_000), 9_000_000_000_000_000_000)
            .unwrap_err();
        assert_eq!(err.code(), "late_fee_overflow");

        let cfg = Model {
            grace_period_minutes: 10,
            ..config(LateFeeType::Multiplier)
        };
        assert_eq!(cfg.calculate_late_fee(dec(2), i64::MIN).unwrap(), Decimal::ZERO);
    }
}
