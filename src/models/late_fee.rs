use crate::entities::{LateFeeType, late_fee_config_entity};
use crate::error::{AppError, AppResult};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateLateFeeConfigRequest {
    #[schema(example = "Weekend surcharge")]
    pub name: String,
    pub fee_type: LateFeeType,
    #[schema(value_type = Option<String>, example = "2.0")]
    pub multiplier: Option<Decimal>,
    #[schema(value_type = Option<String>, example = "0")]
    pub flat_rate_per_hour: Option<Decimal>,
    pub grace_period_minutes: Option<i32>,
    #[schema(value_type = Option<String>, example = "500.00")]
    pub max_daily_rate: Option<Decimal>,
    #[schema(value_type = Option<Object>)]
    pub applicable_package_types: Option<Value>,
    #[schema(value_type = Option<Object>)]
    pub metadata: Option<Value>,
}

impl CreateLateFeeConfigRequest {
    pub fn validate(&self) -> AppResult<()> {
        if self.name.trim().is_empty() {
            return Err(AppError::ValidationError("Name is required".into()));
        }
        validate_amounts(
            self.multiplier,
            self.flat_rate_per_hour,
            self.grace_period_minutes,
            self.max_daily_rate,
        )
    }
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateLateFeeConfigRequest {
    pub name: Option<String>,
    pub fee_type: Option<LateFeeType>,
    #[schema(value_type = Option<String>)]
    pub multiplier: Option<Decimal>,
    #[schema(value_type = Option<String>)]
    pub flat_rate_per_hour: Option<Decimal>,
    pub grace_period_minutes: Option<i32>,
    #[schema(value_type = Option<String>)]
    pub max_daily_rate: Option<Decimal>,
    /// Removes the daily cap; wins over `max_daily_rate`
    pub clear_max_daily_rate: Option<bool>,
    #[schema(value_type = Option<Object>)]
    pub applicable_package_types: Option<Value>,
    #[schema(value_type = Option<Object>)]
    pub metadata: Option<Value>,
}

impl UpdateLateFeeConfigRequest {
    pub fn validate(&self) -> AppResult<()> {
        if let Some(name) = &self.name
            && name.trim().is_empty()
        {
            return Err(AppError::ValidationError("Name cannot be empty".into()));
        }
        validate_amounts(
            self.multiplier,
            self.flat_rate_per_hour,
            self.grace_period_minutes,
            self.max_daily_rate,
        )
    }
}

pub const MAX_MULTIPLIER: i64 = 100;
pub const MAX_FLAT_RATE_PER_HOUR: i64 = 100_000;
pub const MAX_DAILY_RATE: i64 = 1_000_000;
/// One year
pub const MAX_PREVIEW_OVERDUE_MINUTES: i64 = 525_600;
pub const MAX_PREVIEW_RATE_PER_MINUTE: i64 = 10_000;

fn validate_amounts(
    multiplier: Option<Decimal>,
    flat_rate_per_hour: Option<Decimal>,
    grace_period_minutes: Option<i32>,
    max_daily_rate: Option<Decimal>,
) -> AppResult<()> {
    if multiplier.is_some_and(|m| m < Decimal::ZERO) {
        return Err(AppError::ValidationError("Multiplier cannot be negative".into()));
    }
    if multiplier.is_some_and(|m| m > Decimal::from(MAX_MULTIPLIER)) {
        return Err(AppError::ValidationError(format!(
            "Multiplier cannot exceed {MAX_MULTIPLIER}"
        )));
    }
    if flat_rate_per_hour.is_some_and(|f| f < Decimal::ZERO) {
        return Err(AppError::ValidationError("Flat rate cannot be negative".into()));
    }
    if flat_rate_per_hour.is_some_and(|f| f > Decimal::from(MAX_FLAT_RATE_PER_HOUR)) {
        return Err(AppError::ValidationError(format!(
            "Flat rate cannot exceed NPR {MAX_FLAT_RATE_PER_HOUR} per hour"
        )));
    }
    if grace_period_minutes.is_some_and(|g| g < 0) {
        return Err(AppError::ValidationError("Grace period cannot be negative".into()));
    }
    if max_daily_rate.is_some_and(|m| m <= Decimal::ZERO) {
        return Err(AppError::ValidationError("Daily cap must be positive".into()));
    }
    if max_daily_rate.is_some_and(|m| m > Decimal::from(MAX_DAILY_RATE)) {
        return Err(AppError::ValidationError(format!(
            "Daily cap cannot exceed NPR {MAX_DAILY_RATE}"
        )));
    }
    Ok(())
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LateFeeConfigResponse {
    pub id: i64,
    pub name: String,
    pub fee_type: LateFeeType,
    pub multiplier: Decimal,
    pub flat_rate_per_hour: Decimal,
    pub grace_period_minutes: i32,
    pub max_daily_rate: Option<Decimal>,
    pub is_active: bool,
    #[schema(value_type = Object)]
    pub applicable_package_types: Value,
    #[schema(value_type = Object)]
    pub metadata: Value,
    /// Human readable summary of the rule
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<late_fee_config_entity::Model> for LateFeeConfigResponse {
    fn from(c: late_fee_config_entity::Model) -> Self {
        let description = c.get_description();
        Self {
            id: c.id,
            name: c.name,
            fee_type: c.fee_type,
            multiplier: c.multiplier,
            flat_rate_per_hour: c.flat_rate_per_hour,
            grace_period_minutes: c.grace_period_minutes,
            max_daily_rate: c.max_daily_rate,
            is_active: c.is_active,
            applicable_package_types: c.applicable_package_types,
            metadata: c.metadata,
            description,
            created_at: c.created_at,
            updated_at: c.updated_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LateFeePreviewRequest {
    #[schema(value_type = String, example = "0.8333")]
    pub normal_rate_per_minute: Decimal,
    #[schema(example = 90)]
    pub overdue_minutes: i64,
}

impl LateFeePreviewRequest {
    pub fn validate(&self) -> AppResult<()> {
        if self.normal_rate_per_minute < Decimal::ZERO
            || self.normal_rate_per_minute > Decimal::from(MAX_PREVIEW_RATE_PER_MINUTE)
        {
            return Err(AppError::ValidationError(format!(
                "Rate must be between 0 and {MAX_PREVIEW_RATE_PER_MINUTE}"
            )));
        }
        if !(0..=MAX_PREVIEW_OVERDUE_MINUTES).contains(&self.overdue_minutes) {
            return Err(AppError::ValidationError(format!(
                "Overdue minutes must be between 0 and {MAX_PREVIEW_OVERDUE_MINUTES}"
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LateFeePreviewResponse {
    pub config_id: i64,
    pub config_name: String,
    pub normal_rate_per_minute: Decimal,
    pub overdue_minutes: i64,
    pub late_fee: Decimal,
    pub description: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_request() -> CreateLateFeeConfigRequest {
        CreateLateFeeConfigRequest {
            name: "Standard".into(),
            fee_type: LateFeeType::Multiplier,
            multiplier: Some(Decimal::new(20, 1)),
            flat_rate_per_hour: None,
            grace_period_minutes: Some(15),
            max_daily_rate: None,
            applicable_package_types: None,
            metadata: None,
        }
    }

    #[test]
    fn test_valid_create_request() {
        assert!(create_request().validate().is_ok());
    }

    #[test]
    fn test_negative_values_rejected() {
        let mut req = create_request();
        req.multiplier = Some(Decimal::new(-1, 0));
        assert!(req.validate().is_err());

        let mut req = create_request();
        req.grace_period_minutes = Some(-5);
        assert!(req.validate().is_err());

        let mut req = create_request();
        req.max_daily_rate = Some(Decimal::ZERO);
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_blank_name_rejected() {
        let mut req = create_request();
        req.name = "  ".into();
        assert!(req.validate().is_err());

        let update = UpdateLateFeeConfigRequest {
            name: Some(String::new()),
            ..Default::default()
        };
        assert!(update.validate().is_err());
    }

    #[test]
    fn test_upper_bounds_rejected() {
        let mut req = create_request();
        req.multiplier = Some(Decimal::from(MAX_MULTIPLIER + 1));
        assert!(req.validate().is_err());

        let update = UpdateLateFeeConfigRequest {
            flat_rate_per_hour: Some(Decimal::from(MAX_FLAT_RATE_PER_HOUR + 1)),
            ..Default::default()
        };
        assert!(update.validate().is_err());

        let update = UpdateLateFeeConfigRequest {
            max_daily_rate: Some(Decimal::from(MAX_DAILY_RATE + 1)),
            ..Default::default()
        };
        assert!(update.validate().is_err());

        let mut req = create_request();
        req.multiplier = Some(Decimal::from(MAX_MULTIPLIER));
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_preview_bounds() {
        let ok = LateFeePreviewRequest {
            normal_rate_per_minute: Decimal::new(8333, 4),
            overdue_minutes: 90,
        };
        assert!(ok.validate().is_ok());

        let huge_rate = LateFeePreviewRequest {
            normal_rate_per_minute: Decimal::from(100_000_000_000i64),
            overdue_minutes: 90,
        };
        assert!(huge_rate.validate().is_err());

        let huge_overdue = LateFeePreviewRequest {
            normal_rate_per_minute: Decimal::from(2),
            overdue_minutes: 9_000_000_000_000_000_000,
        };
        assert!(huge_overdue.validate().is_err());

        let negative = LateFeePreviewRequest {
            normal_rate_per_minute: Decimal::from(2),
            overdue_minutes: -1,
        };
        assert!(negative.validate().is_err());
    }
}
