use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema, DeriveActiveEnum, EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "String(Some(16))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PointsTransactionType {
    #[sea_orm(string_value = "EARNED")]
    Earned,
    #[sea_orm(string_value = "SPENT")]
    Spent,
    #[sea_orm(string_value = "ADJUSTMENT")]
    Adjustment,
}

impl PointsTransactionType {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.to_ascii_uppercase().as_str() {
            "EARNED" => Some(PointsTransactionType::Earned),
            "SPENT" => Some(PointsTransactionType::Spent),
            "ADJUSTMENT" => Some(PointsTransactionType::Adjustment),
            _ => None,
        }
    }
}

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema, DeriveActiveEnum, EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "String(Some(32))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PointsSource {
    #[sea_orm(string_value = "SIGNUP")]
    Signup,
    #[sea_orm(string_value = "REFERRAL_INVITER")]
    ReferralInviter,
    #[sea_orm(string_value = "REFERRAL_INVITEE")]
    ReferralInvitee,
    #[sea_orm(string_value = "RENTAL_COMPLETE")]
    RentalComplete,
    #[sea_orm(string_value = "TOPUP")]
    Topup,
    #[sea_orm(string_value = "REDEMPTION")]
    Redemption,
    #[sea_orm(string_value = "ADMIN_ADJUSTMENT")]
    AdminAdjustment,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "points_transactions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub user_id: i64,
    pub transaction_type: PointsTransactionType,
    pub source: PointsSource,
    /// Signed change: positive for earned, negative for spent.
    pub points: i64,
    pub balance_before: i64,
    pub balance_after: i64,
    pub description: String,
    pub related_rental_id: Option<i64>,
    pub related_referral_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
