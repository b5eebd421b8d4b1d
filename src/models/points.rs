use crate::entities::{
    PointsSource, PointsTransactionType, points_transaction_entity, user_points_entity,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PointsSummaryResponse {
    pub current_points: i64,
    pub total_points: i64,
    pub last_updated: DateTime<Utc>,
}

impl From<user_points_entity::Model> for PointsSummaryResponse {
    fn from(p: user_points_entity::Model) -> Self {
        Self {
            current_points: p.current_points,
            total_points: p.total_points,
            last_updated: p.last_updated,
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct PointsHistoryQuery {
    pub page: Option<u64>,
    pub page_size: Option<u64>,
    /// EARNED, SPENT or ADJUSTMENT
    pub transaction_type: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PointsTransactionResponse {
    pub id: i64,
    pub transaction_type: PointsTransactionType,
    pub source: PointsSource,
    pub points: i64,
    pub balance_before: i64,
    pub balance_after: i64,
    pub description: String,
    pub related_rental_id: Option<i64>,
    pub related_referral_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl From<points_transaction_entity::Model> for PointsTransactionResponse {
    fn from(t: points_transaction_entity::Model) -> Self {
        Self {
            id: t.id,
            transaction_type: t.transaction_type,
            source: t.source,
            points: t.points,
            balance_before: t.balance_before,
            balance_after: t.balance_after,
            description: t.description,
            related_rental_id: t.related_rental_id,
            related_referral_id: t.related_referral_id,
            created_at: t.created_at,
        }
    }
}

/// Points exchanged for wallet credit.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RedeemPointsRequest {
    #[schema(example = 200)]
    pub points: i64,
}

/// Staff correction; `points` is signed.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AdjustPointsRequest {
    #[schema(example = -20)]
    pub points: i64,
    #[schema(example = "Duplicate signup bonus")]
    pub reason: String,
}
