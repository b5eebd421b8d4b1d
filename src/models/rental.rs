use crate::entities::{RentalStatus, rental_entity};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StartRentalRequest {
    #[schema(example = "CG-KTM-0001")]
    pub station_serial: String,
    #[schema(example = 1)]
    pub package_id: i64,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct RentalListQuery {
    pub page: Option<u64>,
    pub page_size: Option<u64>,
    /// PENDING, ACTIVE, COMPLETED, CANCELLED or OVERDUE
    pub status: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RentalResponse {
    pub id: i64,
    pub rental_code: String,
    pub user_id: i64,
    pub station_id: i64,
    pub return_station_id: Option<i64>,
    pub power_bank_id: i64,
    pub package_id: i64,
    pub status: RentalStatus,
    pub amount_paid: Decimal,
    pub started_at: Option<DateTime<Utc>>,
    pub due_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    pub overdue_minutes: i64,
    pub late_fee: Decimal,
    pub late_fee_paid: bool,
    pub created_at: DateTime<Utc>,
}

impl From<rental_entity::Model> for RentalResponse {
    fn from(r: rental_entity::Model) -> Self {
        Self {
            id: r.id,
            rental_code: r.rental_code,
            user_id: r.user_id,
            station_id: r.station_id,
            return_station_id: r.return_station_id,
            power_bank_id: r.power_bank_id,
            package_id: r.package_id,
            status: r.status,
            amount_paid: r.amount_paid,
            started_at: r.started_at,
            due_at: r.due_at,
            ended_at: r.ended_at,
            overdue_minutes: r.overdue_minutes,
            late_fee: r.late_fee,
            late_fee_paid: r.late_fee_paid,
            created_at: r.created_at,
        }
    }
}
