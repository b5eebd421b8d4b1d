use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DashboardResponse {
    pub total_users: u64,
    pub active_rentals: u64,
    pub overdue_rentals: u64,
    pub stations_online: u64,
    pub total_stations: u64,
    /// Successful RENTAL and FINE transactions since midnight UTC
    pub revenue_today: Decimal,
    pub pending_referrals: u64,
}
