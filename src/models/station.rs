use crate::entities::{
    PowerBankStatus, SlotStatus, StationStatus, power_bank_entity, rental_package_entity,
    station_entity, station_slot_entity,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Deserialize, IntoParams)]
pub struct StationListQuery {
    pub page: Option<u64>,
    pub page_size: Option<u64>,
    /// ONLINE, OFFLINE or MAINTENANCE
    pub status: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StationResponse {
    pub id: i64,
    pub serial_number: String,
    pub name: String,
    pub address: String,
    pub latitude: Option<Decimal>,
    pub longitude: Option<Decimal>,
    pub total_slots: i32,
    pub status: StationStatus,
    pub is_maintenance: bool,
    pub last_heartbeat: Option<DateTime<Utc>>,
}

impl From<station_entity::Model> for StationResponse {
    fn from(s: station_entity::Model) -> Self {
        Self {
            id: s.id,
            serial_number: s.serial_number,
            name: s.name,
            address: s.address,
            latitude: s.latitude,
            longitude: s.longitude,
            total_slots: s.total_slots,
            status: s.status,
            is_maintenance: s.is_maintenance,
            last_heartbeat: s.last_heartbeat,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SlotResponse {
    pub slot_number: i32,
    pub status: SlotStatus,
    pub battery_level: i32,
    pub power_bank_id: Option<i64>,
}

impl From<station_slot_entity::Model> for SlotResponse {
    fn from(s: station_slot_entity::Model) -> Self {
        Self {
            slot_number: s.slot_number,
            status: s.status,
            battery_level: s.battery_level,
            power_bank_id: s.power_bank_id,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PowerBankResponse {
    pub id: i64,
    pub serial_number: String,
    pub model: String,
    pub capacity_mah: i32,
    pub status: PowerBankStatus,
    pub battery_level: i32,
}

impl From<power_bank_entity::Model> for PowerBankResponse {
    fn from(p: power_bank_entity::Model) -> Self {
        Self {
            id: p.id,
            serial_number: p.serial_number,
            model: p.model,
            capacity_mah: p.capacity_mah,
            status: p.status,
            battery_level: p.battery_level,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StationDetailResponse {
    pub station: StationResponse,
    pub available_slots: usize,
    pub occupied_slots: usize,
    pub maintenance_slots: usize,
    pub slots: Vec<SlotResponse>,
    /// Power banks that can be rented right now, best battery first
    pub available_power_banks: Vec<PowerBankResponse>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RentalPackageResponse {
    pub id: i64,
    pub name: String,
    pub duration_minutes: i32,
    pub price: Decimal,
    pub rate_per_minute: Decimal,
}

impl From<rental_package_entity::Model> for RentalPackageResponse {
    fn from(p: rental_package_entity::Model) -> Self {
        let rate_per_minute = p.rate_per_minute();
        Self {
            id: p.id,
            name: p.name,
            duration_minutes: p.duration_minutes,
            price: p.price,
            rate_per_minute,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SetMaintenanceRequest {
    pub is_maintenance: bool,
}
