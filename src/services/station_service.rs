use crate::entities::{
    PowerBankStatus, SlotStatus, StationStatus, power_bank_entity as power_banks,
    rental_package_entity as packages, station_entity as stations,
    station_slot_entity as slots,
};
use crate::error::{AppError, AppResult};
use crate::models::*;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};

/// Rentable banks at a station: AVAILABLE banks sitting in OCCUPIED slots,
/// highest battery first, lower slot number on ties.
pub fn rentable_power_banks<'a>(
    station_slots: &'a [slots::Model],
    banks: &'a [power_banks::Model],
) -> Vec<(&'a slots::Model, &'a power_banks::Model)> {
    let mut candidates: Vec<_> = station_slots
        .iter()
        .filter(|s| s.status == SlotStatus::Occupied)
        .filter_map(|s| {
            let bank_id = s.power_bank_id?;
            banks
                .iter()
                .find(|b| b.id == bank_id && b.status == PowerBankStatus::Available)
                .map(|b| (s, b))
        })
        .collect();
    candidates.sort_by(|a, b| {
        b.1.battery_level
            .cmp(&a.1.battery_level)
            .then(a.0.slot_number.cmp(&b.0.slot_number))
    });
    candidates
}

#[derive(Clone)]
pub struct StationService {
    pool: DatabaseConnection,
}

impl StationService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    pub async fn list_stations(
        &self,
        query: &StationListQuery,
    ) -> AppResult<PaginatedResponse<StationResponse>> {
        let params = PaginationParams::new(query.page, query.page_size);

        let mut select = stations::Entity::find();
        if let Some(raw) = query.status.as_deref() {
            let status = StationStatus::parse(raw).ok_or_else(|| {
                AppError::ValidationError(format!("Unknown station status: {raw}"))
            })?;
            select = select.filter(stations::Column::Status.eq(status));
        }

        let total = select.clone().count(&self.pool).await?;
        let rows = select
            .order_by_asc(stations::Column::Name)
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

    pub async fn station_detail(&self, serial: &str) -> AppResult<StationDetailResponse> {
        let station = self.find_by_serial(serial).await?;

        let station_slots = slots::Entity::find()
            .filter(slots::Column::StationId.eq(station.id))
            .order_by_asc(slots::Column::SlotNumber)
            .all(&self.pool)
            .await?;
        let banks = power_banks::Entity::find()
            .filter(power_banks::Column::CurrentStationId.eq(station.id))
            .all(&self.pool)
            .await?;

        let count = |status: SlotStatus| station_slots.iter().filter(|s| s.status == status).count();
        let available_slots = count(SlotStatus::Available);
        let occupied_slots = count(SlotStatus::Occupied);
        let maintenance_slots = count(SlotStatus::Maintenance) + count(SlotStatus::Error);

        let available_power_banks = if station.accepts_rentals() {
            rentable_power_banks(&station_slots, &banks)
                .into_iter()
                .map(|(_, bank)| PowerBankResponse::from(bank.clone()))
                .collect()
        } else {
            Vec::new()
        };

        Ok(StationDetailResponse {
            station: station.into(),
            available_slots,
            occupied_slots,
            maintenance_slots,
            slots: station_slots.into_iter().map(Into::into).collect(),
            available_power_banks,
        })
    }

    pub async fn list_packages(&self) -> AppResult<Vec<RentalPackageResponse>> {
        let rows = packages::Entity::find()
            .filter(packages::Column::IsActive.eq(true))
            .order_by_asc(packages::Column::DurationMinutes)
            .all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    pub async fn set_maintenance(&self, serial: &str, is_maintenance: bool) -> AppResult<StationResponse> {
        let station = self.find_by_serial(serial).await?;
        let mut am = station.into_active_model();
        am.is_maintenance = Set(is_maintenance);
        am.updated_at = Set(Utc::now());
        let updated = am.update(&self.pool).await?;

        log::info!(
            "Station maintenance flag set: serial={}, is_maintenance={}",
            updated.serial_number,
            is_maintenance
        );
        Ok(updated.into())
    }

    async fn find_by_serial(&self, serial: &str) -> AppResult<stations::Model> {
        stations::Entity::find()
            .filter(stations::Column::SerialNumber.eq(serial))
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Station {serial} not found")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot(number: i32, status: SlotStatus, bank: Option<i64>) -> slots::Model {
        slots::Model {
            id: i64::from(number),
            station_id: 1,
            slot_number: number,
            status,
            battery_level: 0,
            power_bank_id: bank,
            last_updated: Utc::now(),
        }
    }

    fn bank(id: i64, status: PowerBankStatus, battery: i32) -> power_banks::Model {
        power_banks::Model {
            id,
            serial_number: format!("PB-{id}"),
            model: "CG-10K".into(),
            capacity_mah: 10_000,
            status,
            battery_level: battery,
            current_station_id: Some(1),
            current_slot_id: None,
            last_updated: Utc::now(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_highest_battery_wins() {
        let s = vec![
            slot(1, SlotStatus::Occupied, Some(10)),
            slot(2, SlotStatus::Occupied, Some(11)),
            slot(3, SlotStatus::Occupied, Some(12)),
        ];
        let b = vec![
            bank(10, PowerBankStatus::Available, 40),
            bank(11, PowerBankStatus::Available, 95),
            bank(12, PowerBankStatus::Rented, 100),
        ];
        let picked = rentable_power_banks(&s, &b);
        assert_eq!(picked.len(), 2);
        assert_eq!(picked[0].1.id, 11);
        assert_eq!(picked[0].0.slot_number, 2);
    }

    #[test]
    fn test_tie_prefers_lower_slot() {
        let s = vec![
            slot(4, SlotStatus::Occupied, Some(20)),
            slot(2, SlotStatus::Occupied, Some(21)),
        ];
        let b = vec![
            bank(20, PowerBankStatus::Available, 80),
            bank(21, PowerBankStatus::Available, 80),
        ];
        assert_eq!(rentable_power_banks(&s, &b)[0].0.slot_number, 2);
    }

    #[test]
    fn test_slots_in_error_are_skipped() {
        let s = vec![
            slot(1, SlotStatus::Error, Some(30)),
            slot(2, SlotStatus::Available, None),
        ];
        let b = vec![bank(30, PowerBankStatus::Available, 90)];
        assert!(rentable_power_banks(&s, &b).is_empty());
    }
}
