use crate::config::IotConfig;
use crate::entities::{
    PowerBankStatus, RentalStatus, SlotStatus, StationStatus, power_bank_entity as power_banks,
    rental_entity as rentals, station_entity as stations, station_slot_entity as slots,
};
use crate::error::{AppError, AppResult};
use crate::models::{
    DeviceInfo, FullSyncData, IotMessage, IotSyncResponse, PowerBankReport, ReturnedData,
    StatusData,
};
use crate::services::RentalService;
use crate::utils::verify_signed_payload;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    IntoActiveModel, PaginatorTrait, QueryFilter, QuerySelect, Set, TransactionTrait,
};
use std::collections::{HashMap, HashSet};

const DEFAULT_POWER_BANK_MODEL: &str = "standard";
const DEFAULT_CAPACITY_MAH: i32 = 5000;

fn clamp_battery(level: i32) -> i32 {
    level.clamp(0, 100)
}

/// Status a bank should carry after being seen in a slot. Rented banks and
/// banks flagged by the device as broken keep their status.
fn docked_bank_status(current: PowerBankStatus, reported: Option<&str>) -> PowerBankStatus {
    match reported.and_then(PowerBankStatus::parse) {
        Some(s @ (PowerBankStatus::Maintenance | PowerBankStatus::Damaged)) => s,
        _ => current,
    }
}

#[derive(Clone)]
pub struct IotService {
    pool: DatabaseConnection,
    rental_service: RentalService,
    config: IotConfig,
}

impl IotService {
    pub fn new(pool: DatabaseConnection, rental_service: RentalService, config: IotConfig) -> Self {
        Self {
            pool,
            rental_service,
            config,
        }
    }

    pub fn verify_request(
        &self,
        body: &[u8],
        signature: Option<&str>,
        timestamp: Option<&str>,
    ) -> AppResult<()> {
        verify_signed_payload(
            &self.config.secret,
            body,
            signature,
            timestamp,
            self.config.timestamp_tolerance_secs,
            Utc::now().timestamp(),
        )
    }

    /// Applies one device message. All writes share a single transaction.
    pub async fn process_message(&self, message: IotMessage) -> AppResult<IotSyncResponse> {
        let kind = message.kind();
        let serial = message.device_serial().to_string();
        let now = Utc::now();

        let txn = self.pool.begin().await?;
        let mut completed_user = None;
        let mut response = match message {
            IotMessage::Full(data) => self.apply_full_sync(&txn, data, now).await?,
            IotMessage::Returned(data) => {
                let (response, user_id) = self.apply_return(&txn, data, now).await?;
                completed_user = user_id;
                response
            }
            IotMessage::Status(data) => self.apply_status(&txn, data, now).await?,
        };
        txn.commit().await?;

        if let Some(user_id) = completed_user {
            self.rental_service.after_rental_completed(user_id).await;
        }

        response.message_type = kind.to_string();
        response.station_serial = serial;
        log::info!(
            "IoT {} message applied: station={}, slots={}, power_banks={}, activated={}, completed={:?}",
            response.message_type,
            response.station_serial,
            response.slots_updated,
            response.power_banks_updated,
            response.rentals_activated,
            response.rental_completed
        );
        Ok(response)
    }

    async fn apply_full_sync(
        &self,
        txn: &DatabaseTransaction,
        data: FullSyncData,
        now: DateTime<Utc>,
    ) -> AppResult<IotSyncResponse> {
        let reported_slots = i32::try_from(data.slots.len()).unwrap_or(i32::MAX);
        let station = self
            .upsert_station_tx(txn, &data.device, reported_slots, now)
            .await?;

        let mut banks: HashMap<String, power_banks::Model> = HashMap::new();
        for report in &data.power_banks {
            let bank = self.upsert_power_bank_tx(txn, report, station.id, now).await?;
            banks.insert(bank.serial_number.clone(), bank);
        }

        let mut banks_in_slots = HashSet::new();
        for report in &data.slots {
            let status = SlotStatus::parse(&report.status).ok_or_else(|| {
                AppError::ValidationError(format!(
                    "Unknown slot status '{}' for slot {}",
                    report.status, report.slot_number
                ))
            })?;

            let bank = match report.power_bank_serial.as_deref() {
                Some(serial) => match banks.get(serial) {
                    Some(b) => Some(b.clone()),
                    None => {
                        let created = self
                            .upsert_power_bank_tx(
                                txn,
                                &PowerBankReport {
                                    serial_number: serial.to_string(),
                                    battery_level: report.battery_level,
                                    model: None,
                                    capacity_mah: None,
                                    status: None,
                                },
                                station.id,
                                now,
                            )
                            .await?;
                        banks.insert(created.serial_number.clone(), created.clone());
                        Some(created)
                    }
                },
                None => None,
            };

            let slot = self
                .upsert_slot_tx(
                    txn,
                    station.id,
                    report.slot_number,
                    status,
                    clamp_battery(report.battery_level),
                    bank.as_ref().map(|b| b.id),
                    now,
                )
                .await?;

            if let Some(bank) = bank {
                banks_in_slots.insert(bank.id);
                let mut am = bank.into_active_model();
                am.current_station_id = Set(Some(station.id));
                am.current_slot_id = Set(Some(slot.id));
                am.last_updated = Set(now);
                am.update(txn).await?;
            }
        }

        let rentals_activated = self
            .rental_service
            .activate_departed_tx(txn, station.id, &banks_in_slots, now)
            .await?;

        Ok(IotSyncResponse {
            slots_updated: data.slots.len(),
            power_banks_updated: banks.len(),
            rentals_activated,
            ..Default::default()
        })
    }

    async fn apply_return(
        &self,
        txn: &DatabaseTransaction,
        data: ReturnedData,
        now: DateTime<Utc>,
    ) -> AppResult<(IotSyncResponse, Option<i64>)> {
        let station = self.find_station_tx(txn, &data.device_serial).await?;
        let bank = power_banks::Entity::find()
            .filter(power_banks::Column::SerialNumber.eq(data.power_bank_serial.as_str()))
            .lock_exclusive()
            .one(txn)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Power bank {} not found", data.power_bank_serial))
            })?;

        let battery = clamp_battery(data.battery_level);
        let slot = self
            .upsert_slot_tx(
                txn,
                station.id,
                data.slot_number,
                SlotStatus::Occupied,
                battery,
                Some(bank.id),
                now,
            )
            .await?;

        let outcome = self
            .rental_service
            .return_rental_tx(txn, bank.id, station.id, now)
            .await?;

        // a bank still reserved by a PENDING rental stays RENTED
        let reserved = outcome.is_none()
            && rentals::Entity::find()
                .filter(rentals::Column::PowerBankId.eq(bank.id))
                .filter(rentals::Column::Status.eq(RentalStatus::Pending))
                .count(txn)
                .await?
                > 0;
        let status = match bank.status {
            PowerBankStatus::Maintenance | PowerBankStatus::Damaged => bank.status,
            _ if reserved => PowerBankStatus::Rented,
            _ => PowerBankStatus::Available,
        };

        let mut am = bank.into_active_model();
        am.status = Set(status);
        am.battery_level = Set(battery);
        am.current_station_id = Set(Some(station.id));
        am.current_slot_id = Set(Some(slot.id));
        am.last_updated = Set(now);
        am.update(txn).await?;

        if outcome.is_none() {
            log::warn!(
                "Power bank {} returned to {} without an open rental",
                data.power_bank_serial,
                station.serial_number
            );
        }

        let user_id = outcome.as_ref().map(|o| o.rental.user_id);
        Ok((
            IotSyncResponse {
                slots_updated: 1,
                power_banks_updated: 1,
                rental_completed: outcome.map(|o| o.rental.rental_code),
                ..Default::default()
            },
            user_id,
        ))
    }

    async fn apply_status(
        &self,
        txn: &DatabaseTransaction,
        data: StatusData,
        now: DateTime<Utc>,
    ) -> AppResult<IotSyncResponse> {
        let status = StationStatus::parse(&data.status).ok_or_else(|| {
            AppError::ValidationError(format!("Unknown station status: {}", data.status))
        })?;
        let station = self.find_station_tx(txn, &data.device_serial).await?;

        let mut am = station.into_active_model();
        am.status = Set(status);
        am.last_heartbeat = Set(Some(data.last_heartbeat.unwrap_or(now)));
        am.updated_at = Set(now);
        am.update(txn).await?;

        Ok(IotSyncResponse::default())
    }

    async fn find_station_tx(
        &self,
        txn: &DatabaseTransaction,
        serial: &str,
    ) -> AppResult<stations::Model> {
        stations::Entity::find()
            .filter(stations::Column::SerialNumber.eq(serial))
            .lock_exclusive()
            .one(txn)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Station {serial} not found")))
    }

    async fn upsert_station_tx(
        &self,
        txn: &DatabaseTransaction,
        device: &DeviceInfo,
        reported_slots: i32,
        now: DateTime<Utc>,
    ) -> AppResult<stations::Model> {
        let existing = stations::Entity::find()
            .filter(stations::Column::SerialNumber.eq(device.serial_number.as_str()))
            .lock_exclusive()
            .one(txn)
            .await?;

        let station = match existing {
            Some(station) => {
                let total_slots = device
                    .total_slots
                    .unwrap_or(station.total_slots.max(reported_slots));
                let mut am = station.into_active_model();
                am.imei = Set(device.imei.clone());
                if let Some(name) = &device.name {
                    am.name = Set(name.clone());
                }
                if let Some(address) = &device.address {
                    am.address = Set(address.clone());
                }
                am.total_slots = Set(total_slots);
                am.status = Set(StationStatus::Online);
                am.last_heartbeat = Set(Some(now));
                am.hardware_info = Set(Some(device.hardware_info()));
                am.updated_at = Set(now);
                am.update(txn).await?
            }
            None => {
                log::info!("Registering new station from sync: {}", device.serial_number);
                stations::ActiveModel {
                    serial_number: Set(device.serial_number.clone()),
                    imei: Set(device.imei.clone()),
                    name: Set(device.name.clone().unwrap_or_else(|| device.serial_number.clone())),
                    address: Set(device.address.clone().unwrap_or_default()),
                    total_slots: Set(device.total_slots.unwrap_or(reported_slots)),
                    status: Set(StationStatus::Online),
                    is_maintenance: Set(false),
                    last_heartbeat: Set(Some(now)),
                    hardware_info: Set(Some(device.hardware_info())),
                    created_at: Set(now),
                    updated_at: Set(now),
                    ..Default::default()
                }
                .insert(txn)
                .await?
            }
        };
        Ok(station)
    }

    async fn upsert_power_bank_tx(
        &self,
        txn: &DatabaseTransaction,
        report: &PowerBankReport,
        station_id: i64,
        now: DateTime<Utc>,
    ) -> AppResult<power_banks::Model> {
        let existing = power_banks::Entity::find()
            .filter(power_banks::Column::SerialNumber.eq(report.serial_number.as_str()))
            .lock_exclusive()
            .one(txn)
            .await?;

        let bank = match existing {
            Some(bank) => {
                let status = docked_bank_status(bank.status, report.status.as_deref());
                let mut am = bank.into_active_model();
                am.status = Set(status);
                am.battery_level = Set(clamp_battery(report.battery_level));
                if let Some(model) = &report.model {
                    am.model = Set(model.clone());
                }
                if let Some(capacity) = report.capacity_mah {
                    am.capacity_mah = Set(capacity);
                }
                am.current_station_id = Set(Some(station_id));
                am.last_updated = Set(now);
                am.update(txn).await?
            }
            None => {
                power_banks::ActiveModel {
                    serial_number: Set(report.serial_number.clone()),
                    model: Set(report
                        .model
                        .clone()
                        .unwrap_or_else(|| DEFAULT_POWER_BANK_MODEL.to_string())),
                    capacity_mah: Set(report.capacity_mah.unwrap_or(DEFAULT_CAPACITY_MAH)),
                    status: Set(docked_bank_status(
                        PowerBankStatus::Available,
                        report.status.as_deref(),
                    )),
                    battery_level: Set(clamp_battery(report.battery_level)),
                    current_station_id: Set(Some(station_id)),
                    last_updated: Set(now),
                    created_at: Set(now),
                    ..Default::default()
                }
                .insert(txn)
                .await?
            }
        };
        Ok(bank)
    }

    #[allow(clippy::too_many_arguments)]
    async fn upsert_slot_tx(
        &self,
        txn: &DatabaseTransaction,
        station_id: i64,
        slot_number: i32,
        status: SlotStatus,
        battery_level: i32,
        power_bank_id: Option<i64>,
        now: DateTime<Utc>,
    ) -> AppResult<slots::Model> {
        let existing = slots::Entity::find()
            .filter(slots::Column::StationId.eq(station_id))
            .filter(slots::Column::SlotNumber.eq(slot_number))
            .one(txn)
            .await?;

        let slot = match existing {
            Some(slot) => {
                let mut am = slot.into_active_model();
                am.status = Set(status);
                am.battery_level = Set(battery_level);
                am.power_bank_id = Set(power_bank_id);
                am.last_updated = Set(now);
                am.update(txn).await?
            }
            None => {
                slots::ActiveModel {
                    station_id: Set(station_id),
                    slot_number: Set(slot_number),
                    status: Set(status),
                    battery_level: Set(battery_level),
                    power_bank_id: Set(power_bank_id),
                    last_updated: Set(now),
                    ..Default::default()
                }
                .insert(txn)
                .await?
            }
        };
        Ok(slot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_battery_is_clamped() {
        assert_eq!(clamp_battery(-4), 0);
        assert_eq!(clamp_battery(57), 57);
        assert_eq!(clamp_battery(140), 100);
    }

    #[test]
    fn test_docked_bank_keeps_rented_status() {
        assert_eq!(
            docked_bank_status(PowerBankStatus::Rented, None),
            PowerBankStatus::Rented
        );
        assert_eq!(
            docked_bank_status(PowerBankStatus::Rented, Some("AVAILABLE")),
            PowerBankStatus::Rented
        );
    }

    #[test]
    fn test_device_can_flag_damage() {
        assert_eq!(
            docked_bank_status(PowerBankStatus::Available, Some("damaged")),
            PowerBankStatus::Damaged
        );
        assert_eq!(
            docked_bank_status(PowerBankStatus::Available, Some("MAINTENANCE")),
            PowerBankStatus::Maintenance
        );
    }
}
