use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

/// Signed message pushed by a station.
///
/// Wire form: `{"type": "full" | "returned" | "status", "data": {...}}`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum IotMessage {
    Full(FullSyncData),
    Returned(ReturnedData),
    Status(StatusData),
}

impl IotMessage {
    pub fn kind(&self) -> &'static str {
        match self {
            IotMessage::Full(_) => "full",
            IotMessage::Returned(_) => "returned",
            IotMessage::Status(_) => "status",
        }
    }

    pub fn device_serial(&self) -> &str {
        match self {
            IotMessage::Full(d) => &d.device.serial_number,
            IotMessage::Returned(d) => &d.device_serial,
            IotMessage::Status(d) => &d.device_serial,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DeviceInfo {
    pub serial_number: String,
    pub imei: String,
    pub name: Option<String>,
    pub address: Option<String>,
    pub signal_strength: Option<i32>,
    pub wifi_ssid: Option<String>,
    pub firmware_version: Option<String>,
    pub hardware_version: Option<String>,
    pub total_slots: Option<i32>,
}

impl DeviceInfo {
    /// Hardware details kept as JSON on the station row.
    pub fn hardware_info(&self) -> Value {
        serde_json::json!({
            "signal_strength": self.signal_strength,
            "wifi_ssid": self.wifi_ssid,
            "firmware_version": self.firmware_version,
            "hardware_version": self.hardware_version,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SlotReport {
    pub slot_number: i32,
    /// AVAILABLE, OCCUPIED, MAINTENANCE or ERROR
    pub status: String,
    #[serde(default)]
    pub battery_level: i32,
    pub power_bank_serial: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PowerBankReport {
    pub serial_number: String,
    pub battery_level: i32,
    pub model: Option<String>,
    pub capacity_mah: Option<i32>,
    /// Only MAINTENANCE and DAMAGED are honoured
    pub status: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FullSyncData {
    pub device: DeviceInfo,
    #[serde(default)]
    pub slots: Vec<SlotReport>,
    #[serde(default)]
    pub power_banks: Vec<PowerBankReport>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReturnedData {
    pub device_serial: String,
    pub slot_number: i32,
    pub power_bank_serial: String,
    pub battery_level: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StatusData {
    pub device_serial: String,
    /// ONLINE, OFFLINE or MAINTENANCE
    pub status: String,
    pub last_heartbeat: Option<DateTime<Utc>>,
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct IotSyncResponse {
    pub message_type: String,
    pub station_serial: String,
    pub slots_updated: usize,
    pub power_banks_updated: usize,
    pub rentals_activated: usize,
    pub rental_completed: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_message() {
        let raw = r#"{
            "type": "full",
            "data": {
                "device": {"serial_number": "CG-001", "imei": "8612345", "signal_strength": 21},
                "slots": [
                    {"slot_number": 1, "status": "OCCUPIED", "battery_level": 90, "power_bank_serial": "PB-1"},
                    {"slot_number": 2, "status": "AVAILABLE"}
                ],
                "power_banks": [{"serial_number": "PB-1", "battery_level": 90}]
            }
        }"#;
        let msg: IotMessage = serde_json::from_str(raw).unwrap();
        assert_eq!(msg.kind(), "full");
        assert_eq!(msg.device_serial(), "CG-001");
        match msg {
            IotMessage::Full(d) => {
                assert_eq!(d.slots.len(), 2);
                assert_eq!(d.slots[1].battery_level, 0);
                assert!(d.slots[1].power_bank_serial.is_none());
                assert_eq!(d.device.hardware_info()["signal_strength"], 21);
            }
            _ => panic!("expected full sync"),
        }
    }

    #[test]
    fn test_parse_returned_message() {
        let raw = r#"{"type": "returned", "data": {"device_serial": "CG-002",
            "slot_number": 4, "power_bank_serial": "PB-9", "battery_level": 35}}"#;
        let msg: IotMessage = serde_json::from_str(raw).unwrap();
        assert_eq!(msg.kind(), "returned");
        assert_eq!(msg.device_serial(), "CG-002");
    }

    #[test]
    fn test_unknown_type_rejected() {
        let raw = r#"{"type": "reboot", "data": {}}"#;
        assert!(serde_json::from_str::<IotMessage>(raw).is_err());
    }
}
