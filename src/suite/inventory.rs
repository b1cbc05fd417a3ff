// (c) Meta Platforms, Inc. and affiliates.
//
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Records parsed from the administrative services' JSON output.
//!
//! Field names follow the tools' output verbatim. Unknown fields are ignored,
//! missing required ones make the whole document malformed.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

/// Output of the inventory service's list-all query.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct Inventory {
    #[serde(rename = "Drives")]
    pub drives: Vec<Drive>,

    #[serde(rename = "Units")]
    pub units: Vec<Unit>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Drive {
    #[serde(rename = "Make")]
    pub make: String,

    #[serde(rename = "Model")]
    pub model: String,

    #[serde(rename = "Serial")]
    pub serial: String,

    #[serde(rename = "Path")]
    pub path: String,

    #[serde(rename = "DeviceName")]
    pub device_name: String,

    #[serde(rename = "StorageUnitId")]
    pub storage_unit_id: String,

    #[serde(rename = "Wwn")]
    pub wwn: String,

    #[serde(rename = "HWInfo")]
    pub hw_info: DriveHwInfo,

    #[serde(rename = "OSInfo")]
    pub os_info: DriveOsInfo,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct DriveHwInfo {
    #[serde(rename = "Bay")]
    pub bay: i64,

    #[serde(rename = "CelsiusTemperature")]
    pub celsius_temperature: i64,

    #[serde(rename = "MaxFunctionalTemp")]
    pub max_functional_temp: i64,

    #[serde(rename = "Type")]
    pub drive_type: String,

    #[serde(rename = "Rpm")]
    pub rpm: i64,

    #[serde(rename = "PowerOnDuration")]
    pub power_on_duration: i64,

    #[serde(rename = "RegistrationStatus")]
    pub registration_status: RegistrationStatus,

    #[serde(rename = "RegistrationTimestamp", default)]
    pub registration_timestamp: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub enum RegistrationStatus {
    NotSupported,
    Registered,
    #[serde(other)]
    Other,
}

/// OS-level view of a drive: capacity plus the error counters, which are
/// kept loosely typed so one odd counter does not reject the inventory.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct DriveOsInfo {
    #[serde(rename = "Capacity")]
    pub capacity: u64,

    #[serde(flatten)]
    pub fields: BTreeMap<String, Value>,
}

impl DriveOsInfo {
    pub fn counter(&self, name: &str) -> Option<i64> {
        self.fields.get(name).and_then(Value::as_i64)
    }
}

/// A chassis: the head unit or an expansion shelf.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Unit {
    #[serde(rename = "IsHeadUnit")]
    pub is_head_unit: bool,

    #[serde(rename = "PartNumber")]
    pub part_number: String,

    #[serde(rename = "Paths", default)]
    pub paths: Vec<Value>,

    #[serde(rename = "Sensors", default)]
    pub sensors: Vec<Sensor>,

    /// `null` for head units.
    #[serde(rename = "DriveBays", default)]
    pub drive_bays: Option<Vec<DriveBay>>,
}

impl Unit {
    pub fn bay_count(&self) -> usize {
        self.drive_bays.as_ref().map_or(0, Vec::len)
    }

    pub fn bays(&self) -> &[DriveBay] {
        self.drive_bays.as_deref().unwrap_or(&[])
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Sensor {
    #[serde(rename = "Name")]
    pub name: String,

    #[serde(rename = "Type")]
    pub sensor_type: String,

    #[serde(rename = "Status")]
    pub status: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct DriveBay {
    #[serde(rename = "Status")]
    pub status: String,

    #[serde(rename = "Problems", default)]
    pub problems: Option<Value>,

    #[serde(rename = "FaultLedOn")]
    pub fault_led_on: bool,

    #[serde(rename = "IdentifyLedOn")]
    pub identify_led_on: bool,

    #[serde(rename = "BayNumber")]
    pub bay_number: i64,
}

/// Output of the security service's list-all query.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct SecurityInfo {
    #[serde(rename = "Pools", default)]
    pub pools: Vec<Pool>,

    #[serde(rename = "Drives", default)]
    pub drives: Vec<SedDrive>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Pool {
    #[serde(rename = "DriveSerials", default)]
    pub drive_serials: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct SedDrive {
    #[serde(rename = "Serial")]
    pub serial: String,

    #[serde(rename = "Status")]
    pub status: String,

    #[serde(rename = "AutoUnlock")]
    pub auto_unlock: bool,

    #[serde(rename = "Rekeying")]
    pub rekeying: bool,

    #[serde(rename = "Refreshing")]
    pub refreshing: bool,

    #[serde(rename = "LastActionPending")]
    pub last_action_pending: bool,

    #[serde(rename = "ReadyStatus")]
    pub ready_status: String,

    #[serde(rename = "Problems", default)]
    pub problems: Option<Value>,
}

/// SMBIOS/BMC derived identity of the platform.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct Platform {
    #[serde(rename = "Manufacturer")]
    pub manufacturer: String,

    #[serde(rename = "Product")]
    pub product: String,

    #[serde(rename = "SystemFamily")]
    pub system_family: String,

    #[serde(rename = "BaseboardPartNumber")]
    pub baseboard_part_number: String,

    #[serde(rename = "ChassisType")]
    pub chassis_type: String,

    #[serde(rename = "IsValidHardware")]
    pub is_valid_hardware: bool,

    #[serde(rename = "BaseboardSerial")]
    pub baseboard_serial: String,

    #[serde(rename = "IsVm")]
    pub is_vm: bool,

    #[serde(rename = "Uuid")]
    pub uuid: String,

    #[serde(rename = "SystemSerial")]
    pub system_serial: String,
}
