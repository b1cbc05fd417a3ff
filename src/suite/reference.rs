// (c) Meta Platforms, Inc. and affiliates.
//
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Compiled-in reference data about supported hardware.

/// Enclosure part number to number of drive bays. Head units carry no bays.
pub const ENCLOSURE_BAY_COUNTS: &[(&str, usize)] = &[
    ("H4060-J", 60),
    ("SP-3424-E12EBD", 24),
    ("SBX24LC-ECEBD", 24),
    ("GXY124S2V", 0),
    ("GXY108S2V", 0),
];

/// Drive vendors qualified for data pools, lowercase.
pub const KNOWN_VENDORS: &[&str] = &["hgst", "hitachi", "seagate"];

/// Vendor substrings of devices never used for data pools, lowercase.
pub const SKIP_VENDORS: &[&str] = &["ata"];

/// Largest shelf has 84 bays.
pub const BAY_INDEX_RANGE: (i64, i64) = (0, 83);

pub const HDD_NOMINAL_RPM: i64 = 7200;
pub const SSD_RPM: i64 = 0;

pub const MIN_DRIVE_CAPACITY: u64 = 100 << 30;
pub const MIN_SERIAL_LEN: usize = 8;
pub const WWN_LEN: usize = 16;
pub const STORAGE_UNIT_ID_LEN: usize = 16;
pub const BASEBOARD_SERIAL_LEN: usize = 12;

/// Nothing was registered before this year.
pub const EARLIEST_REGISTRATION_YEAR: i32 = 2017;

/// Host identifier reported when no license is installed.
pub const UNLICENSED_HOST: &str = "0000-0000-0000-0000-00000-0000-00000-0000-00000";

/// Acceptable bay and enclosure sensor states.
pub const HEALTHY_SLOT_STATES: &[&str] = &["OK", "NotInstalled"];

/// Acceptable BMC sensor health values; `ns` means "not specified".
pub const HEALTHY_SDR_STATES: &[&str] = &["ok", "ns"];

pub const POWER_SUPPLY_SENSORS: &[&str] = &["PS1", "PS2"];
pub const POWER_SENSOR_TYPE: &str = "Power";

/// Kernel log lines mentioning this device are a known false positive.
pub const KERNEL_LOG_IGNORED_DEVICE: &str = "ddrx104";

pub fn expected_bay_count(model: &str) -> Option<usize> {
    ENCLOSURE_BAY_COUNTS
        .iter()
        .find(|(m, _)| *m == model)
        .map(|(_, count)| *count)
}
