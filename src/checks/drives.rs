// (c) Meta Platforms, Inc. and affiliates.
//
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Per-drive attribute checks over the inventory.
//!
//! Drives whose make matches the skip list are left out of every check here
//! except the total count.

use chrono::{Datelike, NaiveDateTime};

use crate::suite::context::DriveKind;
use crate::suite::inventory::{Drive, RegistrationStatus};
use crate::suite::reference::{
    BAY_INDEX_RANGE, EARLIEST_REGISTRATION_YEAR, MIN_DRIVE_CAPACITY, MIN_SERIAL_LEN,
    STORAGE_UNIT_ID_LEN, WWN_LEN,
};
use crate::suite::{Check, CheckInput, Findings, Registry, Verdict};

const REGISTRATION_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";
/// Fractional seconds and zone suffix dropped before parsing.
const REGISTRATION_TIMESTAMP_SUFFIX: usize = 5;

pub(super) fn register(registry: &mut Registry) {
    registry
        .add(Check::new(
            "drive_count",
            "Minimum number of drives is present",
            drive_count,
        ))
        .add(Check::new(
            "drive_vendor",
            "Drives come from a known vendor",
            per_drive(drive_vendor),
        ))
        .add(Check::new(
            "drive_identity",
            "Drive identifiers are well formed",
            per_drive(drive_identity),
        ))
        .add(Check::new(
            "drive_bay_index",
            "Drive bay index is in range",
            per_drive(drive_bay_index),
        ))
        .add(Check::new(
            "drive_temperature",
            "Drive temperature is acceptable",
            per_drive(drive_temperature),
        ))
        .add(Check::new(
            "drive_type",
            "Drive type is SSD or HDD",
            per_drive(drive_type),
        ))
        .add(Check::new(
            "drive_rpm",
            "Drive RPM matches its type",
            per_drive(drive_rpm),
        ))
        .add(Check::new(
            "drive_power_on",
            "Drive power-on duration is set",
            per_drive(drive_power_on),
        ))
        .add(Check::new(
            "drive_capacity",
            "Drive capacity is above the minimum",
            per_drive(drive_capacity),
        ))
        .add(Check::new(
            "drive_registration",
            "Drives are registered",
            per_drive(drive_registration),
        ));
}

/// How a drive is named in diagnostics.
pub(super) fn label(drive: &Drive) -> String {
    if drive.serial.is_empty() {
        format!("drive at {}", drive.path)
    } else {
        format!("drive {}", drive.serial)
    }
}

type DriveRule = fn(&CheckInput<'_>, &Drive, &mut Findings);

/// Lifts a single-drive rule into a check over every drive not on the skip
/// list.
fn per_drive(rule: DriveRule) -> impl Fn(&CheckInput<'_>) -> Verdict + Send + Sync + 'static {
    move |input: &CheckInput<'_>| {
        let mut findings = Findings::new();
        for drive in &input.snapshot.inventory.drives {
            if input.context.should_skip_vendor(&drive.make) {
                tracing::debug!(serial = %drive.serial, make = %drive.make, "skipping drive");
                continue;
            }
            rule(input, drive, &mut findings);
        }
        findings.finish()
    }
}

fn drive_count(input: &CheckInput<'_>) -> Verdict {
    let count = input.snapshot.inventory.drives.len();
    let minimum = input.expectations.min_drive_count;
    if count < minimum {
        return Err(format!(
            "expected a minimum of {} drives, found {}",
            minimum, count
        )
        .into());
    }
    Ok(())
}

fn drive_vendor(input: &CheckInput<'_>, drive: &Drive, findings: &mut Findings) {
    findings.ensure(input.context.is_known_vendor(&drive.make), || {
        format!("{}: unknown vendor '{}'", label(drive), drive.make)
    });
}

fn drive_identity(_: &CheckInput<'_>, drive: &Drive, findings: &mut Findings) {
    let at = label(drive);

    findings.ensure(drive.serial.len() >= MIN_SERIAL_LEN, || {
        format!(
            "{}: serial '{}' is shorter than {} characters",
            at, drive.serial, MIN_SERIAL_LEN
        )
    });
    findings.ensure(!drive.model.is_empty(), || format!("{}: model is empty", at));
    findings.ensure_eq(
        format!("path of {}", at),
        format!("/dev/rdsk/{}s0", drive.device_name),
        drive.path.clone(),
    );
    findings.ensure_eq(
        format!("length of storage unit id of {}", at),
        STORAGE_UNIT_ID_LEN,
        drive.storage_unit_id.len(),
    );
    findings.ensure_eq(format!("length of WWN of {}", at), WWN_LEN, drive.wwn.len());
}

fn drive_bay_index(_: &CheckInput<'_>, drive: &Drive, findings: &mut Findings) {
    let (low, high) = BAY_INDEX_RANGE;
    let bay = drive.hw_info.bay;
    findings.ensure((low..=high).contains(&bay), || {
        format!(
            "{}: bay {} is outside [{}, {}]",
            label(drive),
            bay,
            low,
            high
        )
    });
}

fn drive_temperature(_: &CheckInput<'_>, drive: &Drive, findings: &mut Findings) {
    let current = drive.hw_info.celsius_temperature;
    let maximum = drive.hw_info.max_functional_temp;

    findings.ensure(current >= 0, || {
        format!("{}: negative temperature {}", label(drive), current)
    });
    findings.ensure(maximum >= 0, || {
        format!("{}: negative maximum temperature {}", label(drive), maximum)
    });
    findings.ensure(current <= maximum, || {
        format!(
            "{}: temperature {} exceeds maximum {}",
            label(drive),
            current,
            maximum
        )
    });
}

fn drive_type(_: &CheckInput<'_>, drive: &Drive, findings: &mut Findings) {
    findings.ensure(DriveKind::classify(&drive.hw_info.drive_type).is_some(), || {
        format!(
            "{}: expected type ssd or hdd, got '{}'",
            label(drive),
            drive.hw_info.drive_type
        )
    });
}

/// Drives of unknown type are reported by `drive_type` alone.
fn drive_rpm(_: &CheckInput<'_>, drive: &Drive, findings: &mut Findings) {
    if let Some(kind) = DriveKind::classify(&drive.hw_info.drive_type) {
        findings.ensure_eq(
            format!("RPM of {}", label(drive)),
            kind.expected_rpm(),
            drive.hw_info.rpm,
        );
    }
}

fn drive_power_on(_: &CheckInput<'_>, drive: &Drive, findings: &mut Findings) {
    findings.ensure(drive.hw_info.power_on_duration > 0, || {
        format!(
            "{}: power-on duration {} is not positive",
            label(drive),
            drive.hw_info.power_on_duration
        )
    });
}

fn drive_capacity(_: &CheckInput<'_>, drive: &Drive, findings: &mut Findings) {
    findings.ensure(drive.os_info.capacity > MIN_DRIVE_CAPACITY, || {
        format!(
            "{}: capacity {} is not above {}",
            label(drive),
            drive.os_info.capacity,
            MIN_DRIVE_CAPACITY
        )
    });
}

fn drive_registration(input: &CheckInput<'_>, drive: &Drive, findings: &mut Findings) {
    match drive.hw_info.registration_status {
        RegistrationStatus::NotSupported => {
            findings.push(format!("{}: registration is not supported", label(drive)));
        }
        RegistrationStatus::Registered => {
            if let Err(problem) =
                registration_in_window(&drive.hw_info.registration_timestamp, input.now)
            {
                findings.push(format!("{}: {}", label(drive), problem));
            }
        }
        RegistrationStatus::Other => {}
    }
}

/// `raw` and `now` are both UTC.
fn registration_in_window(raw: &str, now: NaiveDateTime) -> Result<(), String> {
    let cut = raw.len().saturating_sub(REGISTRATION_TIMESTAMP_SUFFIX);
    let registered = raw
        .get(..cut)
        .and_then(|s| NaiveDateTime::parse_from_str(s, REGISTRATION_TIMESTAMP_FORMAT).ok())
        .ok_or_else(|| format!("unparseable registration timestamp '{}'", raw))?;

    if registered > now {
        return Err(format!("registration timestamp {} is in the future", registered));
    }
    if registered.year() < EARLIEST_REGISTRATION_YEAR {
        return Err(format!(
            "registration year {} is before {}",
            registered.year(),
            EARLIEST_REGISTRATION_YEAR
        ));
    }
    if now.year() - registered.year() > 1 {
        return Err(format!(
            "registration year {} is more than one year before {}",
            registered.year(),
            now.year()
        ));
    }
    Ok(())
}
