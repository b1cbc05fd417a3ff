// (c) Meta Platforms, Inc. and affiliates.
//
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::suite::reference::{BASEBOARD_SERIAL_LEN, HEALTHY_SDR_STATES};
use crate::suite::{chassis, Check, CheckInput, Findings, Probe, Registry, Verdict};

pub(super) fn register(registry: &mut Registry) {
    registry
        .add(Check::new(
            "platform_identity",
            "Platform information is correctly set",
            platform_identity,
        ))
        .add(Check::new(
            "platform_not_virtual",
            "Platform reports physical hardware",
            platform_not_virtual,
        ))
        .add(
            Check::new(
                "chassis_status",
                "Controller chassis status is acceptable",
                chassis_status,
            )
            .physical_only(),
        )
        .add(
            Check::new(
                "bmc_root_account",
                "BMC has root account created",
                bmc_root_account,
            )
            .physical_only(),
        )
        .add(
            Check::new(
                "controller_sensors",
                "Sensor readings in controller are acceptable",
                controller_sensors,
            )
            .physical_only(),
        );
}

fn platform_identity(input: &CheckInput<'_>) -> Verdict {
    let platform = &input.snapshot.platform;
    let expected = &input.expectations.platform;
    let mut findings = Findings::new();

    findings.ensure_eq(
        "Manufacturer",
        expected.manufacturer.as_str(),
        platform.manufacturer.as_str(),
    );
    findings.ensure_eq("Product", expected.product.as_str(), platform.product.as_str());
    findings.ensure_eq(
        "SystemFamily",
        expected.system_family.as_str(),
        platform.system_family.as_str(),
    );
    findings.ensure_eq(
        "BaseboardPartNumber",
        expected.baseboard_part_number.as_str(),
        platform.baseboard_part_number.as_str(),
    );
    findings.ensure_eq(
        "ChassisType",
        expected.chassis_type.as_str(),
        platform.chassis_type.as_str(),
    );
    findings.ensure(platform.is_valid_hardware, || {
        "expected to report valid hardware".to_owned()
    });
    findings.ensure(platform.baseboard_serial != "None", || {
        "expected a value for baseboard serial, got 'None'".to_owned()
    });
    findings.ensure_eq(
        "length of baseboard serial",
        BASEBOARD_SERIAL_LEN,
        platform.baseboard_serial.chars().count(),
    );
    findings.ensure(!platform.uuid.is_empty(), || {
        "expected system UUID to not be empty".to_owned()
    });
    findings.ensure(!platform.system_serial.is_empty(), || {
        "expected system serial number to not be empty".to_owned()
    });

    findings.finish()
}

fn platform_not_virtual(input: &CheckInput<'_>) -> Verdict {
    let mut findings = Findings::new();
    findings.ensure_eq("IsVm", false, input.snapshot.platform.is_vm);
    findings.finish()
}

fn chassis_status(input: &CheckInput<'_>) -> Verdict {
    let output = input.probe_ok(&Probe::ChassisStatus)?;
    let reported = chassis::parse(&output.text());

    // only fields the BMC reports are compared
    let mut findings = Findings::new();
    for (key, expected) in &input.expectations.chassis {
        if let Some(actual) = reported.get(key) {
            findings.ensure_eq(key, expected, actual);
        }
    }
    findings.finish()
}

fn bmc_root_account(input: &CheckInput<'_>) -> Verdict {
    let output = input.probe(&Probe::BmcAccount)?;
    let mut findings = Findings::new();
    findings.ensure_eq(
        format!("BMC user {} password test", input.expectations.bmc.user_id),
        "Success",
        output.trimmed().as_str(),
    );
    findings.finish()
}

#[derive(Deserialize)]
struct SdrDump {
    #[serde(rename = "IPMISDRDUMP", default)]
    entries: Vec<Map<String, Value>>,
}

fn controller_sensors(input: &CheckInput<'_>) -> Verdict {
    let dump: SdrDump = input.probe_json(&Probe::SensorDump)?;

    let mut findings = Findings::new();
    for (idx, entry) in dump.entries.iter().enumerate() {
        let Some(health) = entry.get("Health") else {
            continue;
        };
        let health = health.as_str().unwrap_or_default();
        let name = entry
            .get("Name")
            .and_then(Value::as_str)
            .map(str::to_owned)
            .unwrap_or_else(|| format!("#{}", idx));

        findings.ensure(HEALTHY_SDR_STATES.contains(&health), || {
            format!("health of sensor {}: expected 'ok', got '{}'", name, health)
        });
    }
    findings.finish()
}
