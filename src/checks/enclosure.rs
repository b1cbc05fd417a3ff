// (c) Meta Platforms, Inc. and affiliates.
//
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::suite::inventory::Unit;
use crate::suite::reference::{
    self, HEALTHY_SLOT_STATES, POWER_SENSOR_TYPE, POWER_SUPPLY_SENSORS,
};
use crate::suite::{Check, CheckInput, Findings, Registry, Verdict};

pub(super) fn register(registry: &mut Registry) {
    let checks = [
        Check::new(
            "head_unit_count",
            "Exactly one head unit is present",
            head_unit_count,
        ),
        Check::new(
            "enclosure_multipath",
            "Expansion units are multipathed",
            enclosure_multipath,
        ),
        Check::new(
            "enclosure_bay_count",
            "Enclosures have the expected number of bays",
            enclosure_bay_count,
        ),
        Check::new(
            "drive_bay_state",
            "Drive bays are healthy",
            drive_bay_state,
        ),
        Check::new(
            "enclosure_sensors",
            "Enclosure sensor readings are acceptable",
            enclosure_sensors,
        ),
        Check::new(
            "power_supplies",
            "Head unit has two power supplies",
            power_supplies,
        ),
    ];
    for check in checks {
        registry.add(check.physical_only());
    }
}

fn units<'a>(input: &'a CheckInput<'_>) -> &'a [Unit] {
    &input.snapshot.inventory.units
}

fn head_unit_count(input: &CheckInput<'_>) -> Verdict {
    let heads = units(input).iter().filter(|u| u.is_head_unit).count();
    let mut findings = Findings::new();
    findings.ensure_eq("number of head units", 1, heads);
    findings.finish()
}

fn enclosure_multipath(input: &CheckInput<'_>) -> Verdict {
    let mut findings = Findings::new();
    for unit in units(input).iter().filter(|u| !u.is_head_unit) {
        findings.ensure(unit.paths.len() > 1, || {
            format!(
                "enclosure {}: expected more than one path, got {}",
                unit.part_number,
                unit.paths.len()
            )
        });
    }
    findings.finish()
}

fn enclosure_bay_count(input: &CheckInput<'_>) -> Verdict {
    let mut findings = Findings::new();
    for unit in units(input) {
        let observed = unit.bay_count();
        if input
            .context
            .enclosure_bay_count_ok(&unit.part_number, observed)
        {
            continue;
        }
        match reference::expected_bay_count(&unit.part_number) {
            Some(expected) => findings.ensure_eq(
                format!("bay count of enclosure {}", unit.part_number),
                expected,
                observed,
            ),
            None => findings.push(format!(
                "enclosure {}: unknown model with {} bays",
                unit.part_number, observed
            )),
        }
    }
    findings.finish()
}

fn drive_bay_state(input: &CheckInput<'_>) -> Verdict {
    let mut findings = Findings::new();
    for unit in units(input) {
        for (idx, bay) in unit.bays().iter().enumerate() {
            let at = format!("enclosure {} bay {}", unit.part_number, idx);

            findings.ensure(HEALTHY_SLOT_STATES.contains(&bay.status.as_str()), || {
                format!("{}: unhealthy status '{}'", at, bay.status)
            });
            findings.ensure(bay.problems.is_none(), || {
                format!("{}: problems reported: {}", at, render_problems(bay.problems.as_ref()))
            });
            findings.ensure(!bay.fault_led_on, || format!("{}: fault LED is on", at));
            findings.ensure(!bay.identify_led_on, || {
                format!("{}: identify LED is on", at)
            });
            findings.ensure_eq(format!("bay number of {}", at), idx as i64, bay.bay_number);
        }
    }
    findings.finish()
}

fn render_problems(problems: Option<&serde_json::Value>) -> String {
    problems.map(|p| p.to_string()).unwrap_or_default()
}

fn enclosure_sensors(input: &CheckInput<'_>) -> Verdict {
    let mut findings = Findings::new();
    for unit in units(input) {
        for sensor in &unit.sensors {
            findings.ensure(
                HEALTHY_SLOT_STATES.contains(&sensor.status.as_str()),
                || {
                    format!(
                        "enclosure {} sensor {}: unhealthy status '{}'",
                        unit.part_number, sensor.name, sensor.status
                    )
                },
            );
        }
    }
    findings.finish()
}

fn power_supplies(input: &CheckInput<'_>) -> Verdict {
    let head = units(input)
        .iter()
        .find(|u| u.is_head_unit)
        .ok_or("no head unit reported")?;

    let supplies: Vec<_> = head
        .sensors
        .iter()
        .filter(|s| POWER_SUPPLY_SENSORS.contains(&s.name.as_str()))
        .collect();

    let mut findings = Findings::new();
    findings.ensure_eq(
        "number of power supplies",
        POWER_SUPPLY_SENSORS.len(),
        supplies.len(),
    );
    for supply in supplies {
        findings.ensure_eq(
            format!("type of {}", supply.name),
            POWER_SENSOR_TYPE,
            supply.sensor_type.as_str(),
        );
    }
    findings.finish()
}
