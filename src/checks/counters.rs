// (c) Meta Platforms, Inc. and affiliates.
//
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

use super::drives::label;
use crate::suite::probe::ErrorCounter;
use crate::suite::{Check, CheckInput, Findings, Probe, Registry, Verdict};

pub(super) fn register(registry: &mut Registry) {
    registry.add(Check::new(
        "drive_error_counters",
        "Drives report no errors",
        drive_error_counters,
    ));

    for counter in ErrorCounter::ALL {
        registry.add(Check::new(
            &format!("error_counter_{}", counter.slug()),
            &format!("No drive reports {}", counter.kstat_name()),
            move |input| kstat_counter(input, counter),
        ));
    }
}

fn drive_error_counters(input: &CheckInput<'_>) -> Verdict {
    let mut findings = Findings::new();
    for drive in &input.snapshot.inventory.drives {
        for counter in ErrorCounter::ALL {
            let field = counter.inventory_field();
            match drive.os_info.counter(field) {
                Some(value) => {
                    findings.ensure_eq(format!("{} of {}", field, label(drive)), 0, value)
                }
                None => findings.push(format!("{}: {} is not reported", label(drive), field)),
            }
        }
    }
    findings.finish()
}

/// One instance as printed by `kstat -j`.
#[derive(Deserialize)]
struct KstatEntry {
    #[serde(default)]
    name: String,
    #[serde(default)]
    data: BTreeMap<String, Value>,
}

fn kstat_counter(input: &CheckInput<'_>, counter: ErrorCounter) -> Verdict {
    let entries: Vec<KstatEntry> = input.probe_json(&Probe::ErrorCounter(counter))?;
    let key = counter.kstat_name();

    let mut findings = Findings::new();
    for (idx, entry) in entries.iter().enumerate() {
        let instance = if entry.name.is_empty() {
            format!("#{}", idx)
        } else {
            entry.name.clone()
        };
        match entry.data.get(key).and_then(Value::as_i64) {
            Some(value) => findings.ensure_eq(format!("'{}' of {}", key, instance), 0, value),
            None => findings.push(format!("{}: '{}' is not reported", instance, key)),
        }
    }
    findings.finish()
}
