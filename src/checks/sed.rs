// (c) Meta Platforms, Inc. and affiliates.
//
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::suite::inventory::SedDrive;
use crate::suite::{Check, CheckInput, Findings, Registry, Verdict};

const NOT_SUPPORTED: &str = "NotSupported";
const NOT_ENROLLED: &str = "NotEnrolled";
const READY: &str = "Ready";

pub(super) fn register(registry: &mut Registry) {
    registry.add(Check::new(
        "sed_state",
        "Self-encrypting drives are in factory state",
        sed_state,
    ));
}

fn sed_state(input: &CheckInput<'_>) -> Verdict {
    let mut findings = Findings::new();
    for drive in &input.snapshot.security.drives {
        findings.ensure(!drive.serial.is_empty(), || {
            "security service reported a drive without serial".to_owned()
        });
        if input.context.drive_belongs_to_boot_pool(&drive.serial) {
            continue;
        }

        if drive.status == NOT_SUPPORTED {
            idle(drive, &mut findings);
        } else {
            unenrolled(drive, &mut findings);
        }
    }
    findings.finish()
}

/// Drives without SED support must have nothing in flight.
fn idle(drive: &SedDrive, findings: &mut Findings) {
    let flags = [
        ("AutoUnlock", drive.auto_unlock),
        ("Rekeying", drive.rekeying),
        ("Refreshing", drive.refreshing),
        ("LastActionPending", drive.last_action_pending),
    ];
    for (flag, value) in flags {
        findings.ensure_eq(format!("{} of SED {}", flag, drive.serial), false, value);
    }
}

fn unenrolled(drive: &SedDrive, findings: &mut Findings) {
    let at = format!("SED {}", drive.serial);
    findings.ensure_eq(format!("AutoUnlock of {}", at), false, drive.auto_unlock);
    findings.ensure_eq(format!("Rekeying of {}", at), false, drive.rekeying);
    findings.ensure_eq(
        format!("ReadyStatus of {}", at),
        READY,
        drive.ready_status.as_str(),
    );
    findings.ensure_eq(
        format!("Status of {}", at),
        NOT_ENROLLED,
        drive.status.as_str(),
    );
    findings.ensure(drive.problems.is_none(), || {
        format!(
            "{}: problems reported: {}",
            at,
            drive.problems.as_ref().map(|p| p.to_string()).unwrap_or_default()
        )
    });
}
