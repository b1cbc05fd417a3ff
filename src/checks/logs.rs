// (c) Meta Platforms, Inc. and affiliates.
//
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Log and crash-dump checks.
//!
//! The kernel log and fault log scans run under a short timeout; when it
//! fires, whatever was read so far is judged.

use crate::suite::reference::KERNEL_LOG_IGNORED_DEVICE;
use crate::suite::{Check, CheckInput, Probe, Registry, Verdict};

/// Header lines printed by `fmadm faulty -s` ahead of the fault rows.
const FAULT_SUMMARY_HEADER_LINES: usize = 3;
const LOG_EXCERPT_LINES: usize = 5;

pub(super) fn register(registry: &mut Registry) {
    registry
        .add(Check::new(
            "kernel_log_clean",
            "System log does not contain any kernel warnings or errors",
            kernel_log_clean,
        ))
        .add(Check::new(
            "fault_summary_empty",
            "Fault management did not detect any faults",
            fault_summary_empty,
        ))
        .add(Check::new(
            "fault_log_empty",
            "Fault management error log is empty",
            fault_log_empty,
        ))
        .add(Check::new(
            "no_core_files",
            "No core files are present",
            no_core_files,
        ));
}

fn kernel_log_clean(input: &CheckInput<'_>) -> Verdict {
    let output = input.probe(&Probe::KernelLog)?;
    // egrep: 0 matched, 1 nothing matched, 2 trouble
    if let Some(status) = output.status.filter(|s| *s > 1) {
        return Err(format!("kernel log scan exited with status {}", status).into());
    }

    let text = output.text();
    let hits: Vec<&str> = text
        .lines()
        .filter(|line| !line.is_empty() && !line.contains(KERNEL_LOG_IGNORED_DEVICE))
        .collect();
    if hits.is_empty() {
        return Ok(());
    }

    let mut message = format!(
        "expected no output, instead log contains {} kernel warnings and/or errors",
        hits.len()
    );
    for line in hits.iter().take(LOG_EXCERPT_LINES) {
        message.push_str("\n  ");
        message.push_str(line);
    }
    Err(message.into())
}

fn fault_summary_empty(input: &CheckInput<'_>) -> Verdict {
    let output = input.probe_ok(&Probe::FaultSummary)?;
    let summary = output.trimmed();
    if summary.is_empty() {
        return Ok(());
    }

    let faults = summary
        .lines()
        .count()
        .saturating_sub(FAULT_SUMMARY_HEADER_LINES);
    Err(format!(
        "expected to get no results, instead have {} faults",
        faults
    )
    .into())
}

fn fault_log_empty(input: &CheckInput<'_>) -> Verdict {
    let output = input.probe(&Probe::FaultLog)?;
    if !output.timed_out && !output.success() {
        return Err(format!("fault log scan {}", output.describe_status()).into());
    }

    // first line is the column header
    let errors = output.trimmed().lines().skip(1).count();
    if errors > 0 {
        return Err(format!(
            "expected to find no results, instead have {} errors",
            errors
        )
        .into());
    }
    Ok(())
}

fn no_core_files(input: &CheckInput<'_>) -> Verdict {
    let files = input
        .snapshot
        .core_files
        .as_ref()
        .map_err(|e| e.0.clone())?;

    if !files.is_empty() {
        return Err(format!(
            "expected to find no core files, instead found {} files: {}",
            files.len(),
            files.join(", ")
        )
        .into());
    }
    Ok(())
}
