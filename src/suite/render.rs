// (c) Meta Platforms, Inc. and affiliates.
//
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use std::fmt::Write;

use crate::suite::check::{CheckResult, Report};
use crate::suite::run::ExitStatus;

const SEPARATOR_HEAVY: &str =
    "======================================================================";
const SEPARATOR_LIGHT: &str =
    "----------------------------------------------------------------------";

/// Renders the human readable report and the exit status it implies.
///
/// One line per check in registration order, then a block for each failure
/// carrying its full diagnostic, then the totals.
pub fn render(report: &Report) -> (String, ExitStatus) {
    let mut out = String::new();

    for outcome in &report.outcomes {
        let mark = match &outcome.result {
            CheckResult::Passed => "✓".to_owned(),
            CheckResult::Failed(_) => "✗".to_owned(),
            CheckResult::Skipped(reason) => format!("skipped '{}'", reason),
        };
        // writing to a String cannot fail
        let _ = writeln!(out, "{} ... {}", outcome.description, mark);
    }

    for outcome in &report.outcomes {
        if let CheckResult::Failed(diagnostic) = &outcome.result {
            let _ = writeln!(out);
            let _ = writeln!(out, "{}", SEPARATOR_HEAVY);
            let _ = writeln!(out, "FAIL: {} ({})", outcome.description, outcome.name);
            let _ = writeln!(out, "{}", SEPARATOR_LIGHT);
            let _ = writeln!(out, "{}", diagnostic);
        }
    }

    let _ = writeln!(out, "{}", SEPARATOR_LIGHT);
    let _ = writeln!(
        out,
        "Ran {} checks: {} passed, {} failed, {} skipped",
        report.outcomes.len(),
        report.passed(),
        report.failed(),
        report.skipped()
    );
    let _ = writeln!(out);
    if report.is_success() {
        let _ = writeln!(out, "OK");
    } else {
        let _ = writeln!(out, "FAILED (failures={})", report.failed());
    }

    (out, ExitStatus::from_report(report))
}
