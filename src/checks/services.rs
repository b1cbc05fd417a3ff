// (c) Meta Platforms, Inc. and affiliates.
//
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::suite::{Check, CheckInput, Expectations, Findings, Probe, Registry, Verdict};

pub(super) fn register(registry: &mut Registry, expectations: &Expectations) {
    registry.add(Check::new(
        "service_health",
        "Service manager reports all services healthy",
        service_health,
    ));

    for service in &expectations.services {
        let name = service.name.clone();
        let state = service.state.clone();
        registry.add(Check::new(
            &format!("service_state_{}", name),
            &format!("{} service is {}", name, state),
            move |input| service_state(input, &name, &state),
        ));
    }
}

fn service_health(input: &CheckInput<'_>) -> Verdict {
    let output = input.probe_ok(&Probe::ServiceHealth)?;
    let report = output.trimmed();
    if !report.is_empty() {
        return Err(format!(
            "expected no output, instead one or more services is not healthy:\n{}",
            report
        )
        .into());
    }
    Ok(())
}

fn service_state(input: &CheckInput<'_>, name: &str, expected: &str) -> Verdict {
    let output = input.probe_ok(&Probe::ServiceState(name.to_owned()))?;
    let mut findings = Findings::new();
    findings.ensure_eq(
        format!("state of {}", name),
        expected,
        output.trimmed().as_str(),
    );
    findings.finish()
}
