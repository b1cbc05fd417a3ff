// (c) Meta Platforms, Inc. and affiliates.
//
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use anyhow::Result;
use assert_fs::prelude::*;
use predicates::prelude::*;
use serde_json::json;

use shipcheck::suite::{CheckResult, ExitStatus, Expectations, OutputFormat, Probe};

use super::fixture::*;

fn expectations(cores: &assert_fs::TempDir) -> Expectations {
    Expectations {
        core_dir: cores.path().to_path_buf(),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_healthy_unit_passes() -> Result<()> {
    let cores = assert_fs::TempDir::new()?;
    let unit = Unit::healthy(expectations(&cores));

    let outcome = run_suite(&unit, OutputFormat::Text).await;
    let summary = outcome.summary()?;

    for check in &summary.report.outcomes {
        assert_eq!(check.result, CheckResult::Passed, "{}", check.name);
    }
    assert_eq!(summary.status, ExitStatus::Passed);

    let text = outcome.text();
    assert!(predicate::str::contains("Drive RPM matches its type ... ✓").eval(&text));
    assert!(predicate::str::contains("FAIL:").not().eval(&text));
    assert!(predicate::str::ends_with("\n\nOK").eval(&text));
    Ok(())
}

#[tokio::test]
async fn test_slow_drive_fails_only_rpm() -> Result<()> {
    let cores = assert_fs::TempDir::new()?;
    let mut unit = Unit::healthy(expectations(&cores));
    unit.drive_mut(3)["HWInfo"]["Rpm"] = json!(5400);

    let outcome = run_suite(&unit, OutputFormat::Text).await;
    let summary = outcome.summary()?;

    assert_eq!(summary.status, ExitStatus::ChecksFailed);
    assert_eq!(summary.report.failed(), 1);
    assert_eq!(
        summary.report.outcome("drive_rpm").map(|o| &o.result),
        Some(&CheckResult::Failed(
            "RPM of drive ZC10A003: expected 7200, got 5400".to_owned()
        ))
    );

    let text = outcome.text();
    assert!(predicate::str::contains("Drive RPM matches its type ... ✗").eval(&text));
    assert!(predicate::str::contains("FAIL: Drive RPM matches its type (drive_rpm)").eval(&text));
    assert!(predicate::str::ends_with("FAILED (failures=1)").eval(&text));
    Ok(())
}

#[tokio::test]
async fn test_every_mismatch_is_reported() -> Result<()> {
    let cores = assert_fs::TempDir::new()?;
    let mut unit = Unit::healthy(expectations(&cores));
    unit.drive_mut(0)["HWInfo"]["CelsiusTemperature"] = json!(61);
    unit.drive_mut(5)["HWInfo"]["CelsiusTemperature"] = json!(70);
    // at the limit is still fine
    unit.drive_mut(7)["HWInfo"]["CelsiusTemperature"] = json!(60);

    let outcome = run_suite(&unit, OutputFormat::Text).await;
    let summary = outcome.summary()?;

    let result = summary.report.outcome("drive_temperature").map(|o| o.result.clone());
    let Some(CheckResult::Failed(diagnostic)) = result else {
        panic!("unexpected: {:?}", result);
    };
    assert!(diagnostic.contains("drive ZC10A000: temperature 61 exceeds maximum 60"));
    assert!(diagnostic.contains("drive ZC10A005: temperature 70 exceeds maximum 60"));
    assert!(!diagnostic.contains("ZC10A007"));
    Ok(())
}

#[tokio::test]
async fn test_shifted_bay_numbering_fails() -> Result<()> {
    let cores = assert_fs::TempDir::new()?;
    let mut unit = Unit::healthy(expectations(&cores));
    unit.inventory["Units"][1]["DriveBays"][2]["BayNumber"] = json!(3);

    let outcome = run_suite(&unit, OutputFormat::Text).await;
    let summary = outcome.summary()?;

    let result = summary.report.outcome("drive_bay_state").map(|o| o.result.clone());
    let Some(CheckResult::Failed(diagnostic)) = result else {
        panic!("unexpected: {:?}", result);
    };
    assert!(diagnostic.contains("expected 2, got 3"));
    Ok(())
}

#[tokio::test]
async fn test_virtual_machine_skips_hardware() -> Result<()> {
    let cores = assert_fs::TempDir::new()?;
    let mut unit = Unit::healthy(expectations(&cores));
    unit.platform["IsVm"] = json!(true);

    let outcome = run_suite(&unit, OutputFormat::Text).await;
    let summary = outcome.summary()?;

    let skipped: Vec<&str> = summary
        .report
        .outcomes
        .iter()
        .filter(|o| o.result == CheckResult::Skipped("virtual machine".to_owned()))
        .map(|o| o.name.as_str())
        .collect();
    assert_eq!(
        skipped,
        vec![
            "chassis_status",
            "bmc_root_account",
            "controller_sensors",
            "head_unit_count",
            "enclosure_multipath",
            "enclosure_bay_count",
            "drive_bay_state",
            "enclosure_sensors",
            "power_supplies",
        ]
    );
    // a virtual machine is never shippable
    assert!(matches!(
        summary.report.outcome("platform_not_virtual").map(|o| &o.result),
        Some(CheckResult::Failed(_))
    ));
    assert_eq!(summary.status, ExitStatus::ChecksFailed);

    let bmc = Probe::BmcAccount.command(&unit.expectations).display();
    let chassis = Probe::ChassisStatus.command(&unit.expectations).display();
    assert!(!outcome.calls.contains(&bmc));
    assert!(!outcome.calls.contains(&chassis));

    let skip_line = "BMC has root account created ... skipped 'virtual machine'";
    assert!(predicate::str::contains(skip_line).eval(&outcome.text()));
    Ok(())
}

#[tokio::test]
async fn test_unreachable_probe_fails_its_check_only() -> Result<()> {
    let cores = assert_fs::TempDir::new()?;
    let mut unit = Unit::healthy(expectations(&cores));
    unit.probes.insert(Probe::LicenseHost, Response::SpawnFailure);

    let outcome = run_suite(&unit, OutputFormat::Text).await;
    let summary = outcome.summary()?;

    assert_eq!(summary.report.failed(), 1);
    let result = summary.report.outcome("license_installed").map(|o| o.result.clone());
    let Some(CheckResult::Failed(diagnostic)) = result else {
        panic!("unexpected: {:?}", result);
    };
    assert!(diagnostic.contains("myrackadm"));
    Ok(())
}

#[tokio::test]
async fn test_core_files_are_listed() -> Result<()> {
    let cores = assert_fs::TempDir::new()?;
    cores.child("core.hwd.1234").touch()?;
    let unit = Unit::healthy(expectations(&cores));

    let outcome = run_suite(&unit, OutputFormat::Text).await;
    let summary = outcome.summary()?;

    assert_eq!(
        summary.report.outcome("no_core_files").map(|o| &o.result),
        Some(&CheckResult::Failed(
            "expected to find no core files, instead found 1 files: core.hwd.1234".to_owned()
        ))
    );
    Ok(())
}

#[tokio::test]
async fn test_runs_are_repeatable() -> Result<()> {
    let cores = assert_fs::TempDir::new()?;
    let mut unit = Unit::healthy(expectations(&cores));
    unit.drive_mut(1)["OSInfo"]["HardErrors"] = json!(2);

    let first = run_suite(&unit, OutputFormat::Text).await;
    let second = run_suite(&unit, OutputFormat::Text).await;

    assert_eq!(first.summary()?.report, second.summary()?.report);
    assert_eq!(first.lines, second.lines);

    // every command runs exactly once per run
    let mut calls = first.calls.clone();
    calls.sort();
    calls.dedup();
    assert_eq!(calls.len(), first.calls.len());
    Ok(())
}

#[tokio::test]
async fn test_registration_is_judged_in_utc() -> Result<()> {
    let cores = assert_fs::TempDir::new()?;
    let mut unit = Unit::healthy(expectations(&cores));
    // two hours before the run
    unit.drive_mut(0)["HWInfo"]["RegistrationTimestamp"] = json!("2024-06-01T10:00:00.000Z");
    // three hours after it
    unit.drive_mut(1)["HWInfo"]["RegistrationTimestamp"] = json!("2024-06-01T15:00:00.000Z");

    for zone in [chrono_tz::America::New_York, chrono_tz::Asia::Tokyo, chrono_tz::UTC] {
        let clock = Box::new(ZonedTsProvider { tz: zone });
        let outcome = run_suite_at(&unit, OutputFormat::Text, clock).await;
        let summary = outcome.summary()?;

        assert_eq!(
            summary.report.outcome("drive_registration").map(|o| &o.result),
            Some(&CheckResult::Failed(
                "drive ZC10A001: registration timestamp 2024-06-01 15:00:00 is in the future"
                    .to_owned()
            )),
            "{}",
            zone
        );
    }
    Ok(())
}
