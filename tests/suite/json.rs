// (c) Meta Platforms, Inc. and affiliates.
//
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use anyhow::Result;
use assert_json_diff::assert_json_eq;
use serde_json::json;

use shipcheck::schema::SCHEMA_VERSION;
use shipcheck::suite::{ExitStatus, Expectations, OutputFormat};

use super::fixture::*;

fn healthy() -> Result<(assert_fs::TempDir, Unit)> {
    let cores = assert_fs::TempDir::new()?;
    let unit = Unit::healthy(Expectations {
        core_dir: cores.path().to_path_buf(),
        ..Default::default()
    });
    Ok((cores, unit))
}

fn step_artifacts<'a>(
    artifacts: &'a [serde_json::Value],
    id: &str,
) -> Vec<&'a serde_json::Value> {
    artifacts
        .iter()
        .filter(|a| a["testStepArtifact"]["testStepId"] == id)
        .collect()
}

#[tokio::test]
async fn test_run_artifacts_frame_the_report() -> Result<()> {
    let (_cores, unit) = healthy()?;

    let outcome = run_suite(&unit, OutputFormat::Json).await;
    assert_eq!(outcome.summary()?.status, ExitStatus::Passed);

    let artifacts = outcome.json()?;
    assert_json_eq!(
        artifacts[0],
        json!({
            "schemaVersion": {
                "major": SCHEMA_VERSION.0,
                "minor": SCHEMA_VERSION.1
            },
            "sequenceNumber": 0,
            "timestamp": NOW_FORMATTED
        })
    );
    assert_json_eq!(
        artifacts[1],
        json!({
            "testRunArtifact": {
                "testRunStart": {
                    "name": "shipcheck",
                    "version": "1.0",
                    "commandLine": "shipcheck --format test",
                    "unit": {
                        "manufacturer": "RackTop Systems",
                        "product": "BrickStor",
                        "systemSerial": "BSR-000123",
                        "uuid": "8a1c2f3e-0000-4000-8000-00000000abcd",
                        "virtualMachine": false
                    }
                }
            },
            "sequenceNumber": 1,
            "timestamp": NOW_FORMATTED
        })
    );

    let last = artifacts.len() - 1;
    assert_json_eq!(
        artifacts[last],
        json!({
            "testRunArtifact": {
                "testRunEnd": {
                    "status": "COMPLETE",
                    "result": "PASS"
                }
            },
            "sequenceNumber": last,
            "timestamp": NOW_FORMATTED
        })
    );

    // start, diagnosis and end for every check
    let checks = outcome.summary()?.report.outcomes.len();
    assert_eq!(artifacts.len(), 3 + 3 * checks);
    for (seq, artifact) in artifacts.iter().enumerate() {
        assert_eq!(artifact["sequenceNumber"], json!(seq));
    }
    Ok(())
}

#[tokio::test]
async fn test_failed_check_carries_diagnostic() -> Result<()> {
    let (_cores, mut unit) = healthy()?;
    unit.drive_mut(3)["HWInfo"]["Rpm"] = json!(5400);

    let outcome = run_suite(&unit, OutputFormat::Json).await;
    let summary = outcome.summary()?;
    assert_eq!(summary.status, ExitStatus::ChecksFailed);

    let idx = summary
        .report
        .outcomes
        .iter()
        .position(|o| o.name == "drive_rpm")
        .ok_or_else(|| anyhow::anyhow!("drive_rpm not registered"))?;
    let artifacts = outcome.json()?;
    let step = step_artifacts(&artifacts, &format!("step{}", idx));

    assert_eq!(step.len(), 3);
    assert_json_eq!(
        step[0]["testStepArtifact"],
        json!({
            "testStepId": format!("step{}", idx),
            "testStepStart": {
                "name": "drive_rpm",
                "description": "Drive RPM matches its type"
            }
        })
    );
    assert_json_eq!(
        step[1]["testStepArtifact"],
        json!({
            "testStepId": format!("step{}", idx),
            "diagnosis": {
                "verdict": "drive_rpm-fail",
                "type": "FAIL",
                "message": "RPM of drive ZC10A003: expected 7200, got 5400"
            }
        })
    );
    assert_json_eq!(
        step[2]["testStepArtifact"],
        json!({
            "testStepId": format!("step{}", idx),
            "testStepEnd": {
                "status": "COMPLETE"
            }
        })
    );

    let end = &artifacts[artifacts.len() - 1];
    assert_eq!(end["testRunArtifact"]["testRunEnd"]["result"], "FAIL");
    Ok(())
}

#[tokio::test]
async fn test_skipped_check_has_no_diagnosis() -> Result<()> {
    let (_cores, mut unit) = healthy()?;
    unit.platform["IsVm"] = json!(true);

    let outcome = run_suite(&unit, OutputFormat::Json).await;
    let summary = outcome.summary()?;

    let idx = summary
        .report
        .outcomes
        .iter()
        .position(|o| o.name == "power_supplies")
        .ok_or_else(|| anyhow::anyhow!("power_supplies not registered"))?;
    let artifacts = outcome.json()?;
    let step = step_artifacts(&artifacts, &format!("step{}", idx));

    assert_eq!(step.len(), 2);
    assert_json_eq!(
        step[1]["testStepArtifact"],
        json!({
            "testStepId": format!("step{}", idx),
            "testStepEnd": {
                "status": "SKIP",
                "reason": "virtual machine"
            }
        })
    );
    assert_eq!(
        artifacts[1]["testRunArtifact"]["testRunStart"]["unit"]["virtualMachine"],
        json!(true)
    );
    Ok(())
}
