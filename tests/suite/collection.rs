// (c) Meta Platforms, Inc. and affiliates.
//
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use anyhow::Result;
use assert_json_diff::assert_json_eq;
use serde_json::json;

use shipcheck::suite::{
    CollectionError, Expectations, OutputFormat, SuiteError, Subsystem,
};

use super::fixture::*;

fn unit() -> Result<(assert_fs::TempDir, Unit)> {
    let cores = assert_fs::TempDir::new()?;
    let unit = Unit::healthy(Expectations {
        core_dir: cores.path().to_path_buf(),
        ..Default::default()
    });
    Ok((cores, unit))
}

#[tokio::test]
async fn test_inventory_down_aborts_before_any_check() -> Result<()> {
    let (_cores, mut unit) = unit()?;
    unit.override_subsystem(Subsystem::Inventory, output("", 1));

    let outcome = run_suite(&unit, OutputFormat::Text).await;

    match &outcome.result {
        Err(SuiteError::Collection(CollectionError::Failed { subsystem, status })) => {
            assert_eq!(*subsystem, Subsystem::Inventory);
            assert_eq!(*status, 1);
        }
        other => panic!("unexpected: {:?}", other),
    }
    assert_eq!(
        outcome.lines,
        vec!["ERROR: hwd service is probably not running, check with: 'svcs hwd'"]
    );
    assert_eq!(outcome.calls.len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_unexpected_status_gets_generic_hint() -> Result<()> {
    let (_cores, mut unit) = unit()?;
    unit.override_subsystem(Subsystem::Security, output("", 2));

    let outcome = run_suite(&unit, OutputFormat::Text).await;

    assert!(matches!(
        outcome.result,
        Err(SuiteError::Collection(CollectionError::Failed { status: 2, .. }))
    ));
    assert_eq!(
        outcome.lines,
        vec!["ERROR: something unexpected happened with secured!"]
    );
    Ok(())
}

#[tokio::test]
async fn test_unregistered_platform_aborts() -> Result<()> {
    let (_cores, mut unit) = unit()?;
    unit.override_subsystem(Subsystem::Platform, Response::SpawnFailure);

    let outcome = run_suite(&unit, OutputFormat::Text).await;

    assert!(matches!(
        outcome.result,
        Err(SuiteError::Collection(CollectionError::Unreachable { .. }))
    ));
    assert_eq!(
        outcome.lines,
        vec!["ERROR: system is probably not registered, check with: 'bsradm smb'"]
    );
    // no probe runs without the platform
    assert_eq!(outcome.calls.len(), 3);
    Ok(())
}

#[tokio::test]
async fn test_malformed_inventory_aborts() -> Result<()> {
    let (_cores, mut unit) = unit()?;
    unit.override_subsystem(Subsystem::Inventory, output("{\"Drives\": ", 0));

    let outcome = run_suite(&unit, OutputFormat::Text).await;

    assert!(matches!(
        outcome.result,
        Err(SuiteError::Collection(CollectionError::Malformed { .. }))
    ));
    assert_eq!(outcome.lines, vec!["ERROR: unexpected output from hwd!"]);
    Ok(())
}

#[tokio::test]
async fn test_collection_failure_as_json() -> Result<()> {
    let (_cores, mut unit) = unit()?;
    unit.override_subsystem(Subsystem::Inventory, output("", 1));

    let outcome = run_suite(&unit, OutputFormat::Json).await;
    assert!(outcome.result.is_err());

    let artifacts = outcome.json()?;
    assert_eq!(artifacts.len(), 4);
    assert_json_eq!(
        artifacts[1],
        json!({
            "testRunArtifact": {
                "testRunStart": {
                    "name": "shipcheck",
                    "version": "1.0",
                    "commandLine": "shipcheck --format test"
                }
            },
            "sequenceNumber": 1,
            "timestamp": NOW_FORMATTED
        })
    );
    assert_json_eq!(
        artifacts[2],
        json!({
            "testRunArtifact": {
                "error": {
                    "symptom": "inventory-unavailable",
                    "message": "inventory query failed with status 1; hwd service is probably not running, check with: 'svcs hwd'"
                }
            },
            "sequenceNumber": 2,
            "timestamp": NOW_FORMATTED
        })
    );
    assert_json_eq!(
        artifacts[3],
        json!({
            "testRunArtifact": {
                "testRunEnd": {
                    "status": "ERROR",
                    "result": "NOT_APPLICABLE"
                }
            },
            "sequenceNumber": 3,
            "timestamp": NOW_FORMATTED
        })
    );
    Ok(())
}
