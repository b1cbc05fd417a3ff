// (c) Meta Platforms, Inc. and affiliates.
//
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Low-level model of the JSON artifacts written with `--format json`.
//!
//! One check maps to one test step; the run wraps them all. Artifact names
//! follow the OCP diagnostic output layout so existing collectors can read
//! them.

use chrono::DateTime;
use serde::Serialize;
use serde_with::skip_serializing_none;

pub const SCHEMA_VERSION: (i8, i8) = (1, 0);

mod rfc3339_format {
    use chrono::DateTime;
    use chrono::SecondsFormat;

    pub fn serialize<S>(date: &DateTime<chrono_tz::Tz>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let s = date.to_rfc3339_opts(SecondsFormat::Millis, true);
        serializer.serialize_str(&s)
    }
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub enum DiagnosisType {
    #[serde(rename = "PASS")]
    Pass,
    #[serde(rename = "FAIL")]
    Fail,
}

/// How far a run or a step got.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub enum TestStatus {
    #[serde(rename = "COMPLETE")]
    Complete,
    #[serde(rename = "ERROR")]
    Error,
    #[serde(rename = "SKIP")]
    Skip,
}

/// Verdict of the whole run. `NOT_APPLICABLE` when collection failed and no
/// check ran.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub enum TestResult {
    #[serde(rename = "PASS")]
    Pass,
    #[serde(rename = "FAIL")]
    Fail,
    #[serde(rename = "NOT_APPLICABLE")]
    NotApplicable,
}

#[derive(Debug, Serialize, Clone)]
pub struct Root {
    #[serde(flatten)]
    pub artifact: RootImpl,

    #[serde(rename = "timestamp")]
    #[serde(with = "rfc3339_format")]
    pub timestamp: DateTime<chrono_tz::Tz>,

    #[serde(rename = "sequenceNumber")]
    pub seqno: u64,
}

#[derive(Debug, Serialize, PartialEq, Clone)]
pub enum RootImpl {
    #[serde(rename = "schemaVersion")]
    SchemaVersion(SchemaVersion),

    #[serde(rename = "testRunArtifact")]
    TestRunArtifact(TestRunArtifact),

    #[serde(rename = "testStepArtifact")]
    TestStepArtifact(TestStepArtifact),
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct SchemaVersion {
    #[serde(rename = "major")]
    pub major: i8,

    #[serde(rename = "minor")]
    pub minor: i8,
}

impl Default for SchemaVersion {
    fn default() -> Self {
        SchemaVersion {
            major: SCHEMA_VERSION.0,
            minor: SCHEMA_VERSION.1,
        }
    }
}

#[derive(Debug, Serialize, PartialEq, Clone)]
pub struct TestRunArtifact {
    #[serde(flatten)]
    pub artifact: TestRunArtifactImpl,
}

#[derive(Debug, Serialize, PartialEq, Clone)]
pub enum TestRunArtifactImpl {
    #[serde(rename = "testRunStart")]
    TestRunStart(TestRunStart),

    #[serde(rename = "testRunEnd")]
    TestRunEnd(TestRunEnd),

    #[serde(rename = "error")]
    Error(Error),
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct TestRunStart {
    #[serde(rename = "name")]
    pub name: String,

    #[serde(rename = "version")]
    pub version: String,

    #[serde(rename = "commandLine")]
    pub command_line: String,

    /// Absent when the platform could not be queried.
    #[serde(rename = "unit")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<UnitInfo>,
}

/// Identity of the appliance under test.
#[derive(Debug, Serialize, Default, Clone, PartialEq)]
pub struct UnitInfo {
    #[serde(rename = "manufacturer")]
    pub manufacturer: String,

    #[serde(rename = "product")]
    pub product: String,

    #[serde(rename = "systemSerial")]
    pub system_serial: String,

    #[serde(rename = "uuid")]
    pub uuid: String,

    #[serde(rename = "virtualMachine")]
    pub virtual_machine: bool,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct TestRunEnd {
    #[serde(rename = "status")]
    pub status: TestStatus,

    #[serde(rename = "result")]
    pub result: TestResult,
}

#[skip_serializing_none]
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct Error {
    #[serde(rename = "symptom")]
    pub symptom: String,

    #[serde(rename = "message")]
    pub message: Option<String>,
}

#[derive(Debug, Serialize, PartialEq, Clone)]
pub struct TestStepArtifact {
    #[serde(rename = "testStepId")]
    pub id: String,

    #[serde(flatten)]
    pub artifact: TestStepArtifactImpl,
}

#[derive(Debug, Serialize, PartialEq, Clone)]
pub enum TestStepArtifactImpl {
    #[serde(rename = "testStepStart")]
    TestStepStart(TestStepStart),

    #[serde(rename = "testStepEnd")]
    TestStepEnd(TestStepEnd),

    #[serde(rename = "diagnosis")]
    Diagnosis(Diagnosis),
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct TestStepStart {
    #[serde(rename = "name")]
    pub name: String,

    #[serde(rename = "description")]
    pub description: String,
}

#[skip_serializing_none]
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct TestStepEnd {
    #[serde(rename = "status")]
    pub status: TestStatus,

    /// Why the step was skipped.
    #[serde(rename = "reason")]
    pub reason: Option<String>,
}

#[skip_serializing_none]
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct Diagnosis {
    #[serde(rename = "verdict")]
    pub verdict: String,

    #[serde(rename = "type")]
    pub diagnosis_type: DiagnosisType,

    #[serde(rename = "message")]
    pub message: Option<String>,
}
