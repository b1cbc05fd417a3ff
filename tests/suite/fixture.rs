// (c) Meta Platforms, Inc. and affiliates.
//
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use std::collections::BTreeMap;
use std::io;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::TimeZone;
use serde_json::{json, Value};
use tokio::sync::Mutex;

use shipcheck::suite::probe::ErrorCounter;
use shipcheck::suite::{
    CommandError, CommandOutput, CommandRunner, CommandSpec, Config, Expectations, OutputFormat,
    Probe, RunSummary, SuiteError, SuiteRun, Subsystem, TimestampProvider,
};

pub const NOW_FORMATTED: &str = "2024-06-01T12:00:00.000Z";

pub struct FixedTsProvider {}

impl TimestampProvider for FixedTsProvider {
    fn now(&self) -> chrono::DateTime<chrono_tz::Tz> {
        chrono_tz::UTC.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }
}

/// The same instant as [`FixedTsProvider`], seen from another zone.
pub struct ZonedTsProvider {
    pub tz: chrono_tz::Tz,
}

impl TimestampProvider for ZonedTsProvider {
    fn now(&self) -> chrono::DateTime<chrono_tz::Tz> {
        FixedTsProvider {}.now().with_timezone(&self.tz)
    }
}

#[derive(Debug, Clone)]
pub enum Response {
    Output(CommandOutput),
    SpawnFailure,
}

pub fn output(stdout: &str, status: i32) -> Response {
    Response::Output(CommandOutput {
        stdout: stdout.as_bytes().to_vec(),
        status: Some(status),
        timed_out: false,
    })
}

/// Answers commands from a table keyed by their display form and records
/// every call.
pub struct ScriptedRunner {
    responses: BTreeMap<String, Response>,
    pub calls: std::sync::Mutex<Vec<String>>,
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn run(&self, command: &CommandSpec) -> Result<CommandOutput, CommandError> {
        let key = command.display();
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(key.clone());
        }

        match self.responses.get(&key) {
            Some(Response::Output(out)) => Ok(out.clone()),
            Some(Response::SpawnFailure) | None => Err(CommandError::Spawn {
                program: command.program.clone(),
                source: io::Error::new(io::ErrorKind::NotFound, "no such file or directory"),
            }),
        }
    }
}

/// The state of a unit that is ready to ship: 12 Seagate disks in one
/// 24-bay shelf behind a head unit.
pub struct Unit {
    pub expectations: Expectations,
    pub inventory: Value,
    pub security: Value,
    pub platform: Value,
    pub probes: BTreeMap<Probe, Response>,
    pub subsystem_overrides: BTreeMap<String, Response>,
}

fn drive(idx: usize) -> Value {
    let device = format!("c0t5000C500A1B2C3{:02X}d0", idx);
    let mut os_info = serde_json::Map::new();
    os_info.insert("Capacity".to_owned(), json!(2_000_000_000_000u64));
    for counter in ErrorCounter::ALL {
        os_info.insert(counter.inventory_field().to_owned(), json!(0));
    }

    json!({
        "Make": "Seagate",
        "Model": "ST2000NM0045",
        "Serial": format!("ZC10A0{:02}", idx),
        "Path": format!("/dev/rdsk/{}s0", device),
        "DeviceName": device,
        "StorageUnitId": format!("5000C500A1B2C3{:02X}", idx),
        "Wwn": format!("5000C500A1B2C4{:02X}", idx),
        "HWInfo": {
            "Bay": idx,
            "CelsiusTemperature": 31,
            "MaxFunctionalTemp": 60,
            "Type": "hdd",
            "Rpm": 7200,
            "PowerOnDuration": 100,
            "RegistrationStatus": "Registered",
            "RegistrationTimestamp": "2024-01-15T08:30:00.000Z",
        },
        "OSInfo": os_info,
    })
}

fn bay(idx: usize) -> Value {
    let status = if idx < 12 { "OK" } else { "NotInstalled" };
    json!({
        "Status": status,
        "Problems": null,
        "FaultLedOn": false,
        "IdentifyLedOn": false,
        "BayNumber": idx,
    })
}

const MIRRORED_BOOT_POOL: &str = "  pool: bp
 state: ONLINE
config:

        NAME        STATE     READ WRITE CKSUM
        bp          ONLINE       0     0     0
          mirror-0  ONLINE       0     0     0
            c1t0d0  ONLINE       0     0     0
            c1t1d0  ONLINE       0     0     0

errors: No known data errors
";

impl Unit {
    pub fn healthy(expectations: Expectations) -> Self {
        let drives: Vec<Value> = (0..12).map(drive).collect();
        let bays: Vec<Value> = (0..24).map(bay).collect();
        let inventory = json!({
            "Drives": drives,
            "Units": [
                {
                    "IsHeadUnit": true,
                    "PartNumber": "GXY124S2V",
                    "Paths": [],
                    "Sensors": [
                        {"Name": "PS1", "Type": "Power", "Status": "OK"},
                        {"Name": "PS2", "Type": "Power", "Status": "OK"},
                        {"Name": "FAN1", "Type": "Fan", "Status": "OK"},
                    ],
                    "DriveBays": null,
                },
                {
                    "IsHeadUnit": false,
                    "PartNumber": "SP-3424-E12EBD",
                    "Paths": [{"Port": 0}, {"Port": 1}],
                    "Sensors": [{"Name": "TEMP1", "Type": "Temperature", "Status": "OK"}],
                    "DriveBays": bays,
                },
            ],
        });

        let sed: Vec<Value> = (0..12)
            .map(|idx| {
                json!({
                    "Serial": format!("ZC10A0{:02}", idx),
                    "Status": "NotEnrolled",
                    "AutoUnlock": false,
                    "Rekeying": false,
                    "Refreshing": false,
                    "LastActionPending": false,
                    "ReadyStatus": "Ready",
                    "Problems": null,
                })
            })
            .collect();
        let security = json!({
            "Pools": [{"DriveSerials": ["BOOT0001", "BOOT0002"]}],
            "Drives": sed,
        });

        let platform = json!({
            "Manufacturer": "RackTop Systems",
            "Product": "BrickStor",
            "SystemFamily": "BrickStor",
            "BaseboardPartNumber": "S2600WTTR",
            "ChassisType": "RackMountChassis",
            "IsValidHardware": true,
            "BaseboardSerial": "BQWL71200123",
            "IsVm": false,
            "Uuid": "8a1c2f3e-0000-4000-8000-00000000abcd",
            "SystemSerial": "BSR-000123",
        });

        let mut probes = BTreeMap::new();
        probes.insert(Probe::KernelLog, output("", 1));
        probes.insert(
            Probe::ChassisStatus,
            output(
                "System Power         : on\n\
                 Power Overload       : false\n\
                 Drive Fault          : false\n\
                 Cooling/Fan Fault    : false\n",
                0,
            ),
        );
        probes.insert(Probe::BmcAccount, output("Success\n", 0));
        probes.insert(
            Probe::SensorDump,
            output(
                r#"{"IPMISDRDUMP": [{"Name": "BB +12.0V", "Health": "ok"}, {"Name": "PS2 Status", "Health": "ns"}]}"#,
                0,
            ),
        );
        probes.insert(Probe::BootPoolStatus, output(MIRRORED_BOOT_POOL, 0));
        for profile in &expectations.storage_profiles {
            probes.insert(
                Probe::StorageProfile(profile.dataset.clone()),
                output(&format!("{}\n", profile.profile), 0),
            );
        }
        probes.insert(Probe::ServiceHealth, output("", 0));
        for service in &expectations.services {
            probes.insert(
                Probe::ServiceState(service.name.clone()),
                output(&format!("{}\n", service.state), 0),
            );
        }
        probes.insert(
            Probe::LicenseHost,
            output(r#"{"Host": "1A2B-3C4D-5E6F-7A8B-9C0D1-2E3F-4A5B6-7C8D-9E0F1"}"#, 0),
        );
        probes.insert(
            Probe::DomainName,
            output(r#"{"result": "factory.example.com"}"#, 0),
        );
        probes.insert(Probe::OsImages, output(r#"[{"Name": "bsros-23.4"}]"#, 0));
        probes.insert(
            Probe::OsVersion,
            output(
                &json!({"BootGuid": expectations.os_boot_guid}).to_string(),
                0,
            ),
        );
        probes.insert(Probe::FaultSummary, output("", 0));
        probes.insert(Probe::FaultLog, output("TIME                 CLASS\n", 0));
        for counter in ErrorCounter::ALL {
            let mut data = serde_json::Map::new();
            data.insert(counter.kstat_name().to_owned(), json!(0));
            let listing = json!([{
                "module": "sderr",
                "instance": 0,
                "name": "sd0,err",
                "data": data,
            }]);
            probes.insert(Probe::ErrorCounter(counter), output(&listing.to_string(), 0));
        }

        Unit {
            expectations,
            inventory,
            security,
            platform,
            probes,
            subsystem_overrides: BTreeMap::new(),
        }
    }

    /// Replaces the answer a required subsystem gives.
    pub fn override_subsystem(&mut self, subsystem: Subsystem, response: Response) {
        let key = subsystem.command(&self.expectations).display();
        self.subsystem_overrides.insert(key, response);
    }

    pub fn drive_mut(&mut self, idx: usize) -> &mut Value {
        &mut self.inventory["Drives"][idx]
    }

    pub fn runner(&self) -> ScriptedRunner {
        let mut responses = BTreeMap::new();
        for (subsystem, doc) in [
            (Subsystem::Inventory, &self.inventory),
            (Subsystem::Security, &self.security),
            (Subsystem::Platform, &self.platform),
        ] {
            responses.insert(
                subsystem.command(&self.expectations).display(),
                output(&doc.to_string(), 0),
            );
        }
        responses.extend(self.subsystem_overrides.clone());
        for (probe, response) in &self.probes {
            responses.insert(
                probe.command(&self.expectations).display(),
                response.clone(),
            );
        }

        ScriptedRunner {
            responses,
            calls: std::sync::Mutex::new(vec![]),
        }
    }
}

pub struct Outcome {
    pub result: Result<RunSummary, SuiteError>,
    pub lines: Vec<String>,
    pub calls: Vec<String>,
}

impl Outcome {
    pub fn summary(&self) -> Result<&RunSummary> {
        self.result
            .as_ref()
            .map_err(|e| anyhow::anyhow!("run aborted: {}", e))
    }

    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    pub fn json(&self) -> Result<Vec<Value>> {
        let mut values = vec![];
        for line in &self.lines {
            values.push(serde_json::from_str(line)?);
        }
        Ok(values)
    }
}

/// Runs the standard checks against `unit`, capturing the report.
pub async fn run_suite(unit: &Unit, format: OutputFormat) -> Outcome {
    run_suite_at(unit, format, Box::new(FixedTsProvider {})).await
}

pub async fn run_suite_at(
    unit: &Unit,
    format: OutputFormat,
    clock: Box<dyn TimestampProvider + Send + Sync + 'static>,
) -> Outcome {
    let buffer = Arc::new(Mutex::new(vec![]));
    let config = Config::builder()
        .with_timestamp_provider(clock)
        .with_buffer_output(buffer.clone())
        .format(format)
        .expectations(unit.expectations.clone())
        .build();
    let registry = shipcheck::checks::standard(config.expectations());
    let runner = unit.runner();

    let result = SuiteRun::builder("shipcheck", "1.0")
        .command_line("shipcheck --format test")
        .config(config)
        .build()
        .run(&runner, &registry)
        .await;

    let lines = buffer.lock().await.clone();
    let calls = runner.calls.lock().map(|c| c.clone()).unwrap_or_default();
    Outcome {
        result,
        lines,
        calls,
    }
}
