// (c) Meta Platforms, Inc. and affiliates.
//
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Auxiliary system queries.
//!
//! Unlike the required subsystems, a probe that cannot be run does not abort
//! the suite: its failure is kept in the snapshot and reported by whichever
//! check reads it.

use std::collections::BTreeMap;
use std::fmt;

use crate::suite::command::{CommandError, CommandOutput, CommandSpec};
use crate::suite::config::Expectations;

const SVCS: &str = "/usr/bin/svcs";
const IPMITOOL: &str = "/usr/bin/ipmitool";
const KSTAT: &str = "/usr/bin/kstat";
const BSRADM: &str = "/usr/racktop/sbin/bsradm";
const MYRACKADM: &str = "/usr/racktop/sbin/myrackadm";

/// Per-drive error counters, named both as the inventory field and as the
/// kernel statistic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ErrorCounter {
    SoftErrors,
    HardErrors,
    TransportErrors,
    MediaError,
    DeviceNotReady,
    NoDevice,
    Recoverable,
    IllegalRequest,
    PredictiveFailureAnalysis,
}

impl ErrorCounter {
    pub const ALL: [ErrorCounter; 9] = [
        ErrorCounter::SoftErrors,
        ErrorCounter::HardErrors,
        ErrorCounter::TransportErrors,
        ErrorCounter::MediaError,
        ErrorCounter::DeviceNotReady,
        ErrorCounter::NoDevice,
        ErrorCounter::Recoverable,
        ErrorCounter::IllegalRequest,
        ErrorCounter::PredictiveFailureAnalysis,
    ];

    pub fn inventory_field(&self) -> &'static str {
        match self {
            ErrorCounter::SoftErrors => "SoftErrors",
            ErrorCounter::HardErrors => "HardErrors",
            ErrorCounter::TransportErrors => "TransportErrors",
            ErrorCounter::MediaError => "MediaError",
            ErrorCounter::DeviceNotReady => "DeviceNotReady",
            ErrorCounter::NoDevice => "NoDevice",
            ErrorCounter::Recoverable => "Recoverable",
            ErrorCounter::IllegalRequest => "IllegalRequest",
            ErrorCounter::PredictiveFailureAnalysis => "PredictiveFailureAnalysis",
        }
    }

    pub fn kstat_name(&self) -> &'static str {
        match self {
            ErrorCounter::SoftErrors => "Soft Errors",
            ErrorCounter::HardErrors => "Hard Errors",
            ErrorCounter::TransportErrors => "Transport Errors",
            ErrorCounter::MediaError => "Media Error",
            ErrorCounter::DeviceNotReady => "Device Not Ready",
            ErrorCounter::NoDevice => "No Device",
            ErrorCounter::Recoverable => "Recoverable",
            ErrorCounter::IllegalRequest => "Illegal Request",
            ErrorCounter::PredictiveFailureAnalysis => "Predictive Failure Analysis",
        }
    }

    /// snake_case form used in check names.
    pub fn slug(&self) -> String {
        self.kstat_name().to_lowercase().replace(' ', "_")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Probe {
    KernelLog,
    ChassisStatus,
    BmcAccount,
    SensorDump,
    BootPoolStatus,
    StorageProfile(String),
    ServiceHealth,
    ServiceState(String),
    LicenseHost,
    DomainName,
    OsImages,
    OsVersion,
    FaultSummary,
    FaultLog,
    ErrorCounter(ErrorCounter),
}

impl Probe {
    /// Probes that need a BMC and real chassis behind them.
    pub fn hardware_only(&self) -> bool {
        matches!(
            self,
            Probe::ChassisStatus | Probe::BmcAccount | Probe::SensorDump
        )
    }

    /// Every probe the standard checks read, in execution order.
    pub fn plan(expectations: &Expectations, virtual_machine: bool) -> Vec<Probe> {
        let mut plan = vec![
            Probe::KernelLog,
            Probe::ChassisStatus,
            Probe::BmcAccount,
            Probe::SensorDump,
            Probe::BootPoolStatus,
        ];
        plan.extend(
            expectations
                .storage_profiles
                .iter()
                .map(|p| Probe::StorageProfile(p.dataset.clone())),
        );
        plan.push(Probe::ServiceHealth);
        plan.extend(
            expectations
                .services
                .iter()
                .map(|s| Probe::ServiceState(s.name.clone())),
        );
        plan.extend([
            Probe::LicenseHost,
            Probe::DomainName,
            Probe::OsImages,
            Probe::OsVersion,
            Probe::FaultSummary,
            Probe::FaultLog,
        ]);
        plan.extend(ErrorCounter::ALL.into_iter().map(Probe::ErrorCounter));

        if virtual_machine {
            plan.retain(|p| !p.hardware_only());
        }
        plan
    }

    pub fn command(&self, expectations: &Expectations) -> CommandSpec {
        let timeout = expectations.timeouts.command();
        match self {
            Probe::KernelLog => CommandSpec::new(
                "/usr/bin/egrep",
                &["kern.warn|kern.err", "/var/adm/messages"],
                expectations.timeouts.log_scan(),
            ),
            Probe::ChassisStatus => CommandSpec::new(IPMITOOL, &["chassis", "status"], timeout),
            Probe::BmcAccount => {
                let user_id = expectations.bmc.user_id.to_string();
                CommandSpec::new(
                    IPMITOOL,
                    &["user", "test", &user_id, "16", &expectations.bmc.password],
                    timeout,
                )
                .sensitive()
            }
            Probe::SensorDump => CommandSpec::new(IPMITOOL, &["sdr", "jlist"], timeout),
            Probe::BootPoolStatus => CommandSpec::new(
                "/usr/sbin/zpool",
                &["status", &expectations.boot_pool],
                timeout,
            ),
            Probe::StorageProfile(dataset) => CommandSpec::new(
                "/usr/sbin/zfs",
                &[
                    "get",
                    "-H",
                    "-o",
                    "value",
                    "racktop:storage_profile",
                    dataset,
                ],
                timeout,
            ),
            Probe::ServiceHealth => CommandSpec::new(SVCS, &["-xv"], timeout),
            Probe::ServiceState(service) => {
                CommandSpec::new(SVCS, &["-H", "-o", "state", service], timeout)
            }
            Probe::LicenseHost => CommandSpec::new(MYRACKADM, &["-j", "lic", "show"], timeout),
            Probe::DomainName => {
                CommandSpec::new(BSRADM, &["-j", "dns", "domain", "get"], timeout)
            }
            Probe::OsImages => CommandSpec::new(BSRADM, &["-j", "os", "installed"], timeout),
            Probe::OsVersion => CommandSpec::new(BSRADM, &["-j", "os"], timeout),
            Probe::FaultSummary => CommandSpec::new("/usr/sbin/fmadm", &["faulty", "-s"], timeout),
            Probe::FaultLog => CommandSpec::new(
                "/usr/sbin/fmdump",
                &["-e", "-t30day"],
                expectations.timeouts.log_scan(),
            ),
            Probe::ErrorCounter(counter) => {
                let selector = format!("sderr:::{}", counter.kstat_name());
                CommandSpec::new(KSTAT, &["-j", "-p", &selector], timeout)
            }
        }
    }
}

impl fmt::Display for Probe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Probe::StorageProfile(dataset) => write!(f, "storage profile of {}", dataset),
            Probe::ServiceState(service) => write!(f, "state of service {}", service),
            Probe::ErrorCounter(counter) => write!(f, "kstat '{}'", counter.kstat_name()),
            other => write!(f, "{:?}", other),
        }
    }
}

/// A probe that could not be executed at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeFailure(pub String);

impl fmt::Display for ProbeFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<CommandError> for ProbeFailure {
    fn from(e: CommandError) -> Self {
        ProbeFailure(e.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeRecord {
    /// Operator-facing command line, credentials already redacted.
    pub command: String,
    pub result: Result<CommandOutput, ProbeFailure>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Probes {
    records: BTreeMap<Probe, ProbeRecord>,
}

impl Probes {
    pub fn insert(&mut self, probe: Probe, record: ProbeRecord) {
        self.records.insert(probe, record);
    }

    pub fn get(&self, probe: &Probe) -> Option<&ProbeRecord> {
        self.records.get(probe)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
