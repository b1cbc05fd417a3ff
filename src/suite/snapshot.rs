// (c) Meta Platforms, Inc. and affiliates.
//
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use std::fmt;
use std::io;
use std::path::Path;

use serde::de::DeserializeOwned;

use crate::suite::command::{CommandRunner, CommandSpec};
use crate::suite::config::Expectations;
use crate::suite::error::CollectionError;
use crate::suite::inventory::{Inventory, Platform, SecurityInfo};
use crate::suite::probe::{Probe, ProbeFailure, ProbeRecord, Probes};

/// The services without which no check can be evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subsystem {
    Inventory,
    Security,
    Platform,
}

impl Subsystem {
    /// Collection order.
    pub const ALL: [Subsystem; 3] = [Subsystem::Inventory, Subsystem::Security, Subsystem::Platform];

    pub fn name(&self) -> &'static str {
        match self {
            Subsystem::Inventory => "inventory",
            Subsystem::Security => "security",
            Subsystem::Platform => "platform",
        }
    }

    /// The daemon answering the query.
    pub fn service(&self) -> &'static str {
        match self {
            Subsystem::Inventory => "hwd",
            Subsystem::Security => "secured",
            Subsystem::Platform => "bsradm",
        }
    }

    pub fn hint(&self) -> &'static str {
        match self {
            Subsystem::Inventory => "hwd service is probably not running, check with: 'svcs hwd'",
            Subsystem::Security => {
                "secured service is probably not running, check with: 'svcs secured'"
            }
            Subsystem::Platform => "system is probably not registered, check with: 'bsradm smb'",
        }
    }

    pub fn command(&self, expectations: &Expectations) -> CommandSpec {
        let timeout = expectations.timeouts.collection();
        match self {
            Subsystem::Inventory => {
                CommandSpec::new("/usr/racktop/sbin/hwadm", &["-j", "ls", "a"], timeout)
            }
            Subsystem::Security => {
                CommandSpec::new("/usr/racktop/sbin/secadm", &["-j", "ls", "a"], timeout)
            }
            Subsystem::Platform => CommandSpec::new("/usr/racktop/sbin/bsradm", &["-j", "smb"], timeout),
        }
    }
}

impl fmt::Display for Subsystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Everything the checks know about the system, gathered once per run.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub inventory: Inventory,
    pub security: SecurityInfo,
    pub platform: Platform,
    pub probes: Probes,
    /// File names found in the crash dump directory.
    pub core_files: Result<Vec<String>, ProbeFailure>,
}

impl Default for Snapshot {
    fn default() -> Self {
        Snapshot {
            inventory: Inventory::default(),
            security: SecurityInfo::default(),
            platform: Platform::default(),
            probes: Probes::default(),
            core_files: Ok(vec![]),
        }
    }
}

/// Queries every subsystem exactly once and assembles the [`Snapshot`].
pub struct Collector<'a, R> {
    runner: &'a R,
    expectations: &'a Expectations,
}

impl<'a, R> Collector<'a, R>
where
    R: CommandRunner + Sync,
{
    pub fn new(runner: &'a R, expectations: &'a Expectations) -> Self {
        Collector {
            runner,
            expectations,
        }
    }

    pub async fn collect(&self) -> Result<Snapshot, CollectionError> {
        let inventory: Inventory = self.required(Subsystem::Inventory).await?;
        let security: SecurityInfo = self.required(Subsystem::Security).await?;
        let platform: Platform = self.required(Subsystem::Platform).await?;

        let probes = self.probe_all(platform.is_vm).await;
        let core_files = list_core_files(&self.expectations.core_dir)
            .await
            .map_err(|e| {
                ProbeFailure(format!(
                    "cannot list {}: {}",
                    self.expectations.core_dir.display(),
                    e
                ))
            });

        tracing::info!(
            drives = inventory.drives.len(),
            units = inventory.units.len(),
            probes = probes.len(),
            virtual_machine = platform.is_vm,
            "snapshot collected"
        );

        Ok(Snapshot {
            inventory,
            security,
            platform,
            probes,
            core_files,
        })
    }

    async fn required<T: DeserializeOwned>(
        &self,
        subsystem: Subsystem,
    ) -> Result<T, CollectionError> {
        let command = subsystem.command(self.expectations);
        let output = self
            .runner
            .run(&command)
            .await
            .map_err(|source| CollectionError::Unreachable { subsystem, source })?;

        if output.timed_out {
            return Err(CollectionError::TimedOut {
                subsystem,
                timeout: command.timeout,
            });
        }
        match output.status {
            Some(0) => {}
            Some(status) => return Err(CollectionError::Failed { subsystem, status }),
            None => return Err(CollectionError::Killed { subsystem }),
        }

        serde_json::from_slice(&output.stdout)
            .map_err(|source| CollectionError::Malformed { subsystem, source })
    }

    async fn probe_all(&self, virtual_machine: bool) -> Probes {
        let mut probes = Probes::default();
        for probe in Probe::plan(self.expectations, virtual_machine) {
            let command = probe.command(self.expectations);
            let result = self.runner.run(&command).await.map_err(|e| {
                tracing::warn!(probe = %probe, error = %e, "probe failed");
                ProbeFailure::from(e)
            });
            probes.insert(
                probe,
                ProbeRecord {
                    command: command.display(),
                    result,
                },
            );
        }
        probes
    }
}

/// A missing directory holds no core files.
async fn list_core_files(dir: &Path) -> io::Result<Vec<String>> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(vec![]),
        Err(e) => return Err(e),
    };

    let mut files = vec![];
    while let Some(entry) = entries.next_entry().await? {
        if entry.file_type().await?.is_dir() {
            continue;
        }
        files.push(entry.file_name().to_string_lossy().into_owned());
    }
    files.sort();
    Ok(files)
}
