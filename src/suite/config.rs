// (c) Meta Platforms, Inc. and affiliates.
//
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use maplit::btreemap;
use serde::Deserialize;
use tokio::sync::Mutex;

use crate::suite::error::ConfigError;
use crate::suite::writer::{self, WriterType};

/// Source of the "current time" for a run: artifact timestamps and the
/// registration date checks both read it.
pub trait TimestampProvider {
    fn now(&self) -> chrono::DateTime<chrono_tz::Tz>;
}

struct ConfiguredTzProvider {
    tz: chrono_tz::Tz,
}

impl TimestampProvider for ConfiguredTzProvider {
    fn now(&self) -> chrono::DateTime<chrono_tz::Tz> {
        chrono::Local::now().with_timezone(&self.tz)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human readable report.
    #[default]
    Text,
    /// One JSON artifact per line.
    Json,
}

/// The configuration repository for a suite run.
pub struct Config {
    pub(crate) timestamp_provider: Box<dyn TimestampProvider + Send + Sync + 'static>,
    pub(crate) writer: WriterType,
    pub(crate) format: OutputFormat,
    pub(crate) expectations: Expectations,
}

impl Config {
    /// Creates a new [`ConfigBuilder`]
    ///
    /// # Examples
    /// ```rust
    /// # use shipcheck::suite::*;
    ///
    /// let builder = Config::builder();
    /// ```
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    pub fn expectations(&self) -> &Expectations {
        &self.expectations
    }
}

/// The builder for the [`Config`] object.
pub struct ConfigBuilder {
    timezone: Option<chrono_tz::Tz>,
    timestamp_provider: Option<Box<dyn TimestampProvider + Send + Sync + 'static>>,
    writer: Option<WriterType>,
    format: OutputFormat,
    expectations: Option<Expectations>,
}

impl ConfigBuilder {
    fn new() -> Self {
        Self {
            timezone: None,
            timestamp_provider: None,
            writer: Some(WriterType::Stdout(writer::StdoutWriter::new())),
            format: OutputFormat::default(),
            expectations: None,
        }
    }

    /// Timezone of artifact timestamps. Checks compare against UTC whatever
    /// is set here.
    pub fn timezone(mut self, timezone: chrono_tz::Tz) -> Self {
        self.timezone = Some(timezone);
        self
    }

    pub fn with_timestamp_provider(
        mut self,
        timestamp_provider: Box<dyn TimestampProvider + Send + Sync + 'static>,
    ) -> Self {
        self.timestamp_provider = Some(timestamp_provider);
        self
    }

    pub fn with_buffer_output(mut self, buffer: Arc<Mutex<Vec<String>>>) -> Self {
        self.writer = Some(WriterType::Buffer(writer::BufferWriter::new(buffer)));
        self
    }

    pub async fn with_file_output<P: AsRef<Path>>(
        mut self,
        path: P,
    ) -> Result<Self, std::io::Error> {
        self.writer = Some(WriterType::File(writer::FileWriter::create(path).await?));
        Ok(self)
    }

    pub fn with_custom_output(
        mut self,
        custom: Box<dyn writer::Writer + Send + Sync + 'static>,
    ) -> Self {
        self.writer = Some(WriterType::Custom(custom));
        self
    }

    pub fn format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    pub fn expectations(mut self, expectations: Expectations) -> Self {
        self.expectations = Some(expectations);
        self
    }

    pub fn build(self) -> Config {
        let tz = self.timezone.unwrap_or(chrono_tz::UTC);
        Config {
            timestamp_provider: self
                .timestamp_provider
                .unwrap_or(Box::new(ConfiguredTzProvider { tz })),
            writer: self
                .writer
                .unwrap_or(WriterType::Stdout(writer::StdoutWriter::new())),
            format: self.format,
            expectations: self.expectations.unwrap_or_default(),
        }
    }
}

/// Values the appliance is expected to report.
///
/// Every field has a default matching the current appliance generation, so an
/// expectations file only needs to name what differs.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Expectations {
    pub platform: PlatformExpectations,
    pub os_boot_guid: String,
    pub services: Vec<ServiceExpectation>,
    pub storage_profiles: Vec<StorageProfileExpectation>,
    /// Expected `ipmitool chassis status` values, keyed by the field name
    /// with whitespace removed.
    pub chassis: BTreeMap<String, String>,
    pub min_drive_count: usize,
    pub bmc: BmcAccount,
    pub boot_pool: String,
    pub core_dir: PathBuf,
    pub timeouts: Timeouts,
}

impl Default for Expectations {
    fn default() -> Self {
        let chassis = btreemap! {
            "SystemPower" => "on",
            "PowerOverload" => "false",
            "PowerInterlock" => "inactive",
            "MainPowerFault" => "false",
            "PowerControlFault" => "false",
            "PowerRestorePolicy" => "previous",
            "LastPowerEvent" => "",
            "ChassisIntrusion" => "inactive",
            "Front-PanelLockout" => "inactive",
            "DriveFault" => "false",
            "Cooling/FanFault" => "false",
            "SleepButtonDisable" => "notallowed",
            "DiagButtonDisable" => "allowed",
            "ResetButtonDisable" => "allowed",
            "PowerButtonDisable" => "allowed",
            "SleepButtonDisabled" => "false",
            "DiagButtonDisabled" => "false",
            "ResetButtonDisabled" => "false",
            "PowerButtonDisabled" => "false",
        };

        Expectations {
            platform: PlatformExpectations::default(),
            os_boot_guid: "dba9947551e0e39790c68660ed248775".to_owned(),
            services: [
                "bsrlicensed",
                "bsrinit",
                "hwd",
                "secured",
                "dataprotectiond",
                "datareplicationd",
                "bsrapid",
            ]
            .into_iter()
            .map(|name| ServiceExpectation {
                name: name.to_owned(),
                state: "online".to_owned(),
            })
            .collect(),
            storage_profiles: vec![
                StorageProfileExpectation {
                    dataset: "bp/etc".to_owned(),
                    profile: "sysconfig_filesystem".to_owned(),
                },
                StorageProfileExpectation {
                    dataset: "bp/var".to_owned(),
                    profile: "system".to_owned(),
                },
            ],
            chassis: chassis
                .into_iter()
                .map(|(k, v)| (k.to_owned(), v.to_owned()))
                .collect(),
            min_drive_count: 12,
            bmc: BmcAccount::default(),
            boot_pool: "bp".to_owned(),
            core_dir: PathBuf::from("/var/cores"),
            timeouts: Timeouts::default(),
        }
    }
}

impl Expectations {
    pub async fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;

        Self::from_json(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    pub fn service_state(&self, service: &str) -> Option<&str> {
        self.services
            .iter()
            .find(|s| s.name == service)
            .map(|s| s.state.as_str())
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct PlatformExpectations {
    pub manufacturer: String,
    pub product: String,
    pub system_family: String,
    pub baseboard_part_number: String,
    pub chassis_type: String,
}

impl Default for PlatformExpectations {
    fn default() -> Self {
        PlatformExpectations {
            manufacturer: "RackTop Systems".to_owned(),
            product: "BrickStor".to_owned(),
            system_family: "BrickStor".to_owned(),
            baseboard_part_number: "S2600WTTR".to_owned(),
            chassis_type: "RackMountChassis".to_owned(),
        }
    }
}

/// Expected state of one service-manager service. The state is per service
/// because it has differed between appliance generations.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ServiceExpectation {
    pub name: String,
    pub state: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct StorageProfileExpectation {
    pub dataset: String,
    pub profile: String,
}

/// Factory BMC account whose presence is verified.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct BmcAccount {
    pub user_id: u8,
    pub password: String,
}

impl Default for BmcAccount {
    fn default() -> Self {
        BmcAccount {
            user_id: 2,
            password: "racktop".to_owned(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Timeouts {
    /// Required inventory, security and platform queries.
    pub collection_secs: u64,
    pub command_secs: u64,
    /// Log scans are cut off rather than waited on.
    pub log_scan_secs: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Timeouts {
            collection_secs: 120,
            command_secs: 60,
            log_scan_secs: 5,
        }
    }
}

impl Timeouts {
    pub fn collection(&self) -> Duration {
        Duration::from_secs(self.collection_secs)
    }

    pub fn command(&self) -> Duration {
        Duration::from_secs(self.command_secs)
    }

    pub fn log_scan(&self) -> Duration {
        Duration::from_secs(self.log_scan_secs)
    }
}
