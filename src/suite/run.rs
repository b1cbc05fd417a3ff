// (c) Meta Platforms, Inc. and affiliates.
//
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use std::env;

use crate::schema;
use crate::suite::check::{CheckInput, CheckResult, Registry, Report};
use crate::suite::command::CommandRunner;
use crate::suite::config::{self, Expectations, OutputFormat};
use crate::suite::context::Context;
use crate::suite::emitter::JsonEmitter;
use crate::suite::error::{CollectionError, SuiteError};
use crate::suite::render;
use crate::suite::snapshot::{Collector, Snapshot};

/// How a suite run ended, as seen by the operator's shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    /// Every check passed or was skipped.
    Passed,
    ChecksFailed,
    /// Collection failed before any check ran, or the report could not be
    /// written.
    Aborted,
}

impl ExitStatus {
    pub fn code(&self) -> u8 {
        match self {
            ExitStatus::Passed => 0,
            ExitStatus::ChecksFailed => 1,
            ExitStatus::Aborted => 3,
        }
    }

    pub fn from_report(report: &Report) -> Self {
        if report.is_success() {
            ExitStatus::Passed
        } else {
            ExitStatus::ChecksFailed
        }
    }
}

/// What a completed run produced.
#[derive(Debug)]
pub struct RunSummary {
    pub report: Report,
    pub status: ExitStatus,
}

/// One acceptance run against the local unit.
///
/// Collects the snapshot once, evaluates every registered check against it
/// and writes the report in the configured format.
pub struct SuiteRun {
    name: String,
    version: String,
    command_line: String,
    format: OutputFormat,
    expectations: Expectations,
    emitter: JsonEmitter,
}

impl SuiteRun {
    /// Creates a new [`SuiteRunBuilder`] object.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// # tokio_test::block_on(async {
    /// # use shipcheck::suite::*;
    ///
    /// let config = Config::builder().build();
    /// let registry = shipcheck::checks::standard(config.expectations());
    /// let run = SuiteRun::builder("shipcheck", "1.0").config(config).build();
    /// let summary = run.run(&ProcessRunner::new(), &registry).await?;
    /// println!("exit with {}", summary.status.code());
    ///
    /// # Ok::<(), SuiteError>(())
    /// # });
    /// ```
    pub fn builder(name: &str, version: &str) -> SuiteRunBuilder {
        SuiteRunBuilder::new(name, version)
    }

    pub async fn run<R>(self, runner: &R, registry: &Registry) -> Result<RunSummary, SuiteError>
    where
        R: CommandRunner + Sync,
    {
        if self.format == OutputFormat::Json {
            self.emitter
                .emit(&schema::RootImpl::SchemaVersion(
                    schema::SchemaVersion::default(),
                ))
                .await?;
        }

        let collected = Collector::new(runner, &self.expectations).collect().await;
        let snapshot = match collected {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::error!(subsystem = %e.subsystem(), error = %e, "collection failed");
                self.abort(&e).await?;
                return Err(e.into());
            }
        };

        let context = Context::new(&snapshot);
        let input = CheckInput {
            snapshot: &snapshot,
            context: &context,
            expectations: &self.expectations,
            now: self.emitter.timestamp_provider().now().naive_utc(),
        };
        let report = registry.run_all(&input);
        tracing::info!(
            passed = report.passed(),
            failed = report.failed(),
            skipped = report.skipped(),
            "checks evaluated"
        );

        let status = match self.format {
            OutputFormat::Text => {
                let (text, status) = render::render(&report);
                self.emitter.write_text(text.trim_end_matches('\n')).await?;
                status
            }
            OutputFormat::Json => {
                self.emit_report(&snapshot, &report).await?;
                ExitStatus::from_report(&report)
            }
        };

        Ok(RunSummary { report, status })
    }

    async fn abort(&self, error: &CollectionError) -> Result<(), SuiteError> {
        match self.format {
            OutputFormat::Text => {
                self.emitter
                    .write_text(&format!("ERROR: {}", error.hint()))
                    .await?;
            }
            OutputFormat::Json => {
                self.emit_start(None).await?;
                self.emitter
                    .emit_run(schema::TestRunArtifactImpl::Error(schema::Error {
                        symptom: format!("{}-unavailable", error.subsystem()),
                        message: Some(format!("{}; {}", error, error.hint())),
                    }))
                    .await?;
                self.emit_end(schema::TestStatus::Error, schema::TestResult::NotApplicable)
                    .await?;
            }
        }
        Ok(())
    }

    async fn emit_report(&self, snapshot: &Snapshot, report: &Report) -> Result<(), SuiteError> {
        let platform = &snapshot.platform;
        self.emit_start(Some(schema::UnitInfo {
            manufacturer: platform.manufacturer.clone(),
            product: platform.product.clone(),
            system_serial: platform.system_serial.clone(),
            uuid: platform.uuid.clone(),
            virtual_machine: platform.is_vm,
        }))
        .await?;

        for (idx, outcome) in report.outcomes.iter().enumerate() {
            let id = format!("step{}", idx);
            self.emitter
                .emit_step(
                    &id,
                    schema::TestStepArtifactImpl::TestStepStart(schema::TestStepStart {
                        name: outcome.name.clone(),
                        description: outcome.description.clone(),
                    }),
                )
                .await?;

            let diagnosis = match &outcome.result {
                CheckResult::Passed => Some(schema::Diagnosis {
                    verdict: format!("{}-pass", outcome.name),
                    diagnosis_type: schema::DiagnosisType::Pass,
                    message: None,
                }),
                CheckResult::Failed(msg) => Some(schema::Diagnosis {
                    verdict: format!("{}-fail", outcome.name),
                    diagnosis_type: schema::DiagnosisType::Fail,
                    message: Some(msg.clone()),
                }),
                CheckResult::Skipped(_) => None,
            };
            if let Some(diagnosis) = diagnosis {
                self.emitter
                    .emit_step(&id, schema::TestStepArtifactImpl::Diagnosis(diagnosis))
                    .await?;
            }

            let end = match &outcome.result {
                CheckResult::Skipped(reason) => schema::TestStepEnd {
                    status: schema::TestStatus::Skip,
                    reason: Some(reason.clone()),
                },
                _ => schema::TestStepEnd {
                    status: schema::TestStatus::Complete,
                    reason: None,
                },
            };
            self.emitter
                .emit_step(&id, schema::TestStepArtifactImpl::TestStepEnd(end))
                .await?;
        }

        let result = if report.is_success() {
            schema::TestResult::Pass
        } else {
            schema::TestResult::Fail
        };
        self.emit_end(schema::TestStatus::Complete, result).await
    }

    async fn emit_start(&self, unit: Option<schema::UnitInfo>) -> Result<(), SuiteError> {
        self.emitter
            .emit_run(schema::TestRunArtifactImpl::TestRunStart(schema::TestRunStart {
                name: self.name.clone(),
                version: self.version.clone(),
                command_line: self.command_line.clone(),
                unit,
            }))
            .await?;
        Ok(())
    }

    async fn emit_end(
        &self,
        status: schema::TestStatus,
        result: schema::TestResult,
    ) -> Result<(), SuiteError> {
        self.emitter
            .emit_run(schema::TestRunArtifactImpl::TestRunEnd(schema::TestRunEnd {
                status,
                result,
            }))
            .await?;
        Ok(())
    }
}

/// Builder for the [`SuiteRun`] object.
pub struct SuiteRunBuilder {
    name: String,
    version: String,
    command_line: String,
    config: Option<config::Config>,
}

impl SuiteRunBuilder {
    pub fn new(name: &str, version: &str) -> Self {
        Self {
            name: name.to_string(),
            version: version.to_string(),
            command_line: env::args().skip(1).collect::<Vec<_>>().join(" "),
            config: None,
        }
    }

    /// Overrides the command line reported in the run start artifact.
    pub fn command_line(mut self, cmd: &str) -> Self {
        self.command_line = cmd.to_string();
        self
    }

    pub fn config(mut self, value: config::Config) -> Self {
        self.config = Some(value);
        self
    }

    pub fn build(self) -> SuiteRun {
        let config = self
            .config
            .unwrap_or_else(|| config::Config::builder().build());
        let emitter = JsonEmitter::new(config.timestamp_provider, config.writer);

        SuiteRun {
            name: self.name,
            version: self.version,
            command_line: self.command_line,
            format: config.format,
            expectations: config.expectations,
            emitter,
        }
    }
}
