// (c) Meta Platforms, Inc. and affiliates.
//
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Invariant checks and the registry that runs them.
//!
//! A check is a pure function of the [`Snapshot`], the derived [`Context`] and
//! the configured [`Expectations`]. It never runs commands itself and never
//! sees another check's outcome, so execution order only affects the order
//! of the report.

use std::fmt;

use chrono::NaiveDateTime;

use crate::suite::command::CommandOutput;
use crate::suite::config::Expectations;
use crate::suite::context::Context;
use crate::suite::probe::Probe;
use crate::suite::snapshot::Snapshot;

/// Reason given for checks that need physical hardware.
pub const VIRTUAL_MACHINE_SKIP: &str = "virtual machine";

/// Outcome of a single check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckResult {
    Passed,
    Failed(String),
    Skipped(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckOutcome {
    pub name: String,
    pub description: String,
    pub result: CheckResult,
}

/// A check's diagnostic: what was expected and what was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure(pub String);

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for Failure {
    fn from(s: String) -> Self {
        Failure(s)
    }
}

impl From<&str> for Failure {
    fn from(s: &str) -> Self {
        Failure(s.to_owned())
    }
}

pub type Verdict = Result<(), Failure>;

/// Collects every problem a check finds instead of stopping at the first, so
/// one bad drive does not hide another.
#[derive(Debug, Default)]
pub struct Findings {
    problems: Vec<String>,
}

impl Findings {
    pub fn new() -> Self {
        Findings::default()
    }

    pub fn push<S: Into<String>>(&mut self, problem: S) {
        self.problems.push(problem.into());
    }

    pub fn ensure<F>(&mut self, ok: bool, problem: F)
    where
        F: FnOnce() -> String,
    {
        if !ok {
            self.problems.push(problem());
        }
    }

    /// Records `<subject>: expected <expected>, got <actual>` on mismatch.
    pub fn ensure_eq<T>(&mut self, subject: impl fmt::Display, expected: T, actual: T)
    where
        T: PartialEq + fmt::Debug,
    {
        if expected != actual {
            self.problems.push(format!(
                "{}: expected {:?}, got {:?}",
                subject, expected, actual
            ));
        }
    }

    pub fn is_empty(&self) -> bool {
        self.problems.is_empty()
    }

    pub fn finish(self) -> Verdict {
        if self.problems.is_empty() {
            Ok(())
        } else {
            Err(Failure(self.problems.join("\n")))
        }
    }
}

/// Everything a check may read.
pub struct CheckInput<'a> {
    pub snapshot: &'a Snapshot,
    pub context: &'a Context,
    pub expectations: &'a Expectations,
    /// Time of the run in UTC, the zone drive registration timestamps use.
    pub now: NaiveDateTime,
}

impl CheckInput<'_> {
    /// Output of a probe that ran, or the reason it is unusable.
    pub fn probe(&self, probe: &Probe) -> Result<&CommandOutput, Failure> {
        let record = self
            .snapshot
            .probes
            .get(probe)
            .ok_or_else(|| Failure(format!("{} was not collected", probe)))?;

        record
            .result
            .as_ref()
            .map_err(|e| Failure(format!("'{}' could not be run: {}", record.command, e)))
    }

    /// Like [`CheckInput::probe`], but the command must also have succeeded.
    pub fn probe_ok(&self, probe: &Probe) -> Result<&CommandOutput, Failure> {
        let output = self.probe(probe)?;
        if output.success() {
            return Ok(output);
        }

        let command = self
            .snapshot
            .probes
            .get(probe)
            .map(|r| r.command.as_str())
            .unwrap_or_default();
        Err(Failure(format!(
            "'{}' {}",
            command,
            output.describe_status()
        )))
    }

    /// Probe output parsed as JSON.
    pub fn probe_json<T: serde::de::DeserializeOwned>(&self, probe: &Probe) -> Result<T, Failure> {
        let output = self.probe_ok(probe)?;
        serde_json::from_slice(&output.stdout)
            .map_err(|e| Failure(format!("unexpected output for {}: {}", probe, e)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Always,
    /// Meaningless on virtualized hardware: chassis, sensors, bays, BMC.
    PhysicalOnly,
}

type Evaluator = Box<dyn Fn(&CheckInput<'_>) -> Verdict + Send + Sync + 'static>;

pub struct Check {
    name: String,
    description: String,
    scope: Scope,
    evaluate: Evaluator,
}

impl Check {
    pub fn new<F>(name: &str, description: &str, evaluate: F) -> Self
    where
        F: Fn(&CheckInput<'_>) -> Verdict + Send + Sync + 'static,
    {
        Check {
            name: name.to_owned(),
            description: description.to_owned(),
            scope: Scope::Always,
            evaluate: Box::new(evaluate),
        }
    }

    pub fn physical_only(mut self) -> Self {
        self.scope = Scope::PhysicalOnly;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn scope(&self) -> Scope {
        self.scope
    }

    pub fn run(&self, input: &CheckInput<'_>) -> CheckOutcome {
        let result = if self.scope == Scope::PhysicalOnly && input.context.is_virtual_machine() {
            CheckResult::Skipped(VIRTUAL_MACHINE_SKIP.to_owned())
        } else {
            match (self.evaluate)(input) {
                Ok(()) => CheckResult::Passed,
                Err(Failure(msg)) => CheckResult::Failed(msg),
            }
        };

        CheckOutcome {
            name: self.name.clone(),
            description: self.description.clone(),
            result,
        }
    }
}

impl fmt::Debug for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Check")
            .field("name", &self.name)
            .field("scope", &self.scope)
            .finish()
    }
}

/// Ordered collection of checks.
#[derive(Debug, Default)]
pub struct Registry {
    checks: Vec<Check>,
}

impl Registry {
    pub fn new() -> Self {
        Registry::default()
    }

    pub fn add(&mut self, check: Check) -> &mut Self {
        self.checks.push(check);
        self
    }

    pub fn len(&self) -> usize {
        self.checks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.checks.iter().map(Check::name)
    }

    pub fn get(&self, name: &str) -> Option<&Check> {
        self.checks.iter().find(|c| c.name == name)
    }

    pub fn run_all(&self, input: &CheckInput<'_>) -> Report {
        let outcomes = self
            .checks
            .iter()
            .map(|check| {
                let outcome = check.run(input);
                tracing::debug!(check = %outcome.name, result = ?outcome.result, "evaluated");
                outcome
            })
            .collect();
        Report { outcomes }
    }
}

/// Ordered outcomes of one suite run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    pub outcomes: Vec<CheckOutcome>,
}

impl Report {
    pub fn passed(&self) -> usize {
        self.count(|r| matches!(r, CheckResult::Passed))
    }

    pub fn failed(&self) -> usize {
        self.count(|r| matches!(r, CheckResult::Failed(_)))
    }

    pub fn skipped(&self) -> usize {
        self.count(|r| matches!(r, CheckResult::Skipped(_)))
    }

    /// Skips do not count against success.
    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }

    pub fn outcome(&self, name: &str) -> Option<&CheckOutcome> {
        self.outcomes.iter().find(|o| o.name == name)
    }

    fn count<F: Fn(&CheckResult) -> bool>(&self, pred: F) -> usize {
        self.outcomes.iter().filter(|o| pred(&o.result)).count()
    }
}
