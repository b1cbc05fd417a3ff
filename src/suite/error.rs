// (c) Meta Platforms, Inc. and affiliates.
//
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use crate::suite::command::CommandError;
use crate::suite::snapshot::Subsystem;

/// A required subsystem could not be queried. Fatal to the whole run.
#[derive(Debug, thiserror::Error)]
pub enum CollectionError {
    #[error("{subsystem} query could not be run: {source}")]
    Unreachable {
        subsystem: Subsystem,
        #[source]
        source: CommandError,
    },

    #[error("{subsystem} query timed out after {timeout:?}")]
    TimedOut {
        subsystem: Subsystem,
        timeout: Duration,
    },

    #[error("{subsystem} query failed with status {status}")]
    Failed { subsystem: Subsystem, status: i32 },

    #[error("{subsystem} query was terminated by a signal")]
    Killed { subsystem: Subsystem },

    #[error("{subsystem} returned malformed output: {source}")]
    Malformed {
        subsystem: Subsystem,
        #[source]
        source: serde_json::Error,
    },
}

impl CollectionError {
    pub fn subsystem(&self) -> Subsystem {
        match self {
            CollectionError::Unreachable { subsystem, .. }
            | CollectionError::TimedOut { subsystem, .. }
            | CollectionError::Failed { subsystem, .. }
            | CollectionError::Killed { subsystem }
            | CollectionError::Malformed { subsystem, .. } => *subsystem,
        }
    }

    pub fn status(&self) -> Option<i32> {
        match self {
            CollectionError::Failed { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// What the operator should look at next.
    pub fn hint(&self) -> String {
        match self {
            CollectionError::Failed { status, subsystem } if *status != 1 => {
                format!("something unexpected happened with {}!", subsystem.service())
            }
            CollectionError::Malformed { subsystem, .. } => {
                format!("unexpected output from {}!", subsystem.service())
            }
            other => other.subsystem().hint().to_owned(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read expectations from {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot parse expectations in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("unknown timezone '{0}'")]
    UnknownTimezone(String),
}

/// Top level error of a suite run. Check failures are not errors; they are
/// part of the report.
#[derive(Debug, thiserror::Error)]
pub enum SuiteError {
    #[error(transparent)]
    Collection(#[from] CollectionError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed writing report: {0}")]
    Io(#[from] io::Error),
}
