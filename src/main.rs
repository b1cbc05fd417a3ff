// (c) Meta Platforms, Inc. and affiliates.
//
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use shipcheck::checks;
use shipcheck::suite::{
    Config, ConfigError, ExitStatus, Expectations, OutputFormat, ProcessRunner, SuiteError,
    SuiteRun,
};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
}

impl From<Format> for OutputFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Text => OutputFormat::Text,
            Format::Json => OutputFormat::Json,
        }
    }
}

/// Certify that a freshly assembled storage appliance is ready to ship.
#[derive(Debug, Parser)]
#[command(name = "shipcheck", version, about)]
struct Cli {
    /// Report format
    #[arg(long, value_enum, default_value = "text")]
    format: Format,

    /// Write the report to a file instead of stdout
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// JSON file overriding the expected appliance values
    #[arg(long, env = "SHIPCHECK_EXPECTATIONS")]
    expectations: Option<PathBuf>,

    /// Timezone for artifact timestamps
    #[arg(long, default_value = "UTC")]
    timezone: String,

    /// Verbose logging
    #[arg(long, short)]
    verbose: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .without_time()
                .with_writer(std::io::stderr),
        )
        .init();

    let status = match run(cli).await {
        Ok(status) => status,
        // already reported in the output stream
        Err(SuiteError::Collection(_)) => ExitStatus::Aborted,
        Err(e) => {
            tracing::error!(error = %e, "suite aborted");
            eprintln!("ERROR: {}", e);
            ExitStatus::Aborted
        }
    };
    ExitCode::from(status.code())
}

async fn run(cli: Cli) -> Result<ExitStatus, SuiteError> {
    let timezone: chrono_tz::Tz = cli
        .timezone
        .parse()
        .map_err(|_| ConfigError::UnknownTimezone(cli.timezone.clone()))?;

    let expectations = match &cli.expectations {
        Some(path) => Expectations::load(path).await?,
        None => Expectations::default(),
    };

    let mut builder = Config::builder()
        .timezone(timezone)
        .format(cli.format.into())
        .expectations(expectations);
    if let Some(path) = &cli.output {
        builder = builder.with_file_output(path).await?;
    }
    let config = builder.build();

    let registry = checks::standard(config.expectations());
    tracing::debug!(checks = registry.len(), "registry built");

    let summary = SuiteRun::builder("shipcheck", env!("CARGO_PKG_VERSION"))
        .config(config)
        .build()
        .run(&ProcessRunner::new(), &registry)
        .await?;
    Ok(summary.status)
}
