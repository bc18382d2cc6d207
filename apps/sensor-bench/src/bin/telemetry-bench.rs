use anyhow::Result;
use clap::Parser;
use sensor_bench::cli::TelemetryArgs;
use sensor_bench::config::TelemetryConfig;
use sensor_bench::{logging, report, telemetry};

fn main() -> Result<()> {
    let args = TelemetryArgs::parse();
    let config = TelemetryConfig::load(&args)?;
    logging::init_tracing()?;
    tracing::debug!(?config, "telemetry benchmark configured");

    let summary = telemetry::run(&config)?;
    report::emit(&summary)
}
