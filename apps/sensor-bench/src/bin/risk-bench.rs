use anyhow::Result;
use clap::Parser;
use sensor_bench::cli::RiskArgs;
use sensor_bench::config::RiskConfig;
use sensor_bench::{logging, report, risk};

fn main() -> Result<()> {
    let args = RiskArgs::parse();
    let config = RiskConfig::load(&args)?;
    logging::init_tracing()?;
    tracing::debug!(?config, "risk benchmark configured");

    let summary = risk::run(&config)?;
    report::emit(&summary)
}
