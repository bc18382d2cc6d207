use clap::Parser;

use crate::telemetry::Decoder;

#[derive(Parser, Debug, Default)]
#[command(
    name = "risk-bench",
    version,
    about = "Monte Carlo sensor risk simulation benchmark"
)]
pub struct RiskArgs {
    /// Total synthetic sensors, split evenly across workers
    #[arg(long)]
    pub sensors: Option<usize>,
    /// Monte Carlo steps per sensor
    #[arg(long)]
    pub iterations: Option<u32>,
    /// Worker pool size (defaults to available parallelism)
    #[arg(long)]
    pub workers: Option<usize>,
    /// Untimed single-threaded warmup rounds; 0 disables warmup
    #[arg(long)]
    pub warmup_rounds: Option<usize>,
}

#[derive(Parser, Debug, Default)]
#[command(
    name = "telemetry-bench",
    version,
    about = "Telemetry JSON ingest and per-device aggregation benchmark"
)]
pub struct TelemetryArgs {
    /// Total records to generate and aggregate
    #[arg(long)]
    pub total: Option<usize>,
    /// Worker pool size (defaults to available parallelism)
    #[arg(long)]
    pub workers: Option<usize>,
    /// Records per task
    #[arg(long)]
    pub batch: Option<usize>,
    /// Distinct device ids cycled through by the generator
    #[arg(long)]
    pub devices: Option<usize>,
    /// Filler bytes in each record's payload field
    #[arg(long)]
    pub payload_size: Option<usize>,
    #[arg(long, value_enum)]
    pub decoder: Option<Decoder>,
    /// Pin every record's `ts` to this value (ms) for reproducible checksums
    #[arg(long, allow_negative_numbers = true)]
    pub fixed_ts: Option<i64>,
}
