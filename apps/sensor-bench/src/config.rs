use crate::cli::{RiskArgs, TelemetryArgs};
use crate::telemetry::{Clock, Decoder, DEFAULT_PAYLOAD_SIZE};
use anyhow::{anyhow, bail, Context, Result};
use clap::ValueEnum;
use dotenvy::dotenv;
use std::env;
use std::num::NonZeroUsize;
use std::str::FromStr;

const DEFAULT_RISK_SENSORS: usize = 100;
const DEFAULT_RISK_ITERATIONS: u32 = 50_000;
const DEFAULT_WARMUP_ROUNDS: usize = 3;
const DEFAULT_TELEMETRY_TOTAL: usize = 1_000_000;
const DEFAULT_TELEMETRY_BATCH: usize = 10_000;
const DEFAULT_TELEMETRY_DEVICES: usize = 1_000;

pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
}

#[derive(Clone, Debug, PartialEq)]
pub struct RiskConfig {
    pub sensors: usize,
    pub iterations: u32,
    pub workers: usize,
    pub warmup_rounds: usize,
}

impl RiskConfig {
    /// Environment first (`.env` honoured), then command-line flags on top.
    pub fn load(args: &RiskArgs) -> Result<Self> {
        dotenv().ok();
        let mut config = Self::from_lookup(|key| env::var(key).ok())?;
        config.apply_args(args);
        config.validate()?;
        Ok(config)
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        Ok(Self {
            sensors: parse_or(&lookup, "RISK_SENSORS", DEFAULT_RISK_SENSORS)?,
            iterations: parse_or(&lookup, "RISK_ITERATIONS", DEFAULT_RISK_ITERATIONS)?,
            workers: parse_or(&lookup, "BENCH_WORKERS", default_workers())?,
            warmup_rounds: parse_or(&lookup, "RISK_WARMUP_ROUNDS", DEFAULT_WARMUP_ROUNDS)?,
        })
    }

    pub fn apply_args(&mut self, args: &RiskArgs) {
        if let Some(value) = args.sensors {
            self.sensors = value;
        }
        if let Some(value) = args.iterations {
            self.iterations = value;
        }
        if let Some(value) = args.workers {
            self.workers = value;
        }
        if let Some(value) = args.warmup_rounds {
            self.warmup_rounds = value;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            bail!("workers must be at least 1");
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct TelemetryConfig {
    pub total: usize,
    pub workers: usize,
    pub batch: usize,
    pub devices: usize,
    pub payload_size: usize,
    pub decoder: Decoder,
    pub clock: Clock,
}

impl TelemetryConfig {
    pub fn load(args: &TelemetryArgs) -> Result<Self> {
        dotenv().ok();
        let mut config = Self::from_lookup(|key| env::var(key).ok())?;
        config.apply_args(args);
        config.validate()?;
        Ok(config)
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let decoder = match non_empty(&lookup, "TELEMETRY_DECODER") {
            Some(raw) => <Decoder as ValueEnum>::from_str(&raw, true)
                .map_err(|err| anyhow!("invalid TELEMETRY_DECODER: {err}"))?,
            None => Decoder::default(),
        };
        let clock = match non_empty(&lookup, "TELEMETRY_FIXED_TS") {
            Some(raw) => Clock::Fixed(
                raw.parse::<i64>()
                    .context("invalid TELEMETRY_FIXED_TS")?,
            ),
            None => Clock::WallClock,
        };

        Ok(Self {
            total: parse_or(&lookup, "TELEMETRY_TOTAL", DEFAULT_TELEMETRY_TOTAL)?,
            workers: parse_or(&lookup, "BENCH_WORKERS", default_workers())?,
            batch: parse_or(&lookup, "TELEMETRY_BATCH", DEFAULT_TELEMETRY_BATCH)?,
            devices: parse_or(&lookup, "TELEMETRY_DEVICES", DEFAULT_TELEMETRY_DEVICES)?,
            payload_size: parse_or(&lookup, "TELEMETRY_PAYLOAD_SIZE", DEFAULT_PAYLOAD_SIZE)?,
            decoder,
            clock,
        })
    }

    pub fn apply_args(&mut self, args: &TelemetryArgs) {
        if let Some(value) = args.total {
            self.total = value;
        }
        if let Some(value) = args.workers {
            self.workers = value;
        }
        if let Some(value) = args.batch {
            self.batch = value;
        }
        if let Some(value) = args.devices {
            self.devices = value;
        }
        if let Some(value) = args.payload_size {
            self.payload_size = value;
        }
        if let Some(value) = args.decoder {
            self.decoder = value;
        }
        // A pinned stamp of 0 is accepted on purpose: every record then fails validation.
        if let Some(value) = args.fixed_ts {
            self.clock = Clock::Fixed(value);
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            bail!("workers must be at least 1");
        }
        if self.batch == 0 {
            bail!("batch must be at least 1");
        }
        if self.devices == 0 {
            bail!("devices must be at least 1");
        }
        Ok(())
    }
}

fn non_empty(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<String> {
    lookup(key)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match non_empty(lookup, key) {
        Some(raw) => raw.parse::<T>().with_context(|| format!("invalid {key}")),
        None => Ok(default),
    }
}
