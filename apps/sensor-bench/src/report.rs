use crate::pool::Phase;
use anyhow::{Context, Result};
use serde::ser::Error as _;
use serde::{Serialize, Serializer};
use serde_json::value::RawValue;
use std::io::Write;
use std::time::Duration;

pub const LANG: &str = "rust";

/// Reduced totals of a run plus the wall time of its pooled phase.
#[derive(Clone, Copy, Debug)]
pub struct Measured<T> {
    pub totals: T,
    pub elapsed: Duration,
}

// Field order is the key order of the emitted line.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RiskSummary {
    pub lang: &'static str,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub workers: usize,
    pub sensors: usize,
    pub iterations: u32,
    #[serde(serialize_with = "one_decimal")]
    pub ms: f64,
    pub ops_per_sec: u64,
    #[serde(serialize_with = "six_decimals")]
    pub avg_risk: f64,
    pub checksum: i64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TelemetrySummary {
    pub lang: &'static str,
    pub workers: usize,
    pub total: usize,
    #[serde(serialize_with = "one_decimal")]
    pub ms: f64,
    pub rps: u64,
    pub checksum: u64,
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}

/// Writes `value` as a plain decimal with exactly `decimals` fraction digits, never in
/// exponent form. Non-finite values become `null`.
fn fixed_point<S: Serializer>(
    value: f64,
    decimals: usize,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    if !value.is_finite() {
        return serializer.serialize_none();
    }
    RawValue::from_string(format!("{value:.decimals$}"))
        .map_err(S::Error::custom)?
        .serialize(serializer)
}

fn one_decimal<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    fixed_point(*value, 1, serializer)
}

fn six_decimals<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    fixed_point(*value, 6, serializer)
}

pub fn elapsed_ms(elapsed: Duration) -> f64 {
    round_to(elapsed.as_secs_f64() * 1000.0, 1)
}

/// Items per second, rounded to the nearest integer.
pub fn throughput(items: usize, elapsed: Duration) -> u64 {
    let secs = elapsed.as_secs_f64();
    if secs <= 0.0 {
        return 0;
    }
    (items as f64 / secs).round() as u64
}

pub fn to_line<T: Serialize>(summary: &T) -> Result<String> {
    serde_json::to_string(summary).context("failed to serialize summary")
}

/// Writes the summary as the single stdout line of the run.
pub fn emit<T: Serialize>(summary: &T) -> Result<()> {
    let line = to_line(summary)?;
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    writeln!(out, "{line}").context("failed to write summary")?;
    out.flush().context("failed to flush summary")?;
    tracing::debug!(phase = %Phase::Reported, "summary emitted");
    Ok(())
}
