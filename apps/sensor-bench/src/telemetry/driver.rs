use super::aggregate::{process_batch, TelemetryBatch};
use super::generator::TelemetryGenerator;
use crate::config::TelemetryConfig;
use crate::pool::{split_chunks, Phase, WorkerPool};
use crate::report::{elapsed_ms, throughput, Measured, TelemetrySummary, LANG};
use anyhow::{Context, Result};
use std::time::Instant;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TelemetryTotals {
    pub records: usize,
    pub distinct_devices: usize,
    pub alarm_count: u64,
    pub checksum: u64,
}

impl TelemetryTotals {
    pub fn fold(batches: &[TelemetryBatch]) -> Self {
        batches.iter().fold(Self::default(), |totals, batch| Self {
            records: totals.records + batch.records,
            distinct_devices: totals.distinct_devices + batch.distinct_devices,
            alarm_count: totals.alarm_count + batch.alarm_count,
            checksum: totals.checksum.wrapping_add(batch.checksum_total),
        })
    }
}

/// Generates and aggregates `total` records in `batch`-sized tasks and folds the results.
pub fn measure(config: &TelemetryConfig) -> Result<Measured<TelemetryTotals>> {
    tracing::debug!(
        phase = %Phase::Idle,
        total = config.total,
        batch = config.batch,
        decoder = %config.decoder,
        "telemetry run starting"
    );
    let pool = WorkerPool::new(config.workers)?;
    let generator = TelemetryGenerator::new(config.devices, config.payload_size, config.clock);
    let decoder = config.decoder;
    let started = Instant::now();

    let tasks: Vec<_> = split_chunks(config.total, config.batch)
        .into_iter()
        .map(|range| {
            let generator = generator.clone();
            move || -> Result<TelemetryBatch> {
                let first = range.start;
                let records = generator
                    .generate(range)
                    .context("failed to encode telemetry records")?;
                process_batch(&records, &decoder)
                    .with_context(|| format!("telemetry batch starting at record {first} failed"))
            }
        })
        .collect();
    let batches = pool.run_all(tasks)?;
    let elapsed = started.elapsed();

    let totals = TelemetryTotals::fold(&batches);
    tracing::info!(
        phase = %Phase::Reduced,
        batches = batches.len(),
        records = totals.records,
        devices = totals.distinct_devices,
        alarms = totals.alarm_count,
        checksum = totals.checksum,
        "telemetry batches reduced"
    );
    Ok(Measured { totals, elapsed })
}

pub fn run(config: &TelemetryConfig) -> Result<TelemetrySummary> {
    let Measured { totals, elapsed } = measure(config)?;
    Ok(TelemetrySummary {
        lang: LANG,
        workers: config.workers,
        total: totals.records,
        ms: elapsed_ms(elapsed),
        rps: throughput(totals.records, elapsed),
        checksum: totals.checksum,
    })
}
