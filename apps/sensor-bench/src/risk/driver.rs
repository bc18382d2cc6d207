use super::kernel::{process_batch, RiskBatch, BATCH_CHECKSUM_MODULUS};
use super::sensors::{generate_sensor_range, generate_sensors};
use crate::config::RiskConfig;
use crate::pool::{split_even, Phase, WorkerPool};
use crate::report::{elapsed_ms, round_to, throughput, Measured, RiskSummary, LANG};
use anyhow::Result;
use std::time::Instant;

const WARMUP_SENSORS: usize = 10;
const WARMUP_ITERATIONS: u32 = 1000;
const WARMUP_PREFIX: &str = "warmup";
const AVG_RISK_DECIMALS: i32 = 6;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RiskTotals {
    pub sensors: usize,
    pub avg_risk: f64,
    pub avg_failure_probability: f64,
    pub checksum: i64,
}

impl RiskTotals {
    /// Sensor-weighted fold of per-task batches.
    pub fn fold(batches: &[RiskBatch]) -> Self {
        let mut sensors = 0usize;
        let mut risk_sum = 0.0;
        let mut failure_sum = 0.0;
        let mut checksum = 0i64;
        for batch in batches {
            sensors += batch.sensors;
            risk_sum += batch.avg_risk * batch.sensors as f64;
            failure_sum += batch.avg_failure_probability * batch.sensors as f64;
            checksum = (checksum + batch.checksum).rem_euclid(BATCH_CHECKSUM_MODULUS);
        }
        if sensors == 0 {
            return Self::default();
        }
        Self {
            sensors,
            avg_risk: risk_sum / sensors as f64,
            avg_failure_probability: failure_sum / sensors as f64,
            checksum,
        }
    }
}

/// Single-threaded, un-pooled passes over a small fixed batch. Output is discarded.
pub fn warmup(rounds: usize) {
    if rounds == 0 {
        tracing::debug!("warmup disabled");
        return;
    }
    tracing::info!(phase = %Phase::Warming, rounds, "warming up risk kernel");
    let sensors = generate_sensors(WARMUP_SENSORS, WARMUP_PREFIX);
    for _ in 0..rounds {
        std::hint::black_box(process_batch(&sensors, WARMUP_ITERATIONS));
    }
    tracing::info!("warmup complete, starting benchmark");
}

/// Warms up, then runs the timed pooled simulation and folds the per-task batches.
pub fn measure(config: &RiskConfig) -> Result<Measured<RiskTotals>> {
    tracing::debug!(phase = %Phase::Idle, sensors = config.sensors, workers = config.workers, "risk run starting");
    warmup(config.warmup_rounds);

    let pool = WorkerPool::new(config.workers)?;
    let iterations = config.iterations;
    let started = Instant::now();

    let tasks: Vec<_> = split_even(config.sensors, pool.workers())
        .into_iter()
        .enumerate()
        .map(|(worker, range)| {
            move || -> Result<RiskBatch> {
                let prefix = format!("sensor-w{worker}");
                let sensors = generate_sensor_range(range, &prefix);
                Ok(process_batch(&sensors, iterations))
            }
        })
        .collect();
    let batches = pool.run_all(tasks)?;
    let elapsed = started.elapsed();

    let totals = RiskTotals::fold(&batches);
    tracing::info!(
        phase = %Phase::Reduced,
        batches = batches.len(),
        sensors = totals.sensors,
        avg_risk = totals.avg_risk,
        avg_failure_probability = totals.avg_failure_probability,
        checksum = totals.checksum,
        "risk batches reduced"
    );
    Ok(Measured { totals, elapsed })
}

pub fn run(config: &RiskConfig) -> Result<RiskSummary> {
    let Measured { totals, elapsed } = measure(config)?;
    Ok(RiskSummary {
        lang: LANG,
        kind: "algorithmic",
        workers: config.workers,
        sensors: totals.sensors,
        iterations: config.iterations,
        ms: elapsed_ms(elapsed),
        ops_per_sec: throughput(totals.sensors, elapsed),
        avg_risk: round_to(totals.avg_risk, AVG_RISK_DECIMALS),
        checksum: totals.checksum,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(sensors: usize, workers: usize) -> RiskConfig {
        RiskConfig {
            sensors,
            iterations: 1_200,
            workers,
            warmup_rounds: 0,
        }
    }

    #[test]
    fn fold_weights_uneven_batches() {
        let batches = [
            RiskBatch {
                sensors: 3,
                avg_risk: 1.0,
                avg_failure_probability: 0.5,
                checksum: 999_999_999,
            },
            RiskBatch {
                sensors: 1,
                avg_risk: 5.0,
                avg_failure_probability: 0.1,
                checksum: 2,
            },
        ];
        let totals = RiskTotals::fold(&batches);
        assert_eq!(totals.sensors, 4);
        assert!((totals.avg_risk - 2.0).abs() < 1e-12);
        assert!((totals.avg_failure_probability - 0.4).abs() < 1e-12);
        assert_eq!(totals.checksum, 1);
    }

    #[test]
    fn fold_of_nothing_is_zero() {
        assert_eq!(RiskTotals::fold(&[]), RiskTotals::default());
    }

    #[test]
    fn worker_count_does_not_change_result() {
        let single = measure(&config(13, 1)).expect("single").totals;
        let pooled = measure(&config(13, 4)).expect("pooled").totals;
        assert_eq!(single.sensors, 13);
        assert_eq!(pooled.sensors, 13);
        assert_eq!(single.checksum, pooled.checksum);
        assert!((single.avg_risk - pooled.avg_risk).abs() < 1e-12);
    }

    #[test]
    fn fold_reduces_negative_batch_checksums() {
        let batches = [
            RiskBatch {
                sensors: 1,
                checksum: 5,
                ..RiskBatch::default()
            },
            RiskBatch {
                sensors: 1,
                checksum: -7,
                ..RiskBatch::default()
            },
        ];
        assert_eq!(RiskTotals::fold(&batches).checksum, 999_999_998);
    }

    #[test]
    fn single_step_runs_split_the_same_way() {
        let single = RiskConfig {
            iterations: 1,
            ..config(32, 1)
        };
        let pooled = RiskConfig {
            workers: 5,
            ..single.clone()
        };
        let single = measure(&single).expect("single").totals;
        let pooled = measure(&pooled).expect("pooled").totals;
        assert_eq!(single.checksum, pooled.checksum);
    }

    #[test]
    fn more_workers_than_sensors_is_fine() {
        let totals = measure(&config(3, 8)).expect("run").totals;
        assert_eq!(totals.sensors, 3);
    }

    #[test]
    fn summary_carries_config_and_rounding() {
        let summary = run(&config(4, 2)).expect("run");
        assert_eq!(summary.lang, "rust");
        assert_eq!(summary.kind, "algorithmic");
        assert_eq!(summary.workers, 2);
        assert_eq!(summary.sensors, 4);
        assert_eq!(summary.iterations, 1_200);
        assert_eq!(summary.avg_risk, round_to(summary.avg_risk, 6));
        assert!(summary.ms >= 0.0);
    }
}
