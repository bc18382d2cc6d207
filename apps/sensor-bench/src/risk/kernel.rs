use super::prng::Lcg;
use super::sensors::SensorReading;

const NOMINAL_TEMPERATURE: f64 = 25.0;
const NOMINAL_PRESSURE: f64 = 1013.25;
const RISK_EXPONENT: f64 = 1.8;
const HARMONIC_EVERY: u32 = 1000;
const HARMONIC_TERMS: u32 = 10;
const CHECKSUM_SCALE: f64 = 1_000_000.0;
const CHECKSUM_MODULUS: i64 = 1_000_000;

/// Modulus applied when summing per-reading checksums across a batch or a whole run.
pub const BATCH_CHECKSUM_MODULUS: i64 = 1_000_000_000;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RiskResult {
    pub risk_score: f64,
    pub failure_probability: f64,
    pub checksum: i64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RiskBatch {
    pub sensors: usize,
    pub avg_risk: f64,
    pub avg_failure_probability: f64,
    pub checksum: i64,
}

/// Monte Carlo failure-risk simulation for one reading.
///
/// The generator is reseeded from the device id on every call, so identical inputs always
/// produce an identical result. The checksum is taken from the undivided risk accumulator
/// and keeps its sign, so a negative accumulator yields a negative checksum.
pub fn simulate(reading: &SensorReading, iterations: u32) -> RiskResult {
    if iterations == 0 {
        return RiskResult::default();
    }

    let mut prng = Lcg::for_device(&reading.device_id);
    let temp_base = ((reading.temperature - NOMINAL_TEMPERATURE) / 15.0).exp();
    let humidity_base = (reading.humidity / 100.0).powf(2.0);
    let pressure_base = (reading.pressure - NOMINAL_PRESSURE).abs() / 50.0;
    let vibration_base = reading.vibration.sqrt();

    let mut risk = 0.0_f64;
    let mut failure = 0.0_f64;

    for i in 0..iterations {
        let step = f64::from(i);
        let temp_stress = temp_base * (1.0 + 0.1 * (step * 0.01).sin());
        let humidity_stress = humidity_base * (1.0 + 0.05 * (step * 0.02).cos());
        let pressure_stress = pressure_base * (1.0 + 0.03 * (step * 0.015).sin());
        let vibration_stress = vibration_base * (1.0 + 0.08 * (step * 0.008).cos());

        let random_factor = prng.next_f64();
        let stress = temp_stress * humidity_stress + pressure_stress * vibration_stress;
        let failure_threshold = 2.5 + random_factor * 0.5;

        // Weibull shape/scale perturbed by the same draw.
        let shape = 1.5 + random_factor * 0.3;
        let scale = 100.0 + random_factor * 20.0;
        let weibull = 1.0 - (-(stress / scale).powf(shape)).exp();

        if weibull > failure_threshold / 10.0 {
            failure += weibull;
        }

        risk += stress.powf(RISK_EXPONENT) * (1.0 + weibull).ln();

        if i % HARMONIC_EVERY == 0 {
            for j in 1..=HARMONIC_TERMS {
                let j = f64::from(j);
                risk += (j * stress).sin() * (j * failure).cos() / j;
            }
        }
    }

    let steps = f64::from(iterations);
    RiskResult {
        risk_score: risk / steps,
        failure_probability: failure / steps,
        checksum: (risk * CHECKSUM_SCALE).floor() as i64 % CHECKSUM_MODULUS,
    }
}

pub fn process_batch(readings: &[SensorReading], iterations: u32) -> RiskBatch {
    if readings.is_empty() {
        return RiskBatch::default();
    }

    let mut total_risk = 0.0;
    let mut total_failure = 0.0;
    let mut checksum = 0_i64;
    for reading in readings {
        let result = simulate(reading, iterations);
        total_risk += result.risk_score;
        total_failure += result.failure_probability;
        checksum = (checksum + result.checksum).rem_euclid(BATCH_CHECKSUM_MODULUS);
    }

    let count = readings.len() as f64;
    RiskBatch {
        sensors: readings.len(),
        avg_risk: total_risk / count,
        avg_failure_probability: total_failure / count,
        checksum,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::risk::sensors::{generate_sensor_range, generate_sensors};

    #[test]
    fn simulate_is_idempotent() {
        let reading = SensorReading::synthetic(42, "sensor-w1");
        let first = simulate(&reading, 3_000);
        let second = simulate(&reading, 3_000);
        assert_eq!(first.risk_score.to_bits(), second.risk_score.to_bits());
        assert_eq!(
            first.failure_probability.to_bits(),
            second.failure_probability.to_bits()
        );
        assert_eq!(first.checksum, second.checksum);
    }

    #[test]
    fn zero_iterations_yield_zero_result() {
        let reading = SensorReading::synthetic(7, "sensor");
        assert_eq!(simulate(&reading, 0), RiskResult::default());
    }

    #[test]
    fn only_first_character_of_id_affects_result() {
        let a = SensorReading::synthetic(9, "sensor-w0");
        let mut b = a.clone();
        b.device_id = "s-something-else".to_string();
        assert_eq!(simulate(&a, 1_500), simulate(&b, 1_500));

        b.device_id = "t-9".to_string();
        assert_ne!(simulate(&a, 1_500).risk_score, simulate(&b, 1_500).risk_score);
    }

    #[test]
    fn hot_sensor_scores_above_cool_sensor() {
        let cool = SensorReading::synthetic(0, "sensor");
        let hot = SensorReading::synthetic(59, "sensor");
        let cool = simulate(&cool, 5_000);
        let hot = simulate(&hot, 5_000);
        assert!((hot.risk_score - 0.701496010580917).abs() < 1e-9, "{hot:?}");
        assert!(hot.risk_score > cool.risk_score);
        assert!((0..CHECKSUM_MODULUS).contains(&hot.checksum));
    }

    #[test]
    fn negative_accumulator_keeps_checksum_sign() {
        // One step leaves only the harmonic terms, which are negative for this reading.
        let reading = SensorReading::synthetic(25, "sensor");
        let result = simulate(&reading, 1);
        assert!((result.risk_score - -0.05173930291908892).abs() < 1e-12, "{result:?}");
        assert_eq!(result.checksum, -51_740);
    }

    #[test]
    fn mixed_sign_batch_checksum_is_reduced_non_negative() {
        let sensors = generate_sensor_range(20..32, "sensor");
        let whole = process_batch(&sensors, 1);
        assert_eq!(whole.checksum, 999_154_688);

        let head = process_batch(&sensors[..6], 1);
        let tail = process_batch(&sensors[6..], 1);
        assert_eq!(
            (head.checksum + tail.checksum).rem_euclid(BATCH_CHECKSUM_MODULUS),
            whole.checksum
        );
    }

    #[test]
    fn batch_matches_reference_values() {
        let sensors = generate_sensors(8, "sensor");
        let batch = process_batch(&sensors, 2_000);
        assert_eq!(batch.sensors, 8);
        assert!((batch.avg_risk - 0.0013195928185398712).abs() < 1e-12, "{batch:?}");
        assert_eq!(batch.avg_failure_probability, 0.0);
        assert_eq!(batch.checksum, 5_113_480);
    }

    #[test]
    fn empty_batch_is_zeroed() {
        assert_eq!(process_batch(&[], 1_000), RiskBatch::default());
    }
}
