use std::ops::Range;

#[derive(Clone, Debug, PartialEq)]
pub struct SensorReading {
    pub device_id: String,
    pub temperature: f64,
    pub humidity: f64,
    pub pressure: f64,
    pub vibration: f64,
}

impl SensorReading {
    /// Deterministic reading for global index `index`. The formulas are shared with the other
    /// benchmark runtimes and must not drift.
    pub fn synthetic(index: usize, prefix: &str) -> Self {
        let i = index as f64;
        Self {
            device_id: format!("{prefix}-{index}"),
            temperature: 20.0 + (index % 60) as f64 + (i * 0.1).sin() * 5.0,
            humidity: 40.0 + (index % 40) as f64 + (i * 0.05).cos() * 10.0,
            pressure: 1000.0 + (index % 50) as f64 + (i * 0.02).sin() * 15.0,
            vibration: 1.0 + (index % 10) as f64 + (i * 0.03).cos() * 2.0,
        }
    }
}

pub fn generate_sensors(count: usize, prefix: &str) -> Vec<SensorReading> {
    generate_sensor_range(0..count, prefix)
}

/// Readings for a slice of the global index space, so a partitioned run sees the same data
/// as a single-task run.
pub fn generate_sensor_range(range: Range<usize>, prefix: &str) -> Vec<SensorReading> {
    range
        .map(|index| SensorReading::synthetic(index, prefix))
        .collect()
}
