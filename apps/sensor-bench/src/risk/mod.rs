mod driver;
mod kernel;
mod prng;
mod sensors;

pub use driver::{measure, run, warmup, RiskTotals};
pub use kernel::{process_batch, simulate, RiskBatch, RiskResult, BATCH_CHECKSUM_MODULUS};
pub use prng::Lcg;
pub use sensors::{generate_sensor_range, generate_sensors, SensorReading};
