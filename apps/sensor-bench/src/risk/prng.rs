const MULTIPLIER: u64 = 9301;
const INCREMENT: u64 = 49_297;
const MODULUS: u64 = 233_280;
const DEVICE_SEED_SCALE: u32 = 1000;

/// Linear-congruential generator used by the risk kernel.
///
/// The recurrence and modulus are fixed: checksums produced by other benchmark runtimes
/// depend on this exact output sequence.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Lcg {
    state: u64,
}

impl Lcg {
    pub fn new(seed: u32) -> Self {
        Self {
            state: u64::from(seed),
        }
    }

    /// Seeds from the first UTF-16 code unit of the id, times 1000. An empty id seeds 0.
    pub fn for_device(device_id: &str) -> Self {
        let first = device_id.encode_utf16().next().map_or(0, u32::from);
        Self::new(first * DEVICE_SEED_SCALE)
    }

    pub fn next_f64(&mut self) -> f64 {
        self.state = (self.state * MULTIPLIER + INCREMENT) % MODULUS;
        self.state as f64 / MODULUS as f64
    }
}

impl Iterator for Lcg {
    type Item = f64;

    fn next(&mut self) -> Option<f64> {
        Some(self.next_f64())
    }
}
