use super::ALARM_TEMP_THRESHOLD;
use chrono::Utc;
use serde::Serialize;
use std::ops::Range;

pub const DEFAULT_PAYLOAD_SIZE: usize = 64;
const PAYLOAD_FILL: &str = "x";
const TEMP_CYCLE: usize = 120;
const ALARM_EVERY: usize = 7;

/// Source of the `ts` field. Wall-clock stamps make checksums differ between runs; a fixed
/// stamp makes them reproducible.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Clock {
    #[default]
    WallClock,
    Fixed(i64),
}

impl Clock {
    pub fn now_millis(self) -> i64 {
        match self {
            Self::WallClock => Utc::now().timestamp_millis(),
            Self::Fixed(ms) => ms,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    Ok,
    Alarm,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WireRecord<'a> {
    device_id: &'a str,
    ts: i64,
    temp: i64,
    status: Status,
    payload: &'a str,
}

#[derive(Clone, Debug)]
pub struct TelemetryGenerator {
    devices: usize,
    payload: String,
    clock: Clock,
}

impl TelemetryGenerator {
    pub fn new(devices: usize, payload_size: usize, clock: Clock) -> Self {
        Self {
            devices: devices.max(1),
            payload: PAYLOAD_FILL.repeat(payload_size),
            clock,
        }
    }

    /// Encodes record `index` as one JSON line with keys deviceId, ts, temp, status, payload.
    pub fn encode(&self, index: usize) -> serde_json::Result<String> {
        let device_id = format!("dev-{}", index % self.devices);
        let temp = (index % TEMP_CYCLE) as i64;
        let status = if temp > ALARM_TEMP_THRESHOLD && index % ALARM_EVERY == 0 {
            Status::Alarm
        } else {
            Status::Ok
        };
        serde_json::to_string(&WireRecord {
            device_id: &device_id,
            ts: self.clock.now_millis(),
            temp,
            status,
            payload: &self.payload,
        })
    }

    pub fn generate(&self, range: Range<usize>) -> serde_json::Result<Vec<String>> {
        range.map(|index| self.encode(index)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_keys_in_wire_order() {
        let generator = TelemetryGenerator::new(10, 4, Clock::Fixed(1_700_000_000_000));
        assert_eq!(
            generator.encode(98).unwrap(),
            r#"{"deviceId":"dev-8","ts":1700000000000,"temp":98,"status":"ALARM","payload":"xxxx"}"#
        );
        assert_eq!(
            generator.encode(121).unwrap(),
            r#"{"deviceId":"dev-1","ts":1700000000000,"temp":1,"status":"OK","payload":"xxxx"}"#
        );
    }

    #[test]
    fn hot_records_off_the_seventh_stay_ok() {
        let generator = TelemetryGenerator::new(1000, 0, Clock::Fixed(1));
        let line = generator.encode(97).unwrap();
        assert!(line.contains(r#""temp":97,"status":"OK""#), "{line}");
    }

    #[test]
    fn default_payload_is_sixty_four_fill_bytes() {
        let generator = TelemetryGenerator::new(1000, DEFAULT_PAYLOAD_SIZE, Clock::Fixed(1));
        let line = generator.encode(0).unwrap();
        assert!(line.ends_with(&format!(r#""payload":"{}"}}"#, "x".repeat(64))), "{line}");
    }

    #[test]
    fn wall_clock_stamps_are_recent() {
        let before = Utc::now().timestamp_millis();
        let stamp = Clock::WallClock.now_millis();
        assert!(stamp >= before);
    }

    #[test]
    fn generate_covers_range() {
        let generator = TelemetryGenerator::new(3, 1, Clock::Fixed(5));
        let lines = generator.generate(10..14).unwrap();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with(r#"{"deviceId":"dev-1""#));
        assert!(lines[3].starts_with(r#"{"deviceId":"dev-1""#));
    }
}
