use super::decode::{DecodeError, DecodedRecord, RecordDecoder};
use super::{ALARM_TEMP_THRESHOLD, STATUS_ALARM};
use std::collections::HashMap;
use thiserror::Error;

const FNV_OFFSET_BASIS: u32 = 0x811c_9dc5;
const FNV_PRIME: u32 = 0x0100_0193;

/// A record that failed decoding or validation. Fails the whole batch it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed record at batch offset {offset}: {source}")]
pub struct MalformedRecordError {
    pub offset: usize,
    pub source: DecodeError,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DeviceAggregate {
    pub count: u64,
    pub alarm_count: u64,
    pub checksum_sum: u64,
}

impl DeviceAggregate {
    fn record(&mut self, alarm: bool, checksum: u32) {
        self.count += 1;
        if alarm {
            self.alarm_count += 1;
        }
        self.checksum_sum = self.checksum_sum.wrapping_add(u64::from(checksum));
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TelemetryBatch {
    pub records: usize,
    pub distinct_devices: usize,
    pub alarm_count: u64,
    pub checksum_total: u64,
}

/// 32-bit FNV-1a over `bytes`.
pub fn fnv1a32(bytes: &[u8]) -> u32 {
    bytes.iter().fold(FNV_OFFSET_BASIS, |hash, &byte| {
        (hash ^ u32::from(byte)).wrapping_mul(FNV_PRIME)
    })
}

pub fn is_alarm(temp: i64, status: &str) -> bool {
    temp > ALARM_TEMP_THRESHOLD || status == STATUS_ALARM
}

/// Per-device counters for one batch. Owned by a single task and never shared.
#[derive(Debug, Default)]
pub struct BatchAggregator {
    devices: HashMap<String, DeviceAggregate>,
    alarm_count: u64,
    records: usize,
}

impl BatchAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one decoded record in. `raw` is the exact text it was decoded from.
    pub fn push(&mut self, raw: &str, record: &DecodedRecord<'_>) {
        let alarm = is_alarm(record.temp, &record.status);
        let checksum = fnv1a32(raw.as_bytes());
        self.records += 1;
        if alarm {
            self.alarm_count += 1;
        }
        match self.devices.get_mut(record.device_id.as_ref()) {
            Some(aggregate) => aggregate.record(alarm, checksum),
            None => {
                let mut aggregate = DeviceAggregate::default();
                aggregate.record(alarm, checksum);
                self.devices.insert(record.device_id.to_string(), aggregate);
            }
        }
    }

    pub fn device(&self, device_id: &str) -> Option<&DeviceAggregate> {
        self.devices.get(device_id)
    }

    pub fn finish(self) -> TelemetryBatch {
        let checksum_total = self
            .devices
            .values()
            .fold(0u64, |total, aggregate| total.wrapping_add(aggregate.checksum_sum));
        TelemetryBatch {
            records: self.records,
            distinct_devices: self.devices.len(),
            alarm_count: self.alarm_count,
            checksum_total,
        }
    }
}

/// Decodes, classifies and aggregates a batch. The first malformed record aborts it.
pub fn process_batch<S, D>(records: &[S], decoder: &D) -> Result<TelemetryBatch, MalformedRecordError>
where
    S: AsRef<str>,
    D: RecordDecoder + ?Sized,
{
    let mut aggregator = BatchAggregator::new();
    let mut scratch = Vec::with_capacity(256);
    for (offset, raw) in records.iter().enumerate() {
        let raw = raw.as_ref();
        let record = decoder
            .decode(raw, &mut scratch)
            .map_err(|source| MalformedRecordError { offset, source })?;
        aggregator.push(raw, &record);
    }
    Ok(aggregator.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::Decoder;

    #[test]
    fn fnv_of_empty_input_is_offset_basis() {
        assert_eq!(fnv1a32(b""), 0x811c_9dc5);
    }

    #[test]
    fn fnv_matches_published_vectors() {
        assert_eq!(fnv1a32(b"a"), 0xe40c_292c);
        assert_eq!(fnv1a32(b"foobar"), 0xbf9c_f968);
    }

    #[test]
    fn alarm_classification() {
        assert!(is_alarm(96, "OK"));
        assert!(is_alarm(50, "ALARM"));
        assert!(!is_alarm(50, "OK"));
        assert!(!is_alarm(95, "OK"));
        assert!(!is_alarm(50, "alarm"));
    }

    #[test]
    fn aggregates_per_device() {
        let records = [
            r#"{"deviceId":"a","ts":1,"temp":10,"status":"OK"}"#,
            r#"{"deviceId":"b","ts":1,"temp":99,"status":"OK"}"#,
            r#"{"deviceId":"a","ts":2,"temp":10,"status":"ALARM"}"#,
        ];
        let mut aggregator = BatchAggregator::new();
        let mut scratch = Vec::new();
        for raw in records {
            let record = Decoder::Streaming.decode(raw, &mut scratch).expect("decoded");
            aggregator.push(raw, &record);
        }

        let a = *aggregator.device("a").expect("device a");
        assert_eq!(a.count, 2);
        assert_eq!(a.alarm_count, 1);
        assert_eq!(
            a.checksum_sum,
            u64::from(fnv1a32(records[0].as_bytes())) + u64::from(fnv1a32(records[2].as_bytes()))
        );

        let batch = aggregator.finish();
        assert_eq!(batch.records, 3);
        assert_eq!(batch.distinct_devices, 2);
        assert_eq!(batch.alarm_count, 2);
        let expected: u64 = records.iter().map(|r| u64::from(fnv1a32(r.as_bytes()))).sum();
        assert_eq!(batch.checksum_total, expected);
    }

    #[test]
    fn checksum_covers_exact_text_not_a_reserialization() {
        let compact = r#"{"deviceId":"a","ts":1,"temp":1,"status":"OK"}"#;
        let spaced = r#"{ "deviceId": "a", "ts": 1, "temp": 1, "status": "OK" }"#;
        let compact = process_batch(&[compact], &Decoder::Document).expect("compact");
        let spaced = process_batch(&[spaced], &Decoder::Document).expect("spaced");
        assert_eq!(compact.alarm_count, spaced.alarm_count);
        assert_ne!(compact.checksum_total, spaced.checksum_total);
    }

    #[test]
    fn one_bad_record_fails_the_batch() {
        let records = [
            r#"{"deviceId":"a","ts":1,"temp":1,"status":"OK"}"#,
            r#"{"ts":1,"temp":1,"status":"OK"}"#,
            r#"{"deviceId":"c","ts":1,"temp":1,"status":"OK"}"#,
        ];
        for decoder in [Decoder::Document, Decoder::Streaming] {
            let err = process_batch(&records, &decoder).expect_err("batch fails");
            assert_eq!(err.offset, 1);
            assert_eq!(err.source, DecodeError::MissingField("deviceId"));
        }
    }

    #[test]
    fn empty_batch_is_zeroed() {
        let records: [&str; 0] = [];
        assert_eq!(
            process_batch(&records, &Decoder::Document).expect("empty"),
            TelemetryBatch::default()
        );
    }
}
