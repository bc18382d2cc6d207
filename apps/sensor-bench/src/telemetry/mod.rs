mod aggregate;
mod decode;
mod driver;
mod generator;


pub use aggregate::{
    fnv1a32, is_alarm, process_batch, BatchAggregator, DeviceAggregate, MalformedRecordError,
    TelemetryBatch,
};
pub use decode::{DecodeError, DecodedRecord, Decoder, DocumentDecoder, RecordDecoder, StreamingDecoder};
pub use driver::{measure, run, TelemetryTotals};
pub use generator::{Clock, Status, TelemetryGenerator, DEFAULT_PAYLOAD_SIZE};

const ALARM_TEMP_THRESHOLD: i64 = 95;
const STATUS_ALARM: &str = "ALARM";
