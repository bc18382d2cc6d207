use clap::ValueEnum;
use serde::de::{self, IgnoredAny, MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use std::borrow::Cow;
use std::fmt;
use thiserror::Error;

const FIELD_DEVICE_ID: &str = "deviceId";
const FIELD_TS: &str = "ts";
const FIELD_TEMP: &str = "temp";
const FIELD_STATUS: &str = "status";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("invalid telemetry json: {0}")]
    Syntax(String),
    #[error("missing required field `{0}`")]
    MissingField(&'static str),
    #[error("timestamp is zero")]
    ZeroTimestamp,
}

/// Required fields of one record, borrowed from the text being decoded where possible.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedRecord<'a> {
    pub device_id: Cow<'a, str>,
    pub ts: i64,
    pub temp: i64,
    pub status: Cow<'a, str>,
}

pub trait RecordDecoder {
    /// Decodes `raw`. `scratch` is a reusable buffer for decoders that parse in place.
    fn decode<'a>(
        &self,
        raw: &'a str,
        scratch: &'a mut Vec<u8>,
    ) -> Result<DecodedRecord<'a>, DecodeError>;
}

/// Decoding strategy selectable from the command line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum Decoder {
    /// Whole-document decode with simd-json.
    #[default]
    Document,
    /// Token-by-token decode with serde_json, skipping unknown values.
    Streaming,
}

impl Decoder {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Document => "document",
            Self::Streaming => "streaming",
        }
    }
}

impl fmt::Display for Decoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl RecordDecoder for Decoder {
    fn decode<'a>(
        &self,
        raw: &'a str,
        scratch: &'a mut Vec<u8>,
    ) -> Result<DecodedRecord<'a>, DecodeError> {
        match self {
            Self::Document => DocumentDecoder.decode(raw, scratch),
            Self::Streaming => StreamingDecoder.decode(raw, scratch),
        }
    }
}

#[derive(Debug, Default)]
struct RawFields<'a> {
    device_id: Option<Cow<'a, str>>,
    ts: Option<i64>,
    temp: Option<i64>,
    status: Option<Cow<'a, str>>,
}

impl<'a> RawFields<'a> {
    fn validate(self) -> Result<DecodedRecord<'a>, DecodeError> {
        let device_id = self
            .device_id
            .ok_or(DecodeError::MissingField(FIELD_DEVICE_ID))?;
        let ts = self.ts.ok_or(DecodeError::MissingField(FIELD_TS))?;
        let temp = self.temp.ok_or(DecodeError::MissingField(FIELD_TEMP))?;
        let status = self.status.ok_or(DecodeError::MissingField(FIELD_STATUS))?;
        if ts == 0 {
            return Err(DecodeError::ZeroTimestamp);
        }
        Ok(DecodedRecord {
            device_id,
            ts,
            temp,
            status,
        })
    }
}

fn syntax(err: impl fmt::Display) -> DecodeError {
    DecodeError::Syntax(err.to_string())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BorrowedTelemetry<'a> {
    #[serde(default, borrow)]
    device_id: Option<&'a str>,
    #[serde(default)]
    ts: Option<i64>,
    #[serde(default)]
    temp: Option<i64>,
    #[serde(default, borrow)]
    status: Option<&'a str>,
}

/// Parses the whole record with simd-json into a borrowed struct.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentDecoder;

impl RecordDecoder for DocumentDecoder {
    fn decode<'a>(
        &self,
        raw: &'a str,
        scratch: &'a mut Vec<u8>,
    ) -> Result<DecodedRecord<'a>, DecodeError> {
        // simd-json parses in place, so the raw text stays untouched for hashing.
        scratch.clear();
        scratch.extend_from_slice(raw.as_bytes());
        let telemetry: BorrowedTelemetry<'a> =
            simd_json::from_slice(scratch.as_mut_slice()).map_err(syntax)?;
        RawFields {
            device_id: telemetry.device_id.map(Cow::Borrowed),
            ts: telemetry.ts,
            temp: telemetry.temp,
            status: telemetry.status.map(Cow::Borrowed),
        }
        .validate()
    }
}

/// Walks the record token by token, picking out the required keys and skipping the rest.
#[derive(Debug, Clone, Copy, Default)]
pub struct StreamingDecoder;

impl RecordDecoder for StreamingDecoder {
    fn decode<'a>(
        &self,
        raw: &'a str,
        _scratch: &'a mut Vec<u8>,
    ) -> Result<DecodedRecord<'a>, DecodeError> {
        let mut de = serde_json::Deserializer::from_str(raw);
        let fields = (&mut de)
            .deserialize_map(FieldsVisitor)
            .map_err(syntax)?;
        de.end().map_err(syntax)?;
        fields.validate()
    }
}

struct FieldsVisitor;

impl<'de> Visitor<'de> for FieldsVisitor {
    type Value = RawFields<'de>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a telemetry record object")
    }

    fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut device_id: Option<Option<Text<'de>>> = None;
        let mut ts: Option<Option<i64>> = None;
        let mut temp: Option<Option<i64>> = None;
        let mut status: Option<Option<Text<'de>>> = None;

        while let Some(Text(key)) = map.next_key::<Text<'de>>()? {
            match key.as_ref() {
                FIELD_DEVICE_ID => read_once(&mut map, &mut device_id, FIELD_DEVICE_ID)?,
                FIELD_TS => read_once(&mut map, &mut ts, FIELD_TS)?,
                FIELD_TEMP => read_once(&mut map, &mut temp, FIELD_TEMP)?,
                FIELD_STATUS => read_once(&mut map, &mut status, FIELD_STATUS)?,
                _ => {
                    map.next_value::<IgnoredAny>()?;
                }
            }
        }

        // A null value counts as absent, same as the derived decoder.
        Ok(RawFields {
            device_id: device_id.flatten().map(|Text(value)| value),
            ts: ts.flatten(),
            temp: temp.flatten(),
            status: status.flatten().map(|Text(value)| value),
        })
    }
}

fn read_once<'de, A, T>(
    map: &mut A,
    slot: &mut Option<Option<T>>,
    field: &'static str,
) -> Result<(), A::Error>
where
    A: MapAccess<'de>,
    T: Deserialize<'de>,
{
    if slot.is_some() {
        return Err(de::Error::duplicate_field(field));
    }
    *slot = Some(map.next_value()?);
    Ok(())
}

/// A JSON string, borrowed when it contains no escapes.
struct Text<'de>(Cow<'de, str>);

impl<'de> Deserialize<'de> for Text<'de> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_str(TextVisitor).map(Text)
    }
}

struct TextVisitor;

impl<'de> Visitor<'de> for TextVisitor {
    type Value = Cow<'de, str>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a string")
    }

    fn visit_borrowed_str<E: de::Error>(self, value: &'de str) -> Result<Self::Value, E> {
        Ok(Cow::Borrowed(value))
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
        Ok(Cow::Owned(value.to_owned()))
    }

    fn visit_string<E: de::Error>(self, value: String) -> Result<Self::Value, E> {
        Ok(Cow::Owned(value))
    }
}
