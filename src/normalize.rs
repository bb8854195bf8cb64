//! Migration of persisted entries into the current [`EntryData`] shape.
//!
//! Older data files stored either a bare string per day or an object with a
//! single `content` string and a single `image`. The shape is sniffed from the
//! JSON value itself; there is no version tag.

use crate::models::{Color, EntriesMap, EntryData, LogEntry};
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{error, warn};

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("expected a string or an object, found {0}")]
    UnexpectedShape(&'static str),
    #[error("invalid entry object: {0}")]
    InvalidObject(#[from] serde_json::Error),
}

/// One persisted value, decoded by shape.
#[derive(Debug)]
pub enum RawRecord {
    /// Oldest format: the day's text.
    Text(String),
    Entry(RawEntry),
}

#[derive(Debug, Default, Deserialize)]
pub struct RawEntry {
    #[serde(default)]
    pub logs: Option<Vec<LogEntry>>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default, deserialize_with = "lenient_weight")]
    pub weight: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub images: Option<Vec<String>>,
}

impl RawRecord {
    pub fn from_value(value: Value) -> Result<Self, RecordError> {
        match value {
            Value::String(text) => Ok(RawRecord::Text(text)),
            object @ Value::Object(_) => Ok(RawRecord::Entry(RawEntry::deserialize(object)?)),
            Value::Null => Err(RecordError::UnexpectedShape("null")),
            Value::Bool(_) => Err(RecordError::UnexpectedShape("a boolean")),
            Value::Number(_) => Err(RecordError::UnexpectedShape("a number")),
            Value::Array(_) => Err(RecordError::UnexpectedShape("an array")),
        }
    }
}

/// Entry point for the raw bytes of the data file. Unparseable payloads yield
/// an empty map.
pub fn normalize_payload(bytes: &[u8]) -> EntriesMap {
    match serde_json::from_slice::<Value>(bytes) {
        Ok(value) => normalize(value),
        Err(err) => {
            error!("failed to parse entries payload, starting empty: {err}");
            EntriesMap::new()
        }
    }
}

pub fn normalize(raw: Value) -> EntriesMap {
    let Value::Object(records) = raw else {
        error!("entries payload is not a JSON object, starting empty");
        return EntriesMap::new();
    };
    normalize_records(records)
}

fn normalize_records(records: Map<String, Value>) -> EntriesMap {
    let mut entries = EntriesMap::new();
    for (key, value) in records {
        match RawRecord::from_value(value) {
            Ok(record) => {
                entries.insert(key, normalize_record(record));
            }
            Err(err) => warn!(date = %key, "skipping malformed entry: {err}"),
        }
    }
    entries
}

pub fn normalize_record(record: RawRecord) -> EntryData {
    match record {
        RawRecord::Text(text) => EntryData {
            logs: vec![LogEntry::new(text)],
            color: Some(Color::default().id().to_string()),
            weight: None,
            images: Vec::new(),
        },
        RawRecord::Entry(entry) => {
            let logs = match entry.logs {
                Some(logs) if !logs.is_empty() => logs,
                _ => entry
                    .content
                    .filter(|content| !content.is_empty())
                    .map(|content| vec![LogEntry::new(content)])
                    .unwrap_or_default(),
            };
            let images = match entry.images {
                Some(images) if !images.is_empty() => images,
                _ => entry
                    .image
                    .filter(|image| !image.is_empty())
                    .map(|image| vec![image])
                    .unwrap_or_default(),
            };
            EntryData {
                logs,
                color: entry.color,
                weight: entry.weight,
                images,
            }
        }
    }
}

/// Weights were typed into a free text field, but hand-edited files may hold numbers.
fn lenient_weight<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Weight {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(Option::<Weight>::deserialize(deserializer)?.map(|weight| match weight {
        Weight::Text(text) => text,
        Weight::Number(number) => number.to_string(),
    }))
}
