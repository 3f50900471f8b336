//! Typed metrics records and the per-fetch metrics index.
//!
//! The metrics endpoint answers with a JSON object keyed by item path. Each
//! value is validated here, at the fetch boundary, so renderers only ever see
//! well-formed records. Malformed entries are dropped and logged; the rest of
//! the index survives.

use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;

/// Errors raised while validating a single metrics record.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    /// `size` is not a base-10 byte count.
    #[error("size must be a non-negative decimal byte count, got {0:?}")]
    InvalidSize(String),
}

/// Errors raised while parsing a whole metrics payload.
#[derive(Error, Debug)]
pub enum IndexError {
    /// The body is not JSON.
    #[error("malformed metrics payload: {0}")]
    Json(#[from] serde_json::Error),

    /// The body is JSON but not an object.
    #[error("metrics payload must be a JSON object keyed by item path")]
    NotAnObject,
}

/// Aggregate metrics for one folder, as computed server-side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsRecord {
    /// Number of assets below the folder.
    pub total_assets: u64,
    /// Number of assets whose size contributed to `size`.
    pub counted_assets: u64,
    /// Byte count exactly as the server sent it.
    size: String,
    /// Parsed value of `size`.
    bytes: u64,
}

impl MetricsRecord {
    /// Create a record, validating that `size` is a base-10 byte count.
    pub fn new(
        total_assets: u64,
        counted_assets: u64,
        size: impl Into<String>,
    ) -> Result<Self, RecordError> {
        let size = size.into();

        if size.is_empty() || !size.bytes().all(|b| b.is_ascii_digit()) {
            return Err(RecordError::InvalidSize(size));
        }

        let bytes = size
            .parse::<u64>()
            .map_err(|_| RecordError::InvalidSize(size.clone()))?;

        Ok(Self {
            total_assets,
            counted_assets,
            size,
            bytes,
        })
    }

    /// The byte count as the server encoded it.
    pub fn size(&self) -> &str {
        &self.size
    }

    /// The byte count as a number.
    pub fn bytes(&self) -> u64 {
        self.bytes
    }

    /// Whether only part of the folder was indexed.
    pub fn is_approximate(&self) -> bool {
        self.total_assets != self.counted_assets
    }
}

/// Wire shape of a record. `size` arrives as a string per the endpoint
/// contract, but the server serialises it as a plain integer.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireRecord {
    total_assets: u64,
    counted_assets: u64,
    size: WireSize,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WireSize {
    Text(String),
    Number(u64),
}

impl TryFrom<WireRecord> for MetricsRecord {
    type Error = RecordError;

    fn try_from(wire: WireRecord) -> Result<Self, Self::Error> {
        let size = match wire.size {
            WireSize::Text(text) => text,
            WireSize::Number(n) => n.to_string(),
        };
        MetricsRecord::new(wire.total_assets, wire.counted_assets, size)
    }
}

/// Item path to metrics mapping for one fetch. A missing key means "no data".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricsIndex {
    entries: HashMap<String, MetricsRecord>,
}

impl MetricsIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a raw endpoint response body.
    pub fn from_slice(body: &[u8]) -> Result<Self, IndexError> {
        let value: Value = serde_json::from_slice(body)?;
        Self::from_value(value)
    }

    /// Build an index from an already-decoded JSON payload.
    ///
    /// Entries that fail validation are skipped with a warning.
    pub fn from_value(value: Value) -> Result<Self, IndexError> {
        let Value::Object(map) = value else {
            return Err(IndexError::NotAnObject);
        };

        let mut entries = HashMap::with_capacity(map.len());

        for (path, raw) in map {
            let record = serde_json::from_value::<WireRecord>(raw)
                .map_err(|e| e.to_string())
                .and_then(|wire| MetricsRecord::try_from(wire).map_err(|e| e.to_string()));

            match record {
                Ok(record) => {
                    entries.insert(path, record);
                }
                Err(reason) => {
                    tracing::warn!("Dropping malformed metrics entry for {}: {}", path, reason);
                }
            }
        }

        Ok(Self { entries })
    }

    /// Insert or replace the record for `path`.
    pub fn insert(&mut self, path: impl Into<String>, record: MetricsRecord) {
        self.entries.insert(path.into(), record);
    }

    /// Look up the record for an item path.
    pub fn get(&self, path: &str) -> Option<&MetricsRecord> {
        self.entries.get(path)
    }

    /// Number of valid entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no entry survived validation.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
