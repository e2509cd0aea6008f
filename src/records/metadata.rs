// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! File-level metadata record.
//!
//! A recfile may carry one opaque key/value record describing its contents,
//! written as the metadata chunk immediately after the signature. The engine
//! does not interpret the fields; the `record_type` key is merely a reserved
//! name with convenience accessors, since most files store the type name of
//! their serialized records there.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::{FormatError, Result};

/// Key reserved for the record type name.
const RECORD_TYPE_KEY: &str = "record_type";

/// Opaque key/value metadata attached once per file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordsMetadata {
    fields: BTreeMap<String, String>,
}

impl RecordsMetadata {
    /// Create empty metadata.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field, replacing any previous value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Get a field.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    /// Whether no field is set.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterate fields in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Set the record type name (the reserved `record_type` field).
    pub fn set_record_type(&mut self, name: impl Into<String>) -> &mut Self {
        self.set(RECORD_TYPE_KEY, name)
    }

    /// Get the record type name, if set.
    pub fn record_type(&self) -> Option<&str> {
        self.get(RECORD_TYPE_KEY)
    }

    /// Serialize into the metadata chunk's payload bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self)
            .map_err(|e| FormatError::io("metadata serialization", e.to_string()))
    }

    /// Parse a metadata chunk's payload bytes.
    ///
    /// `offset` is the metadata chunk's stream offset, used in error reports.
    pub fn from_bytes(bytes: &[u8], offset: u64) -> Result<Self> {
        serde_json::from_slice(bytes).map_err(|e| {
            FormatError::payload_corrupted(offset, format!("malformed metadata record: {e}"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get() {
        let mut metadata = RecordsMetadata::new();
        metadata.set("producer", "sensor-rig-7").set("schema", "v2");
        assert_eq!(metadata.get("producer"), Some("sensor-rig-7"));
        assert_eq!(metadata.get("missing"), None);
    }

    #[test]
    fn test_record_type_accessors() {
        let mut metadata = RecordsMetadata::new();
        assert_eq!(metadata.record_type(), None);
        metadata.set_record_type("telemetry.Frame");
        assert_eq!(metadata.record_type(), Some("telemetry.Frame"));
    }

    #[test]
    fn test_bytes_round_trip() {
        let mut metadata = RecordsMetadata::new();
        metadata.set_record_type("t.M").set("k", "v");
        let bytes = metadata.to_bytes().unwrap();
        let parsed = RecordsMetadata::from_bytes(&bytes, 0).unwrap();
        assert_eq!(parsed, metadata);
    }

    #[test]
    fn test_malformed_bytes_rejected() {
        let err = RecordsMetadata::from_bytes(b"not json", 56).unwrap_err();
        assert!(matches!(err, FormatError::PayloadCorrupted { offset: 56, .. }));
    }
}
