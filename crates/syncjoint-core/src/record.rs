//! Records: schemaless field-to-value mappings exchanged with collections.
//!
//! The joint never owns a schema. Records are JSON objects supplied by the
//! two collections; the joint only reads fields, writes fields, and projects
//! subsets of fields when building denormalized snapshots and summaries.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Error;
use crate::path::FieldPath;

/// A single record: an ordered mapping from field name to JSON value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

impl Record {
    /// Create an empty record.
    #[must_use]
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Read the value at a field path.
    #[must_use]
    pub fn get(&self, path: &FieldPath) -> Option<&Value> {
        path.get(&self.0)
    }

    /// Write a value at a field path, creating intermediate objects as needed.
    pub fn set(&mut self, path: &FieldPath, value: impl Into<Value>) {
        path.set(&mut self.0, value.into());
    }

    /// Remove and return the value at a field path.
    pub fn remove(&mut self, path: &FieldPath) -> Option<Value> {
        path.remove(&mut self.0)
    }

    /// True when the record holds any value (including `null`) at the path.
    #[must_use]
    pub fn has(&self, path: &FieldPath) -> bool {
        self.get(path).is_some()
    }

    /// True when the field is absent for relationship purposes.
    ///
    /// External keys may be unset, `null`, or the empty string on records
    /// that have not been synchronized outward yet; all three read as blank.
    #[must_use]
    pub fn is_blank_at(&self, path: &FieldPath) -> bool {
        value_is_blank(self.get(path))
    }

    /// Project the record onto a set of field paths.
    ///
    /// Fields absent from the record are silently skipped, so the projection
    /// of a sparse record is itself sparse.
    #[must_use]
    pub fn pick(&self, fields: &[FieldPath]) -> Self {
        let mut out = Self::new();
        for path in fields {
            if let Some(value) = self.get(path) {
                out.set(path, value.clone());
            }
        }
        out
    }

    /// The underlying field map.
    #[must_use]
    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Number of top-level fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when the record has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// True when an optional field value counts as "absent": missing, `null`,
/// or the empty string.
#[must_use]
pub fn value_is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(_) => false,
    }
}

impl From<Map<String, Value>> for Record {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

impl From<Record> for Value {
    fn from(record: Record) -> Self {
        Self::Object(record.0)
    }
}

impl TryFrom<Value> for Record {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self, Error> {
        match value {
            Value::Object(fields) => Ok(Self(fields)),
            other => Err(Error::Custom(format!(
                "expected a JSON object for a record, got {other}"
            ))),
        }
    }
}
