//! Structured field paths for reading and writing nested record fields.
//!
//! Joint configurations name fields like `"accountId"` or `"account.extId"`.
//! Rather than scattering string splitting through the hook logic, a path is
//! parsed once into a [`FieldPath`] and reused for every record access.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A dotted field path, parsed into its segments.
///
/// `FieldPath::from("account.extId")` addresses the `extId` field inside the
/// embedded `account` object. A single-segment path addresses a top-level
/// field. Paths serialize as their dotted string form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct FieldPath {
    segments: Vec<String>,
}

impl FieldPath {
    /// Parse a dotted path.
    pub fn new(path: impl AsRef<str>) -> Self {
        let path = path.as_ref();
        let segments = if path.is_empty() {
            Vec::new()
        } else {
            path.split('.').map(str::to_string).collect()
        };
        Self { segments }
    }

    /// The path segments, outermost first.
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// True for the empty path (which addresses nothing).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Read the value at this path from a field map.
    #[must_use]
    pub fn get<'a>(&self, fields: &'a Map<String, Value>) -> Option<&'a Value> {
        let (first, rest) = self.segments.split_first()?;
        let mut current = fields.get(first)?;
        for segment in rest {
            current = current.as_object()?.get(segment)?;
        }
        Some(current)
    }

    /// Read the value at this path from a JSON value.
    ///
    /// Returns `None` when `root` is not an object.
    #[must_use]
    pub fn get_value<'a>(&self, root: &'a Value) -> Option<&'a Value> {
        self.get(root.as_object()?)
    }

    /// Write `value` at this path, creating intermediate objects as needed.
    ///
    /// A non-object value in the middle of the path is overwritten by an
    /// empty object. Writing through the empty path is a no-op.
    pub fn set(&self, fields: &mut Map<String, Value>, value: Value) {
        let Some((last, parents)) = self.segments.split_last() else {
            return;
        };
        let Some((first, mid)) = parents.split_first() else {
            fields.insert(last.clone(), value);
            return;
        };
        let mut slot = fields.entry(first.clone()).or_insert(Value::Null);
        for segment in mid {
            slot = ensure_object(slot)
                .entry(segment.clone())
                .or_insert(Value::Null);
        }
        ensure_object(slot).insert(last.clone(), value);
    }

    /// Remove and return the value at this path.
    pub fn remove(&self, fields: &mut Map<String, Value>) -> Option<Value> {
        let (last, parents) = self.segments.split_last()?;
        let Some((first, mid)) = parents.split_first() else {
            return fields.remove(last);
        };
        let mut current = fields.get_mut(first)?;
        for segment in mid {
            current = current.as_object_mut()?.get_mut(segment)?;
        }
        current.as_object_mut()?.remove(last)
    }
}

/// Coerce a slot to an object, replacing any other value.
fn ensure_object(slot: &mut Value) -> &mut Map<String, Value> {
    if !matches!(slot, Value::Object(_)) {
        *slot = Value::Object(Map::new());
    }
    match slot {
        Value::Object(map) => map,
        _ => unreachable!("slot coerced to an object above"),
    }
}

impl std::fmt::Display for FieldPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.segments.join("."))
    }
}

impl From<&str> for FieldPath {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

impl From<String> for FieldPath {
    fn from(path: String) -> Self {
        Self::new(path)
    }
}

impl From<FieldPath> for String {
    fn from(path: FieldPath) -> Self {
        path.to_string()
    }
}
