//! The collection contract consumed by relationship joints.
//!
//! A [`Collection`] is a handle onto one record store: it knows which field
//! identifies a record externally, which field identifies it internally, and
//! how to look records up, bulk-update them, and maintain embedded lists.
//! Joints are pure orchestration over this surface — they issue every call
//! through a [`Cx`] and surface the driver's [`Outcome`] unchanged.

// Allow `impl Future` return types in trait methods - intentional for async trait compat
#![allow(clippy::manual_async_fn)]

use std::future::Future;

use asupersync::{Cx, Outcome};
use serde_json::Value;

use crate::error::Error;
use crate::path::FieldPath;
use crate::record::Record;

/// A conjunction of field-equality constraints used to select records.
///
/// A missing field compares equal to `null`, matching the loosely-typed
/// stores these joints front. Values compare by deep JSON equality, which is
/// what lets parent propagation select children by their whole embedded
/// snapshot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Criteria {
    terms: Vec<(FieldPath, Value)>,
}

impl Criteria {
    /// An empty criteria set, which matches every record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an equality constraint.
    #[must_use]
    pub fn eq(mut self, path: impl Into<FieldPath>, value: impl Into<Value>) -> Self {
        self.terms.push((path.into(), value.into()));
        self
    }

    /// The equality constraints, in insertion order.
    #[must_use]
    pub fn terms(&self) -> &[(FieldPath, Value)] {
        &self.terms
    }

    /// True when `record` satisfies every constraint.
    #[must_use]
    pub fn matches(&self, record: &Record) -> bool {
        self.terms.iter().all(|(path, expected)| {
            record.get(path).unwrap_or(&Value::Null) == expected
        })
    }

    /// True when a raw JSON value satisfies every constraint.
    ///
    /// Used for entries inside embedded lists, which are values rather than
    /// full records. Non-object values match only the empty criteria.
    #[must_use]
    pub fn matches_value(&self, value: &Value) -> bool {
        self.terms.iter().all(|(path, expected)| {
            path.get_value(value).unwrap_or(&Value::Null) == expected
        })
    }
}

/// An ordered set of field assignments applied by [`Collection::update`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Assignments {
    entries: Vec<(FieldPath, Value)>,
}

impl Assignments {
    /// An empty assignment set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an assignment.
    #[must_use]
    pub fn set(mut self, path: impl Into<FieldPath>, value: impl Into<Value>) -> Self {
        self.entries.push((path.into(), value.into()));
        self
    }

    /// The assignments, in application order.
    #[must_use]
    pub fn entries(&self) -> &[(FieldPath, Value)] {
        &self.entries
    }

    /// True when there is nothing to assign.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Apply every assignment to `record` in order.
    ///
    /// Drivers that store records as plain field maps can implement their
    /// partial-update primitive with this.
    pub fn apply(&self, record: &mut Record) {
        for (path, value) in &self.entries {
            record.set(path, value.clone());
        }
    }
}

/// Capability surface a record store must expose to participate in a joint.
///
/// Implementations are cheap shared handles (`Clone` is expected to be an
/// `Arc` bump). All asynchronous operations take a [`Cx`] and resolve to an
/// [`Outcome`]; joints await them in strict sequence and never retry.
pub trait Collection: Clone + Send + Sync + 'static {
    /// The externally-visible identifier field of this collection's records.
    ///
    /// May be blank on records that have not been synchronized outward yet.
    fn key_field(&self) -> &str;

    /// The internally-assigned identifier field, distinct from the external
    /// key and always present.
    fn local_key_field(&self) -> &str;

    /// Point lookup: the first record matching `query`, if any.
    fn get(
        &self,
        cx: &Cx,
        query: &Criteria,
    ) -> impl Future<Output = Outcome<Option<Record>, Error>> + Send;

    /// Multi-record lookup: every record matching `query`.
    fn find(
        &self,
        cx: &Cx,
        query: &Criteria,
    ) -> impl Future<Output = Outcome<Vec<Record>, Error>> + Send;

    /// Bulk partial update: apply `fields` to every record matching
    /// `criteria`. Resolves to the number of records updated.
    fn update(
        &self,
        cx: &Cx,
        criteria: &Criteria,
        fields: &Assignments,
    ) -> impl Future<Output = Outcome<u64, Error>> + Send;

    /// Upsert `entry` into the embedded list at `list_field` on every record
    /// matching `criteria`, keyed by `entry_key_field`: an existing entry
    /// with the same key is replaced in place, otherwise the entry is
    /// appended. Resolves to the number of records touched.
    fn add_or_update_child(
        &self,
        cx: &Cx,
        criteria: &Criteria,
        list_field: &str,
        entry: Record,
        entry_key_field: &str,
    ) -> impl Future<Output = Outcome<u64, Error>> + Send;

    /// Remove every entry matching `entry_criteria` from the embedded list
    /// at `list_field` on every record matching `criteria`. Resolves to the
    /// number of records touched.
    fn remove_child(
        &self,
        cx: &Cx,
        criteria: &Criteria,
        list_field: &str,
        entry_criteria: &Criteria,
    ) -> impl Future<Output = Outcome<u64, Error>> + Send;
}
