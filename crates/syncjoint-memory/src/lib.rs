//! In-memory collection driver for syncjoint.
//!
//! [`MemoryCollection`] keeps its records in a mutex-guarded vector and
//! implements the full [`Collection`] surface: point and multi-record
//! lookups, bulk filter-based updates, and embedded-list upsert/removal.
//!
//! It exists for the same reason the heavier drivers do — so joints can be
//! exercised end to end — but with no I/O underneath, which makes it the
//! backend of choice for engine prototypes and test suites.

// Allow `impl Future` return types in trait methods - intentional for async trait compat
#![allow(clippy::manual_async_fn)]

use std::future::Future;
use std::sync::Arc;

use asupersync::sync::Mutex;
use asupersync::{Cx, Outcome};
use serde_json::Value;

use syncjoint_core::{Assignments, Collection, Criteria, Error, FieldPath, Record};

/// A shared, in-memory record store.
///
/// Cloning is cheap: clones share the same underlying rows, so a collection
/// handle can be given to a joint and kept by the test for assertions.
#[derive(Clone)]
pub struct MemoryCollection {
    inner: Arc<Inner>,
}

struct Inner {
    key_field: String,
    local_key_field: String,
    rows: Mutex<Vec<Record>>,
}

impl std::fmt::Debug for MemoryCollection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryCollection")
            .field("key_field", &self.inner.key_field)
            .field("local_key_field", &self.inner.local_key_field)
            .finish_non_exhaustive()
    }
}

fn store_error(message: &str) -> Error {
    Error::collection(message)
}

impl MemoryCollection {
    /// Create an empty collection with the given identifier fields.
    #[must_use]
    pub fn new(key_field: impl Into<String>, local_key_field: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(Inner {
                key_field: key_field.into(),
                local_key_field: local_key_field.into(),
                rows: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Append a record to the store.
    pub async fn insert(&self, cx: &Cx, record: Record) -> Outcome<(), Error> {
        let Ok(mut rows) = self.inner.rows.lock(cx).await else {
            return Outcome::Err(store_error("failed to acquire store lock"));
        };
        rows.push(record);
        Outcome::Ok(())
    }

    /// Snapshot of every record in the store, in insertion order.
    pub async fn records(&self, cx: &Cx) -> Outcome<Vec<Record>, Error> {
        let Ok(rows) = self.inner.rows.lock(cx).await else {
            return Outcome::Err(store_error("failed to acquire store lock"));
        };
        Outcome::Ok(rows.clone())
    }

    /// Number of records in the store.
    pub async fn len(&self, cx: &Cx) -> Outcome<usize, Error> {
        let Ok(rows) = self.inner.rows.lock(cx).await else {
            return Outcome::Err(store_error("failed to acquire store lock"));
        };
        Outcome::Ok(rows.len())
    }
}

impl Collection for MemoryCollection {
    fn key_field(&self) -> &str {
        &self.inner.key_field
    }

    fn local_key_field(&self) -> &str {
        &self.inner.local_key_field
    }

    fn get(
        &self,
        cx: &Cx,
        query: &Criteria,
    ) -> impl Future<Output = Outcome<Option<Record>, Error>> + Send {
        let inner = Arc::clone(&self.inner);
        let query = query.clone();
        async move {
            let Ok(rows) = inner.rows.lock(cx).await else {
                return Outcome::Err(store_error("failed to acquire store lock"));
            };
            Outcome::Ok(rows.iter().find(|row| query.matches(row)).cloned())
        }
    }

    fn find(
        &self,
        cx: &Cx,
        query: &Criteria,
    ) -> impl Future<Output = Outcome<Vec<Record>, Error>> + Send {
        let inner = Arc::clone(&self.inner);
        let query = query.clone();
        async move {
            let Ok(rows) = inner.rows.lock(cx).await else {
                return Outcome::Err(store_error("failed to acquire store lock"));
            };
            Outcome::Ok(
                rows.iter()
                    .filter(|row| query.matches(row))
                    .cloned()
                    .collect(),
            )
        }
    }

    fn update(
        &self,
        cx: &Cx,
        criteria: &Criteria,
        fields: &Assignments,
    ) -> impl Future<Output = Outcome<u64, Error>> + Send {
        let inner = Arc::clone(&self.inner);
        let criteria = criteria.clone();
        let fields = fields.clone();
        async move {
            let Ok(mut rows) = inner.rows.lock(cx).await else {
                return Outcome::Err(store_error("failed to acquire store lock"));
            };
            let mut updated = 0u64;
            for row in rows.iter_mut().filter(|row| criteria.matches(row)) {
                fields.apply(row);
                updated += 1;
            }
            tracing::debug!(updated, "memory store bulk update");
            Outcome::Ok(updated)
        }
    }

    fn add_or_update_child(
        &self,
        cx: &Cx,
        criteria: &Criteria,
        list_field: &str,
        entry: Record,
        entry_key_field: &str,
    ) -> impl Future<Output = Outcome<u64, Error>> + Send {
        let inner = Arc::clone(&self.inner);
        let criteria = criteria.clone();
        let list_path = FieldPath::new(list_field);
        let key_path = FieldPath::new(entry_key_field);
        async move {
            let entry_key = entry.get(&key_path).cloned().unwrap_or(Value::Null);
            let entry_value = Value::from(entry);
            let Ok(mut rows) = inner.rows.lock(cx).await else {
                return Outcome::Err(store_error("failed to acquire store lock"));
            };
            let mut touched = 0u64;
            for row in rows.iter_mut().filter(|row| criteria.matches(row)) {
                let mut items = match row.get(&list_path) {
                    Some(Value::Array(items)) => items.clone(),
                    _ => Vec::new(),
                };
                let existing = items
                    .iter()
                    .position(|item| key_path.get_value(item).unwrap_or(&Value::Null) == &entry_key);
                match existing {
                    Some(idx) => items[idx] = entry_value.clone(),
                    None => items.push(entry_value.clone()),
                }
                row.set(&list_path, Value::Array(items));
                touched += 1;
            }
            Outcome::Ok(touched)
        }
    }

    fn remove_child(
        &self,
        cx: &Cx,
        criteria: &Criteria,
        list_field: &str,
        entry_criteria: &Criteria,
    ) -> impl Future<Output = Outcome<u64, Error>> + Send {
        let inner = Arc::clone(&self.inner);
        let criteria = criteria.clone();
        let entry_criteria = entry_criteria.clone();
        let list_path = FieldPath::new(list_field);
        async move {
            let Ok(mut rows) = inner.rows.lock(cx).await else {
                return Outcome::Err(store_error("failed to acquire store lock"));
            };
            let mut touched = 0u64;
            for row in rows.iter_mut().filter(|row| criteria.matches(row)) {
                let Some(Value::Array(items)) = row.get(&list_path) else {
                    continue;
                };
                let kept: Vec<Value> = items
                    .iter()
                    .filter(|item| !entry_criteria.matches_value(item))
                    .cloned()
                    .collect();
                if kept.len() != items.len() {
                    row.set(&list_path, Value::Array(kept));
                    touched += 1;
                }
            }
            Outcome::Ok(touched)
        }
    }
}
