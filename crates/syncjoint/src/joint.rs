//! The relationship joint: hooks that keep two collections consistent.
//!
//! A [`Joint`] is built once from a [`JointConfig`] and two [`Collection`]
//! handles, and holds no mutable state of its own — all state lives in the
//! collections, so a joint is cheap to clone and safe to share. The external
//! sync engine decides *when* each hook fires; the joint only decides *what*
//! a hook does.
//!
//! Hook ordering within one invocation is strictly sequential: every
//! collection call is awaited before the next one is issued, and a
//! `Cancelled` or `Panicked` outcome from a collection propagates out of the
//! hook unchanged.

use asupersync::{Cx, Outcome};
use serde_json::Value;

use syncjoint_core::{
    Assignments, Collection, Criteria, Error, FieldPath, Record, Result, value_is_blank,
};

use crate::config::JointConfig;
use crate::transform::{
    CleanseTransform, EnhancedCleanse, EnhancedPrepare, Identity, PrepareTransform,
};

/// A built relationship joint between a parent and a child collection.
///
/// Construction normalizes the configuration: the parent collection's local
/// key field is appended to `parent_fields` (so snapshots always carry the
/// parent's internal identity), and the child collection's local key field is
/// appended to the related-list fields (so list entries have stable keys).
#[derive(Clone)]
pub struct Joint<P: Collection, C: Collection> {
    config: JointConfig,
    parent_key: FieldPath,
    parent_local_key: FieldPath,
    child_local_key: FieldPath,
    parent: P,
    child: C,
}

impl<P: Collection, C: Collection> std::fmt::Debug for Joint<P, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Joint")
            .field("parent_entity", &self.config.parent_entity)
            .field("child_entity", &self.config.child_entity)
            .finish_non_exhaustive()
    }
}

impl<P: Collection, C: Collection> Joint<P, C> {
    /// Build a joint from a validated configuration and two collections.
    ///
    /// Fails synchronously on a configuration error; no partial joint is
    /// returned and neither collection is touched.
    pub fn new(config: JointConfig, parent: P, child: C) -> Result<Self> {
        config.validate()?;
        let mut config = config;

        let parent_local_key = FieldPath::new(parent.local_key_field());
        if !config.parent_fields.contains(&parent_local_key) {
            config.parent_fields.push(parent_local_key.clone());
        }

        let child_local_key = FieldPath::new(child.local_key_field());
        if let Some(list) = config.related_list.as_mut() {
            if !list.fields.contains(&child_local_key) {
                list.fields.push(child_local_key.clone());
            }
        }

        let parent_key = FieldPath::new(parent.key_field());
        Ok(Self {
            config,
            parent_key,
            parent_local_key,
            child_local_key,
            parent,
            child,
        })
    }

    /// The normalized configuration this joint was built with.
    #[must_use]
    pub fn config(&self) -> &JointConfig {
        &self.config
    }

    /// The parent collection handle.
    #[must_use]
    pub fn parent(&self) -> &P {
        &self.parent
    }

    /// The child collection handle.
    #[must_use]
    pub fn child(&self) -> &C {
        &self.child
    }

    /// True when parent updates propagate denormalized fields to children.
    ///
    /// False when the configuration requested no parent fields beyond the
    /// local key: there is nothing to push on update, and
    /// [`on_parent_updated`](Self::on_parent_updated) becomes a no-op the
    /// engine may skip.
    #[must_use]
    pub fn propagates_updates(&self) -> bool {
        self.config
            .parent_fields
            .iter()
            .any(|field| field != &self.parent_local_key)
    }

    /// True when a child-summary list is maintained on the parent.
    #[must_use]
    pub fn maintains_related_list(&self) -> bool {
        self.config.related_list.is_some()
    }

    /// Project a parent record onto the configured denormalized fields.
    fn parent_snapshot(&self, parent: &Record) -> Record {
        parent.pick(&self.config.parent_fields)
    }

    /// Bulk-rewrite the foreign key of every child whose embedded snapshot
    /// matches this parent.
    async fn propagate_to_children(&self, cx: &Cx, parent: &Record) -> Outcome<u64, Error> {
        let snapshot = self.parent_snapshot(parent);
        let external_key = parent.get(&self.parent_key).cloned().unwrap_or(Value::Null);
        let criteria =
            Criteria::new().eq(self.config.parent_field.clone(), Value::from(snapshot));
        let fields = Assignments::new().set(self.config.lookup_field.clone(), external_key);
        match self.child.update(cx, &criteria, &fields).await {
            Outcome::Ok(count) => {
                tracing::debug!(
                    parent = %self.config.parent_entity,
                    child = %self.config.child_entity,
                    count,
                    "propagated parent fields to children"
                );
                Outcome::Ok(count)
            }
            Outcome::Err(e) => Outcome::Err(e),
            Outcome::Cancelled(r) => Outcome::Cancelled(r),
            Outcome::Panicked(p) => Outcome::Panicked(p),
        }
    }

    /// Re-derive the parent's child-summary list from the child collection.
    ///
    /// This is the resynchronization path used when a parent first appears
    /// or is re-inserted: it establishes a consistent baseline independent
    /// of incremental child events. Skipped when the parent has no external
    /// key yet, since no child can reference it.
    async fn resync_related_list(&self, cx: &Cx, parent: &Record) -> Outcome<(), Error> {
        let Some(list) = &self.config.related_list else {
            return Outcome::Ok(());
        };
        if parent.is_blank_at(&self.parent_key) {
            tracing::debug!(
                parent = %self.config.parent_entity,
                "parent has no external key; skipping related-list resync"
            );
            return Outcome::Ok(());
        }
        let external_key = parent.get(&self.parent_key).cloned().unwrap_or(Value::Null);

        let by_lookup = Criteria::new().eq(self.config.lookup_field.clone(), external_key.clone());
        let children = match self.child.find(cx, &by_lookup).await {
            Outcome::Ok(children) => children,
            Outcome::Err(e) => return Outcome::Err(e),
            Outcome::Cancelled(r) => return Outcome::Cancelled(r),
            Outcome::Panicked(p) => return Outcome::Panicked(p),
        };
        if children.is_empty() {
            return Outcome::Ok(());
        }

        let entries: Vec<Value> = children
            .iter()
            .map(|child| Value::from(child.pick(&list.fields)))
            .collect();
        let count = entries.len();
        let by_key = Criteria::new().eq(self.parent_key.clone(), external_key);
        let fields = Assignments::new().set(list.name.as_str(), Value::Array(entries));
        match self.parent.update(cx, &by_key, &fields).await {
            Outcome::Ok(_) => {
                tracing::debug!(
                    parent = %self.config.parent_entity,
                    entries = count,
                    "rebuilt related list from child collection"
                );
                Outcome::Ok(())
            }
            Outcome::Err(e) => Outcome::Err(e),
            Outcome::Cancelled(r) => Outcome::Cancelled(r),
            Outcome::Panicked(p) => Outcome::Panicked(p),
        }
    }

    /// Hook: a parent record was inserted (or re-inserted).
    ///
    /// Pushes denormalized fields down to matching children when any are
    /// configured, then rebuilds the related list wholesale when one is
    /// maintained.
    #[tracing::instrument(level = "debug", skip(self, cx, parent))]
    pub async fn on_parent_inserted(&self, cx: &Cx, parent: &Record) -> Outcome<(), Error> {
        if self.propagates_updates() {
            match self.propagate_to_children(cx, parent).await {
                Outcome::Ok(_) => {}
                Outcome::Err(e) => return Outcome::Err(e),
                Outcome::Cancelled(r) => return Outcome::Cancelled(r),
                Outcome::Panicked(p) => return Outcome::Panicked(p),
            }
        }
        if self.maintains_related_list() {
            return self.resync_related_list(cx, parent).await;
        }
        Outcome::Ok(())
    }

    /// Hook: a parent record was updated.
    ///
    /// No-op when no parent fields beyond the local key are denormalized —
    /// check [`propagates_updates`](Self::propagates_updates) to skip the
    /// call entirely.
    #[tracing::instrument(level = "debug", skip(self, cx, parent))]
    pub async fn on_parent_updated(&self, cx: &Cx, parent: &Record) -> Outcome<(), Error> {
        if !self.propagates_updates() {
            tracing::debug!(
                parent = %self.config.parent_entity,
                "no denormalized parent fields configured; nothing to propagate"
            );
            return Outcome::Ok(());
        }
        match self.propagate_to_children(cx, parent).await {
            Outcome::Ok(_) => Outcome::Ok(()),
            Outcome::Err(e) => Outcome::Err(e),
            Outcome::Cancelled(r) => Outcome::Cancelled(r),
            Outcome::Panicked(p) => Outcome::Panicked(p),
        }
    }

    /// Cleanse-side core: attach the parent snapshot to a cleansed record.
    ///
    /// A blank foreign key means the child legitimately has no parent yet;
    /// a foreign key that resolves to no parent is tolerated with a warning,
    /// since source-order races between parent and child arrival are
    /// expected during ingest.
    pub(crate) async fn attach_parent_snapshot(
        &self,
        cx: &Cx,
        mut record: Record,
    ) -> Outcome<Record, Error> {
        if record.is_blank_at(&self.config.lookup_field) {
            return Outcome::Ok(record);
        }
        let foreign_key = record
            .get(&self.config.lookup_field)
            .cloned()
            .unwrap_or(Value::Null);

        let by_key = Criteria::new().eq(self.parent_key.clone(), foreign_key.clone());
        let parent = match self.parent.get(cx, &by_key).await {
            Outcome::Ok(parent) => parent,
            Outcome::Err(e) => return Outcome::Err(e),
            Outcome::Cancelled(r) => return Outcome::Cancelled(r),
            Outcome::Panicked(p) => return Outcome::Panicked(p),
        };

        match parent {
            Some(parent) => {
                record.set(
                    &self.config.parent_field,
                    Value::from(self.parent_snapshot(&parent)),
                );
            }
            None => {
                tracing::warn!(
                    parent = %self.config.parent_entity,
                    child = %self.config.child_entity,
                    foreign_key = %foreign_key,
                    "parent not found during cleanse; record left without a snapshot"
                );
            }
        }
        Outcome::Ok(record)
    }

    /// Prepare-side core: resolve the embedded parent reference into the
    /// parent's external key.
    ///
    /// Fast path: the snapshot already carries the external key and it is
    /// copied verbatim, with no collection access. Otherwise the parent is
    /// looked up by its local key, and failure to resolve it is fatal for
    /// the record — nothing may leave the system with a dangling reference.
    pub(crate) async fn resolve_parent_reference(
        &self,
        cx: &Cx,
        mut record: Record,
    ) -> Outcome<Record, Error> {
        if record.is_blank_at(&self.config.parent_field) {
            return Outcome::Ok(record);
        }
        let snapshot = record
            .get(&self.config.parent_field)
            .cloned()
            .unwrap_or(Value::Null);

        if let Some(external_key) = self.parent_key.get_value(&snapshot) {
            if !value_is_blank(Some(external_key)) {
                let external_key = external_key.clone();
                record.set(&self.config.lookup_field, external_key);
                return Outcome::Ok(record);
            }
        }

        let local_key = self
            .parent_local_key
            .get_value(&snapshot)
            .cloned()
            .unwrap_or(Value::Null);
        if value_is_blank(Some(&local_key)) {
            // A blank local key can never legitimately resolve; fail without
            // issuing a lookup that cannot match.
            return Outcome::Err(Error::ParentNotFound {
                entity: self.config.parent_entity.clone(),
                local_key: key_display(&local_key),
            });
        }

        let by_local_key = Criteria::new().eq(self.parent_local_key.clone(), local_key.clone());
        let parent = match self.parent.get(cx, &by_local_key).await {
            Outcome::Ok(parent) => parent,
            Outcome::Err(e) => return Outcome::Err(e),
            Outcome::Cancelled(r) => return Outcome::Cancelled(r),
            Outcome::Panicked(p) => return Outcome::Panicked(p),
        };
        let Some(parent) = parent else {
            return Outcome::Err(Error::ParentNotFound {
                entity: self.config.parent_entity.clone(),
                local_key: key_display(&local_key),
            });
        };

        if parent.is_blank_at(&self.parent_key) {
            return Outcome::Err(Error::ParentNotSynced {
                entity: self.config.parent_entity.clone(),
                local_key: key_display(&local_key),
            });
        }
        let external_key = parent.get(&self.parent_key).cloned().unwrap_or(Value::Null);
        record.set(&self.config.lookup_field, external_key);
        Outcome::Ok(record)
    }

    /// Upsert the child's summary into its parent's related list.
    ///
    /// A child with a blank foreign key is not represented in any list, and
    /// a child whose foreign key *changed* away from a previous parent is
    /// not removed from that parent's list — reparenting cleanup is a known,
    /// deliberate limitation.
    async fn upsert_child_summary(&self, cx: &Cx, child: &Record) -> Outcome<(), Error> {
        let Some(list) = &self.config.related_list else {
            tracing::debug!(
                child = %self.config.child_entity,
                "no related list configured; ignoring child event"
            );
            return Outcome::Ok(());
        };
        if child.is_blank_at(&self.config.lookup_field) {
            return Outcome::Ok(());
        }
        let foreign_key = child
            .get(&self.config.lookup_field)
            .cloned()
            .unwrap_or(Value::Null);

        let entry = child.pick(&list.fields);
        let by_key = Criteria::new().eq(self.parent_key.clone(), foreign_key);
        match self
            .parent
            .add_or_update_child(cx, &by_key, &list.name, entry, self.child.local_key_field())
            .await
        {
            Outcome::Ok(count) => {
                tracing::debug!(
                    parent = %self.config.parent_entity,
                    child = %self.config.child_entity,
                    count,
                    "upserted child summary into related list"
                );
                Outcome::Ok(())
            }
            Outcome::Err(e) => Outcome::Err(e),
            Outcome::Cancelled(r) => Outcome::Cancelled(r),
            Outcome::Panicked(p) => Outcome::Panicked(p),
        }
    }

    /// Hook: a child record was inserted.
    #[tracing::instrument(level = "debug", skip(self, cx, child))]
    pub async fn on_child_inserted(&self, cx: &Cx, child: &Record) -> Outcome<(), Error> {
        self.upsert_child_summary(cx, child).await
    }

    /// Hook: a child record was updated.
    ///
    /// Identical to insert — the upsert keys on the child's local key, so
    /// re-applying the same summary converges on one entry.
    #[tracing::instrument(level = "debug", skip(self, cx, child))]
    pub async fn on_child_updated(&self, cx: &Cx, child: &Record) -> Outcome<(), Error> {
        self.upsert_child_summary(cx, child).await
    }

    /// Hook: a child record was removed.
    ///
    /// Removes the child's entry from its parent's related list; a no-op
    /// when no related list is configured or the child has no parent.
    #[tracing::instrument(level = "debug", skip(self, cx, child))]
    pub async fn on_child_removed(&self, cx: &Cx, child: &Record) -> Outcome<(), Error> {
        let Some(list) = &self.config.related_list else {
            return Outcome::Ok(());
        };
        if child.is_blank_at(&self.config.lookup_field) {
            return Outcome::Ok(());
        }
        let foreign_key = child
            .get(&self.config.lookup_field)
            .cloned()
            .unwrap_or(Value::Null);
        let local_key = child.get(&self.child_local_key).cloned().unwrap_or(Value::Null);

        let by_key = Criteria::new().eq(self.parent_key.clone(), foreign_key);
        let entry_criteria = Criteria::new().eq(self.child_local_key.clone(), local_key);
        match self
            .parent
            .remove_child(cx, &by_key, &list.name, &entry_criteria)
            .await
        {
            Outcome::Ok(_) => Outcome::Ok(()),
            Outcome::Err(e) => Outcome::Err(e),
            Outcome::Cancelled(r) => Outcome::Cancelled(r),
            Outcome::Panicked(p) => Outcome::Panicked(p),
        }
    }

    /// Wrap an existing cleanse transform with parent-snapshot attachment.
    pub fn enhance_cleanse<T: CleanseTransform>(&self, inner: T) -> EnhancedCleanse<P, C, T> {
        EnhancedCleanse {
            joint: self.clone(),
            inner,
        }
    }

    /// The enhanced cleanse transform over the identity step.
    pub fn cleanse_transform(&self) -> EnhancedCleanse<P, C, Identity> {
        self.enhance_cleanse(Identity)
    }

    /// Wrap an existing prepare transform with foreign-key resolution.
    pub fn enhance_prepare<T: PrepareTransform>(&self, inner: T) -> EnhancedPrepare<P, C, T> {
        EnhancedPrepare {
            joint: self.clone(),
            inner,
        }
    }

    /// The enhanced prepare transform over the identity step.
    pub fn prepare_transform(&self) -> EnhancedPrepare<P, C, Identity> {
        self.enhance_prepare(Identity)
    }
}

/// Render a key value for error messages without JSON string quoting.
fn key_display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
