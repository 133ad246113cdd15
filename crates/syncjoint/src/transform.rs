//! Cleanse and prepare transforms, and their enhanced compositions.
//!
//! Sync engines run records through a *cleanse* step on the way in and a
//! *prepare* step on the way out. A joint does not replace those steps; it
//! wraps them. [`Joint::enhance_cleanse`](crate::Joint::enhance_cleanse) and
//! [`Joint::enhance_prepare`](crate::Joint::enhance_prepare) accept any
//! existing transform and return a new one with the same shape that runs the
//! wrapped step first and then applies the joint's relationship logic.
//! When the engine has no step of its own, [`Identity`] is the default —
//! plain function composition, no truthiness checks.

// Allow `impl Future` return types in trait methods - intentional for async trait compat
#![allow(clippy::manual_async_fn)]

use std::future::Future;

use asupersync::{Cx, Outcome};
use syncjoint_core::{Collection, Error, Record};

use crate::joint::Joint;

/// The outward operation a record is being prepared for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// The record will be created in the external system.
    Insert,
    /// The record will update an existing external record.
    Update,
    /// The record will be removed from the external system.
    Remove,
}

/// A record-normalization step applied as records are ingested.
pub trait CleanseTransform: Send + Sync {
    /// Transform one record.
    fn cleanse(
        &self,
        cx: &Cx,
        record: Record,
    ) -> impl Future<Output = Outcome<Record, Error>> + Send;
}

/// A record-preparation step applied before a record is sent outward.
pub trait PrepareTransform: Send + Sync {
    /// Transform one record bound for the external system.
    fn prepare(
        &self,
        cx: &Cx,
        record: Record,
        action: Action,
    ) -> impl Future<Output = Outcome<Record, Error>> + Send;
}

/// Pass-through transform substituted when a joint wraps no caller-supplied
/// step.
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

impl CleanseTransform for Identity {
    fn cleanse(
        &self,
        _cx: &Cx,
        record: Record,
    ) -> impl Future<Output = Outcome<Record, Error>> + Send {
        async move { Outcome::Ok(record) }
    }
}

impl PrepareTransform for Identity {
    fn prepare(
        &self,
        _cx: &Cx,
        record: Record,
        _action: Action,
    ) -> impl Future<Output = Outcome<Record, Error>> + Send {
        async move { Outcome::Ok(record) }
    }
}

/// A cleanse transform extended with parent-snapshot attachment.
///
/// Runs the wrapped transform first, then looks the parent up by the child's
/// foreign key and embeds the denormalized snapshot. A parent that cannot be
/// found is logged and tolerated — ingest-order races between parent and
/// child arrival are expected.
pub struct EnhancedCleanse<P: Collection, C: Collection, T> {
    pub(crate) joint: Joint<P, C>,
    pub(crate) inner: T,
}

impl<P: Collection, C: Collection, T: CleanseTransform> CleanseTransform
    for EnhancedCleanse<P, C, T>
{
    fn cleanse(
        &self,
        cx: &Cx,
        record: Record,
    ) -> impl Future<Output = Outcome<Record, Error>> + Send {
        async move {
            let record = match self.inner.cleanse(cx, record).await {
                Outcome::Ok(r) => r,
                Outcome::Err(e) => return Outcome::Err(e),
                Outcome::Cancelled(r) => return Outcome::Cancelled(r),
                Outcome::Panicked(p) => return Outcome::Panicked(p),
            };
            self.joint.attach_parent_snapshot(cx, record).await
        }
    }
}

/// A prepare transform extended with foreign-key resolution.
///
/// Runs the wrapped transform first, then resolves the embedded parent
/// reference into the parent's external key. Unlike the cleanse side, an
/// unresolvable parent here fails the record: nothing may leave the system
/// with a dangling foreign key.
pub struct EnhancedPrepare<P: Collection, C: Collection, T> {
    pub(crate) joint: Joint<P, C>,
    pub(crate) inner: T,
}

impl<P: Collection, C: Collection, T: PrepareTransform> PrepareTransform
    for EnhancedPrepare<P, C, T>
{
    fn prepare(
        &self,
        cx: &Cx,
        record: Record,
        action: Action,
    ) -> impl Future<Output = Outcome<Record, Error>> + Send {
        async move {
            let record = match self.inner.prepare(cx, record, action).await {
                Outcome::Ok(r) => r,
                Outcome::Err(e) => return Outcome::Err(e),
                Outcome::Cancelled(r) => return Outcome::Cancelled(r),
                Outcome::Panicked(p) => return Outcome::Panicked(p),
            };
            self.joint.resolve_parent_reference(cx, record).await
        }
    }
}
