//! Core types and traits for syncjoint.
//!
//! `syncjoint-core` is the **contract layer** for the workspace. It defines
//! the record data model and the collection capability surface that joints
//! orchestrate over.
//!
//! # Role In The Architecture
//!
//! - **Contract layer**: [`Collection`] is the trait record stores implement
//!   to participate in a joint; [`Criteria`] and [`Assignments`] are the
//!   query/update value types it consumes.
//! - **Data model**: [`Record`] and [`FieldPath`] represent schemaless
//!   records and structured access into them, shared by the joint logic and
//!   every driver.
//! - **Structured concurrency**: re-exports `Cx` and `Outcome` from
//!   asupersync so every async collection operation is cancel-correct.
//!
//! # Who Uses This Crate
//!
//! - `syncjoint` builds joints and their cleanse/prepare transforms on top of
//!   [`Collection`].
//! - Driver crates (e.g. `syncjoint-memory`) implement [`Collection`] and
//!   operate on [`Record`]/[`Criteria`].
//!
//! Most applications should use the `syncjoint` facade; reach for
//! `syncjoint-core` directly when writing drivers.

// Re-export asupersync primitives for structured concurrency
pub use asupersync::{Cx, Outcome};

pub mod collection;
pub mod error;
pub mod path;
pub mod record;
pub mod validate;

pub use collection::{Assignments, Collection, Criteria};
pub use error::{ConfigError, Error, Result};
pub use path::FieldPath;
pub use record::{Record, value_is_blank};
