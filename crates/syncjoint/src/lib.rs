//! Relationship joints that keep denormalized records in sync across
//! collections.
//!
//! A **joint** describes a one-to-many relationship between a parent and a
//! child collection and synthesizes the hooks a sync engine needs to keep
//! denormalized copies consistent:
//!
//! - **Parent propagation** — [`Joint::on_parent_inserted`] /
//!   [`Joint::on_parent_updated`] push denormalized parent fields down onto
//!   matching children.
//! - **Cleanse enhancement** — [`Joint::enhance_cleanse`] wraps an ingest
//!   transform so cleansed child records gain a snapshot of their parent,
//!   looked up by foreign key.
//! - **Prepare enhancement** — [`Joint::enhance_prepare`] wraps an outbound
//!   transform so a child's foreign key is resolved from its parent's
//!   external identifier before the record leaves the system.
//! - **Related-list maintenance** — [`Joint::on_child_inserted`] /
//!   [`Joint::on_child_updated`] / [`Joint::on_child_removed`] keep an
//!   embedded list of child summaries on the parent record.
//!
//! The joint holds no mutable state; all state lives in the two collections,
//! reached through the [`Collection`] trait from `syncjoint-core`. When the
//! joint fires is entirely the engine's decision.
//!
//! # Example
//!
//! ```ignore
//! use syncjoint::prelude::*;
//!
//! let joint = Joint::new(
//!     JointConfig::new("Account", "Contact", "accountId", "account")
//!         .parent_fields(["name"])
//!         .related_list("contacts", ["email"]),
//!     accounts,
//!     contacts,
//! )?;
//!
//! // Ingest path: cleanse then attach the parent snapshot.
//! let cleanse = joint.cleanse_transform();
//! let contact = cleanse.cleanse(&cx, contact).await?;
//!
//! // Outbound path: resolve the foreign key before sending.
//! let prepare = joint.prepare_transform();
//! let contact = prepare.prepare(&cx, contact, Action::Update).await?;
//! ```

pub mod config;
pub mod joint;
pub mod transform;

pub use config::{JointConfig, RelatedListConfig};
pub use joint::Joint;
pub use transform::{
    Action, CleanseTransform, EnhancedCleanse, EnhancedPrepare, Identity, PrepareTransform,
};

// Re-export the contract layer so engines can depend on the facade alone.
pub use syncjoint_core::{
    Assignments, Collection, ConfigError, Criteria, Cx, Error, FieldPath, Outcome, Record, Result,
    value_is_blank,
};

/// Convenience imports for engines wiring up joints.
pub mod prelude {
    pub use crate::config::{JointConfig, RelatedListConfig};
    pub use crate::joint::Joint;
    pub use crate::transform::{Action, CleanseTransform, Identity, PrepareTransform};
    pub use syncjoint_core::{
        Assignments, Collection, Criteria, Cx, Error, FieldPath, Outcome, Record, Result,
    };
}
