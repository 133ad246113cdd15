//! Error types shared across the syncjoint crates.
//!
//! The error taxonomy mirrors the failure policy of the joint:
//!
//! - configuration problems are synchronous and fatal — no joint is built;
//! - a parent that cannot be resolved while *preparing* an outbound record is
//!   fatal for that record ([`Error::ParentNotFound`] /
//!   [`Error::ParentNotSynced`]);
//! - a parent missing during *cleansing* is not an error at all — the hook
//!   logs a warning and passes the record through.

use std::fmt;

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, Error>;

/// A configuration problem detected while a joint is being built.
///
/// Carries the offending option name so engines can surface actionable
/// messages for declaratively-loaded joint definitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    /// The configuration option that failed validation.
    pub option: &'static str,
    /// Human-readable description of the problem.
    pub message: String,
}

impl ConfigError {
    /// Create a new configuration error.
    pub fn new(option: &'static str, message: impl Into<String>) -> Self {
        Self {
            option,
            message: message.into(),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid option `{}`: {}", self.option, self.message)
    }
}

/// Errors surfaced by joint construction, joint hooks, and collection drivers.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Invalid or inconsistent joint configuration. Construction-time only.
    Config(ConfigError),

    /// A child record references a parent that does not exist.
    ///
    /// Raised on the prepare path: a record cannot be sent outward with an
    /// unresolvable foreign key.
    ParentNotFound {
        /// The parent entity name from the joint configuration.
        entity: String,
        /// The local key the lookup was performed with.
        local_key: String,
    },

    /// The referenced parent exists but has not been assigned an external
    /// key yet, so the child's foreign key cannot be resolved.
    ParentNotSynced {
        /// The parent entity name from the joint configuration.
        entity: String,
        /// The parent's local key.
        local_key: String,
    },

    /// A collection driver failed while serving a joint operation.
    Collection(String),

    /// Catch-all for errors that do not fit the categories above.
    Custom(String),
}

impl Error {
    /// Shorthand for a [`Error::Config`] value.
    pub fn config(option: &'static str, message: impl Into<String>) -> Self {
        Self::Config(ConfigError::new(option, message))
    }

    /// Shorthand for a [`Error::Collection`] value.
    pub fn collection(message: impl Into<String>) -> Self {
        Self::Collection(message.into())
    }

    /// True for the hard lookup misses of the prepare path.
    #[must_use]
    pub fn is_unresolved_parent(&self) -> bool {
        matches!(
            self,
            Self::ParentNotFound { .. } | Self::ParentNotSynced { .. }
        )
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "configuration error: {e}"),
            Self::ParentNotFound { entity, local_key } => {
                write!(f, "parent {entity} with local key {local_key} not found")
            }
            Self::ParentNotSynced { entity, local_key } => {
                write!(
                    f,
                    "parent {entity} with local key {local_key} lacks an external id"
                )
            }
            Self::Collection(msg) => write!(f, "collection error: {msg}"),
            Self::Custom(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}
