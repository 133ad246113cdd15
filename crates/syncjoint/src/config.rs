//! Declarative description of a parent/child relationship joint.
//!
//! A [`JointConfig`] is built once, validated, and then owned immutably by
//! the joint. Configs carry serde derives so sync engines can load joint
//! definitions from declarative config files.

use serde::{Deserialize, Serialize};
use syncjoint_core::{Error, FieldPath, Result, validate};

/// Configuration for the denormalized child-summary list kept on a parent
/// record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelatedListConfig {
    /// Field on the parent record holding the embedded list.
    pub name: String,
    /// Child fields copied into each list entry. The child collection's
    /// local key field is appended when the joint is built.
    pub fields: Vec<FieldPath>,
}

/// Immutable description of a one-to-many relationship between a parent and
/// a child collection.
///
/// # Example
///
/// ```
/// use syncjoint::JointConfig;
///
/// let config = JointConfig::new("Account", "Contact", "accountId", "account")
///     .parent_fields(["name"])
///     .related_list("contacts", ["email"]);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JointConfig {
    /// Name of the parent entity, used in error and log messages.
    pub parent_entity: String,
    /// Name of the child entity.
    pub child_entity: String,
    /// Foreign-key field on the child holding the parent's external key.
    pub lookup_field: FieldPath,
    /// Field on the child where the denormalized parent snapshot is embedded.
    pub parent_field: FieldPath,
    /// Parent fields denormalized onto children. The parent collection's
    /// local key field is appended when the joint is built.
    #[serde(default)]
    pub parent_fields: Vec<FieldPath>,
    /// Optional child-summary list maintained on the parent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_list: Option<RelatedListConfig>,
}

impl JointConfig {
    /// Describe a relationship with its required options.
    pub fn new(
        parent_entity: impl Into<String>,
        child_entity: impl Into<String>,
        lookup_field: impl Into<FieldPath>,
        parent_field: impl Into<FieldPath>,
    ) -> Self {
        Self {
            parent_entity: parent_entity.into(),
            child_entity: child_entity.into(),
            lookup_field: lookup_field.into(),
            parent_field: parent_field.into(),
            parent_fields: Vec::new(),
            related_list: None,
        }
    }

    /// Set the parent fields denormalized onto children.
    #[must_use]
    pub fn parent_fields<I, F>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = F>,
        F: Into<FieldPath>,
    {
        self.parent_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Configure the child-summary list maintained on the parent.
    #[must_use]
    pub fn related_list<I, F>(mut self, name: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = F>,
        F: Into<FieldPath>,
    {
        self.related_list = Some(RelatedListConfig {
            name: name.into(),
            fields: fields.into_iter().map(Into::into).collect(),
        });
        self
    }

    /// Check option well-formedness and cross-field constraints.
    ///
    /// Invoked by `Joint::new` before anything else; a failure here means no
    /// joint is constructed.
    pub fn validate(&self) -> Result<()> {
        validate::require_identifier("parent_entity", &self.parent_entity)?;
        validate::require_identifier("child_entity", &self.child_entity)?;
        if self.lookup_field.is_empty() {
            return Err(Error::config("lookup_field", "must not be empty"));
        }
        if self.parent_field.is_empty() {
            return Err(Error::config("parent_field", "must not be empty"));
        }
        if let Some(list) = &self.related_list {
            validate::require_non_empty("related_list.name", &list.name)?;
            if list.fields.is_empty() {
                return Err(Error::config(
                    "related_list.fields",
                    "required when a related list is configured",
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> JointConfig {
        JointConfig::new("Account", "Contact", "accountId", "account")
    }

    #[test]
    fn test_minimal_config_is_valid() {
        assert!(base().validate().is_ok());
    }

    #[test]
    fn test_builder_chain() {
        let config = base()
            .parent_fields(["name", "region"])
            .related_list("contacts", ["email", "name"]);

        assert_eq!(config.parent_fields.len(), 2);
        let list = config.related_list.expect("related list configured");
        assert_eq!(list.name, "contacts");
        assert_eq!(list.fields.len(), 2);
    }

    #[test]
    fn test_empty_entity_rejected() {
        let err = JointConfig::new("", "Contact", "accountId", "account")
            .validate()
            .unwrap_err();
        assert!(matches!(err, Error::Config(ref c) if c.option == "parent_entity"));
    }

    #[test]
    fn test_malformed_entity_rejected() {
        let config = JointConfig::new("Account", "bad entity", "accountId", "account");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_lookup_field_rejected() {
        let err = JointConfig::new("Account", "Contact", "", "account")
            .validate()
            .unwrap_err();
        assert!(matches!(err, Error::Config(ref c) if c.option == "lookup_field"));
    }

    #[test]
    fn test_related_list_requires_fields() {
        let err = base()
            .related_list("contacts", Vec::<&str>::new())
            .validate()
            .unwrap_err();
        assert!(matches!(err, Error::Config(ref c) if c.option == "related_list.fields"));
    }

    #[test]
    fn test_config_round_trips_through_serde() {
        let config = base()
            .parent_fields(["name"])
            .related_list("contacts", ["email"]);
        let json = serde_json::to_string(&config).expect("serialize");
        let parsed: JointConfig = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(parsed, config);
    }
}
