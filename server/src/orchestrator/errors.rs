use crate::cloud::{CloudError, ResourceKind};
use std::time::Duration;
use thiserror::Error;

/// Problems found while validating a resource graph.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GraphError {
    #[error("Resource '{0}' is declared more than once")]
    DuplicateName(String),

    #[error("Resource '{name}' refers to unknown resource '{missing}'")]
    UnknownReference { name: String, missing: String },

    #[error("A {kind} requires a parent, but '{name}' has none")]
    MissingParentReference { name: String, kind: ResourceKind },

    #[error("A {kind} cannot be placed under {parent} '{parent_name}' ('{name}')")]
    ParentKindMismatch {
        name: String,
        kind: ResourceKind,
        parent_name: String,
        parent: ResourceKind,
    },

    #[error("A resource group cannot have a parent ('{name}' under '{parent_name}')")]
    UnexpectedParent { name: String, parent_name: String },

    #[error("Dependency cycle between: {}", .0.join(", "))]
    Cycle(Vec<String>),
}

/// Why provisioning stopped. Everything created before the failure is still
/// in the run's registry and gets rolled back.
#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("Failed to provision {kind} '{name}': {source}")]
    Api {
        name: String,
        kind: ResourceKind,
        #[source]
        source: CloudError,
    },

    #[error("Provisioning {kind} '{name}' did not finish within {after:?}")]
    Timeout {
        name: String,
        kind: ResourceKind,
        after: Duration,
    },

    #[error("Provisioning was cancelled before '{name}' was created")]
    Cancelled { name: String },

    #[error("Parent '{parent}' of '{name}' has not been created")]
    MissingParent { name: String, parent: String },
}

impl ProvisionError {
    /// Resource that was being provisioned when the run stopped.
    pub fn resource_name(&self) -> &str {
        match self {
            ProvisionError::Api { name, .. }
            | ProvisionError::Timeout { name, .. }
            | ProvisionError::Cancelled { name }
            | ProvisionError::MissingParent { name, .. } => name,
        }
    }
}

/// A delete that failed during rollback. Never fatal.
#[derive(Debug, Clone, Error)]
#[error("Failed to delete {kind} '{name}': {source}")]
pub struct RollbackError {
    pub name: String,
    pub kind: ResourceKind,
    #[source]
    pub source: CloudError,
}

#[derive(Debug, Error)]
pub enum UpdateError {
    #[error("A {expected} update cannot be applied to {actual} '{name}'")]
    KindMismatch {
        name: String,
        expected: ResourceKind,
        actual: ResourceKind,
    },

    #[error("A {kind} has no authorization rules ('{name}')")]
    RulesNotSupported { name: String, kind: ResourceKind },

    #[error("Failed to read current state of '{name}': {source}")]
    Fetch {
        name: String,
        #[source]
        source: CloudError,
    },

    #[error("Failed to apply new configuration to '{name}': {source}")]
    Apply {
        name: String,
        #[source]
        source: CloudError,
    },

    #[error("Failed to remove authorization rule '{rule}' from '{name}': {source}")]
    RemoveRule {
        name: String,
        rule: String,
        #[source]
        source: CloudError,
    },

    #[error("Failed to add authorization rule '{rule}' to '{name}': {source}")]
    AddRule {
        name: String,
        rule: String,
        #[source]
        source: CloudError,
    },
}
