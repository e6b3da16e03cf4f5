//! # Orchestrator
//!
//! Provisioning runs declare their resources as a [`ResourceGraph`], hand it
//! to a [`LifecycleExecutor`] and get back the [`CreatedResources`] of the
//! run. On failure the [`RollbackManager`] removes what was created, newest
//! first. The [`ConfigurationUpdater`] changes resources that already exist.

pub mod errors;
pub mod executor;
pub mod graph;
pub mod registry;
pub mod rollback;
pub mod update;

pub use errors::{GraphError, ProvisionError, RollbackError, UpdateError};
pub use executor::{ExecutorOptions, LifecycleExecutor, OrchestrationOutcome};
pub use graph::{ResourceGraph, ResourceGraphBuilder};
pub use registry::{CreatedResource, CreatedResources};
pub use rollback::{RollbackManager, RollbackReport, RollbackStrategy};
pub use update::{
    ConfigDelta, ConfigurationUpdater, NamespaceDelta, ResourceUpdate, SubscriptionDelta,
    TopicDelta, UpdateOutcome,
};
