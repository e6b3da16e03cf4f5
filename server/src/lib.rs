//! # Busforge Server Library
//!
//! Declarative provisioning of Azure Service Bus resources with ordered
//! creation, rollback on failure and in-place reconfiguration.
//!
//! ## Modules
//!
//! - [`auth`] - Azure AD credential resolution and token caching
//! - [`arm`] - Azure Resource Manager REST implementation of the cloud API
//! - [`cloud`] - Resource model, the [`cloud::CloudResourceApi`] seam and an in-memory cloud
//! - [`orchestrator`] - Dependency graph, executor, rollback and updates
//! - [`report`] - Text rendering of resource state
//! - [`scenario`] - The publish/subscribe walkthrough
//! - [`utils`] - Environment and naming helpers
//! - [`common`] - Request rate limiting

pub mod arm;
pub mod auth;
pub mod cloud;
pub mod common;
pub mod orchestrator;
pub mod report;
pub mod scenario;
pub mod utils;
