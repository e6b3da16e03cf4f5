//! # Cloud Resource API
//!
//! The orchestrator never talks to Azure directly. It goes through
//! [`CloudResourceApi`], a declarative create-or-update / get / list / delete
//! interface over the control plane. Two implementations ship with the crate:
//!
//! - [`crate::arm::ArmCloudApi`] - Azure Resource Manager over REST
//! - [`InMemoryCloud`] - a simulated control plane with failure injection

pub mod errors;
pub mod memory;
pub mod resource;

pub use errors::{CloudError, CloudResult};
pub use memory::{CloudOperation, InMemoryCloud};
pub use resource::*;

use async_trait::async_trait;
use futures::stream::BoxStream;

/// Lazy, finite stream of resource states. Every call to
/// [`CloudResourceApi::list`] starts a fresh enumeration.
pub type ResourceStream<'a> = BoxStream<'a, CloudResult<ResourceState>>;

#[async_trait]
pub trait CloudResourceApi: Send + Sync {
    /// Create the resource or bring an existing one to `config`.
    ///
    /// Idempotent. Returns once the control plane reports a terminal state;
    /// a failed terminal state is an error.
    async fn create_or_update(
        &self,
        parent: Option<&ResourceHandle>,
        name: &str,
        config: &ResourceConfig,
    ) -> CloudResult<ResourceHandle>;

    async fn get(&self, handle: &ResourceHandle) -> CloudResult<ResourceState>;

    /// Enumerate children of `kind` under `parent`.
    fn list<'a>(&'a self, parent: &'a ResourceHandle, kind: ResourceKind) -> ResourceStream<'a>;

    /// Delete the resource and wait for completion. Deleting a resource that
    /// does not exist succeeds.
    async fn delete(&self, handle: &ResourceHandle) -> CloudResult<()>;

    /// Shared access keys of an authorization rule.
    async fn get_secrets(&self, handle: &ResourceHandle) -> CloudResult<AccessKeys>;

    /// Subscription every handle created through this API belongs to.
    fn subscription_id(&self) -> &str;
}

/// Id a `create_or_update` call addresses: resource groups live directly in
/// the subscription, everything else under its parent handle.
pub fn target_id(
    subscription_id: &str,
    parent: Option<&ResourceHandle>,
    name: &str,
    kind: ResourceKind,
) -> CloudResult<ResourceId> {
    match (kind, parent) {
        (ResourceKind::ResourceGroup, None) => {
            if name.trim().is_empty() {
                return Err(CloudError::InvalidRequest(
                    "A resource group name cannot be empty".to_string(),
                ));
            }
            Ok(ResourceId::resource_group(subscription_id, name))
        }
        (ResourceKind::ResourceGroup, Some(_)) => Err(CloudError::InvalidRequest(
            "A resource group cannot have a parent".to_string(),
        )),
        (_, Some(parent)) => parent.id().child(kind, name),
        (_, None) => Err(CloudError::InvalidRequest(format!(
            "A {kind} requires a parent resource"
        ))),
    }
}
