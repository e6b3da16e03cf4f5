//! In-memory control plane.
//!
//! Behaves like the management API for the resource kinds this crate knows:
//! parents must exist before children, deletes cascade to descendants and are
//! idempotent, namespaces come with a `RootManageSharedAccessKey` rule. Faults
//! can be injected per resource name to exercise rollback paths.

use super::errors::{CloudError, CloudResult};
use super::resource::*;
use super::{CloudResourceApi, ResourceStream, target_id};
use async_trait::async_trait;
use chrono::Utc;
use futures::{StreamExt, TryStreamExt, stream};
use rand::Rng;
use rand::distributions::Alphanumeric;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

pub const DEFAULT_NAMESPACE_RULE: &str = "RootManageSharedAccessKey";

/// A mutating call observed by the in-memory control plane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloudOperation {
    CreateOrUpdate {
        kind: ResourceKind,
        name: String,
        created: bool,
    },
    Delete {
        kind: ResourceKind,
        name: String,
        existed: bool,
    },
}

#[derive(Debug, Default)]
struct Faults {
    fail_create: HashSet<String>,
    fail_delete: HashSet<String>,
    create_delay: HashMap<String, Duration>,
}

#[derive(Debug)]
struct Stored {
    state: ResourceState,
    keys: Option<AccessKeys>,
}

#[derive(Debug, Default)]
struct MemoryState {
    resources: BTreeMap<String, Stored>,
    operations: Vec<CloudOperation>,
    faults: Faults,
}

#[derive(Debug)]
pub struct InMemoryCloud {
    subscription_id: String,
    state: Mutex<MemoryState>,
}

impl InMemoryCloud {
    pub fn new(subscription_id: impl Into<String>) -> Self {
        Self {
            subscription_id: subscription_id.into(),
            state: Mutex::new(MemoryState::default()),
        }
    }

    /// Every create-or-update of a resource with this name fails.
    pub fn fail_create(&self, name: &str) {
        self.lock().faults.fail_create.insert(name.to_ascii_lowercase());
    }

    /// Every delete of a resource with this name fails.
    pub fn fail_delete(&self, name: &str) {
        self.lock().faults.fail_delete.insert(name.to_ascii_lowercase());
    }

    /// Creating a resource with this name takes `delay` before completing.
    pub fn delay_create(&self, name: &str, delay: Duration) {
        self.lock()
            .faults
            .create_delay
            .insert(name.to_ascii_lowercase(), delay);
    }

    /// Mutating calls in the order they were served.
    pub fn operations(&self) -> Vec<CloudOperation> {
        self.lock().operations.clone()
    }

    pub fn exists(&self, id: &ResourceId) -> bool {
        self.lock().resources.contains_key(&key(id))
    }

    pub fn resource_count(&self) -> usize {
        self.lock().resources.len()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn children(
        &self,
        parent: &ResourceHandle,
        kind: ResourceKind,
    ) -> CloudResult<Vec<ResourceState>> {
        if kind.parent_kind() != Some(parent.kind()) {
            return Err(CloudError::InvalidRequest(format!(
                "A {} does not contain {kind} resources",
                parent.kind()
            )));
        }

        let state = self.lock();
        let parent_key = key(parent.id());
        if !state.resources.contains_key(&parent_key) {
            return Err(CloudError::NotFound(parent.id().to_string()));
        }

        Ok(state
            .resources
            .values()
            .filter(|stored| stored.state.kind() == kind)
            .filter(|stored| {
                stored
                    .state
                    .id()
                    .parent()
                    .is_some_and(|p| key(&p) == parent_key)
            })
            .map(|stored| with_live_counts(&state, &stored.state))
            .collect())
    }
}

#[async_trait]
impl CloudResourceApi for InMemoryCloud {
    async fn create_or_update(
        &self,
        parent: Option<&ResourceHandle>,
        name: &str,
        config: &ResourceConfig,
    ) -> CloudResult<ResourceHandle> {
        let kind = config.kind();
        let id = target_id(&self.subscription_id, parent, name, kind)?;

        let delay = self
            .lock()
            .faults
            .create_delay
            .get(&name.to_ascii_lowercase())
            .copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.lock();

        if let Some(parent_id) = id.parent() {
            if !state.resources.contains_key(&key(&parent_id)) {
                return Err(CloudError::NotFound(parent_id.to_string()));
            }
        }

        if state.faults.fail_create.contains(&name.to_ascii_lowercase()) {
            log::debug!("Injected create failure for {kind} '{name}'");
            return Err(CloudError::OperationFailed {
                operation: format!("create {kind} {name}"),
                status: "Failed".to_string(),
            });
        }

        let resource_key = key(&id);
        let previous = state.resources.remove(&resource_key);
        let created = previous.is_none();
        let keys = match &previous {
            Some(stored) => stored.keys.clone(),
            None if kind.is_authorization_rule() => Some(generate_keys(&id)),
            None => None,
        };
        let resource_state = materialize(&id, config, previous.as_ref().map(|s| &s.state));
        state.resources.insert(
            resource_key,
            Stored {
                state: resource_state,
                keys,
            },
        );

        if created && kind == ResourceKind::Namespace {
            let rule_id =
                id.child(ResourceKind::NamespaceAuthorizationRule, DEFAULT_NAMESPACE_RULE)?;
            state.resources.insert(
                key(&rule_id),
                Stored {
                    keys: Some(generate_keys(&rule_id)),
                    state: ResourceState::AuthorizationRule(AuthorizationRuleState {
                        id: rule_id,
                        rights: AccessRights::manage(),
                    }),
                },
            );
        }

        state.operations.push(CloudOperation::CreateOrUpdate {
            kind,
            name: name.to_string(),
            created,
        });
        log::debug!(
            "{} {kind} {id}",
            if created { "Created" } else { "Updated" }
        );

        Ok(ResourceHandle::new(id))
    }

    async fn get(&self, handle: &ResourceHandle) -> CloudResult<ResourceState> {
        let state = self.lock();
        state
            .resources
            .get(&key(handle.id()))
            .map(|stored| with_live_counts(&state, &stored.state))
            .ok_or_else(|| CloudError::NotFound(handle.id().to_string()))
    }

    fn list<'a>(&'a self, parent: &'a ResourceHandle, kind: ResourceKind) -> ResourceStream<'a> {
        stream::once(async move { self.children(parent, kind) })
            .map_ok(|items| stream::iter(items.into_iter().map(Ok)))
            .try_flatten()
            .boxed()
    }

    async fn delete(&self, handle: &ResourceHandle) -> CloudResult<()> {
        let mut state = self.lock();
        let name = handle.name().to_string();

        if state.faults.fail_delete.contains(&name.to_ascii_lowercase()) {
            log::debug!("Injected delete failure for {} '{name}'", handle.kind());
            return Err(CloudError::arm(
                format!("delete {} {name}", handle.kind()),
                "InternalServerError",
                500,
                "Injected delete failure",
            ));
        }

        let resource_key = key(handle.id());
        let prefix = format!("{resource_key}/");
        let existed = state.resources.remove(&resource_key).is_some();
        state.resources.retain(|k, _| !k.starts_with(&prefix));

        state.operations.push(CloudOperation::Delete {
            kind: handle.kind(),
            name,
            existed,
        });
        Ok(())
    }

    async fn get_secrets(&self, handle: &ResourceHandle) -> CloudResult<AccessKeys> {
        if !handle.kind().is_authorization_rule() {
            return Err(CloudError::InvalidRequest(format!(
                "Keys are only available for authorization rules, not for a {}",
                handle.kind()
            )));
        }
        let state = self.lock();
        state
            .resources
            .get(&key(handle.id()))
            .and_then(|stored| stored.keys.clone())
            .ok_or_else(|| CloudError::NotFound(handle.id().to_string()))
    }

    fn subscription_id(&self) -> &str {
        &self.subscription_id
    }
}

fn key(id: &ResourceId) -> String {
    id.to_string().to_ascii_lowercase()
}

fn materialize(
    id: &ResourceId,
    config: &ResourceConfig,
    previous: Option<&ResourceState>,
) -> ResourceState {
    let now = Utc::now();
    let previous_runtime = match previous {
        Some(ResourceState::Topic(t)) => Some(t.runtime.clone()),
        Some(ResourceState::Subscription(s)) => Some(s.runtime.clone()),
        _ => None,
    };
    let runtime = || {
        let mut runtime = previous_runtime.clone().unwrap_or_else(|| EntityRuntime {
            status: Some("Active".to_string()),
            created_at: Some(now),
            accessed_at: Some(now),
            message_count: Some(0),
            size_in_bytes: Some(0),
            ..Default::default()
        });
        runtime.updated_at = Some(now);
        runtime
    };

    match config {
        ResourceConfig::ResourceGroup(cfg) => ResourceState::ResourceGroup(ResourceGroupState {
            id: id.clone(),
            config: cfg.clone(),
            provisioning_state: Some("Succeeded".to_string()),
        }),
        ResourceConfig::Namespace(cfg) => {
            let created_at = match previous {
                Some(ResourceState::Namespace(ns)) => ns.created_at,
                _ => Some(now),
            };
            ResourceState::Namespace(NamespaceState {
                id: id.clone(),
                config: cfg.clone(),
                provisioning_state: Some("Succeeded".to_string()),
                status: Some("Active".to_string()),
                created_at,
                updated_at: Some(now),
                service_bus_endpoint: Some(format!(
                    "https://{}.servicebus.windows.net:443/",
                    id.name()
                )),
            })
        }
        ResourceConfig::Topic(cfg) => ResourceState::Topic(TopicState {
            id: id.clone(),
            config: cfg.clone(),
            runtime: runtime(),
        }),
        ResourceConfig::Subscription(cfg) => ResourceState::Subscription(SubscriptionState {
            id: id.clone(),
            config: cfg.clone(),
            runtime: runtime(),
        }),
        ResourceConfig::NamespaceAuthorizationRule(cfg)
        | ResourceConfig::TopicAuthorizationRule(cfg) => {
            ResourceState::AuthorizationRule(AuthorizationRuleState {
                id: id.clone(),
                rights: cfg.rights.clone(),
            })
        }
    }
}

fn with_live_counts(state: &MemoryState, resource: &ResourceState) -> ResourceState {
    let mut resource = resource.clone();
    if let ResourceState::Topic(topic) = &mut resource {
        let topic_key = key(&topic.id);
        let count = state
            .resources
            .values()
            .filter(|stored| stored.state.kind() == ResourceKind::Subscription)
            .filter(|stored| {
                stored
                    .state
                    .id()
                    .parent()
                    .is_some_and(|p| key(&p) == topic_key)
            })
            .count();
        topic.runtime.subscription_count = Some(count as u32);
    }
    resource
}

fn generate_keys(rule_id: &ResourceId) -> AccessKeys {
    let primary_key = random_key();
    let secondary_key = random_key();
    let namespace = rule_id.namespace_name().unwrap_or_default();
    let entity_path = rule_id
        .topic_name()
        .map(|topic| format!(";EntityPath={topic}"))
        .unwrap_or_default();
    let connection_string = |key: &str| {
        format!(
            "Endpoint=sb://{namespace}.servicebus.windows.net/;SharedAccessKeyName={};SharedAccessKey={key}{entity_path}",
            rule_id.name()
        )
    };

    AccessKeys {
        key_name: rule_id.name().to_string(),
        primary_connection_string: connection_string(&primary_key),
        secondary_connection_string: connection_string(&secondary_key),
        primary_key,
        secondary_key,
    }
}

fn random_key() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(44)
        .map(char::from)
        .collect()
}
