use super::errors::UpdateError;
use super::registry::CreatedResources;
use crate::cloud::{
    AccessRights, CloudResourceApi, NamespaceConfig, NamespaceSku, ResourceConfig, ResourceHandle,
    ResourceKind, SubscriptionConfig, TopicConfig,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamespaceDelta {
    pub sku: Option<NamespaceSku>,
    pub tags: Option<BTreeMap<String, String>>,
}

impl NamespaceDelta {
    fn is_empty(&self) -> bool {
        self.sku.is_none() && self.tags.is_none()
    }

    fn apply(&self, config: &mut NamespaceConfig) {
        if let Some(sku) = &self.sku {
            config.sku = sku.clone();
        }
        if let Some(tags) = &self.tags {
            config.tags = tags.clone();
        }
    }
}

/// Topic properties to replace; `None` keeps the current value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TopicDelta {
    pub max_size_in_megabytes: Option<u32>,
    pub default_message_time_to_live: Option<Duration>,
    pub auto_delete_on_idle: Option<Duration>,
    pub requires_duplicate_detection: Option<bool>,
    pub duplicate_detection_history_time_window: Option<Duration>,
    pub enable_batched_operations: Option<bool>,
    pub enable_partitioning: Option<bool>,
    pub enable_express: Option<bool>,
    pub support_ordering: Option<bool>,
}

impl TopicDelta {
    fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    fn apply(&self, config: &mut TopicConfig) {
        replace(&mut config.max_size_in_megabytes, self.max_size_in_megabytes);
        replace(
            &mut config.default_message_time_to_live,
            self.default_message_time_to_live,
        );
        replace(&mut config.auto_delete_on_idle, self.auto_delete_on_idle);
        set(
            &mut config.requires_duplicate_detection,
            self.requires_duplicate_detection,
        );
        replace(
            &mut config.duplicate_detection_history_time_window,
            self.duplicate_detection_history_time_window,
        );
        set(
            &mut config.enable_batched_operations,
            self.enable_batched_operations,
        );
        set(&mut config.enable_partitioning, self.enable_partitioning);
        set(&mut config.enable_express, self.enable_express);
        set(&mut config.support_ordering, self.support_ordering);
    }
}

/// Subscription properties to replace; `None` keeps the current value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubscriptionDelta {
    pub requires_session: Option<bool>,
    pub default_message_time_to_live: Option<Duration>,
    pub lock_duration: Option<Duration>,
    pub max_delivery_count: Option<u32>,
    pub dead_lettering_on_message_expiration: Option<bool>,
    pub dead_lettering_on_filter_evaluation_exceptions: Option<bool>,
    pub auto_delete_on_idle: Option<Duration>,
    pub enable_batched_operations: Option<bool>,
}

impl SubscriptionDelta {
    fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    fn apply(&self, config: &mut SubscriptionConfig) {
        set(&mut config.requires_session, self.requires_session);
        replace(
            &mut config.default_message_time_to_live,
            self.default_message_time_to_live,
        );
        replace(&mut config.lock_duration, self.lock_duration);
        replace(&mut config.max_delivery_count, self.max_delivery_count);
        set(
            &mut config.dead_lettering_on_message_expiration,
            self.dead_lettering_on_message_expiration,
        );
        set(
            &mut config.dead_lettering_on_filter_evaluation_exceptions,
            self.dead_lettering_on_filter_evaluation_exceptions,
        );
        replace(&mut config.auto_delete_on_idle, self.auto_delete_on_idle);
        set(
            &mut config.enable_batched_operations,
            self.enable_batched_operations,
        );
    }
}

fn replace<T>(target: &mut Option<T>, value: Option<T>) {
    if value.is_some() {
        *target = value;
    }
}

fn set<T>(target: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *target = value;
    }
}

/// Partial property replacement for one resource kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ConfigDelta {
    /// Leave the resource's own properties alone
    #[default]
    None,
    Namespace(NamespaceDelta),
    Topic(TopicDelta),
    Subscription(SubscriptionDelta),
}

impl ConfigDelta {
    /// Kind the delta applies to; `None` fits any kind.
    pub fn kind(&self) -> Option<ResourceKind> {
        match self {
            ConfigDelta::None => None,
            ConfigDelta::Namespace(_) => Some(ResourceKind::Namespace),
            ConfigDelta::Topic(_) => Some(ResourceKind::Topic),
            ConfigDelta::Subscription(_) => Some(ResourceKind::Subscription),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            ConfigDelta::None => true,
            ConfigDelta::Namespace(d) => d.is_empty(),
            ConfigDelta::Topic(d) => d.is_empty(),
            ConfigDelta::Subscription(d) => d.is_empty(),
        }
    }

    /// Merges the delta into `config`. Mismatched kinds leave it unchanged.
    pub fn merge_into(&self, config: &mut ResourceConfig) {
        match (self, config) {
            (ConfigDelta::Namespace(d), ResourceConfig::Namespace(c)) => d.apply(c),
            (ConfigDelta::Topic(d), ResourceConfig::Topic(c)) => d.apply(c),
            (ConfigDelta::Subscription(d), ResourceConfig::Subscription(c)) => d.apply(c),
            _ => {}
        }
    }
}

/// Property changes plus authorization rule edits for one resource.
#[derive(Debug, Clone, Default)]
pub struct ResourceUpdate {
    pub delta: ConfigDelta,
    pub remove_rules: Vec<String>,
    pub add_rules: Vec<(String, AccessRights)>,
}

impl ResourceUpdate {
    pub fn new(delta: ConfigDelta) -> Self {
        Self {
            delta,
            ..Default::default()
        }
    }

    /// Update that only edits authorization rules.
    pub fn rules_only() -> Self {
        Self::default()
    }

    pub fn remove_rule(mut self, name: impl Into<String>) -> Self {
        self.remove_rules.push(name.into());
        self
    }

    pub fn add_rule(mut self, name: impl Into<String>, rights: AccessRights) -> Self {
        self.add_rules.push((name.into(), rights));
        self
    }
}

/// What an update changed.
#[derive(Debug, Clone)]
pub struct UpdateOutcome {
    pub handle: ResourceHandle,
    pub reconfigured: bool,
    pub removed_rules: Vec<String>,
    pub added_rules: Vec<ResourceHandle>,
}

/// Applies [`ResourceUpdate`]s to existing resources.
#[derive(Clone)]
pub struct ConfigurationUpdater {
    api: Arc<dyn CloudResourceApi>,
}

impl ConfigurationUpdater {
    pub fn new(api: Arc<dyn CloudResourceApi>) -> Self {
        Self { api }
    }

    /// Applies `update` to the resource behind `handle`.
    ///
    /// Steps run in this order: merge and write the properties (skipped for
    /// an empty delta), delete the removed rules, create the added rules. A
    /// rule named in both lists ends up recreated with the new rights. Added
    /// rules are recorded in `registry` under `<resource>/<rule>` so the
    /// run's teardown covers them.
    pub async fn apply(
        &self,
        handle: &ResourceHandle,
        update: &ResourceUpdate,
        registry: &mut CreatedResources,
    ) -> Result<UpdateOutcome, UpdateError> {
        let name = handle.name().to_string();

        if let Some(expected) = update.delta.kind() {
            if expected != handle.kind() {
                return Err(UpdateError::KindMismatch {
                    name,
                    expected,
                    actual: handle.kind(),
                });
            }
        }

        let edits_rules = !update.remove_rules.is_empty() || !update.add_rules.is_empty();
        let rule_kind = handle.kind().rule_kind();
        if edits_rules && rule_kind.is_none() {
            return Err(UpdateError::RulesNotSupported {
                name,
                kind: handle.kind(),
            });
        }

        let reconfigured = !update.delta.is_empty();
        if reconfigured {
            let current = self.api.get(handle).await.map_err(|source| UpdateError::Fetch {
                name: name.clone(),
                source,
            })?;
            let mut config = current.config();
            update.delta.merge_into(&mut config);

            log::info!("Updating {} '{name}'", handle.kind());
            self.api
                .create_or_update(handle.parent().as_ref(), &name, &config)
                .await
                .map_err(|source| UpdateError::Apply {
                    name: name.clone(),
                    source,
                })?;
        }

        let mut removed_rules = Vec::with_capacity(update.remove_rules.len());
        let mut added_rules = Vec::with_capacity(update.add_rules.len());

        if let Some(rule_kind) = rule_kind {
            for rule in &update.remove_rules {
                let rule_id = handle.id().child(rule_kind, rule).map_err(|source| {
                    UpdateError::RemoveRule {
                        name: name.clone(),
                        rule: rule.clone(),
                        source,
                    }
                })?;
                log::info!("Removing authorization rule '{rule}' from '{name}'");
                self.api
                    .delete(&ResourceHandle::new(rule_id))
                    .await
                    .map_err(|source| UpdateError::RemoveRule {
                        name: name.clone(),
                        rule: rule.clone(),
                        source,
                    })?;
                removed_rules.push(rule.clone());
            }

            for (rule, rights) in &update.add_rules {
                let Some(config) = ResourceConfig::authorization_rule(rule_kind, rights.clone())
                else {
                    continue;
                };
                log::info!(
                    "Adding authorization rule '{rule}' ({}) to '{name}'",
                    rights_list(rights)
                );
                let rule_handle = self
                    .api
                    .create_or_update(Some(handle), rule, &config)
                    .await
                    .map_err(|source| UpdateError::AddRule {
                        name: name.clone(),
                        rule: rule.clone(),
                        source,
                    })?;
                registry.record(format!("{name}/{rule}"), rule_handle.clone());
                added_rules.push(rule_handle);
            }
        }

        Ok(UpdateOutcome {
            handle: handle.clone(),
            reconfigured,
            removed_rules,
            added_rules,
        })
    }
}

fn rights_list(rights: &AccessRights) -> String {
    rights
        .iter()
        .map(|right| right.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn topic_delta_only_touches_given_fields() {
        let mut config = ResourceConfig::Topic(TopicConfig::default().with_max_size_mb(1024));
        let delta = ConfigDelta::Topic(TopicDelta {
            auto_delete_on_idle: Some(Duration::from_secs(300)),
            ..Default::default()
        });
        delta.merge_into(&mut config);

        let ResourceConfig::Topic(topic) = config else {
            panic!("expected topic config");
        };
        assert_eq!(topic.max_size_in_megabytes, Some(1024));
        assert_eq!(topic.auto_delete_on_idle, Some(Duration::from_secs(300)));
    }

    #[test]
    fn empty_deltas_are_detected() {
        assert!(ConfigDelta::None.is_empty());
        assert!(ConfigDelta::Topic(TopicDelta::default()).is_empty());
        assert!(
            !ConfigDelta::Subscription(SubscriptionDelta {
                max_delivery_count: Some(5),
                ..Default::default()
            })
            .is_empty()
        );
    }
}
