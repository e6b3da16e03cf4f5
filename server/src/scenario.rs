//! Publish/subscribe walkthrough.
//!
//! Provisions a namespace with two topics, three subscriptions and a send
//! rule, prints everything, reworks the second topic's rules, reads the
//! namespace keys, deletes a topic and the namespace, and finally tears down
//! whatever the run created.

use crate::cloud::{
    AccessRights, CloudError, CloudResourceApi, NamespaceConfig, ResourceGroupConfig,
    ResourceHandle, ResourceKind, ResourceSpec, ResourceState, SkuTier, SubscriptionConfig,
    TopicConfig,
};
use crate::orchestrator::{
    ConfigDelta, ConfigurationUpdater, CreatedResources, GraphError, LifecycleExecutor,
    ProvisionError, ResourceGraph, ResourceUpdate, RollbackReport, TopicDelta, UpdateError,
};
use crate::report;
use crate::utils::random_resource_name;
use futures::TryStreamExt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

pub const SEND_RULE: &str = "SendRule";
pub const MANAGE_RULE: &str = "ManageRule";

/// Role names accepted wherever a scenario resource is picked by role.
pub const ROLES: [&str; 8] = [
    "resource-group",
    "namespace",
    "topic1",
    "subscription1",
    "subscription2",
    "topic2",
    "send-rule",
    "subscription3",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioNames {
    pub resource_group: String,
    pub namespace: String,
    pub topic1: String,
    pub topic2: String,
    pub subscription1: String,
    pub subscription2: String,
    pub subscription3: String,
    pub send_rule: String,
    pub manage_rule: String,
}

impl ScenarioNames {
    /// Fresh names, so concurrent runs in one subscription do not collide.
    pub fn random() -> Self {
        Self {
            resource_group: random_resource_name("rgSB04_", 24),
            namespace: random_resource_name("namespace", 20),
            topic1: random_resource_name("topic1_", 24),
            topic2: random_resource_name("topic2_", 24),
            subscription1: random_resource_name("subs_", 24),
            subscription2: random_resource_name("subs_", 24),
            subscription3: random_resource_name("subs_", 24),
            send_rule: SEND_RULE.to_string(),
            manage_rule: MANAGE_RULE.to_string(),
        }
    }

    /// Actual name of the resource playing `role` (see [`ROLES`]).
    pub fn by_role(&self, role: &str) -> Option<&str> {
        let name = match role.to_ascii_lowercase().as_str() {
            "resource-group" | "resource_group" | "rg" => &self.resource_group,
            "namespace" | "ns" => &self.namespace,
            "topic1" => &self.topic1,
            "topic2" => &self.topic2,
            "subscription1" => &self.subscription1,
            "subscription2" => &self.subscription2,
            "subscription3" => &self.subscription3,
            "send-rule" | "send_rule" => &self.send_rule,
            _ => return None,
        };
        Some(name)
    }
}

#[derive(Debug, Clone)]
pub struct ScenarioSettings {
    pub region: String,
    pub sku: SkuTier,
    /// Leave the resources in place after a successful walkthrough
    pub keep_resources: bool,
}

impl Default for ScenarioSettings {
    fn default() -> Self {
        Self {
            region: "westus".to_string(),
            sku: SkuTier::Standard,
            keep_resources: false,
        }
    }
}

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Provision(#[from] ProvisionError),

    #[error(transparent)]
    Update(#[from] UpdateError),

    #[error("Failed to {step}: {source}")]
    Cloud {
        step: String,
        #[source]
        source: CloudError,
    },

    #[error("Resource '{0}' was not created by this run")]
    NotCreated(String),

    #[error("Interrupted before {0}")]
    Cancelled(String),
}

#[derive(Debug)]
pub struct ScenarioOutcome {
    pub error: Option<ScenarioError>,
    /// Report of the final clean up, `None` when resources were kept
    pub teardown: Option<RollbackReport>,
    /// Resources left in place
    pub kept: CreatedResources,
}

impl ScenarioOutcome {
    pub fn is_success(&self) -> bool {
        self.error.is_none() && self.teardown.as_ref().is_none_or(RollbackReport::is_clean)
    }
}

/// The resources of the walkthrough, in creation order.
pub fn build_graph(
    names: &ScenarioNames,
    settings: &ScenarioSettings,
) -> Result<ResourceGraph, GraphError> {
    let twenty_minutes = Duration::from_secs(20 * 60);

    ResourceGraph::builder()
        .add(ResourceSpec::resource_group(
            &names.resource_group,
            ResourceGroupConfig::new(&settings.region),
        ))
        .add(
            ResourceSpec::namespace(
                &names.namespace,
                NamespaceConfig::new(&settings.region, settings.sku),
            )
            .under(&names.resource_group),
        )
        .add(
            ResourceSpec::topic(&names.topic1, TopicConfig::default().with_max_size_mb(1024))
                .under(&names.namespace),
        )
        .add(
            ResourceSpec::subscription(
                &names.subscription1,
                SubscriptionConfig::default()
                    .with_session()
                    .with_default_message_ttl(twenty_minutes)
                    .with_max_delivery_count(20)
                    .with_dead_letter_on_expiration()
                    .with_dead_letter_on_filter_exceptions(),
            )
            .under(&names.topic1),
        )
        .add(
            ResourceSpec::subscription(
                &names.subscription2,
                SubscriptionConfig::default()
                    .with_session()
                    .with_auto_delete_on_idle(twenty_minutes),
            )
            .under(&names.topic1),
        )
        .add(
            ResourceSpec::topic(&names.topic2, TopicConfig::default().with_partitioning())
                .under(&names.namespace),
        )
        .add(ResourceSpec::topic_rule(&names.send_rule, AccessRights::send()).under(&names.topic2))
        .add(
            ResourceSpec::subscription(&names.subscription3, SubscriptionConfig::default())
                .under(&names.topic2),
        )
        .build()
}

/// Runs the whole walkthrough. Text meant for the user goes to `out`;
/// progress and errors go to the log.
pub async fn run_scenario(
    api: Arc<dyn CloudResourceApi>,
    executor: &LifecycleExecutor,
    names: &ScenarioNames,
    settings: &ScenarioSettings,
    out: &mut (dyn FnMut(String) + Send),
) -> ScenarioOutcome {
    let mut created = CreatedResources::new();

    let result = match build_graph(names, settings) {
        Ok(graph) => {
            out(format!(
                "Creating name space {} in resource group {}...",
                names.namespace, names.resource_group
            ));
            match executor.provision(&graph, &mut created).await {
                Ok(()) => {
                    let cancel = executor.cancellation().clone();
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => {
                            Err(ScenarioError::Cancelled("the walkthrough finished".to_string()))
                        }
                        result = walkthrough(&api, &mut created, names, &cancel, out) => result,
                    }
                }
                Err(e) => Err(e.into()),
            }
        }
        Err(e) => Err(e.into()),
    };

    if let Err(e) = &result {
        log::error!("{e}");
    }

    let teardown = if result.is_ok() && settings.keep_resources {
        out(format!(
            "Keeping {} resource(s) in resource group {}",
            created.len(),
            names.resource_group
        ));
        None
    } else {
        if created.has_provisioned_anything() {
            out(format!("Deleting Resource Group: {}", names.resource_group));
        } else {
            out("Did not create any resources in Azure. No clean up is necessary".to_string());
        }
        Some(executor.rollback_manager().rollback(&mut created).await)
    };

    ScenarioOutcome {
        error: result.err(),
        teardown,
        kept: created,
    }
}

async fn walkthrough(
    shared: &Arc<dyn CloudResourceApi>,
    created: &mut CreatedResources,
    names: &ScenarioNames,
    cancel: &CancellationToken,
    out: &mut (dyn FnMut(String) + Send),
) -> Result<(), ScenarioError> {
    let namespace = handle(created, &names.namespace)?;
    let topic1 = handle(created, &names.topic1)?;
    let topic2 = handle(created, &names.topic2)?;

    out(format!("Created service bus {}", names.namespace));
    let api = shared.as_ref();
    out(describe(api, &namespace).await?);
    out(format!(
        "Created topic following topic along with namespace {}",
        names.namespace
    ));
    out(describe(api, &topic1).await?);

    for subscription in [&names.subscription1, &names.subscription2] {
        out(format!(
            "Created subscription {subscription} in topic {}",
            names.topic1
        ));
        out(describe(api, &handle(created, subscription)?).await?);
    }

    out("Created second topic in namespace".to_string());
    out(describe(api, &topic2).await?);
    out("Creating following authorization rules in second topic".to_string());
    for rule in list(api, &topic2, ResourceKind::TopicAuthorizationRule).await? {
        out(report::format_state(&rule));
    }

    checkpoint(cancel, "updating the second topic")?;
    out(format!("Updating second topic {}...", names.topic2));
    let update = ResourceUpdate::new(ConfigDelta::Topic(TopicDelta {
        auto_delete_on_idle: Some(Duration::from_secs(5 * 60)),
        ..Default::default()
    }))
    .remove_rule(&names.send_rule)
    .add_rule(&names.manage_rule, AccessRights::manage());
    ConfigurationUpdater::new(shared.clone())
        .apply(&topic2, &update, created)
        .await?;
    out("Updated second topic to change its auto deletion time".to_string());
    out(describe(api, &topic2).await?);
    out(
        "Updated following authorization rules in second topic, new list of authorization rules are"
            .to_string(),
    );
    for rule in list(api, &topic2, ResourceKind::TopicAuthorizationRule).await? {
        out(report::format_state(&rule));
    }

    checkpoint(cancel, "reading namespace keys")?;
    let namespace_rules =
        list(api, &namespace, ResourceKind::NamespaceAuthorizationRule).await?;
    out(format!(
        "Number of authorization rule for namespace: {}",
        namespace_rules.len()
    ));
    for rule in &namespace_rules {
        out(report::format_state(rule));
    }
    match namespace_rules.first() {
        Some(rule) => {
            out("Getting keys for authorization rule ...".to_string());
            let keys = api
                .get_secrets(&rule.handle())
                .await
                .map_err(|source| ScenarioError::Cloud {
                    step: format!("get keys of {}", rule.name()),
                    source,
                })?;
            out(report::format_keys(&keys));
        }
        None => log::warn!("Namespace {} has no authorization rules", names.namespace),
    }

    checkpoint(cancel, "deleting the first topic")?;
    out(format!(
        "Deleting topic {} in namespace {}...",
        names.topic1, names.namespace
    ));
    api.delete(&topic1)
        .await
        .map_err(|source| ScenarioError::Cloud {
            step: format!("delete topic {}", names.topic1),
            source,
        })?;
    out(format!("Deleted topic {}...", names.topic1));

    checkpoint(cancel, "deleting the namespace")?;
    out(format!("Deleting namespace {}...", names.namespace));
    // Deletes the topics inside as well; a failure here is left to teardown
    if let Err(e) = api.delete(&namespace).await {
        log::warn!("Deleting namespace {} failed: {e}", names.namespace);
    }
    out(format!("Deleted namespace {}...", names.namespace));
    Ok(())
}

/// Checked between steps too: a walkthrough that never yields is not
/// interrupted by the `select!` around it.
fn checkpoint(cancel: &CancellationToken, next: &str) -> Result<(), ScenarioError> {
    if cancel.is_cancelled() {
        log::warn!("Interrupted, skipping the rest of the walkthrough");
        return Err(ScenarioError::Cancelled(next.to_string()));
    }
    Ok(())
}

fn handle(created: &CreatedResources, name: &str) -> Result<ResourceHandle, ScenarioError> {
    created
        .handle(name)
        .cloned()
        .ok_or_else(|| ScenarioError::NotCreated(name.to_string()))
}

async fn describe(
    api: &dyn CloudResourceApi,
    handle: &ResourceHandle,
) -> Result<String, ScenarioError> {
    let state = api.get(handle).await.map_err(|source| ScenarioError::Cloud {
        step: format!("get {} {}", handle.kind(), handle.name()),
        source,
    })?;
    Ok(report::format_state(&state))
}

async fn list(
    api: &dyn CloudResourceApi,
    parent: &ResourceHandle,
    kind: ResourceKind,
) -> Result<Vec<ResourceState>, ScenarioError> {
    api.list(parent, kind)
        .try_collect()
        .await
        .map_err(|source| ScenarioError::Cloud {
            step: format!("list {kind} resources of {}", parent.name()),
            source,
        })
}
