use claims::{assert_err, assert_ok};
use futures::TryStreamExt;
use server::cloud::{
    AccessRights, CloudOperation, CloudResourceApi, InMemoryCloud, NamespaceConfig,
    ResourceConfig, ResourceGroupConfig, ResourceKind, ResourceSpec, ResourceState, SkuTier,
    SubscriptionConfig, TopicConfig,
};
use server::orchestrator::{
    ConfigDelta, ConfigurationUpdater, CreatedResources, ExecutorOptions, LifecycleExecutor,
    ProvisionError, ResourceGraph, ResourceUpdate, RollbackManager, RollbackStrategy,
    SubscriptionDelta, TopicDelta, UpdateError,
};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

// Helper module for orchestration testing
mod orchestration_helpers {
    use super::*;

    pub fn cloud() -> Arc<InMemoryCloud> {
        Arc::new(InMemoryCloud::new("test-subscription"))
    }

    pub fn executor(cloud: &Arc<InMemoryCloud>) -> LifecycleExecutor {
        LifecycleExecutor::new(cloud.clone(), ExecutorOptions::default())
    }

    /// rg -> ns1 -> t1 -> {s1, s2}
    pub fn topology() -> ResourceGraph {
        ResourceGraph::builder()
            .add(ResourceSpec::resource_group(
                "rg",
                ResourceGroupConfig::new("westus"),
            ))
            .add(
                ResourceSpec::namespace("ns1", NamespaceConfig::new("westus", SkuTier::Standard))
                    .under("rg"),
            )
            .add(ResourceSpec::topic("t1", TopicConfig::default().with_max_size_mb(1024)).under("ns1"))
            .add(
                ResourceSpec::subscription(
                    "s1",
                    SubscriptionConfig::default()
                        .with_session()
                        .with_default_message_ttl(Duration::from_secs(20 * 60))
                        .with_max_delivery_count(20)
                        .with_dead_letter_on_expiration()
                        .with_dead_letter_on_filter_exceptions(),
                )
                .under("t1"),
            )
            .add(ResourceSpec::subscription("s2", SubscriptionConfig::default()).under("t1"))
            .build()
            .expect("valid topology")
    }

    pub fn created_names(cloud: &InMemoryCloud) -> Vec<String> {
        cloud
            .operations()
            .into_iter()
            .filter_map(|op| match op {
                CloudOperation::CreateOrUpdate { name, .. } => Some(name),
                CloudOperation::Delete { .. } => None,
            })
            .collect()
    }

    pub fn deleted_names(cloud: &InMemoryCloud) -> Vec<String> {
        cloud
            .operations()
            .into_iter()
            .filter_map(|op| match op {
                CloudOperation::Delete { name, .. } => Some(name),
                CloudOperation::CreateOrUpdate { .. } => None,
            })
            .collect()
    }
}

use orchestration_helpers::*;

// Integration tests for provisioning order and success paths
mod provisioning {
    use super::*;

    #[tokio::test]
    async fn test_parents_are_created_before_children() {
        let cloud = cloud();
        // Declared children first; the graph still creates parents first
        let graph = assert_ok!(
            ResourceGraph::builder()
                .add(ResourceSpec::subscription("s1", SubscriptionConfig::default()).under("t1"))
                .add(ResourceSpec::topic("t1", TopicConfig::default()).under("ns1"))
                .add(
                    ResourceSpec::namespace(
                        "ns1",
                        NamespaceConfig::new("westus", SkuTier::Standard)
                    )
                    .under("rg")
                )
                .add(ResourceSpec::resource_group(
                    "rg",
                    ResourceGroupConfig::new("westus")
                ))
                .build()
        );

        let outcome = executor(&cloud).run(&graph).await;

        assert!(outcome.is_success());
        assert_eq!(outcome.created.names(), vec!["rg", "ns1", "t1", "s1"]);
        assert_eq!(created_names(&cloud), vec!["rg", "ns1", "t1", "s1"]);
    }

    #[tokio::test]
    async fn test_subscription_values_are_applied() {
        let cloud = cloud();
        let outcome = executor(&cloud).run(&topology()).await;
        assert!(outcome.is_success());

        let handle = outcome.created.handle("s1").cloned().expect("s1 created");
        let state = assert_ok!(cloud.get(&handle).await);
        let ResourceState::Subscription(s1) = state else {
            panic!("expected a subscription, got {state:?}");
        };
        assert!(s1.config.requires_session);
        assert_eq!(
            s1.config.default_message_time_to_live,
            Some(Duration::from_secs(1200))
        );
        assert_eq!(s1.config.max_delivery_count, Some(20));
        assert!(s1.config.dead_lettering_on_message_expiration);
        assert!(s1.config.dead_lettering_on_filter_evaluation_exceptions);
    }

    #[tokio::test]
    async fn test_existing_resource_is_updated_in_place() {
        let cloud = cloud();
        let graph = topology();
        assert!(executor(&cloud).run(&graph).await.is_success());
        let count = cloud.resource_count();

        // Same graph again: every create becomes an update
        assert!(executor(&cloud).run(&graph).await.is_success());
        assert_eq!(cloud.resource_count(), count);
        let recreated = cloud.operations().into_iter().skip(graph.len()).any(|op| {
            matches!(op, CloudOperation::CreateOrUpdate { created: true, .. })
        });
        assert!(!recreated);
    }
}

// Integration tests for failure handling and rollback
mod rollback {
    use super::*;

    #[tokio::test]
    async fn test_failed_create_rolls_back_newest_first() {
        let cloud = cloud();
        cloud.fail_create("s1");

        let outcome = executor(&cloud).run(&topology()).await;

        let error = outcome.error.as_ref().expect("provisioning must fail");
        assert!(matches!(error, ProvisionError::Api { .. }));
        assert_eq!(error.resource_name(), "s1");

        let report = outcome.rollback.as_ref().expect("rollback must run");
        assert!(report.is_clean());
        assert_eq!(report.attempted, vec!["t1", "ns1", "rg"]);
        assert_eq!(deleted_names(&cloud), vec!["t1", "ns1", "rg"]);
        assert!(outcome.created.is_empty());
        assert_eq!(cloud.resource_count(), 0);
    }

    #[tokio::test]
    async fn test_failure_at_first_step_has_nothing_to_clean() {
        let cloud = cloud();
        cloud.fail_create("rg");

        let outcome = executor(&cloud).run(&topology()).await;

        assert!(!outcome.is_success());
        let report = outcome.rollback.expect("rollback report");
        assert!(report.attempted.is_empty());
        assert!(deleted_names(&cloud).is_empty());
    }

    #[tokio::test]
    async fn test_failed_delete_is_reported_and_rollback_continues() {
        let cloud = cloud();
        cloud.fail_create("s2");
        cloud.fail_delete("t1");

        let outcome = executor(&cloud).run(&topology()).await;

        let report = outcome.rollback.expect("rollback report");
        assert!(!report.is_clean());
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].name, "t1");
        assert_eq!(report.errors[0].kind, ResourceKind::Topic);
        assert_eq!(report.attempted, vec!["s1", "t1", "ns1", "rg"]);
        assert_eq!(report.deleted, vec!["s1", "ns1", "rg"]);
    }

    #[tokio::test]
    async fn test_resource_group_only_strategy_deletes_just_the_group() {
        let cloud = cloud();
        cloud.fail_create("s2");
        let executor = LifecycleExecutor::new(
            cloud.clone(),
            ExecutorOptions {
                rollback_strategy: RollbackStrategy::ResourceGroupOnly,
                ..Default::default()
            },
        );

        let outcome = executor.run(&topology()).await;

        let report = outcome.rollback.expect("rollback report");
        assert_eq!(report.attempted, vec!["rg"]);
        assert_eq!(deleted_names(&cloud), vec!["rg"]);
        // The group delete cascades
        assert_eq!(cloud.resource_count(), 0);
    }

    #[tokio::test]
    async fn test_resource_group_only_without_group_falls_back_to_reverse_order() {
        let cloud = cloud();
        let rg = assert_ok!(
            cloud
                .create_or_update(
                    None,
                    "shared-rg",
                    &ResourceConfig::ResourceGroup(ResourceGroupConfig::new("westus"))
                )
                .await
        );
        let ns = assert_ok!(
            cloud
                .create_or_update(
                    Some(&rg),
                    "ns1",
                    &ResourceConfig::Namespace(NamespaceConfig::new("westus", SkuTier::Basic))
                )
                .await
        );
        let topic = assert_ok!(
            cloud
                .create_or_update(Some(&ns), "t1", &ResourceConfig::Topic(TopicConfig::default()))
                .await
        );

        let mut registry = CreatedResources::new();
        registry.record("ns1", ns);
        registry.record("t1", topic);

        let report = RollbackManager::new(cloud.clone())
            .with_strategy(RollbackStrategy::ResourceGroupOnly)
            .rollback(&mut registry)
            .await;

        assert_eq!(report.attempted, vec!["t1", "ns1"]);
        assert!(registry.is_empty());
        assert!(cloud.exists(rg.id()));
    }

    #[tokio::test]
    async fn test_rollback_twice_is_harmless() {
        let cloud = cloud();
        let outcome = executor(&cloud).run(&topology()).await;
        let mut registry = outcome.created;
        let mut copy = registry.clone();
        let manager = RollbackManager::new(cloud.clone());

        let first = manager.rollback(&mut registry).await;
        // Everything already gone; deletes of missing resources succeed
        let second = manager.rollback(&mut copy).await;

        assert!(first.is_clean());
        assert!(second.is_clean());
        assert_eq!(second.deleted.len(), 5);
        assert_eq!(cloud.resource_count(), 0);
    }
}

// Integration tests for timeouts and cancellation
mod interruption {
    use super::*;

    #[tokio::test]
    async fn test_slow_create_times_out_and_rolls_back() {
        let cloud = cloud();
        cloud.delay_create("t1", Duration::from_secs(5));
        let executor = LifecycleExecutor::new(
            cloud.clone(),
            ExecutorOptions {
                operation_timeout: Duration::from_millis(50),
                ..Default::default()
            },
        );

        let outcome = executor.run(&topology()).await;

        assert!(matches!(
            outcome.error,
            Some(ProvisionError::Timeout { ref name, .. }) if name == "t1"
        ));
        let report = outcome.rollback.expect("rollback report");
        assert_eq!(report.attempted, vec!["ns1", "rg"]);
    }

    #[tokio::test]
    async fn test_cancelled_run_stops_before_next_create() {
        let cloud = cloud();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let executor = executor(&cloud).with_cancellation(cancel);

        let outcome = executor.run(&topology()).await;

        assert!(matches!(
            outcome.error,
            Some(ProvisionError::Cancelled { ref name }) if name == "rg"
        ));
        assert!(created_names(&cloud).is_empty());
    }

    #[tokio::test]
    async fn test_cancellation_during_create_interrupts_it() {
        let cloud = cloud();
        cloud.delay_create("ns1", Duration::from_secs(5));
        let cancel = CancellationToken::new();
        let executor = executor(&cloud).with_cancellation(cancel.clone());

        let trigger = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            cancel.cancel();
        });
        let outcome = executor.run(&topology()).await;
        assert_ok!(trigger.await);

        assert!(matches!(
            outcome.error,
            Some(ProvisionError::Cancelled { ref name }) if name == "ns1"
        ));
        let report = outcome.rollback.expect("rollback report");
        assert_eq!(report.deleted, vec!["rg"]);
    }
}

// Integration tests for reconfiguring existing resources
mod updates {
    use super::*;

    async fn topic_rules(cloud: &InMemoryCloud, topic: &server::cloud::ResourceHandle) -> Vec<String> {
        let rules: Vec<ResourceState> = assert_ok!(
            cloud
                .list(topic, ResourceKind::TopicAuthorizationRule)
                .try_collect()
                .await
        );
        rules.iter().map(|rule| rule.name().to_string()).collect()
    }

    fn graph_with_rule() -> ResourceGraph {
        ResourceGraph::builder()
            .add(ResourceSpec::resource_group(
                "rg",
                ResourceGroupConfig::new("westus"),
            ))
            .add(
                ResourceSpec::namespace("ns1", NamespaceConfig::new("westus", SkuTier::Standard))
                    .under("rg"),
            )
            .add(ResourceSpec::topic("t2", TopicConfig::default().with_partitioning()).under("ns1"))
            .add(ResourceSpec::topic_rule("r1", AccessRights::send()).under("t2"))
            .build()
            .expect("valid graph")
    }

    #[tokio::test]
    async fn test_rule_swap_leaves_only_the_new_rule() {
        let cloud = cloud();
        let mut registry = executor(&cloud).run(&graph_with_rule()).await.created;
        let topic = registry.handle("t2").cloned().expect("t2 created");

        let update = ResourceUpdate::new(ConfigDelta::Topic(TopicDelta {
            auto_delete_on_idle: Some(Duration::from_secs(300)),
            ..Default::default()
        }))
        .remove_rule("r1")
        .add_rule("r2", AccessRights::manage());
        let outcome = assert_ok!(
            ConfigurationUpdater::new(cloud.clone())
                .apply(&topic, &update, &mut registry)
                .await
        );

        assert!(outcome.reconfigured);
        assert_eq!(outcome.removed_rules, vec!["r1"]);
        assert_eq!(topic_rules(&cloud, &topic).await, vec!["r2"]);
        assert!(registry.contains("t2/r2"));

        let ResourceState::Topic(state) = assert_ok!(cloud.get(&topic).await) else {
            panic!("expected a topic");
        };
        assert_eq!(state.config.auto_delete_on_idle, Some(Duration::from_secs(300)));
        // Untouched properties survive the update
        assert!(state.config.enable_partitioning);
    }

    #[tokio::test]
    async fn test_rule_removed_and_added_is_replaced() {
        let cloud = cloud();
        let mut registry = executor(&cloud).run(&graph_with_rule()).await.created;
        let topic = registry.handle("t2").cloned().expect("t2 created");

        let update = ResourceUpdate::rules_only()
            .remove_rule("r1")
            .add_rule("r1", AccessRights::manage());
        let outcome = assert_ok!(
            ConfigurationUpdater::new(cloud.clone())
                .apply(&topic, &update, &mut registry)
                .await
        );

        assert_eq!(outcome.removed_rules, vec!["r1"]);
        assert_eq!(outcome.added_rules.len(), 1);
        assert_eq!(topic_rules(&cloud, &topic).await, vec!["r1"]);

        let ResourceState::AuthorizationRule(rule) =
            assert_ok!(cloud.get(&outcome.added_rules[0]).await)
        else {
            panic!("expected an authorization rule");
        };
        assert_eq!(rule.rights, AccessRights::manage());
        assert_eq!(rule.rights.len(), 3);
    }

    #[tokio::test]
    async fn test_rules_only_update_skips_reconfiguration() {
        let cloud = cloud();
        let mut registry = executor(&cloud).run(&graph_with_rule()).await.created;
        let topic = registry.handle("t2").cloned().expect("t2 created");
        let writes_before = created_names(&cloud).len();

        let update = ResourceUpdate::rules_only().add_rule("listen", AccessRights::listen());
        let outcome = assert_ok!(
            ConfigurationUpdater::new(cloud.clone())
                .apply(&topic, &update, &mut registry)
                .await
        );

        assert!(!outcome.reconfigured);
        assert_eq!(created_names(&cloud).len(), writes_before + 1);
        assert_eq!(topic_rules(&cloud, &topic).await, vec!["listen", "r1"]);
    }

    #[tokio::test]
    async fn test_delta_for_other_kind_is_rejected() {
        let cloud = cloud();
        let mut registry = executor(&cloud).run(&graph_with_rule()).await.created;
        let topic = registry.handle("t2").cloned().expect("t2 created");

        let update = ResourceUpdate::new(ConfigDelta::Subscription(SubscriptionDelta {
            max_delivery_count: Some(3),
            ..Default::default()
        }));
        let err = assert_err!(
            ConfigurationUpdater::new(cloud.clone())
                .apply(&topic, &update, &mut registry)
                .await
        );
        assert!(matches!(err, UpdateError::KindMismatch { .. }));
    }

    #[tokio::test]
    async fn test_teardown_covers_rules_added_by_updates() {
        let cloud = cloud();
        let mut registry = executor(&cloud).run(&graph_with_rule()).await.created;
        let topic = registry.handle("t2").cloned().expect("t2 created");
        let update = ResourceUpdate::rules_only().add_rule("r2", AccessRights::send());
        assert_ok!(
            ConfigurationUpdater::new(cloud.clone())
                .apply(&topic, &update, &mut registry)
                .await
        );

        let report = RollbackManager::new(cloud.clone())
            .rollback(&mut registry)
            .await;

        assert_eq!(report.attempted.first().map(String::as_str), Some("t2/r2"));
        assert!(report.is_clean());
        assert_eq!(cloud.resource_count(), 0);
    }
}

// Property based tests for creation order
mod ordering_properties {
    use super::*;
    use proptest::prelude::*;

    /// A namespace with `topics` topics, each with the given number of
    /// subscriptions, declared in a shuffled order.
    fn shuffled_graph(subscriptions: &[usize], seed: &[usize]) -> ResourceGraph {
        let mut specs = vec![
            ResourceSpec::resource_group("rg", ResourceGroupConfig::new("westus")),
            ResourceSpec::namespace("ns", NamespaceConfig::new("westus", SkuTier::Standard))
                .under("rg"),
        ];
        for (t, count) in subscriptions.iter().enumerate() {
            let topic = format!("t{t}");
            specs.push(ResourceSpec::topic(&topic, TopicConfig::default()).under("ns"));
            for s in 0..*count {
                specs.push(
                    ResourceSpec::subscription(format!("t{t}s{s}"), SubscriptionConfig::default())
                        .under(&topic),
                );
            }
        }
        // Deterministic shuffle driven by the generated seed
        for (i, pick) in seed.iter().enumerate() {
            let len = specs.len();
            specs.swap(i % len, pick % len);
        }

        specs
            .into_iter()
            .fold(ResourceGraph::builder(), |builder, spec| builder.add(spec))
            .build()
            .expect("valid graph")
    }

    proptest! {
        #[test]
        fn test_every_parent_precedes_its_children(
            subscriptions in prop::collection::vec(0usize..4, 1..5),
            seed in prop::collection::vec(0usize..64, 0..20),
        ) {
            let graph = shuffled_graph(&subscriptions, &seed);
            let order: Vec<&str> = graph.topological_order().map(|spec| spec.name()).collect();
            prop_assert_eq!(order.len(), graph.len());

            for (position, spec) in graph.topological_order().enumerate() {
                if let Some(parent) = spec.parent() {
                    let parent_position = order.iter().position(|name| *name == parent);
                    prop_assert!(parent_position.is_some_and(|p| p < position));
                }
            }
        }

        #[test]
        fn test_rollback_deletes_in_reverse_creation_order(
            subscriptions in prop::collection::vec(0usize..3, 1..4),
        ) {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_time()
                .build()
                .expect("runtime");
            let (attempted, created, remaining) = runtime.block_on(async {
                let cloud = cloud();
                let graph = shuffled_graph(&subscriptions, &[]);
                let mut registry = executor(&cloud).run(&graph).await.created;
                let created: Vec<String> = registry.names().into_iter().map(str::to_string).collect();

                let report = RollbackManager::new(cloud.clone()).rollback(&mut registry).await;
                (report.attempted, created, cloud.resource_count())
            });

            let expected: Vec<String> = created.into_iter().rev().collect();
            prop_assert_eq!(attempted, expected);
            prop_assert_eq!(remaining, 0);
        }
    }
}
