use server::cloud::{InMemoryCloud, ResourceId};
use server::orchestrator::{ExecutorOptions, LifecycleExecutor, ProvisionError};
use server::scenario::{ScenarioError, ScenarioNames, ScenarioSettings, run_scenario};
use std::sync::Arc;

// Helper module for walkthrough testing
mod scenario_helpers {
    use super::*;

    pub struct Run {
        pub cloud: Arc<InMemoryCloud>,
        pub names: ScenarioNames,
        pub lines: Vec<String>,
        pub outcome: server::scenario::ScenarioOutcome,
    }

    pub async fn run(settings: ScenarioSettings, fail_at: Option<&str>) -> Run {
        let cloud = Arc::new(InMemoryCloud::new("test-subscription"));
        let names = ScenarioNames::random();
        if let Some(role) = fail_at {
            cloud.fail_create(names.by_role(role).expect("known role"));
        }
        let executor = LifecycleExecutor::new(cloud.clone(), ExecutorOptions::default());

        let mut lines = Vec::new();
        let mut sink = |line: String| lines.push(line);
        let outcome = run_scenario(cloud.clone(), &executor, &names, &settings, &mut sink).await;

        Run {
            cloud,
            names,
            lines,
            outcome,
        }
    }

    pub fn position(lines: &[String], needle: &str) -> usize {
        lines
            .iter()
            .position(|line| line.contains(needle))
            .unwrap_or_else(|| panic!("no line contains {needle:?}"))
    }
}

use scenario_helpers::*;

mod walkthrough {
    use super::*;

    #[tokio::test]
    async fn test_full_walkthrough_succeeds_and_cleans_up() {
        let run = run(ScenarioSettings::default(), None).await;

        assert!(run.outcome.error.is_none(), "{:?}", run.outcome.error);
        assert!(run.outcome.is_success());
        let teardown = run.outcome.teardown.as_ref().expect("teardown ran");
        assert!(teardown.is_clean());
        assert!(teardown.attempted.iter().any(|name| name.ends_with("/ManageRule")));
        assert!(run.outcome.kept.is_empty());
        assert_eq!(run.cloud.resource_count(), 0);
    }

    #[tokio::test]
    async fn test_walkthrough_prints_each_stage() {
        let run = run(ScenarioSettings::default(), None).await;
        let lines = &run.lines;

        let namespace = position(lines, "Service bus Namespace: ");
        let topic = position(lines, "Service bus topic: ");
        let subscription = position(lines, "Service bus subscription: ");
        let update = position(lines, "Updated second topic");
        let rule_count = position(lines, "Number of authorization rule for namespace: 1");
        let keys = position(lines, "Authorization keys: RootManageSharedAccessKey");
        assert!(namespace < topic && topic < subscription && subscription < update);
        assert!(update < rule_count && rule_count < keys);

        // After the update only the manage rule is left on the second topic
        let new_rules = position(lines, "new list of authorization rules");
        let rule_block = &lines[new_rules + 1];
        assert!(rule_block.contains("Name: ManageRule"));
        assert!(rule_block.contains("Number of access rights: 3"));
        assert!(!lines[new_rules + 1..rule_count].iter().any(|l| l.contains("Name: SendRule")));

        let s1 = lines
            .iter()
            .find(|line| line.contains(&format!("Name: {}", run.names.subscription1)))
            .expect("first subscription printed");
        assert!(s1.contains("IsSessionEnabled: true"));
        assert!(s1.contains("DefaultMessageTtlDuration: 00:20:00"));
        assert!(s1.contains("MaxDeliveryCountBeforeDeadLetteringMessage: 20"));
    }

    #[tokio::test]
    async fn test_keep_leaves_resource_group_in_place() {
        let settings = ScenarioSettings {
            keep_resources: true,
            ..Default::default()
        };
        let run = run(settings, None).await;

        assert!(run.outcome.is_success());
        assert!(run.outcome.teardown.is_none());
        assert!(!run.outcome.kept.is_empty());
        let rg = ResourceId::resource_group("test-subscription", &run.names.resource_group);
        assert!(run.cloud.exists(&rg));
    }
}

mod failures {
    use super::*;

    #[tokio::test]
    async fn test_failed_provisioning_rolls_back_created_resources() {
        let settings = ScenarioSettings {
            keep_resources: true,
            ..Default::default()
        };
        let run = run(settings, Some("subscription2")).await;

        assert!(matches!(
            run.outcome.error,
            Some(ScenarioError::Provision(ProvisionError::Api { ref name, .. }))
                if *name == run.names.subscription2
        ));
        let teardown = run.outcome.teardown.as_ref().expect("rollback despite keep");
        assert_eq!(
            teardown.attempted,
            vec![
                run.names.subscription1.clone(),
                run.names.topic1.clone(),
                run.names.namespace.clone(),
                run.names.resource_group.clone(),
            ]
        );
        assert_eq!(run.cloud.resource_count(), 0);
    }

    #[tokio::test]
    async fn test_failure_before_anything_exists_reports_no_clean_up() {
        let run = run(ScenarioSettings::default(), Some("resource-group")).await;

        assert!(!run.outcome.is_success());
        assert!(
            run.lines
                .iter()
                .any(|line| line == "Did not create any resources in Azure. No clean up is necessary")
        );
    }

    #[test]
    fn test_unknown_role_is_rejected() {
        let names = ScenarioNames::random();
        assert_eq!(names.by_role("queue"), None);
        assert_eq!(names.by_role("Topic2"), Some(names.topic2.as_str()));
    }
}

mod interruption {
    use super::*;
    use server::cloud::{CloudOperation, ResourceKind};
    use tokio_util::sync::CancellationToken;

    #[tokio::test]
    async fn test_interrupt_after_provisioning_skips_to_teardown() {
        let cloud = Arc::new(InMemoryCloud::new("test-subscription"));
        let names = ScenarioNames::random();
        let cancel = CancellationToken::new();
        let executor = LifecycleExecutor::new(cloud.clone(), ExecutorOptions::default())
            .with_cancellation(cancel.clone());

        let mut lines = Vec::new();
        let mut sink = |line: String| {
            if line.starts_with("Created second topic") {
                cancel.cancel();
            }
            lines.push(line);
        };
        let outcome = run_scenario(
            cloud.clone(),
            &executor,
            &names,
            &ScenarioSettings::default(),
            &mut sink,
        )
        .await;

        assert!(matches!(outcome.error, Some(ScenarioError::Cancelled(_))));
        assert!(!lines.iter().any(|line| line.starts_with("Updating second topic")));
        assert!(lines.iter().any(|line| line.starts_with("Deleting Resource Group")));

        let operations = cloud.operations();
        let manage_rule_created = operations.iter().any(|op| {
            matches!(
                op,
                CloudOperation::CreateOrUpdate {
                    kind: ResourceKind::TopicAuthorizationRule,
                    name,
                    ..
                } if *name == names.manage_rule
            )
        });
        assert!(!manage_rule_created);
        let topic2_writes = operations
            .iter()
            .filter(|op| {
                matches!(op, CloudOperation::CreateOrUpdate { name, .. } if *name == names.topic2)
            })
            .count();
        assert_eq!(topic2_writes, 1);

        let teardown = outcome.teardown.expect("teardown ran");
        assert!(teardown.is_clean());
        assert!(outcome.kept.is_empty());
        assert_eq!(cloud.resource_count(), 0);
    }

    #[tokio::test]
    async fn test_interrupt_with_keep_still_tears_down() {
        let cloud = Arc::new(InMemoryCloud::new("test-subscription"));
        let names = ScenarioNames::random();
        let cancel = CancellationToken::new();
        let executor = LifecycleExecutor::new(cloud.clone(), ExecutorOptions::default())
            .with_cancellation(cancel.clone());
        let settings = ScenarioSettings {
            keep_resources: true,
            ..Default::default()
        };

        let mut sink = |line: String| {
            if line.starts_with("Number of authorization rule") {
                cancel.cancel();
            }
        };
        let outcome = run_scenario(cloud.clone(), &executor, &names, &settings, &mut sink).await;

        assert!(matches!(outcome.error, Some(ScenarioError::Cancelled(_))));
        assert!(outcome.teardown.is_some());
        assert_eq!(cloud.resource_count(), 0);
    }
}
