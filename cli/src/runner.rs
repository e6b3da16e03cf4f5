use crate::args::Args;
use crate::config::AppConfig;
use crate::error::AppResult;
use server::arm::{ArmClientOptions, ArmCloudApi};
use server::auth::Credentials;
use server::cloud::{CloudResourceApi, InMemoryCloud};
use server::orchestrator::{ExecutorOptions, LifecycleExecutor};
use server::scenario::{ScenarioNames, ScenarioOutcome, ScenarioSettings, run_scenario};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

const SIMULATED_SUBSCRIPTION: &str = "00000000-0000-0000-0000-000000000000";

/// Effective settings of one run: configuration overridden by arguments.
#[derive(Debug, Clone)]
pub struct RunPlan {
    pub simulate: bool,
    pub fail_at: Option<String>,
    pub scenario: ScenarioSettings,
    pub executor: ExecutorOptions,
    pub arm: ArmClientOptions,
}

impl RunPlan {
    pub fn new(config: &AppConfig, args: &Args) -> Self {
        let provisioning = config.provisioning();
        let operation_timeout = provisioning.operation_timeout();

        Self {
            simulate: args.simulate,
            fail_at: args.fail_at.clone(),
            scenario: ScenarioSettings {
                region: args
                    .region
                    .clone()
                    .unwrap_or_else(|| provisioning.region().to_string()),
                sku: provisioning.sku(),
                keep_resources: args.keep || provisioning.keep_resources(),
            },
            executor: ExecutorOptions {
                operation_timeout,
                rollback_strategy: args
                    .rollback_strategy
                    .unwrap_or_else(|| provisioning.rollback_strategy()),
            },
            arm: ArmClientOptions {
                poll_interval: provisioning.poll_interval(),
                max_wait: operation_timeout,
                requests_per_second: provisioning.requests_per_second(),
            },
        }
    }
}

/// Builds the cloud API for `plan`. Simulated runs never touch credentials;
/// real runs acquire a token first so bad credentials stop the run before
/// anything is created.
pub async fn cloud_api(
    config: &AppConfig,
    plan: &RunPlan,
    names: &ScenarioNames,
) -> AppResult<Arc<dyn CloudResourceApi>> {
    if plan.simulate {
        let cloud = InMemoryCloud::new(SIMULATED_SUBSCRIPTION);
        if let Some(target) = &plan.fail_at {
            let name = names.by_role(target).unwrap_or(target.as_str());
            log::info!("Simulating a failure when creating '{name}'");
            cloud.fail_create(name);
        }
        return Ok(Arc::new(cloud));
    }

    let credentials = Credentials::resolve(config.azure())?;
    log::info!(
        "Using subscription {} at {}",
        credentials.subscription_id,
        credentials.management_endpoint
    );
    let api = ArmCloudApi::from_credentials(&credentials, plan.arm.clone());
    api.verify().await?;
    Ok(Arc::new(api))
}

/// Runs the walkthrough, printing its report lines to stdout.
pub async fn run(
    config: &AppConfig,
    args: &Args,
    cancel: CancellationToken,
) -> AppResult<ScenarioOutcome> {
    let plan = RunPlan::new(config, args);
    let names = ScenarioNames::random();
    let api = cloud_api(config, &plan, &names).await?;

    log::info!(
        "Starting run in {} with {} rollback",
        plan.scenario.region,
        plan.executor.rollback_strategy
    );
    let executor =
        LifecycleExecutor::new(api.clone(), plan.executor.clone()).with_cancellation(cancel);
    let mut print = |line: String| println!("{line}");
    let outcome = run_scenario(api, &executor, &names, &plan.scenario, &mut print).await;

    summarize(&outcome);
    Ok(outcome)
}

fn summarize(outcome: &ScenarioOutcome) {
    if let Some(teardown) = &outcome.teardown {
        for error in &teardown.errors {
            log::error!("{error}");
        }
        if !teardown.is_clean() {
            log::warn!(
                "{} resource(s) could not be deleted and may need manual clean up",
                teardown.errors.len()
            );
        }
    }
    if !outcome.kept.is_empty() {
        for resource in outcome.kept.iter() {
            log::info!("Kept {}", resource.handle);
        }
    }
}
