use super::errors::ProvisionError;
use super::graph::ResourceGraph;
use super::registry::CreatedResources;
use super::rollback::{RollbackManager, RollbackReport, RollbackStrategy};
use crate::cloud::{CloudResourceApi, ResourceHandle, ResourceSpec};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone)]
pub struct ExecutorOptions {
    /// Limit for a single create, including waiting for it to settle
    pub operation_timeout: Duration,
    pub rollback_strategy: RollbackStrategy,
}

impl Default for ExecutorOptions {
    fn default() -> Self {
        Self {
            operation_timeout: Duration::from_secs(600),
            rollback_strategy: RollbackStrategy::default(),
        }
    }
}

/// Result of [`LifecycleExecutor::run`].
#[derive(Debug)]
pub struct OrchestrationOutcome {
    /// What is still alive: everything on success, nothing after a rollback
    pub created: CreatedResources,
    pub error: Option<ProvisionError>,
    pub rollback: Option<RollbackReport>,
}

impl OrchestrationOutcome {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Creates the resources of a graph one at a time, in dependency order.
pub struct LifecycleExecutor {
    api: Arc<dyn CloudResourceApi>,
    options: ExecutorOptions,
    cancel: CancellationToken,
}

impl LifecycleExecutor {
    pub fn new(api: Arc<dyn CloudResourceApi>, options: ExecutorOptions) -> Self {
        Self {
            api,
            options,
            cancel: CancellationToken::new(),
        }
    }

    /// Stop at the next opportunity once `cancel` fires.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Token that interrupts this executor; later steps of the same run
    /// should stop on it too.
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Rollback manager sharing this executor's API, strategy and timeout.
    pub fn rollback_manager(&self) -> RollbackManager {
        RollbackManager::new(self.api.clone())
            .with_strategy(self.options.rollback_strategy)
            .with_operation_timeout(self.options.operation_timeout)
    }

    /// Creates every spec of `graph`, appending each handle to `registry` as
    /// soon as it exists. Stops at the first failure; later specs are not
    /// attempted.
    pub async fn provision(
        &self,
        graph: &ResourceGraph,
        registry: &mut CreatedResources,
    ) -> Result<(), ProvisionError> {
        log::info!("Provisioning {} resource(s)", graph.len());
        for spec in graph.topological_order() {
            let handle = self.provision_one(spec, registry).await?;
            registry.record(spec.name(), handle);
        }
        Ok(())
    }

    async fn provision_one(
        &self,
        spec: &ResourceSpec,
        registry: &CreatedResources,
    ) -> Result<ResourceHandle, ProvisionError> {
        let name = spec.name();
        let kind = spec.kind();

        let parent = match spec.parent() {
            Some(parent) => Some(registry.handle(parent).cloned().ok_or_else(|| {
                ProvisionError::MissingParent {
                    name: name.to_string(),
                    parent: parent.to_string(),
                }
            })?),
            None => None,
        };

        if self.cancel.is_cancelled() {
            return Err(ProvisionError::Cancelled {
                name: name.to_string(),
            });
        }

        log::info!("Creating {kind} '{name}'");
        let create = self.api.create_or_update(parent.as_ref(), name, spec.config());
        let outcome = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                return Err(ProvisionError::Cancelled { name: name.to_string() });
            }
            outcome = tokio::time::timeout(self.options.operation_timeout, create) => outcome,
        };

        match outcome {
            Ok(Ok(handle)) => {
                log::info!("Created {kind} '{name}'");
                log::debug!("{handle}");
                Ok(handle)
            }
            Ok(Err(source)) => Err(ProvisionError::Api {
                name: name.to_string(),
                kind,
                source,
            }),
            Err(_) => Err(ProvisionError::Timeout {
                name: name.to_string(),
                kind,
                after: self.options.operation_timeout,
            }),
        }
    }

    /// Provisions `graph` and rolls back everything it created if any step
    /// fails.
    pub async fn run(&self, graph: &ResourceGraph) -> OrchestrationOutcome {
        let mut created = CreatedResources::new();
        match self.provision(graph, &mut created).await {
            Ok(()) => OrchestrationOutcome {
                created,
                error: None,
                rollback: None,
            },
            Err(error) => {
                log::error!("{error}");
                let report = self.rollback_manager().rollback(&mut created).await;
                OrchestrationOutcome {
                    created,
                    error: Some(error),
                    rollback: Some(report),
                }
            }
        }
    }
}
