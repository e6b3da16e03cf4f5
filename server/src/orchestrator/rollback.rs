use super::errors::RollbackError;
use super::registry::{CreatedResource, CreatedResources};
use crate::cloud::{CloudError, CloudResourceApi, ResourceKind};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

/// Which handles a rollback deletes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RollbackStrategy {
    /// Every recorded handle, newest first
    #[default]
    ReverseOrder,
    /// Only resource groups created by the run; deleting a group removes its
    /// contents. Behaves like `ReverseOrder` when the run created no group.
    ResourceGroupOnly,
}

impl fmt::Display for RollbackStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RollbackStrategy::ReverseOrder => f.write_str("reverse_order"),
            RollbackStrategy::ResourceGroupOnly => f.write_str("resource_group_only"),
        }
    }
}

impl FromStr for RollbackStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "reverse_order" | "reverse" => Ok(RollbackStrategy::ReverseOrder),
            "resource_group_only" | "resource_group" => Ok(RollbackStrategy::ResourceGroupOnly),
            other => Err(format!("Unknown rollback strategy: {other}")),
        }
    }
}

/// Outcome of one rollback pass.
#[derive(Debug, Default)]
pub struct RollbackReport {
    /// Names in the order their delete was issued
    pub attempted: Vec<String>,
    pub deleted: Vec<String>,
    pub errors: Vec<RollbackError>,
}

impl RollbackReport {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Tears down what a run created, newest first, without ever failing.
#[derive(Clone)]
pub struct RollbackManager {
    api: Arc<dyn CloudResourceApi>,
    strategy: RollbackStrategy,
    operation_timeout: Option<Duration>,
}

impl RollbackManager {
    pub fn new(api: Arc<dyn CloudResourceApi>) -> Self {
        Self {
            api,
            strategy: RollbackStrategy::default(),
            operation_timeout: None,
        }
    }

    pub fn with_strategy(mut self, strategy: RollbackStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Bound each delete; a delete that runs over is reported as failed.
    pub fn with_operation_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout = Some(timeout);
        self
    }

    /// Deletes the registry's resources and leaves it empty.
    pub async fn rollback(&self, registry: &mut CreatedResources) -> RollbackReport {
        let mut report = RollbackReport::default();
        if registry.is_empty() {
            log::info!("Nothing was created, no clean up is necessary");
            return report;
        }

        let entries = registry.drain_newest_first();
        let targets = self.select(entries);
        log::info!(
            "Rolling back {} resource(s) using {} strategy",
            targets.len(),
            self.strategy
        );

        for entry in targets {
            report.attempted.push(entry.name.clone());
            match self.delete(&entry).await {
                Ok(()) => {
                    log::info!("Deleted {} '{}'", entry.handle.kind(), entry.name);
                    report.deleted.push(entry.name);
                }
                Err(source) => {
                    let error = RollbackError {
                        name: entry.name,
                        kind: entry.handle.kind(),
                        source,
                    };
                    log::error!("{error}");
                    report.errors.push(error);
                }
            }
        }

        if report.is_clean() {
            log::info!("Rollback finished, {} resource(s) deleted", report.deleted.len());
        } else {
            log::warn!(
                "Rollback finished with {} failure(s); some resources may need manual clean up",
                report.errors.len()
            );
        }
        report
    }

    fn select(&self, newest_first: Vec<CreatedResource>) -> Vec<CreatedResource> {
        match self.strategy {
            RollbackStrategy::ReverseOrder => newest_first,
            RollbackStrategy::ResourceGroupOnly => {
                let groups: Vec<_> = newest_first
                    .iter()
                    .filter(|entry| entry.handle.kind() == ResourceKind::ResourceGroup)
                    .cloned()
                    .collect();
                if groups.is_empty() {
                    log::debug!("No resource group was created by this run, deleting one by one");
                    newest_first
                } else {
                    groups
                }
            }
        }
    }

    async fn delete(&self, entry: &CreatedResource) -> Result<(), CloudError> {
        let delete = self.api.delete(&entry.handle);
        let result = match self.operation_timeout {
            Some(limit) => match tokio::time::timeout(limit, delete).await {
                Ok(result) => result,
                Err(_) => Err(CloudError::Timeout {
                    operation: format!("delete {} {}", entry.handle.kind(), entry.name),
                    after: limit,
                }),
            },
            None => delete.await,
        };
        match result {
            Err(e) if e.is_not_found() => Ok(()),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strategy_parses_config_spellings() {
        assert_eq!(
            "resource-group-only".parse::<RollbackStrategy>(),
            Ok(RollbackStrategy::ResourceGroupOnly)
        );
        assert_eq!(
            "Reverse_Order".parse::<RollbackStrategy>(),
            Ok(RollbackStrategy::ReverseOrder)
        );
        assert!("everything".parse::<RollbackStrategy>().is_err());
    }
}
