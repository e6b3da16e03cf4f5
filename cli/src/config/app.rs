use super::LoggingConfig;
use super::limits::*;
use super::validation::ConfigValidationError;
use serde::Deserialize;
use server::auth::CredentialSettings;
use server::cloud::SkuTier;
use server::orchestrator::RollbackStrategy;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Deserialize, Default, Clone)]
pub struct AppConfig {
    #[serde(default)]
    azure: CredentialSettings,
    #[serde(default)]
    provisioning: ProvisioningConfig,
    #[serde(default)]
    logging: LoggingConfig,
}

/// `[provisioning]` section. Unset values fall back to the defaults below.
#[derive(Debug, Deserialize, Default, Clone)]
pub struct ProvisioningConfig {
    region: Option<String>,
    sku: Option<String>,
    operation_timeout_secs: Option<u64>,
    poll_interval_ms: Option<u64>,
    requests_per_second: Option<u32>,
    rollback_strategy: Option<String>,
    keep_resources: Option<bool>,
}

impl AppConfig {
    pub fn azure(&self) -> &CredentialSettings {
        &self.azure
    }

    pub fn provisioning(&self) -> &ProvisioningConfig {
        &self.provisioning
    }

    pub fn logging(&self) -> &LoggingConfig {
        &self.logging
    }

    /// Validate the configuration and return any errors found
    pub fn validate(&self) -> Result<(), Vec<ConfigValidationError>> {
        let mut errors = Vec::new();
        let p = &self.provisioning;

        if p.region().trim().is_empty() {
            errors.push(ConfigValidationError::Region);
        }

        if let Some(sku) = &p.sku {
            if sku.parse::<SkuTier>().is_err() {
                errors.push(ConfigValidationError::Sku {
                    configured: sku.clone(),
                });
            }
        }

        let timeout = p.operation_timeout().as_secs();
        if !(MIN_OPERATION_TIMEOUT_SECS..=MAX_OPERATION_TIMEOUT_SECS).contains(&timeout) {
            errors.push(ConfigValidationError::OperationTimeout {
                configured: timeout,
                min_limit: MIN_OPERATION_TIMEOUT_SECS,
                max_limit: MAX_OPERATION_TIMEOUT_SECS,
            });
        }

        let poll = p.poll_interval_ms.unwrap_or(DEFAULT_POLL_INTERVAL_MS);
        if !(MIN_POLL_INTERVAL_MS..=MAX_POLL_INTERVAL_MS).contains(&poll) {
            errors.push(ConfigValidationError::PollInterval {
                configured: poll,
                min_limit: MIN_POLL_INTERVAL_MS,
                max_limit: MAX_POLL_INTERVAL_MS,
            });
        }

        let rps = p.requests_per_second();
        if rps == 0 || rps > MAX_REQUESTS_PER_SECOND {
            errors.push(ConfigValidationError::RequestsPerSecond {
                configured: rps,
                limit: MAX_REQUESTS_PER_SECOND,
            });
        }

        if let Some(strategy) = &p.rollback_strategy {
            if strategy.parse::<RollbackStrategy>().is_err() {
                errors.push(ConfigValidationError::RollbackStrategy {
                    configured: strategy.clone(),
                });
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

const DEFAULT_REGION: &str = "westus";
const DEFAULT_OPERATION_TIMEOUT_SECS: u64 = 600;
const DEFAULT_POLL_INTERVAL_MS: u64 = 2000;
const DEFAULT_REQUESTS_PER_SECOND: u32 = 10;

impl ProvisioningConfig {
    pub fn region(&self) -> &str {
        self.region.as_deref().unwrap_or(DEFAULT_REGION)
    }

    pub fn sku(&self) -> SkuTier {
        self.sku
            .as_deref()
            .and_then(|sku| sku.parse().ok())
            .unwrap_or(SkuTier::Standard)
    }

    pub fn operation_timeout(&self) -> Duration {
        Duration::from_secs(
            self.operation_timeout_secs
                .unwrap_or(DEFAULT_OPERATION_TIMEOUT_SECS),
        )
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.unwrap_or(DEFAULT_POLL_INTERVAL_MS))
    }

    pub fn requests_per_second(&self) -> u32 {
        self.requests_per_second
            .unwrap_or(DEFAULT_REQUESTS_PER_SECOND)
    }

    pub fn rollback_strategy(&self) -> RollbackStrategy {
        self.rollback_strategy
            .as_deref()
            .and_then(|strategy| strategy.parse().ok())
            .unwrap_or_default()
    }

    pub fn keep_resources(&self) -> bool {
        self.keep_resources.unwrap_or(false)
    }
}
