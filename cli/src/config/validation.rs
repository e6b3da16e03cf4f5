/// Configuration validation errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid region: must not be empty")]
    Region,
    #[error("Invalid sku: {configured}")]
    Sku { configured: String },
    #[error("Invalid operation_timeout_secs: {configured} (min: {min_limit}, max: {max_limit})")]
    OperationTimeout {
        configured: u64,
        min_limit: u64,
        max_limit: u64,
    },
    #[error("Invalid poll_interval_ms: {configured} (min: {min_limit}, max: {max_limit})")]
    PollInterval {
        configured: u64,
        min_limit: u64,
        max_limit: u64,
    },
    #[error("Invalid requests_per_second: {configured} (limit: {limit})")]
    RequestsPerSecond { configured: u32, limit: u32 },
    #[error("Invalid rollback_strategy: {configured}")]
    RollbackStrategy { configured: String },
}

impl ConfigValidationError {
    pub fn user_message(&self) -> String {
        match self {
            ConfigValidationError::Region => "Region is empty!\n\n\
                Please set provisioning.region in config.toml, e.g. region = \"westus\"."
                .to_string(),
            ConfigValidationError::Sku { configured } => {
                format!(
                    "Unknown namespace SKU!\n\n\
                    Your configured value: {configured}\n\
                    Valid values: Basic, Standard, Premium\n\n\
                    Please update provisioning.sku in config.toml."
                )
            }
            ConfigValidationError::OperationTimeout {
                configured,
                min_limit,
                max_limit,
            } => {
                format!(
                    "Operation timeout out of range!\n\n\
                    Your configured value: {configured} seconds\n\
                    Valid range: {min_limit} - {max_limit} seconds\n\n\
                    Please update provisioning.operation_timeout_secs in config.toml."
                )
            }
            ConfigValidationError::PollInterval {
                configured,
                min_limit,
                max_limit,
            } => {
                format!(
                    "Poll interval out of range!\n\n\
                    Your configured value: {configured} ms\n\
                    Valid range: {min_limit} - {max_limit} ms\n\n\
                    Please update provisioning.poll_interval_ms in config.toml."
                )
            }
            ConfigValidationError::RequestsPerSecond { configured, limit } => {
                format!(
                    "Request rate out of range!\n\n\
                    Your configured value: {configured}\n\
                    Valid range: 1 - {limit}\n\n\
                    Please update provisioning.requests_per_second in config.toml."
                )
            }
            ConfigValidationError::RollbackStrategy { configured } => {
                format!(
                    "Unknown rollback strategy!\n\n\
                    Your configured value: {configured}\n\
                    Valid values: reverse_order, resource_group_only\n\n\
                    Please update provisioning.rollback_strategy in config.toml."
                )
            }
        }
    }
}
