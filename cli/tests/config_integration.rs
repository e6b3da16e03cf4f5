use busforge::config::{self, ConfigLoadError, ConfigValidationError};
use claims::{assert_err, assert_ok};
use server::cloud::SkuTier;
use server::orchestrator::RollbackStrategy;
use std::io::Write;
use std::time::Duration;
use tempfile::NamedTempFile;

// Helper module for configuration file testing
mod config_helpers {
    use super::*;

    pub fn config_file(content: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .expect("Failed to create temp config file");
        file.write_all(content.as_bytes())
            .expect("Failed to write temp config file");
        file
    }
}

use config_helpers::*;

mod loading {
    use super::*;

    #[test]
    fn test_full_configuration_is_read() {
        let file = config_file(
            r#"
[azure]
tenant_id = "tenant"
client_id = "client"
client_secret = "secret"
subscription_id = "subscription"

[provisioning]
region = "northeurope"
sku = "premium"
operation_timeout_secs = 120
poll_interval_ms = 500
requests_per_second = 5
rollback_strategy = "resource_group_only"
keep_resources = true

[logging]
level = "debug"
file = "busforge.log"
"#,
        );

        let config = assert_ok!(config::load_file(file.path()));

        assert_eq!(config.azure().tenant_id.as_deref(), Some("tenant"));
        assert_eq!(config.azure().subscription_id.as_deref(), Some("subscription"));
        let p = config.provisioning();
        assert_eq!(p.region(), "northeurope");
        assert_eq!(p.sku(), SkuTier::Premium);
        assert_eq!(p.operation_timeout(), Duration::from_secs(120));
        assert_eq!(p.poll_interval(), Duration::from_millis(500));
        assert_eq!(p.requests_per_second(), 5);
        assert_eq!(p.rollback_strategy(), RollbackStrategy::ResourceGroupOnly);
        assert!(p.keep_resources());
        assert_eq!(config.logging().level(), "debug");
        assert_eq!(config.logging().file(), Some("busforge.log"));
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let file = config_file("");

        let config = assert_ok!(config::load_file(file.path()));

        let p = config.provisioning();
        assert_eq!(p.region(), "westus");
        assert_eq!(p.sku(), SkuTier::Standard);
        assert_eq!(p.operation_timeout(), Duration::from_secs(600));
        assert_eq!(p.rollback_strategy(), RollbackStrategy::ReverseOrder);
        assert!(!p.keep_resources());
        assert_eq!(config.logging().level(), "info");
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let missing = dir.path().join("nope.toml");

        let err = assert_err!(config::load(Some(missing.as_path())));
        assert!(matches!(err, ConfigLoadError::Load(_)));
    }
}

mod validation {
    use super::*;

    #[test]
    fn test_out_of_range_values_are_all_reported() {
        let file = config_file(
            r#"
[provisioning]
region = " "
sku = "gold"
operation_timeout_secs = 1
requests_per_second = 500
rollback_strategy = "sideways"
"#,
        );

        let err = assert_err!(config::load_file(file.path()));
        let ConfigLoadError::Invalid(errors) = &err else {
            panic!("expected validation errors, got {err:?}");
        };
        assert_eq!(errors.len(), 5);
        assert!(errors.iter().any(|e| matches!(e, ConfigValidationError::Region)));
        assert!(errors.iter().any(|e| matches!(
            e,
            ConfigValidationError::OperationTimeout { configured: 1, .. }
        )));
        assert!(err.to_string().contains("provisioning.rollback_strategy"));
    }

    #[test]
    fn test_user_message_names_the_setting() {
        let error = ConfigValidationError::PollInterval {
            configured: 5,
            min_limit: 100,
            max_limit: 60_000,
        };
        let message = error.user_message();
        assert!(message.contains("Your configured value: 5 ms"));
        assert!(message.contains("provisioning.poll_interval_ms"));
    }
}
