use clap::Parser;
use server::orchestrator::RollbackStrategy;
use std::path::PathBuf;

/// Provision a Service Bus namespace with topics, subscriptions and
/// authorization rules, walk through updating them, then tear everything down.
#[derive(Debug, Clone, Default, Parser)]
#[command(name = "busforge", version, about, long_about = None)]
pub struct Args {
    /// Configuration file, instead of ./config.toml or ~/.config/busforge/config.toml
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Run against an in-memory cloud instead of Azure
    #[arg(long)]
    pub simulate: bool,

    /// Make creating this resource fail (a role such as `subscription2`, or a name)
    #[arg(long, value_name = "RESOURCE", requires = "simulate")]
    pub fail_at: Option<String>,

    /// Azure region for the resource group and namespace
    #[arg(long)]
    pub region: Option<String>,

    /// Keep the resources after a successful run
    #[arg(long)]
    pub keep: bool,

    /// trace, debug, info, warn or error
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// reverse_order or resource_group_only
    #[arg(long, value_name = "STRATEGY")]
    pub rollback_strategy: Option<RollbackStrategy>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use claims::{assert_err, assert_ok};

    #[test]
    fn parses_simulated_failure() {
        let args = assert_ok!(Args::try_parse_from([
            "busforge",
            "--simulate",
            "--fail-at",
            "subscription2",
            "--rollback-strategy",
            "resource-group-only",
        ]));
        assert!(args.simulate);
        assert_eq!(args.fail_at.as_deref(), Some("subscription2"));
        assert_eq!(
            args.rollback_strategy,
            Some(RollbackStrategy::ResourceGroupOnly)
        );
    }

    #[test]
    fn fail_at_requires_simulate() {
        assert_err!(Args::try_parse_from(["busforge", "--fail-at", "topic1"]));
    }

    #[test]
    fn unknown_strategy_is_rejected() {
        assert_err!(Args::try_parse_from([
            "busforge",
            "--rollback-strategy",
            "sideways"
        ]));
    }
}
