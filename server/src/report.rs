//! Human readable dumps of resource state.
//!
//! Plain functions from state to text; nothing here talks to the control
//! plane. Each block starts with a header line carrying the resource id,
//! followed by one tab-indented `Field: value` line per property.

use crate::cloud::{
    AccessKeys, AuthorizationRuleState, NamespaceState, ResourceKind, ResourceState,
    SubscriptionState, TopicState,
};
use chrono::{DateTime, Utc};
use std::fmt::{Display, Write};
use std::time::Duration;

struct Block {
    out: String,
}

impl Block {
    fn new(title: &str, id: impl Display) -> Self {
        Self {
            out: format!("{title}: {id}"),
        }
    }

    fn field(mut self, name: &str, value: impl Display) -> Self {
        let _ = write!(self.out, "\n\t{name}: {value}");
        self
    }

    fn nested(mut self, name: &str, value: impl Display) -> Self {
        let _ = write!(self.out, "\n\t\t{name}: {value}");
        self
    }

    fn finish(self) -> String {
        self.out
    }
}

pub fn format_namespace(ns: &NamespaceState) -> String {
    Block::new("Service bus Namespace", &ns.id)
        .field("Name", ns.id.name())
        .field("Region", &ns.config.location)
        .field("ResourceGroupName", ns.id.resource_group_name())
        .field("CreatedAt", timestamp(ns.created_at))
        .field("UpdatedAt", timestamp(ns.updated_at))
        .field("DnsLabel", ns.dns_label())
        .field("FQDN", ns.fqdn().unwrap_or_default())
        .field("Sku", "")
        .nested(
            "Capacity",
            ns.config.sku.capacity.map(|c| c.to_string()).unwrap_or_default(),
        )
        .nested("SkuName", ns.config.sku.tier)
        .nested("Tier", ns.config.sku.tier)
        .finish()
}

pub fn format_topic(topic: &TopicState) -> String {
    let config = &topic.config;
    let runtime = &topic.runtime;
    Block::new("Service bus topic", &topic.id)
        .field("Name", topic.id.name())
        .field("ResourceGroupName", topic.id.resource_group_name())
        .field("CreatedAt", timestamp(runtime.created_at))
        .field("UpdatedAt", timestamp(runtime.updated_at))
        .field("AccessedAt", timestamp(runtime.accessed_at))
        .field("ActiveMessageCount", runtime.counts.active)
        .field("CurrentSizeInBytes", runtime.size_in_bytes.unwrap_or_default())
        .field("DeadLetterMessageCount", runtime.counts.dead_letter)
        .field(
            "DefaultMessageTtlDuration",
            timespan(config.default_message_time_to_live),
        )
        .field(
            "DuplicateMessageDetectionHistoryDuration",
            timespan(config.duplicate_detection_history_time_window),
        )
        .field("IsBatchedOperationsEnabled", config.enable_batched_operations)
        .field("IsDuplicateDetectionEnabled", config.requires_duplicate_detection)
        .field("IsExpressEnabled", config.enable_express)
        .field("IsPartitioningEnabled", config.enable_partitioning)
        .field(
            "DeleteOnIdleDurationInMinutes",
            whole_minutes(config.auto_delete_on_idle),
        )
        .field(
            "MaxSizeInMB",
            config.max_size_in_megabytes.unwrap_or_default(),
        )
        .field("ScheduledMessageCount", runtime.counts.scheduled)
        .field("Status", runtime.status.as_deref().unwrap_or_default())
        .field("TransferMessageCount", runtime.counts.transfer)
        .field(
            "SubscriptionCount",
            runtime.subscription_count.unwrap_or_default(),
        )
        .field(
            "TransferDeadLetterMessageCount",
            runtime.counts.transfer_dead_letter,
        )
        .finish()
}

pub fn format_subscription(subscription: &SubscriptionState) -> String {
    let config = &subscription.config;
    let runtime = &subscription.runtime;
    Block::new("Service bus subscription", &subscription.id)
        .field("Name", subscription.id.name())
        .field("ResourceGroupName", subscription.id.resource_group_name())
        .field("CreatedAt", timestamp(runtime.created_at))
        .field("UpdatedAt", timestamp(runtime.updated_at))
        .field("AccessedAt", timestamp(runtime.accessed_at))
        .field("ActiveMessageCount", runtime.counts.active)
        .field("DeadLetterMessageCount", runtime.counts.dead_letter)
        .field(
            "DefaultMessageTtlDuration",
            timespan(config.default_message_time_to_live),
        )
        .field("IsBatchedOperationsEnabled", config.enable_batched_operations)
        .field(
            "DeleteOnIdleDurationInMinutes",
            whole_minutes(config.auto_delete_on_idle),
        )
        .field("ScheduledMessageCount", runtime.counts.scheduled)
        .field("Status", runtime.status.as_deref().unwrap_or_default())
        .field(
            "IsDeadLetteringEnabledForExpiredMessages",
            config.dead_lettering_on_message_expiration,
        )
        .field("IsSessionEnabled", config.requires_session)
        .field(
            "LockDurationInSeconds",
            config.lock_duration.map(|d| d.as_secs()).unwrap_or_default(),
        )
        .field(
            "MaxDeliveryCountBeforeDeadLetteringMessage",
            config.max_delivery_count.unwrap_or_default(),
        )
        .field(
            "IsDeadLetteringEnabledForFilterEvaluationFailedMessages",
            config.dead_lettering_on_filter_evaluation_exceptions,
        )
        .field("TransferMessageCount", runtime.counts.transfer)
        .field(
            "TransferDeadLetterMessageCount",
            runtime.counts.transfer_dead_letter,
        )
        .finish()
}

/// Works for topic and namespace rules; the header names the owner kind.
pub fn format_authorization_rule(rule: &AuthorizationRuleState) -> String {
    let title = match rule.id.kind() {
        ResourceKind::TopicAuthorizationRule => "Service bus topic authorization rule",
        _ => "Service bus namespace authorization rule",
    };
    let mut block = Block::new(title, &rule.id)
        .field("Name", rule.id.name())
        .field("ResourceGroupName", rule.id.resource_group_name())
        .field("Namespace Name", rule.id.namespace_name().unwrap_or_default());
    if let Some(topic) = rule.id.topic_name() {
        block = block.field("Topic Name", topic);
    }
    block = block.field("Number of access rights", rule.rights.len());
    for right in rule.rights.iter() {
        block = block.nested("AccessRight", right);
    }
    block.finish()
}

pub fn format_keys(keys: &AccessKeys) -> String {
    Block::new("Authorization keys", &keys.key_name)
        .field("PrimaryKey", &keys.primary_key)
        .field("PrimaryConnectionString", &keys.primary_connection_string)
        .field("SecondaryKey", &keys.secondary_key)
        .field("SecondaryConnectionString", &keys.secondary_connection_string)
        .finish()
}

/// Dispatches on the state kind. Resource groups get a short summary.
pub fn format_state(state: &ResourceState) -> String {
    match state {
        ResourceState::ResourceGroup(rg) => Block::new("Resource group", &rg.id)
            .field("Name", rg.id.name())
            .field("Region", &rg.config.location)
            .field(
                "ProvisioningState",
                rg.provisioning_state.as_deref().unwrap_or_default(),
            )
            .finish(),
        ResourceState::Namespace(ns) => format_namespace(ns),
        ResourceState::Topic(topic) => format_topic(topic),
        ResourceState::Subscription(sub) => format_subscription(sub),
        ResourceState::AuthorizationRule(rule) => format_authorization_rule(rule),
    }
}

fn timestamp(value: Option<DateTime<Utc>>) -> String {
    value
        .map(|ts| ts.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_default()
}

/// `[d.]hh:mm:ss[.fffffff]`, the way .NET prints a TimeSpan, which is what
/// the portal and the Service Bus explorer show.
pub fn timespan(value: Option<Duration>) -> String {
    let Some(duration) = value else {
        return String::new();
    };
    let total = duration.as_secs();
    let days = total / 86_400;
    let hours = (total % 86_400) / 3_600;
    let minutes = (total % 3_600) / 60;
    let seconds = total % 60;
    // TimeSpan resolution is 100ns ticks
    let ticks = duration.subsec_nanos() / 100;

    let mut out = String::new();
    if days > 0 {
        let _ = write!(out, "{days}.");
    }
    let _ = write!(out, "{hours:02}:{minutes:02}:{seconds:02}");
    if ticks > 0 {
        let _ = write!(out, ".{ticks:07}");
    }
    out
}

fn whole_minutes(value: Option<Duration>) -> u64 {
    value.map(|d| d.as_secs() / 60).unwrap_or_default()
}
