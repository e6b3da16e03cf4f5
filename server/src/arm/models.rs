//! Wire shapes of the Resource Manager REST API and their mapping onto the
//! crate's resource model.

use super::duration::option_iso8601;
use crate::cloud::{
    AccessKeys, AccessRights, AuthorizationRuleState, CloudError, CloudResult, EntityRuntime,
    MessageCounts, NamespaceConfig, NamespaceSku, NamespaceState, ResourceConfig,
    ResourceGroupConfig, ResourceGroupState, ResourceId, ResourceKind, ResourceState, SkuTier,
    SubscriptionConfig, SubscriptionState, TopicConfig, TopicState,
};
use chrono::{DateTime, Datelike, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

#[derive(Debug, Deserialize)]
pub(crate) struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    pub value: Vec<T>,
    #[serde(rename = "nextLink")]
    pub next_link: Option<String>,
}

/// Envelope shared by every tracked and proxy resource.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct ArmResource<P> {
    #[serde(default, skip_serializing)]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<ArmSku>,
    #[serde(default)]
    pub properties: P,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct ArmSku {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ProvisioningProperties {
    #[serde(default, skip_serializing)]
    pub provisioning_state: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct NamespaceProperties {
    #[serde(default, skip_serializing)]
    pub provisioning_state: Option<String>,
    #[serde(default, skip_serializing)]
    pub status: Option<String>,
    #[serde(default, skip_serializing)]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing)]
    pub updated_at: Option<String>,
    #[serde(default, skip_serializing)]
    pub service_bus_endpoint: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CountDetails {
    #[serde(default)]
    pub active_message_count: i64,
    #[serde(default)]
    pub dead_letter_message_count: i64,
    #[serde(default)]
    pub scheduled_message_count: i64,
    #[serde(default)]
    pub transfer_message_count: i64,
    #[serde(default)]
    pub transfer_dead_letter_message_count: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TopicProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_size_in_megabytes: Option<u32>,
    #[serde(default, with = "option_iso8601", skip_serializing_if = "Option::is_none")]
    pub default_message_time_to_live: Option<Duration>,
    #[serde(default, with = "option_iso8601", skip_serializing_if = "Option::is_none")]
    pub auto_delete_on_idle: Option<Duration>,
    #[serde(default)]
    pub requires_duplicate_detection: bool,
    #[serde(default, with = "option_iso8601", skip_serializing_if = "Option::is_none")]
    pub duplicate_detection_history_time_window: Option<Duration>,
    #[serde(default)]
    pub enable_batched_operations: bool,
    #[serde(default)]
    pub enable_partitioning: bool,
    #[serde(default)]
    pub enable_express: bool,
    #[serde(default)]
    pub support_ordering: bool,

    #[serde(default, skip_serializing)]
    pub status: Option<String>,
    #[serde(default, skip_serializing)]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing)]
    pub updated_at: Option<String>,
    #[serde(default, skip_serializing)]
    pub accessed_at: Option<String>,
    #[serde(default, skip_serializing)]
    pub size_in_bytes: Option<i64>,
    #[serde(default, skip_serializing)]
    pub subscription_count: Option<i64>,
    #[serde(default, skip_serializing)]
    pub count_details: Option<CountDetails>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SubscriptionProperties {
    #[serde(default)]
    pub requires_session: bool,
    #[serde(default, with = "option_iso8601", skip_serializing_if = "Option::is_none")]
    pub default_message_time_to_live: Option<Duration>,
    #[serde(default, with = "option_iso8601", skip_serializing_if = "Option::is_none")]
    pub lock_duration: Option<Duration>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_delivery_count: Option<u32>,
    #[serde(default)]
    pub dead_lettering_on_message_expiration: bool,
    #[serde(default)]
    pub dead_lettering_on_filter_evaluation_exceptions: bool,
    #[serde(default, with = "option_iso8601", skip_serializing_if = "Option::is_none")]
    pub auto_delete_on_idle: Option<Duration>,
    #[serde(default)]
    pub enable_batched_operations: bool,

    #[serde(default, skip_serializing)]
    pub status: Option<String>,
    #[serde(default, skip_serializing)]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing)]
    pub updated_at: Option<String>,
    #[serde(default, skip_serializing)]
    pub accessed_at: Option<String>,
    #[serde(default, skip_serializing)]
    pub message_count: Option<i64>,
    #[serde(default, skip_serializing)]
    pub count_details: Option<CountDetails>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct RuleProperties {
    #[serde(default)]
    pub rights: AccessRights,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ArmAccessKeys {
    #[serde(default)]
    pub key_name: Option<String>,
    #[serde(default)]
    pub primary_key: String,
    #[serde(default)]
    pub secondary_key: String,
    #[serde(default)]
    pub primary_connection_string: String,
    #[serde(default)]
    pub secondary_connection_string: String,
}

impl ArmAccessKeys {
    pub fn into_keys(self, rule_name: &str) -> AccessKeys {
        AccessKeys {
            key_name: self.key_name.unwrap_or_else(|| rule_name.to_string()),
            primary_key: self.primary_key,
            secondary_key: self.secondary_key,
            primary_connection_string: self.primary_connection_string,
            secondary_connection_string: self.secondary_connection_string,
        }
    }
}

/// Terminal and in-flight values of `provisioningState` / operation `status`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum OperationStatus {
    Succeeded,
    Failed(String),
    InProgress,
}

impl OperationStatus {
    pub fn from_arm(status: Option<&str>) -> Self {
        match status {
            None => OperationStatus::Succeeded,
            Some(s) if s.eq_ignore_ascii_case("succeeded") => OperationStatus::Succeeded,
            Some(s)
                if s.eq_ignore_ascii_case("failed")
                    || s.eq_ignore_ascii_case("canceled")
                    || s.eq_ignore_ascii_case("cancelled") =>
            {
                OperationStatus::Failed(s.to_string())
            }
            Some(_) => OperationStatus::InProgress,
        }
    }
}

/// Body of `GET` on an `Azure-AsyncOperation` URL.
#[derive(Debug, Deserialize)]
pub(crate) struct AsyncOperationBody {
    pub status: Option<String>,
    pub error: Option<AsyncOperationError>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AsyncOperationError {
    pub code: Option<String>,
    pub message: Option<String>,
}

/// `provisioningState` of any resource body, wherever the kind keeps it.
pub(crate) fn provisioning_state(body: &serde_json::Value) -> Option<&str> {
    body.get("properties")
        .and_then(|p| p.get("provisioningState"))
        .and_then(|s| s.as_str())
}

/// Request body for `PUT` of `config`.
pub(crate) fn request_body(config: &ResourceConfig) -> CloudResult<serde_json::Value> {
    let value = match config {
        ResourceConfig::ResourceGroup(c) => serde_json::to_value(ArmResource {
            id: String::new(),
            location: Some(c.location.clone()),
            tags: Some(c.tags.clone()),
            sku: None,
            properties: ProvisioningProperties::default(),
        }),
        ResourceConfig::Namespace(c) => serde_json::to_value(ArmResource {
            id: String::new(),
            location: Some(c.location.clone()),
            tags: Some(c.tags.clone()),
            sku: Some(ArmSku {
                name: c.sku.tier.to_string(),
                tier: Some(c.sku.tier.to_string()),
                capacity: c.sku.capacity,
            }),
            properties: NamespaceProperties::default(),
        }),
        ResourceConfig::Topic(c) => serde_json::to_value(proxy(TopicProperties {
            max_size_in_megabytes: c.max_size_in_megabytes,
            default_message_time_to_live: c.default_message_time_to_live,
            auto_delete_on_idle: c.auto_delete_on_idle,
            requires_duplicate_detection: c.requires_duplicate_detection,
            duplicate_detection_history_time_window: c.duplicate_detection_history_time_window,
            enable_batched_operations: c.enable_batched_operations,
            enable_partitioning: c.enable_partitioning,
            enable_express: c.enable_express,
            support_ordering: c.support_ordering,
            ..Default::default()
        })),
        ResourceConfig::Subscription(c) => serde_json::to_value(proxy(SubscriptionProperties {
            requires_session: c.requires_session,
            default_message_time_to_live: c.default_message_time_to_live,
            lock_duration: c.lock_duration,
            max_delivery_count: c.max_delivery_count,
            dead_lettering_on_message_expiration: c.dead_lettering_on_message_expiration,
            dead_lettering_on_filter_evaluation_exceptions: c
                .dead_lettering_on_filter_evaluation_exceptions,
            auto_delete_on_idle: c.auto_delete_on_idle,
            enable_batched_operations: c.enable_batched_operations,
            ..Default::default()
        })),
        ResourceConfig::NamespaceAuthorizationRule(c)
        | ResourceConfig::TopicAuthorizationRule(c) => {
            if c.rights.is_empty() {
                return Err(CloudError::InvalidRequest(
                    "An authorization rule needs at least one access right".to_string(),
                ));
            }
            serde_json::to_value(proxy(RuleProperties {
                rights: c.rights.clone(),
            }))
        }
    };
    value.map_err(|e| CloudError::InvalidRequest(e.to_string()))
}

fn proxy<P>(properties: P) -> ArmResource<P> {
    ArmResource {
        id: String::new(),
        location: None,
        tags: None,
        sku: None,
        properties,
    }
}

/// Maps a resource body returned by ARM onto [`ResourceState`].
pub(crate) fn into_state(kind: ResourceKind, body: serde_json::Value) -> CloudResult<ResourceState> {
    let invalid = |e: serde_json::Error| CloudError::InvalidResponse(format!("{kind} body: {e}"));

    match kind {
        ResourceKind::ResourceGroup => {
            let raw: ArmResource<ProvisioningProperties> =
                serde_json::from_value(body).map_err(invalid)?;
            let id = parse_id(&raw.id, kind)?;
            let mut config = ResourceGroupConfig::new(raw.location.unwrap_or_default());
            config.tags = raw.tags.unwrap_or_default();
            Ok(ResourceState::ResourceGroup(ResourceGroupState {
                id,
                config,
                provisioning_state: raw.properties.provisioning_state,
            }))
        }
        ResourceKind::Namespace => {
            let raw: ArmResource<NamespaceProperties> =
                serde_json::from_value(body).map_err(invalid)?;
            let id = parse_id(&raw.id, kind)?;
            let sku = match raw.sku {
                Some(sku) => NamespaceSku {
                    tier: sku
                        .tier
                        .as_deref()
                        .unwrap_or(&sku.name)
                        .parse()
                        .unwrap_or(SkuTier::Standard),
                    capacity: sku.capacity,
                },
                None => NamespaceSku::default(),
            };
            let props = raw.properties;
            Ok(ResourceState::Namespace(NamespaceState {
                id,
                config: NamespaceConfig {
                    location: raw.location.unwrap_or_default(),
                    sku,
                    tags: raw.tags.unwrap_or_default(),
                },
                provisioning_state: props.provisioning_state,
                status: props.status,
                created_at: parse_timestamp(props.created_at.as_deref()),
                updated_at: parse_timestamp(props.updated_at.as_deref()),
                service_bus_endpoint: props.service_bus_endpoint,
            }))
        }
        ResourceKind::Topic => {
            let raw: ArmResource<TopicProperties> =
                serde_json::from_value(body).map_err(invalid)?;
            let id = parse_id(&raw.id, kind)?;
            let p = raw.properties;
            Ok(ResourceState::Topic(TopicState {
                id,
                config: TopicConfig {
                    max_size_in_megabytes: p.max_size_in_megabytes,
                    default_message_time_to_live: p.default_message_time_to_live,
                    auto_delete_on_idle: p.auto_delete_on_idle,
                    requires_duplicate_detection: p.requires_duplicate_detection,
                    duplicate_detection_history_time_window: p
                        .duplicate_detection_history_time_window,
                    enable_batched_operations: p.enable_batched_operations,
                    enable_partitioning: p.enable_partitioning,
                    enable_express: p.enable_express,
                    support_ordering: p.support_ordering,
                },
                runtime: EntityRuntime {
                    status: p.status,
                    created_at: parse_timestamp(p.created_at.as_deref()),
                    updated_at: parse_timestamp(p.updated_at.as_deref()),
                    accessed_at: parse_timestamp(p.accessed_at.as_deref()),
                    counts: counts(p.count_details),
                    message_count: None,
                    size_in_bytes: p.size_in_bytes.map(clamp_count),
                    subscription_count: p
                        .subscription_count
                        .map(|c| u32::try_from(c.max(0)).unwrap_or(u32::MAX)),
                },
            }))
        }
        ResourceKind::Subscription => {
            let raw: ArmResource<SubscriptionProperties> =
                serde_json::from_value(body).map_err(invalid)?;
            let id = parse_id(&raw.id, kind)?;
            let p = raw.properties;
            Ok(ResourceState::Subscription(SubscriptionState {
                id,
                config: SubscriptionConfig {
                    requires_session: p.requires_session,
                    default_message_time_to_live: p.default_message_time_to_live,
                    lock_duration: p.lock_duration,
                    max_delivery_count: p.max_delivery_count,
                    dead_lettering_on_message_expiration: p.dead_lettering_on_message_expiration,
                    dead_lettering_on_filter_evaluation_exceptions: p
                        .dead_lettering_on_filter_evaluation_exceptions,
                    auto_delete_on_idle: p.auto_delete_on_idle,
                    enable_batched_operations: p.enable_batched_operations,
                },
                runtime: EntityRuntime {
                    status: p.status,
                    created_at: parse_timestamp(p.created_at.as_deref()),
                    updated_at: parse_timestamp(p.updated_at.as_deref()),
                    accessed_at: parse_timestamp(p.accessed_at.as_deref()),
                    counts: counts(p.count_details),
                    message_count: p.message_count.map(clamp_count),
                    size_in_bytes: None,
                    subscription_count: None,
                },
            }))
        }
        ResourceKind::NamespaceAuthorizationRule | ResourceKind::TopicAuthorizationRule => {
            let raw: ArmResource<RuleProperties> =
                serde_json::from_value(body).map_err(invalid)?;
            let id = parse_id(&raw.id, kind)?;
            Ok(ResourceState::AuthorizationRule(AuthorizationRuleState {
                id,
                rights: raw.properties.rights,
            }))
        }
    }
}

fn parse_id(raw: &str, expected: ResourceKind) -> CloudResult<ResourceId> {
    let id: ResourceId = raw.parse()?;
    if id.kind() != expected {
        return Err(CloudError::InvalidResponse(format!(
            "Expected a {expected} id, got {raw}"
        )));
    }
    Ok(id)
}

/// The service reports counters as signed longs.
fn clamp_count(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}

fn counts(details: Option<CountDetails>) -> MessageCounts {
    let details = details.unwrap_or_default();
    MessageCounts {
        active: clamp_count(details.active_message_count),
        dead_letter: clamp_count(details.dead_letter_message_count),
        scheduled: clamp_count(details.scheduled_message_count),
        transfer: clamp_count(details.transfer_message_count),
        transfer_dead_letter: clamp_count(details.transfer_dead_letter_message_count),
    }
}

/// Accepts RFC 3339 as well as the offset-less form Service Bus uses for some
/// timestamps. `0001-01-01T00:00:00` means "never" and maps to `None`.
pub(crate) fn parse_timestamp(raw: Option<&str>) -> Option<DateTime<Utc>> {
    let raw = raw?.trim();
    let parsed = DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f").map(|dt| dt.and_utc())
        })
        .ok()?;
    (parsed.year() > 1).then_some(parsed)
}
