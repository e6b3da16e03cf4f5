//! Resource model shared by the orchestrator and every Cloud Resource API
//! implementation.
//!
//! The types here describe *what* should exist ([`ResourceSpec`],
//! [`ResourceConfig`]), *where* it lives ([`ResourceId`], [`ResourceHandle`])
//! and *what the control plane reports back* ([`ResourceState`]).

use super::errors::CloudError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

const SERVICE_BUS_PROVIDER: &str = "Microsoft.ServiceBus";

/// Kinds of resources the orchestrator knows how to manage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    ResourceGroup,
    Namespace,
    Topic,
    Subscription,
    NamespaceAuthorizationRule,
    TopicAuthorizationRule,
}

impl ResourceKind {
    /// Kind of the resource that must own this one, `None` for top-level kinds.
    pub fn parent_kind(self) -> Option<ResourceKind> {
        match self {
            ResourceKind::ResourceGroup => None,
            ResourceKind::Namespace => Some(ResourceKind::ResourceGroup),
            ResourceKind::Topic | ResourceKind::NamespaceAuthorizationRule => {
                Some(ResourceKind::Namespace)
            }
            ResourceKind::Subscription | ResourceKind::TopicAuthorizationRule => {
                Some(ResourceKind::Topic)
            }
        }
    }

    /// Collection name used in resource ids and REST paths.
    pub fn path_segment(self) -> &'static str {
        match self {
            ResourceKind::ResourceGroup => "resourceGroups",
            ResourceKind::Namespace => "namespaces",
            ResourceKind::Topic => "topics",
            ResourceKind::Subscription => "subscriptions",
            ResourceKind::NamespaceAuthorizationRule | ResourceKind::TopicAuthorizationRule => {
                "authorizationRules"
            }
        }
    }

    /// Authorization rule kind scoped to this kind, if rules can live under it.
    pub fn rule_kind(self) -> Option<ResourceKind> {
        match self {
            ResourceKind::Namespace => Some(ResourceKind::NamespaceAuthorizationRule),
            ResourceKind::Topic => Some(ResourceKind::TopicAuthorizationRule),
            _ => None,
        }
    }

    pub fn is_authorization_rule(self) -> bool {
        matches!(
            self,
            ResourceKind::NamespaceAuthorizationRule | ResourceKind::TopicAuthorizationRule
        )
    }

    fn child_from_segment(parent: ResourceKind, segment: &str) -> Option<ResourceKind> {
        let kind = match (parent, segment.to_ascii_lowercase().as_str()) {
            (ResourceKind::ResourceGroup, "namespaces") => ResourceKind::Namespace,
            (ResourceKind::Namespace, "topics") => ResourceKind::Topic,
            (ResourceKind::Namespace, "authorizationrules") => {
                ResourceKind::NamespaceAuthorizationRule
            }
            (ResourceKind::Topic, "subscriptions") => ResourceKind::Subscription,
            (ResourceKind::Topic, "authorizationrules") => ResourceKind::TopicAuthorizationRule,
            _ => return None,
        };
        Some(kind)
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResourceKind::ResourceGroup => "resource group",
            ResourceKind::Namespace => "namespace",
            ResourceKind::Topic => "topic",
            ResourceKind::Subscription => "subscription",
            ResourceKind::NamespaceAuthorizationRule => "namespace authorization rule",
            ResourceKind::TopicAuthorizationRule => "topic authorization rule",
        };
        f.write_str(name)
    }
}

/// A single right granted by an authorization rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AccessRight {
    Listen,
    Send,
    Manage,
}

impl fmt::Display for AccessRight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessRight::Listen => f.write_str("Listen"),
            AccessRight::Send => f.write_str("Send"),
            AccessRight::Manage => f.write_str("Manage"),
        }
    }
}

/// Normalized set of access rights.
///
/// `Manage` implies `Send` and `Listen`; the control plane rejects a rule that
/// grants `Manage` alone, so the set is completed on construction.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "Vec<AccessRight>", into = "Vec<AccessRight>")]
pub struct AccessRights(BTreeSet<AccessRight>);

impl AccessRights {
    pub fn new(rights: impl IntoIterator<Item = AccessRight>) -> Self {
        let mut set: BTreeSet<AccessRight> = rights.into_iter().collect();
        if set.contains(&AccessRight::Manage) {
            set.insert(AccessRight::Send);
            set.insert(AccessRight::Listen);
        }
        Self(set)
    }

    pub fn send() -> Self {
        Self::new([AccessRight::Send])
    }

    pub fn listen() -> Self {
        Self::new([AccessRight::Listen])
    }

    pub fn manage() -> Self {
        Self::new([AccessRight::Manage])
    }

    pub fn contains(&self, right: AccessRight) -> bool {
        self.0.contains(&right)
    }

    pub fn iter(&self) -> impl Iterator<Item = AccessRight> + '_ {
        self.0.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<AccessRight>> for AccessRights {
    fn from(rights: Vec<AccessRight>) -> Self {
        Self::new(rights)
    }
}

impl From<AccessRights> for Vec<AccessRight> {
    fn from(rights: AccessRights) -> Self {
        rights.0.into_iter().collect()
    }
}

/// Service Bus pricing tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SkuTier {
    Basic,
    #[default]
    Standard,
    Premium,
}

impl fmt::Display for SkuTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkuTier::Basic => f.write_str("Basic"),
            SkuTier::Standard => f.write_str("Standard"),
            SkuTier::Premium => f.write_str("Premium"),
        }
    }
}

impl FromStr for SkuTier {
    type Err = CloudError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "basic" => Ok(SkuTier::Basic),
            "standard" => Ok(SkuTier::Standard),
            "premium" => Ok(SkuTier::Premium),
            other => Err(CloudError::InvalidRequest(format!(
                "Unknown Service Bus SKU tier: {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NamespaceSku {
    pub tier: SkuTier,
    /// Messaging units, only meaningful for the Premium tier.
    pub capacity: Option<u32>,
}

impl NamespaceSku {
    pub fn new(tier: SkuTier) -> Self {
        Self {
            tier,
            capacity: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ResourceGroupConfig {
    pub location: String,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}

impl ResourceGroupConfig {
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            tags: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NamespaceConfig {
    pub location: String,
    pub sku: NamespaceSku,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}

impl NamespaceConfig {
    pub fn new(location: impl Into<String>, tier: SkuTier) -> Self {
        Self {
            location: location.into(),
            sku: NamespaceSku::new(tier),
            tags: BTreeMap::new(),
        }
    }
}

/// Topic options. `None` leaves the service default in place.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TopicConfig {
    pub max_size_in_megabytes: Option<u32>,
    pub default_message_time_to_live: Option<Duration>,
    pub auto_delete_on_idle: Option<Duration>,
    pub requires_duplicate_detection: bool,
    pub duplicate_detection_history_time_window: Option<Duration>,
    pub enable_batched_operations: bool,
    pub enable_partitioning: bool,
    pub enable_express: bool,
    pub support_ordering: bool,
}

impl TopicConfig {
    pub fn with_max_size_mb(mut self, megabytes: u32) -> Self {
        self.max_size_in_megabytes = Some(megabytes);
        self
    }

    pub fn with_default_message_ttl(mut self, ttl: Duration) -> Self {
        self.default_message_time_to_live = Some(ttl);
        self
    }

    pub fn with_auto_delete_on_idle(mut self, idle: Duration) -> Self {
        self.auto_delete_on_idle = Some(idle);
        self
    }

    pub fn with_duplicate_detection(mut self, window: Duration) -> Self {
        self.requires_duplicate_detection = true;
        self.duplicate_detection_history_time_window = Some(window);
        self
    }

    pub fn with_partitioning(mut self) -> Self {
        self.enable_partitioning = true;
        self
    }

    pub fn with_batched_operations(mut self) -> Self {
        self.enable_batched_operations = true;
        self
    }
}

/// Subscription delivery and dead-letter policy.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SubscriptionConfig {
    pub requires_session: bool,
    pub default_message_time_to_live: Option<Duration>,
    pub lock_duration: Option<Duration>,
    pub max_delivery_count: Option<u32>,
    pub dead_lettering_on_message_expiration: bool,
    pub dead_lettering_on_filter_evaluation_exceptions: bool,
    pub auto_delete_on_idle: Option<Duration>,
    pub enable_batched_operations: bool,
}

impl SubscriptionConfig {
    pub fn with_session(mut self) -> Self {
        self.requires_session = true;
        self
    }

    pub fn with_default_message_ttl(mut self, ttl: Duration) -> Self {
        self.default_message_time_to_live = Some(ttl);
        self
    }

    pub fn with_lock_duration(mut self, lock: Duration) -> Self {
        self.lock_duration = Some(lock);
        self
    }

    /// Messages are moved to the dead-letter sub-queue after this many
    /// delivery attempts.
    pub fn with_max_delivery_count(mut self, count: u32) -> Self {
        self.max_delivery_count = Some(count);
        self
    }

    pub fn with_dead_letter_on_expiration(mut self) -> Self {
        self.dead_lettering_on_message_expiration = true;
        self
    }

    pub fn with_dead_letter_on_filter_exceptions(mut self) -> Self {
        self.dead_lettering_on_filter_evaluation_exceptions = true;
        self
    }

    pub fn with_auto_delete_on_idle(mut self, idle: Duration) -> Self {
        self.auto_delete_on_idle = Some(idle);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AuthorizationRuleConfig {
    pub rights: AccessRights,
}

impl AuthorizationRuleConfig {
    pub fn new(rights: AccessRights) -> Self {
        Self { rights }
    }
}

/// Desired configuration of a resource; the variant determines its kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResourceConfig {
    ResourceGroup(ResourceGroupConfig),
    Namespace(NamespaceConfig),
    Topic(TopicConfig),
    Subscription(SubscriptionConfig),
    NamespaceAuthorizationRule(AuthorizationRuleConfig),
    TopicAuthorizationRule(AuthorizationRuleConfig),
}

impl ResourceConfig {
    pub fn kind(&self) -> ResourceKind {
        match self {
            ResourceConfig::ResourceGroup(_) => ResourceKind::ResourceGroup,
            ResourceConfig::Namespace(_) => ResourceKind::Namespace,
            ResourceConfig::Topic(_) => ResourceKind::Topic,
            ResourceConfig::Subscription(_) => ResourceKind::Subscription,
            ResourceConfig::NamespaceAuthorizationRule(_) => {
                ResourceKind::NamespaceAuthorizationRule
            }
            ResourceConfig::TopicAuthorizationRule(_) => ResourceKind::TopicAuthorizationRule,
        }
    }

    /// Build the rule configuration matching a rule kind.
    pub fn authorization_rule(kind: ResourceKind, rights: AccessRights) -> Option<Self> {
        match kind {
            ResourceKind::NamespaceAuthorizationRule => Some(
                ResourceConfig::NamespaceAuthorizationRule(AuthorizationRuleConfig::new(rights)),
            ),
            ResourceKind::TopicAuthorizationRule => Some(ResourceConfig::TopicAuthorizationRule(
                AuthorizationRuleConfig::new(rights),
            )),
            _ => None,
        }
    }
}

/// Declarative description of one resource to provision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceSpec {
    name: String,
    parent: Option<String>,
    config: ResourceConfig,
}

impl ResourceSpec {
    pub fn new(name: impl Into<String>, config: ResourceConfig) -> Self {
        Self {
            name: name.into(),
            parent: None,
            config,
        }
    }

    /// Attach this spec to the spec named `parent`.
    pub fn under(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn resource_group(name: impl Into<String>, config: ResourceGroupConfig) -> Self {
        Self::new(name, ResourceConfig::ResourceGroup(config))
    }

    pub fn namespace(name: impl Into<String>, config: NamespaceConfig) -> Self {
        Self::new(name, ResourceConfig::Namespace(config))
    }

    pub fn topic(name: impl Into<String>, config: TopicConfig) -> Self {
        Self::new(name, ResourceConfig::Topic(config))
    }

    pub fn subscription(name: impl Into<String>, config: SubscriptionConfig) -> Self {
        Self::new(name, ResourceConfig::Subscription(config))
    }

    pub fn topic_rule(name: impl Into<String>, rights: AccessRights) -> Self {
        Self::new(
            name,
            ResourceConfig::TopicAuthorizationRule(AuthorizationRuleConfig::new(rights)),
        )
    }

    pub fn namespace_rule(name: impl Into<String>, rights: AccessRights) -> Self {
        Self::new(
            name,
            ResourceConfig::NamespaceAuthorizationRule(AuthorizationRuleConfig::new(rights)),
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    pub fn config(&self) -> &ResourceConfig {
        &self.config
    }

    pub fn kind(&self) -> ResourceKind {
        self.config.kind()
    }
}

/// Fully qualified Azure Resource Manager id.
///
/// Format: `/subscriptions/{sub}/resourceGroups/{rg}` optionally followed by
/// `/providers/Microsoft.ServiceBus/namespaces/{ns}[/topics/{t}[/subscriptions/{s}]]`
/// or an `authorizationRules/{rule}` segment under a namespace or topic.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceId {
    subscription_id: String,
    resource_group: String,
    segments: Vec<(ResourceKind, String)>,
}

impl ResourceId {
    pub fn resource_group(subscription_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            subscription_id: subscription_id.into(),
            resource_group: name.into(),
            segments: Vec::new(),
        }
    }

    /// Id of a resource of `kind` named `name` owned by this resource.
    pub fn child(&self, kind: ResourceKind, name: &str) -> Result<ResourceId, CloudError> {
        if kind.parent_kind() != Some(self.kind()) {
            return Err(CloudError::InvalidRequest(format!(
                "A {kind} cannot be created under a {}",
                self.kind()
            )));
        }
        validate_name(kind, name)?;

        let mut segments = self.segments.clone();
        segments.push((kind, name.to_string()));
        Ok(Self {
            subscription_id: self.subscription_id.clone(),
            resource_group: self.resource_group.clone(),
            segments,
        })
    }

    pub fn parent(&self) -> Option<ResourceId> {
        if self.segments.is_empty() {
            return None;
        }
        let mut parent = self.clone();
        parent.segments.pop();
        Some(parent)
    }

    pub fn kind(&self) -> ResourceKind {
        self.segments
            .last()
            .map(|(kind, _)| *kind)
            .unwrap_or(ResourceKind::ResourceGroup)
    }

    pub fn name(&self) -> &str {
        self.segments
            .last()
            .map(|(_, name)| name.as_str())
            .unwrap_or(&self.resource_group)
    }

    pub fn subscription_id(&self) -> &str {
        &self.subscription_id
    }

    pub fn resource_group_name(&self) -> &str {
        &self.resource_group
    }

    pub fn namespace_name(&self) -> Option<&str> {
        self.segment(ResourceKind::Namespace)
    }

    pub fn topic_name(&self) -> Option<&str> {
        self.segment(ResourceKind::Topic)
    }

    /// True when `self` is `other` or lives underneath it.
    pub fn is_within(&self, other: &ResourceId) -> bool {
        self.subscription_id.eq_ignore_ascii_case(&other.subscription_id)
            && self.resource_group.eq_ignore_ascii_case(&other.resource_group)
            && self.segments.len() >= other.segments.len()
            && self
                .segments
                .iter()
                .zip(other.segments.iter())
                .all(|((k1, n1), (k2, n2))| k1 == k2 && n1.eq_ignore_ascii_case(n2))
    }

    fn segment(&self, kind: ResourceKind) -> Option<&str> {
        self.segments
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, name)| name.as_str())
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "/subscriptions/{}/resourceGroups/{}",
            self.subscription_id, self.resource_group
        )?;
        if !self.segments.is_empty() {
            write!(f, "/providers/{SERVICE_BUS_PROVIDER}")?;
        }
        for (kind, name) in &self.segments {
            write!(f, "/{}/{}", kind.path_segment(), name)?;
        }
        Ok(())
    }
}

impl FromStr for ResourceId {
    type Err = CloudError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || CloudError::InvalidResponse(format!("Invalid resource ID format: {s}"));
        let parts: Vec<&str> = s.split('/').filter(|p| !p.is_empty()).collect();

        if parts.len() < 4
            || !parts[0].eq_ignore_ascii_case("subscriptions")
            || !parts[2].eq_ignore_ascii_case("resourceGroups")
        {
            return Err(invalid());
        }

        let mut id = ResourceId::resource_group(parts[1], parts[3]);
        let rest = &parts[4..];
        if rest.is_empty() {
            return Ok(id);
        }

        if rest.len() < 2
            || !rest[0].eq_ignore_ascii_case("providers")
            || !rest[1].eq_ignore_ascii_case(SERVICE_BUS_PROVIDER)
        {
            return Err(invalid());
        }

        let pairs = &rest[2..];
        if pairs.is_empty() || pairs.len() % 2 != 0 {
            return Err(invalid());
        }
        for pair in pairs.chunks(2) {
            let kind = ResourceKind::child_from_segment(id.kind(), pair[0]).ok_or_else(invalid)?;
            id.segments.push((kind, pair[1].to_string()));
        }
        Ok(id)
    }
}

impl Serialize for ResourceId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ResourceId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

fn validate_name(kind: ResourceKind, name: &str) -> Result<(), CloudError> {
    if name.trim().is_empty() {
        return Err(CloudError::InvalidRequest(format!(
            "A {kind} name cannot be empty"
        )));
    }
    if name.contains('/') {
        return Err(CloudError::InvalidRequest(format!(
            "Invalid {kind} name '{name}': '/' is not allowed"
        )));
    }
    Ok(())
}

/// Reference to a resource that exists on the control plane.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceHandle {
    kind: ResourceKind,
    id: ResourceId,
}

impl ResourceHandle {
    pub fn new(id: ResourceId) -> Self {
        Self {
            kind: id.kind(),
            id,
        }
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn id(&self) -> &ResourceId {
        &self.id
    }

    pub fn name(&self) -> &str {
        self.id.name()
    }

    pub fn parent(&self) -> Option<ResourceHandle> {
        self.id.parent().map(ResourceHandle::new)
    }
}

impl fmt::Display for ResourceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.id)
    }
}

/// Per-entity message counters reported by the service.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MessageCounts {
    pub active: u64,
    pub dead_letter: u64,
    pub scheduled: u64,
    pub transfer: u64,
    pub transfer_dead_letter: u64,
}

/// Read-only runtime properties of a topic or subscription.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EntityRuntime {
    pub status: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub accessed_at: Option<DateTime<Utc>>,
    pub counts: MessageCounts,
    pub message_count: Option<u64>,
    pub size_in_bytes: Option<u64>,
    pub subscription_count: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceGroupState {
    pub id: ResourceId,
    pub config: ResourceGroupConfig,
    pub provisioning_state: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamespaceState {
    pub id: ResourceId,
    pub config: NamespaceConfig,
    pub provisioning_state: Option<String>,
    pub status: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub service_bus_endpoint: Option<String>,
}

impl NamespaceState {
    pub fn dns_label(&self) -> &str {
        self.id.name()
    }

    /// Host part of the service endpoint, e.g. `ns.servicebus.windows.net`.
    pub fn fqdn(&self) -> Option<&str> {
        self.service_bus_endpoint.as_deref().map(|endpoint| {
            endpoint
                .trim_start_matches("https://")
                .trim_start_matches("sb://")
                .trim_end_matches(":443/")
                .trim_end_matches('/')
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicState {
    pub id: ResourceId,
    pub config: TopicConfig,
    pub runtime: EntityRuntime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionState {
    pub id: ResourceId,
    pub config: SubscriptionConfig,
    pub runtime: EntityRuntime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationRuleState {
    pub id: ResourceId,
    pub rights: AccessRights,
}

/// Current state of a resource as reported by the control plane.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResourceState {
    ResourceGroup(ResourceGroupState),
    Namespace(NamespaceState),
    Topic(TopicState),
    Subscription(SubscriptionState),
    AuthorizationRule(AuthorizationRuleState),
}

impl ResourceState {
    pub fn id(&self) -> &ResourceId {
        match self {
            ResourceState::ResourceGroup(s) => &s.id,
            ResourceState::Namespace(s) => &s.id,
            ResourceState::Topic(s) => &s.id,
            ResourceState::Subscription(s) => &s.id,
            ResourceState::AuthorizationRule(s) => &s.id,
        }
    }

    pub fn name(&self) -> &str {
        self.id().name()
    }

    pub fn kind(&self) -> ResourceKind {
        self.id().kind()
    }

    pub fn handle(&self) -> ResourceHandle {
        ResourceHandle::new(self.id().clone())
    }

    /// Effective configuration, usable as the base of an update.
    pub fn config(&self) -> ResourceConfig {
        match self {
            ResourceState::ResourceGroup(s) => ResourceConfig::ResourceGroup(s.config.clone()),
            ResourceState::Namespace(s) => ResourceConfig::Namespace(s.config.clone()),
            ResourceState::Topic(s) => ResourceConfig::Topic(s.config.clone()),
            ResourceState::Subscription(s) => ResourceConfig::Subscription(s.config.clone()),
            ResourceState::AuthorizationRule(s) => {
                ResourceConfig::authorization_rule(s.id.kind(), s.rights.clone())
                    .unwrap_or_else(|| {
                        ResourceConfig::NamespaceAuthorizationRule(AuthorizationRuleConfig::new(
                            s.rights.clone(),
                        ))
                    })
            }
        }
    }
}

/// Shared access keys of an authorization rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessKeys {
    pub key_name: String,
    pub primary_key: String,
    pub secondary_key: String,
    pub primary_connection_string: String,
    pub secondary_connection_string: String,
}
