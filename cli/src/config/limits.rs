/// Hard limits for provisioning settings

/// Shortest accepted per-operation timeout
pub const MIN_OPERATION_TIMEOUT_SECS: u64 = 10;

/// Longest accepted per-operation timeout (1 hour). Namespace creation
/// usually finishes within a few minutes.
pub const MAX_OPERATION_TIMEOUT_SECS: u64 = 3600;

/// Polling bounds for long-running operations
pub const MIN_POLL_INTERVAL_MS: u64 = 100;
pub const MAX_POLL_INTERVAL_MS: u64 = 60_000;

/// Resource Manager allows roughly 20 writes per second per subscription
pub const MAX_REQUESTS_PER_SECOND: u32 = 20;
