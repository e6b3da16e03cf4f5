//! Azure Resource Manager implementation of the Cloud Resource API.

pub mod api;
pub mod client;
pub mod duration;
pub(crate) mod models;
mod polling;

pub use api::ArmCloudApi;
pub use client::{API_VERSION_RESOURCE_GROUPS, API_VERSION_SERVICE_BUS, ArmClient, ArmClientOptions};
pub use duration::DurationParseError;
