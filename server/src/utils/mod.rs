//! # Server Utilities Module
//!
//! - [`env`] - validated access to environment variables, used when resolving
//!   credentials and the target subscription
//! - [`names`] - random resource names for throwaway runs

pub mod env;
pub mod names;

pub use env::{EnvUtils, EnvVarError};
pub use names::random_resource_name;
