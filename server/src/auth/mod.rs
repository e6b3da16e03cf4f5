pub mod client_secret;
pub mod credentials;
pub mod errors;
pub mod provider;
pub mod token_cache;
pub mod types;

pub use client_secret::ClientSecretProvider;
pub use credentials::{
    CredentialMethod, CredentialSettings, Credentials, DEFAULT_MANAGEMENT_ENDPOINT,
    create_auth_provider,
};
pub use errors::AuthError;
pub use provider::{AuthProvider, AuthToken, StaticTokenProvider};
pub use token_cache::TokenCache;
