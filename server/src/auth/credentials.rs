use super::client_secret::{ClientSecretProvider, DEFAULT_AUTHORITY_HOST};
use super::errors::AuthError;
use super::provider::{AuthProvider, StaticTokenProvider};
use crate::utils::EnvUtils;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use zeroize::Zeroizing;

pub const DEFAULT_MANAGEMENT_ENDPOINT: &str = "https://management.azure.com";

/// Environment variable naming an SDK auth file.
pub const AUTH_FILE_ENV: &str = "AZURE_AUTH_LOCATION";

/// Credential values as they come from configuration. Anything left empty is
/// looked up in the environment and then in the auth file.
#[derive(Clone, Default, Deserialize)]
pub struct CredentialSettings {
    pub tenant_id: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub subscription_id: Option<String>,
    pub access_token: Option<String>,
    pub authority_host: Option<String>,
    pub management_endpoint: Option<String>,
}

impl std::fmt::Debug for CredentialSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialSettings")
            .field("tenant_id", &self.tenant_id)
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "<redacted>"))
            .field("subscription_id", &self.subscription_id)
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .field("authority_host", &self.authority_host)
            .field("management_endpoint", &self.management_endpoint)
            .finish()
    }
}

/// SDK auth file layout, as written by `az ad sp create-for-rbac --sdk-auth`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthFile {
    client_id: Option<String>,
    client_secret: Option<String>,
    tenant_id: Option<String>,
    subscription_id: Option<String>,
    active_directory_endpoint_url: Option<String>,
    resource_manager_endpoint_url: Option<String>,
}

impl AuthFile {
    fn load(path: &Path) -> Result<Self, AuthError> {
        let content = std::fs::read_to_string(path).map_err(|e| AuthError::CredentialFile {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        serde_json::from_str(&content).map_err(|e| AuthError::CredentialFile {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }
}

/// How the management token is obtained.
pub enum CredentialMethod {
    ClientSecret {
        tenant_id: String,
        client_id: String,
        client_secret: Zeroizing<String>,
        authority_host: String,
    },
    AccessToken(Zeroizing<String>),
}

/// Fully resolved credentials for one subscription.
pub struct Credentials {
    pub subscription_id: String,
    pub management_endpoint: String,
    pub method: CredentialMethod,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let method = match &self.method {
            CredentialMethod::ClientSecret { client_id, .. } => format!("client_secret({client_id})"),
            CredentialMethod::AccessToken(_) => "access_token".to_string(),
        };
        f.debug_struct("Credentials")
            .field("subscription_id", &self.subscription_id)
            .field("management_endpoint", &self.management_endpoint)
            .field("method", &method)
            .finish()
    }
}

impl Credentials {
    /// Resolves credentials from `settings`, the process environment and
    /// the auth file named by `AZURE_AUTH_LOCATION`, in that order.
    pub fn resolve(settings: &CredentialSettings) -> Result<Self, AuthError> {
        Self::resolve_with(settings, |names| EnvUtils::get_first_var(names))
    }

    /// Same as [`Credentials::resolve`] with a custom variable lookup.
    pub fn resolve_with<F>(settings: &CredentialSettings, lookup: F) -> Result<Self, AuthError>
    where
        F: Fn(&[&str]) -> Option<String>,
    {
        let file = match lookup(&[AUTH_FILE_ENV]) {
            Some(path) => {
                let path = PathBuf::from(path);
                log::debug!("Reading credentials from {}", path.display());
                AuthFile::load(&path)?
            }
            None => AuthFile::default(),
        };

        let pick = |configured: &Option<String>, names: &[&str], from_file: &Option<String>| {
            non_empty(configured)
                .or_else(|| lookup(names))
                .or_else(|| non_empty(from_file))
        };

        let subscription_id = pick(
            &settings.subscription_id,
            &["AZURE_SUBSCRIPTION_ID", "SUBSCRIPTION_ID"],
            &file.subscription_id,
        )
        .ok_or(AuthError::MissingSetting {
            setting: "subscription_id",
            env_hint: "AZURE_SUBSCRIPTION_ID",
        })?;

        let management_endpoint = pick(
            &settings.management_endpoint,
            &["AZURE_RESOURCE_MANAGER_ENDPOINT"],
            &file.resource_manager_endpoint_url,
        )
        .unwrap_or_else(|| DEFAULT_MANAGEMENT_ENDPOINT.to_string())
        .trim_end_matches('/')
        .to_string();

        if let Some(token) = pick(&settings.access_token, &["AZURE_ACCESS_TOKEN"], &None) {
            return Ok(Self {
                subscription_id,
                management_endpoint,
                method: CredentialMethod::AccessToken(Zeroizing::new(token)),
            });
        }

        let tenant_id = pick(
            &settings.tenant_id,
            &["AZURE_TENANT_ID", "TENANT_ID"],
            &file.tenant_id,
        )
        .ok_or(AuthError::MissingSetting {
            setting: "tenant_id",
            env_hint: "AZURE_TENANT_ID",
        })?;
        let client_id = pick(
            &settings.client_id,
            &["AZURE_CLIENT_ID", "CLIENT_ID"],
            &file.client_id,
        )
        .ok_or(AuthError::MissingSetting {
            setting: "client_id",
            env_hint: "AZURE_CLIENT_ID",
        })?;
        let client_secret = pick(
            &settings.client_secret,
            &["AZURE_CLIENT_SECRET", "CLIENT_SECRET"],
            &file.client_secret,
        )
        .ok_or(AuthError::MissingSetting {
            setting: "client_secret",
            env_hint: "AZURE_CLIENT_SECRET",
        })?;
        let authority_host = pick(
            &settings.authority_host,
            &["AZURE_AUTHORITY_HOST"],
            &file.active_directory_endpoint_url,
        )
        .unwrap_or_else(|| DEFAULT_AUTHORITY_HOST.to_string());

        Ok(Self {
            subscription_id,
            management_endpoint,
            method: CredentialMethod::ClientSecret {
                tenant_id,
                client_id,
                client_secret: Zeroizing::new(client_secret),
                authority_host,
            },
        })
    }

    /// Token scope matching the management endpoint.
    pub fn scope(&self) -> String {
        format!("{}/.default", self.management_endpoint)
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Builds the token provider for resolved credentials.
pub fn create_auth_provider(credentials: &Credentials) -> Arc<dyn AuthProvider> {
    match &credentials.method {
        CredentialMethod::ClientSecret {
            tenant_id,
            client_id,
            client_secret,
            authority_host,
        } => {
            log::info!("Using client credentials for application {client_id}");
            Arc::new(
                ClientSecretProvider::new(tenant_id, client_id, client_secret.clone())
                    .with_authority_host(authority_host)
                    .with_scope(credentials.scope()),
            )
        }
        CredentialMethod::AccessToken(token) => {
            log::info!("Using pre-acquired access token");
            Arc::new(StaticTokenProvider::new(token.as_str()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(vars: &[(&str, &str)]) -> impl Fn(&[&str]) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |names: &[&str]| names.iter().find_map(|name| vars.get(*name).cloned())
    }

    #[test]
    fn settings_win_over_environment() {
        let settings = CredentialSettings {
            subscription_id: Some("sub-config".into()),
            access_token: Some("tok".into()),
            ..Default::default()
        };
        let creds =
            Credentials::resolve_with(&settings, env(&[("AZURE_SUBSCRIPTION_ID", "sub-env")]))
                .unwrap();
        assert_eq!(creds.subscription_id, "sub-config");
        assert!(matches!(creds.method, CredentialMethod::AccessToken(_)));
        assert_eq!(creds.management_endpoint, DEFAULT_MANAGEMENT_ENDPOINT);
    }

    #[test]
    fn bare_variable_names_are_accepted() {
        let creds = Credentials::resolve_with(
            &CredentialSettings::default(),
            env(&[
                ("SUBSCRIPTION_ID", "sub"),
                ("TENANT_ID", "tenant"),
                ("CLIENT_ID", "client"),
                ("CLIENT_SECRET", "secret"),
            ]),
        )
        .unwrap();

        match creds.method {
            CredentialMethod::ClientSecret {
                tenant_id,
                client_id,
                authority_host,
                ..
            } => {
                assert_eq!(tenant_id, "tenant");
                assert_eq!(client_id, "client");
                assert_eq!(authority_host, DEFAULT_AUTHORITY_HOST);
            }
            CredentialMethod::AccessToken(_) => panic!("expected client secret"),
        }
    }

    #[test]
    fn missing_secret_names_the_variable() {
        let err = Credentials::resolve_with(
            &CredentialSettings::default(),
            env(&[
                ("AZURE_SUBSCRIPTION_ID", "sub"),
                ("AZURE_TENANT_ID", "tenant"),
                ("AZURE_CLIENT_ID", "client"),
            ]),
        )
        .unwrap_err();
        assert!(err.to_string().contains("AZURE_CLIENT_SECRET"));
    }

    #[test]
    fn auth_file_fills_remaining_values() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "clientId": "file-client",
                "clientSecret": "file-secret",
                "tenantId": "file-tenant",
                "subscriptionId": "file-sub",
                "activeDirectoryEndpointUrl": "https://login.example.com",
                "resourceManagerEndpointUrl": "https://management.example.com/"
            }}"#
        )
        .unwrap();
        let path = file.path().to_string_lossy().to_string();

        let creds = Credentials::resolve_with(
            &CredentialSettings::default(),
            env(&[(AUTH_FILE_ENV, path.as_str()), ("AZURE_CLIENT_ID", "env-client")]),
        )
        .unwrap();

        assert_eq!(creds.subscription_id, "file-sub");
        assert_eq!(creds.management_endpoint, "https://management.example.com");
        assert_eq!(creds.scope(), "https://management.example.com/.default");
        match creds.method {
            CredentialMethod::ClientSecret {
                client_id,
                authority_host,
                ..
            } => {
                assert_eq!(client_id, "env-client");
                assert_eq!(authority_host, "https://login.example.com");
            }
            CredentialMethod::AccessToken(_) => panic!("expected client secret"),
        }
    }

    #[test]
    fn unreadable_auth_file_is_reported() {
        let err = Credentials::resolve_with(
            &CredentialSettings::default(),
            env(&[(AUTH_FILE_ENV, "/nonexistent/busforge-auth.json")]),
        )
        .unwrap_err();
        assert!(matches!(err, AuthError::CredentialFile { .. }));
    }

    #[test]
    fn debug_output_hides_secrets() {
        let settings = CredentialSettings {
            client_secret: Some("hunter2".into()),
            ..Default::default()
        };
        assert!(!format!("{settings:?}").contains("hunter2"));
    }
}
