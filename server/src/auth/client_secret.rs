use super::errors::AuthError;
use super::provider::{AuthProvider, AuthToken};
use async_trait::async_trait;
use serde::Deserialize;
use zeroize::Zeroizing;

pub const DEFAULT_AUTHORITY_HOST: &str = "https://login.microsoftonline.com";
pub const MANAGEMENT_SCOPE: &str = "https://management.azure.com/.default";

/// OAuth2 client-credentials flow for a service principal.
#[derive(Clone)]
pub struct ClientSecretProvider {
    tenant_id: String,
    client_id: String,
    client_secret: Zeroizing<String>,
    authority_host: String,
    scope: String,
    http_client: reqwest::Client,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    token_type: String,
    expires_in: u64,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: String,
    error_description: Option<String>,
}

impl ClientSecretProvider {
    pub fn new(
        tenant_id: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: Zeroizing<String>,
    ) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            client_id: client_id.into(),
            client_secret,
            authority_host: DEFAULT_AUTHORITY_HOST.to_string(),
            scope: MANAGEMENT_SCOPE.to_string(),
            http_client: reqwest::Client::new(),
        }
    }

    /// Override the identity endpoint, e.g. for sovereign clouds or tests.
    pub fn with_authority_host(mut self, authority_host: impl Into<String>) -> Self {
        self.authority_host = authority_host.into().trim_end_matches('/').to_string();
        self
    }

    /// Scope requested for the token; defaults to the public cloud
    /// management endpoint.
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = scope.into();
        self
    }

    fn token_url(&self) -> String {
        format!(
            "{}/{}/oauth2/v2.0/token",
            self.authority_host, self.tenant_id
        )
    }
}

/// Turns the identity platform error codes into something a user can act on.
fn friendly_message(error: &ErrorResponse) -> String {
    let hint = match error.error.as_str() {
        "invalid_client" => {
            "Invalid client credentials. Check the client id and that the client secret has not expired."
        }
        "unauthorized_client" => {
            "The application is not registered in this tenant. Check the tenant id."
        }
        "invalid_request" => "Invalid authentication request. Check the tenant id and client id.",
        "invalid_scope" => "The requested scope is not valid for this application.",
        _ => {
            return error
                .error_description
                .clone()
                .unwrap_or_else(|| error.error.clone());
        }
    };
    hint.to_string()
}

#[async_trait]
impl AuthProvider for ClientSecretProvider {
    async fn authenticate(&self) -> Result<AuthToken, AuthError> {
        let params = [
            ("grant_type", "client_credentials"),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("scope", self.scope.as_str()),
        ];

        let response = self
            .http_client
            .post(self.token_url())
            .form(&params)
            .send()
            .await
            .map_err(|e| AuthError::TokenRequest(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_info = response
                .json::<ErrorResponse>()
                .await
                .unwrap_or(ErrorResponse {
                    error: format!("http_{}", status.as_u16()),
                    error_description: Some(format!("Token endpoint returned {status}")),
                });
            log::warn!("Client credentials flow rejected: {}", error_info.error);
            return Err(AuthError::Rejected(friendly_message(&error_info)));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| AuthError::InvalidResponse(e.to_string()))?;

        log::debug!(
            "Acquired {} token, expires in {}s",
            token.token_type,
            token.expires_in
        );

        Ok(AuthToken {
            token: Zeroizing::new(token.access_token),
            token_type: token.token_type,
            expires_in_secs: Some(token.expires_in),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(server: &MockServer) -> ClientSecretProvider {
        ClientSecretProvider::new("tenant-1", "client-1", Zeroizing::new("s3cret".into()))
            .with_authority_host(server.uri())
    }

    #[tokio::test]
    async fn posts_client_credentials_form() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/tenant-1/oauth2/v2.0/token"))
            .and(body_string_contains("grant_type=client_credentials"))
            .and(body_string_contains("client_id=client-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "tok",
                "token_type": "Bearer",
                "expires_in": 3599
            })))
            .expect(1)
            .mount(&server)
            .await;

        let token = provider(&server).authenticate().await.unwrap();
        assert_eq!(token.token.as_str(), "tok");
        assert_eq!(token.expires_in_secs, Some(3599));
    }

    #[tokio::test]
    async fn invalid_client_maps_to_friendly_rejection() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "error": "invalid_client",
                "error_description": "AADSTS7000215: Invalid client secret provided."
            })))
            .mount(&server)
            .await;

        match provider(&server).authenticate().await {
            Err(AuthError::Rejected(message)) => assert!(message.contains("client secret")),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn unknown_error_uses_description() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": "temporarily_unavailable",
                "error_description": "try later"
            })))
            .mount(&server)
            .await;

        match provider(&server).authenticate().await {
            Err(AuthError::Rejected(message)) => assert_eq!(message, "try later"),
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
