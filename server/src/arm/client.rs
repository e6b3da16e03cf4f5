use super::models::ListResponse;
use crate::auth::{AuthError, TokenCache};
use crate::cloud::{CloudError, CloudResult, ResourceId, ResourceKind};
use crate::common::RateLimiter;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use std::time::Duration;

pub const API_VERSION_RESOURCE_GROUPS: &str = "2021-04-01";
pub const API_VERSION_SERVICE_BUS: &str = "2021-11-01";

const CLIENT_REQUEST_ID: &str = "x-ms-client-request-id";

/// Tuning for an [`ArmClient`].
#[derive(Debug, Clone)]
pub struct ArmClientOptions {
    /// Delay between polls of a long-running operation when the service
    /// does not send `Retry-After`.
    pub poll_interval: Duration,
    /// Upper bound for waiting on one long-running operation.
    pub max_wait: Duration,
    pub requests_per_second: u32,
}

impl Default for ArmClientOptions {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(2),
            max_wait: Duration::from_secs(600),
            requests_per_second: 10,
        }
    }
}

/// Thin REST client for the Resource Manager endpoint.
///
/// Adds the bearer token, a fresh `x-ms-client-request-id` and client-side
/// throttling to every request, and turns non-success responses into
/// [`CloudError`]s.
#[derive(Clone)]
pub struct ArmClient {
    pub(super) http: reqwest::Client,
    base_url: String,
    tokens: TokenCache,
    limiter: RateLimiter,
    pub(super) options: ArmClientOptions,
}

impl ArmClient {
    pub fn new(base_url: impl Into<String>, tokens: TokenCache, options: ArmClientOptions) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http: reqwest::Client::new(),
            base_url,
            tokens,
            limiter: RateLimiter::new(options.requests_per_second),
            options,
        }
    }

    /// Acquires a management token without sending anything to Resource
    /// Manager.
    pub async fn authenticate(&self) -> Result<(), AuthError> {
        self.tokens.token().await.map(|_| ())
    }

    /// URL of `id`, with the API version its provider expects.
    pub fn resource_url(&self, id: &ResourceId) -> String {
        format!(
            "{}{}?api-version={}",
            self.base_url,
            id,
            api_version(id.kind())
        )
    }

    /// URL of the `kind` collection under `parent`.
    pub fn collection_url(&self, parent: &ResourceId, kind: ResourceKind) -> String {
        let prefix = if parent.kind() == ResourceKind::ResourceGroup {
            "/providers/Microsoft.ServiceBus"
        } else {
            ""
        };
        format!(
            "{}{}{}/{}?api-version={}",
            self.base_url,
            parent,
            prefix,
            kind.path_segment(),
            api_version(kind)
        )
    }

    /// URL of an action on a resource, e.g. `listKeys`.
    pub fn action_url(&self, id: &ResourceId, action: &str) -> String {
        format!(
            "{}{}/{}?api-version={}",
            self.base_url,
            id,
            action,
            api_version(id.kind())
        )
    }

    /// Sends one request and fails on any non-success status.
    pub(super) async fn send(
        &self,
        method: Method,
        url: &str,
        body: Option<&serde_json::Value>,
        operation: &str,
    ) -> CloudResult<reqwest::Response> {
        let response = self.send_raw(method, url, body).await?;
        if response.status().is_success() {
            Ok(response)
        } else {
            if response.status() == StatusCode::UNAUTHORIZED {
                self.tokens.invalidate().await;
            }
            Err(CloudError::from_response(response, operation).await)
        }
    }

    /// Sends one request and returns whatever the service answered.
    pub(super) async fn send_raw(
        &self,
        method: Method,
        url: &str,
        body: Option<&serde_json::Value>,
    ) -> CloudResult<reqwest::Response> {
        self.limiter.acquire().await;
        let token = self.tokens.token().await?;
        let request_id = uuid::Uuid::new_v4().to_string();
        log::trace!("{method} {url} [{CLIENT_REQUEST_ID}: {request_id}]");

        let is_post = method == Method::POST;
        let mut request = self
            .http
            .request(method, url)
            .header(AUTHORIZATION, format!("Bearer {}", token.as_str()))
            .header(CLIENT_REQUEST_ID, request_id);
        request = match body {
            Some(body) => request.json(body),
            // actions such as listKeys reject a POST without a JSON body
            None if is_post => request.header(CONTENT_TYPE, "application/json").body("{}"),
            None => request,
        };

        Ok(request.send().await?)
    }

    pub async fn get_json(&self, url: &str, operation: &str) -> CloudResult<serde_json::Value> {
        let response = self.send(Method::GET, url, None, operation).await?;
        Ok(response.json().await?)
    }

    pub async fn post_json(&self, url: &str, operation: &str) -> CloudResult<serde_json::Value> {
        let response = self.send(Method::POST, url, None, operation).await?;
        Ok(response.json().await?)
    }

    pub(crate) async fn get_page(
        &self,
        url: &str,
        operation: &str,
    ) -> CloudResult<ListResponse<serde_json::Value>> {
        let response = self.send(Method::GET, url, None, operation).await?;
        response
            .json()
            .await
            .map_err(|e| CloudError::InvalidResponse(format!("{operation}: {e}")))
    }

    /// `PUT` the body and wait for the operation to settle. Returns the final
    /// resource body.
    pub async fn put_and_wait(
        &self,
        url: &str,
        body: &serde_json::Value,
        operation: &str,
    ) -> CloudResult<serde_json::Value> {
        let response = self.send(Method::PUT, url, Some(body), operation).await?;
        self.settle_put(response, url, operation).await
    }

    /// `DELETE` and wait for the operation to settle. A resource that is
    /// already gone counts as deleted.
    pub async fn delete_and_wait(&self, url: &str, operation: &str) -> CloudResult<()> {
        match self.send(Method::DELETE, url, None, operation).await {
            Ok(response) => self.settle_delete(response, operation).await,
            Err(e) if e.is_not_found() => {
                log::debug!("{operation}: resource already absent");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

fn api_version(kind: ResourceKind) -> &'static str {
    match kind {
        ResourceKind::ResourceGroup => API_VERSION_RESOURCE_GROUPS,
        _ => API_VERSION_SERVICE_BUS,
    }
}
