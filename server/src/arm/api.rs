use super::client::{ArmClient, ArmClientOptions};
use super::models::{ArmAccessKeys, into_state, request_body};
use crate::auth::{AuthError, Credentials, TokenCache, create_auth_provider};
use crate::cloud::{
    AccessKeys, CloudError, CloudResourceApi, CloudResult, ResourceConfig, ResourceHandle,
    ResourceKind, ResourceState, ResourceStream, target_id,
};
use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt, stream};

/// [`CloudResourceApi`] backed by the Azure Resource Manager REST API.
#[derive(Clone)]
pub struct ArmCloudApi {
    client: ArmClient,
    subscription_id: String,
}

impl ArmCloudApi {
    pub fn new(client: ArmClient, subscription_id: impl Into<String>) -> Self {
        Self {
            client,
            subscription_id: subscription_id.into(),
        }
    }

    /// Wires token acquisition, caching and the REST client for `credentials`.
    pub fn from_credentials(credentials: &Credentials, options: ArmClientOptions) -> Self {
        let tokens = TokenCache::new(create_auth_provider(credentials));
        let client = ArmClient::new(credentials.management_endpoint.clone(), tokens, options);
        Self::new(client, credentials.subscription_id.clone())
    }

    /// Fails fast on bad credentials, before any resource is touched.
    pub async fn verify(&self) -> Result<(), AuthError> {
        self.client.authenticate().await?;
        log::info!("Selected subscription {}", self.subscription_id);
        Ok(())
    }
}

#[async_trait]
impl CloudResourceApi for ArmCloudApi {
    async fn create_or_update(
        &self,
        parent: Option<&ResourceHandle>,
        name: &str,
        config: &ResourceConfig,
    ) -> CloudResult<ResourceHandle> {
        let kind = config.kind();
        let id = target_id(&self.subscription_id, parent, name, kind)?;
        let body = request_body(config)?;
        let operation = format!("create or update {kind} {name}");

        log::debug!("PUT {id}");
        self.client
            .put_and_wait(&self.client.resource_url(&id), &body, &operation)
            .await?;
        Ok(ResourceHandle::new(id))
    }

    async fn get(&self, handle: &ResourceHandle) -> CloudResult<ResourceState> {
        let operation = format!("get {} {}", handle.kind(), handle.name());
        let body = self
            .client
            .get_json(&self.client.resource_url(handle.id()), &operation)
            .await?;
        into_state(handle.kind(), body)
    }

    fn list<'a>(&'a self, parent: &'a ResourceHandle, kind: ResourceKind) -> ResourceStream<'a> {
        if kind.parent_kind() != Some(parent.kind()) {
            let err = CloudError::InvalidRequest(format!(
                "A {} does not contain {kind} resources",
                parent.kind()
            ));
            return stream::once(async move { Err(err) }).boxed();
        }

        let first_page = self.client.collection_url(parent.id(), kind);
        let operation = format!("list {kind} resources of {}", parent.name());

        stream::try_unfold(Some(first_page), move |next| {
            let operation = operation.clone();
            async move {
                let Some(url) = next else {
                    return Ok(None);
                };
                let page = self.client.get_page(&url, &operation).await?;
                let items: Vec<CloudResult<ResourceState>> = page
                    .value
                    .into_iter()
                    .map(|body| into_state(kind, body))
                    .collect();
                Ok::<_, CloudError>(Some((stream::iter(items), page.next_link)))
            }
        })
        .try_flatten()
        .boxed()
    }

    async fn delete(&self, handle: &ResourceHandle) -> CloudResult<()> {
        let operation = format!("delete {} {}", handle.kind(), handle.name());
        log::debug!("DELETE {}", handle.id());
        self.client
            .delete_and_wait(&self.client.resource_url(handle.id()), &operation)
            .await
    }

    async fn get_secrets(&self, handle: &ResourceHandle) -> CloudResult<AccessKeys> {
        if !handle.kind().is_authorization_rule() {
            return Err(CloudError::InvalidRequest(format!(
                "Keys are only available for authorization rules, not for a {}",
                handle.kind()
            )));
        }
        let operation = format!("list keys of {}", handle.name());
        let body = self
            .client
            .post_json(&self.client.action_url(handle.id(), "listKeys"), &operation)
            .await?;
        let keys: ArmAccessKeys = serde_json::from_value(body)
            .map_err(|e| CloudError::InvalidResponse(format!("{operation}: {e}")))?;
        Ok(keys.into_keys(handle.name()))
    }

    fn subscription_id(&self) -> &str {
        &self.subscription_id
    }
}
