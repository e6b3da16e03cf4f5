//! Long-running operation handling.
//!
//! A mutating request may finish synchronously or hand back one of two
//! tracking URLs: `Azure-AsyncOperation` (poll for a `status` field) or
//! `Location` (poll until it stops answering `202`). Resources created
//! without either header are tracked through their own `provisioningState`.

use super::client::ArmClient;
use super::models::{AsyncOperationBody, OperationStatus, provisioning_state};
use crate::cloud::{CloudError, CloudResult};
use reqwest::header::{HeaderMap, LOCATION, RETRY_AFTER};
use reqwest::{Method, StatusCode};
use std::time::Duration;
use tokio::time::Instant;

const ASYNC_OPERATION: &str = "azure-asyncoperation";

/// What to poll while an operation is in flight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum PollTarget {
    AsyncOperation(String),
    Location(String),
    Resource(String),
}

impl PollTarget {
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };
        header(ASYNC_OPERATION)
            .map(PollTarget::AsyncOperation)
            .or_else(|| header(LOCATION.as_str()).map(PollTarget::Location))
    }
}

fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

impl ArmClient {
    pub(super) async fn settle_put(
        &self,
        response: reqwest::Response,
        url: &str,
        operation: &str,
    ) -> CloudResult<serde_json::Value> {
        if let Some(target) = PollTarget::from_headers(response.headers()) {
            let hint = retry_after(response.headers());
            self.wait_for(target, hint, operation).await?;
            return self.get_json(url, operation).await;
        }

        let body: serde_json::Value = if response.status() == StatusCode::NO_CONTENT {
            serde_json::Value::Null
        } else {
            response.json().await?
        };
        match OperationStatus::from_arm(provisioning_state(&body)) {
            OperationStatus::Succeeded if !body.is_null() => Ok(body),
            OperationStatus::Failed(status) => Err(CloudError::OperationFailed {
                operation: operation.to_string(),
                status,
            }),
            _ => {
                self.wait_for(PollTarget::Resource(url.to_string()), None, operation)
                    .await?;
                self.get_json(url, operation).await
            }
        }
    }

    pub(super) async fn settle_delete(
        &self,
        response: reqwest::Response,
        operation: &str,
    ) -> CloudResult<()> {
        if response.status() != StatusCode::ACCEPTED {
            return Ok(());
        }
        match PollTarget::from_headers(response.headers()) {
            Some(target) => {
                let hint = retry_after(response.headers());
                match self.wait_for(target, hint, operation).await {
                    Err(e) if e.is_not_found() => Ok(()),
                    other => other,
                }
            }
            None => {
                log::warn!("{operation}: accepted without a tracking URL, not waiting");
                Ok(())
            }
        }
    }

    /// Polls `target` until the operation reaches a terminal state.
    async fn wait_for(
        &self,
        target: PollTarget,
        retry_hint: Option<Duration>,
        operation: &str,
    ) -> CloudResult<()> {
        let started = Instant::now();
        let mut delay = retry_hint.unwrap_or(self.options.poll_interval);
        log::debug!("{operation}: waiting for completion via {target:?}");

        loop {
            if started.elapsed() + delay > self.options.max_wait {
                return Err(CloudError::Timeout {
                    operation: operation.to_string(),
                    after: started.elapsed(),
                });
            }
            tokio::time::sleep(delay).await;

            let response = self.send_raw(Method::GET, target_url(&target), None).await?;
            let status = response.status();
            let next_hint = retry_after(response.headers());

            if status == StatusCode::NOT_FOUND && !matches!(target, PollTarget::AsyncOperation(_)) {
                return Err(CloudError::NotFound(operation.to_string()));
            }
            if !status.is_success() {
                return Err(CloudError::from_response(response, operation).await);
            }

            let done = match &target {
                PollTarget::Location(_) => status != StatusCode::ACCEPTED,
                PollTarget::AsyncOperation(_) => {
                    let body: AsyncOperationBody = response.json().await?;
                    match OperationStatus::from_arm(body.status.as_deref()) {
                        OperationStatus::Succeeded => true,
                        OperationStatus::InProgress => false,
                        OperationStatus::Failed(status) => {
                            return Err(match body.error {
                                Some(error) => CloudError::arm(
                                    operation,
                                    error.code.unwrap_or(status),
                                    200,
                                    error.message.unwrap_or_default(),
                                ),
                                None => CloudError::OperationFailed {
                                    operation: operation.to_string(),
                                    status,
                                },
                            });
                        }
                    }
                }
                PollTarget::Resource(_) => {
                    let body: serde_json::Value = response.json().await?;
                    match OperationStatus::from_arm(provisioning_state(&body)) {
                        OperationStatus::Succeeded => true,
                        OperationStatus::InProgress => false,
                        OperationStatus::Failed(status) => {
                            return Err(CloudError::OperationFailed {
                                operation: operation.to_string(),
                                status,
                            });
                        }
                    }
                }
            };

            if done {
                log::debug!("{operation}: completed after {:?}", started.elapsed());
                return Ok(());
            }
            delay = next_hint.unwrap_or(self.options.poll_interval);
        }
    }
}

fn target_url(target: &PollTarget) -> &str {
    match target {
        PollTarget::AsyncOperation(url) | PollTarget::Location(url) | PollTarget::Resource(url) => {
            url
        }
    }
}
