use std::fmt;
use std::time::Duration;

/// Errors reported by a Cloud Resource API implementation.
#[derive(Debug, Clone)]
pub enum CloudError {
    /// Resource Manager answered with an error body.
    Arm {
        operation: String,
        /// ARM error code, `HTTP_<status>` when the body carried none
        code: String,
        /// HTTP status; 200 for failures reported by an async operation
        status: u16,
        message: String,
        /// `x-ms-request-id`, quoted in support tickets
        request_id: Option<String>,
    },

    NotFound(String),

    /// A long-running operation reached a failed or cancelled terminal state
    OperationFailed { operation: String, status: String },

    /// Transport level failure (connection refused, TLS, ...)
    RequestFailed(String),

    InvalidResponse(String),

    /// Rejected before anything was sent
    InvalidRequest(String),

    Authentication(String),

    /// Polling gave up before the operation reached a terminal state
    Timeout { operation: String, after: Duration },
}

impl fmt::Display for CloudError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CloudError::Arm {
                operation,
                code,
                status,
                message,
                request_id,
            } => {
                write!(f, "{operation} failed with {code} (HTTP {status}): {message}")?;
                match request_id {
                    Some(id) => write!(f, " [request id {id}]"),
                    None => Ok(()),
                }
            }
            CloudError::NotFound(what) => write!(f, "Resource not found: {what}"),
            CloudError::OperationFailed { operation, status } => {
                write!(f, "{operation} finished with status {status}")
            }
            CloudError::RequestFailed(msg) => write!(f, "Request failed: {msg}"),
            CloudError::InvalidResponse(msg) => write!(f, "Invalid response: {msg}"),
            CloudError::InvalidRequest(msg) => write!(f, "Invalid request: {msg}"),
            CloudError::Authentication(msg) => write!(f, "Authentication error: {msg}"),
            CloudError::Timeout { operation, after } => {
                write!(f, "{operation} did not finish within {after:?}")
            }
        }
    }
}

impl std::error::Error for CloudError {}

impl CloudError {
    pub fn arm(
        operation: impl Into<String>,
        code: impl Into<String>,
        status: u16,
        message: impl Into<String>,
    ) -> Self {
        Self::Arm {
            operation: operation.into(),
            code: code.into(),
            status,
            message: message.into(),
            request_id: None,
        }
    }

    /// Turns a non-success response into an error, reading the ARM error
    /// envelope when there is one. A 404 becomes [`CloudError::NotFound`].
    pub async fn from_response(response: reqwest::Response, operation: impl Into<String>) -> Self {
        let operation = operation.into();
        let status = response.status().as_u16();
        let request_id = response
            .headers()
            .get("x-ms-request-id")
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        let body = response.text().await.unwrap_or_default();
        let (code, message) = match serde_json::from_str::<ErrorEnvelope>(&body) {
            Ok(envelope) => (envelope.error.code, envelope.error.message),
            Err(_) if body.is_empty() => (format!("HTTP_{status}"), "empty response body".into()),
            Err(_) => (format!("HTTP_{status}"), body),
        };

        if status == 404 {
            return CloudError::NotFound(format!("{operation}: {code} - {message}"));
        }

        Self::Arm {
            operation,
            code,
            status,
            message,
            request_id,
        }
    }

    pub fn is_not_found(&self) -> bool {
        match self {
            CloudError::NotFound(_) => true,
            CloudError::Arm { status, code, .. } => *status == 404 || code.ends_with("NotFound"),
            _ => false,
        }
    }

    pub fn error_code(&self) -> Option<&str> {
        match self {
            CloudError::Arm { code, .. } => Some(code),
            _ => None,
        }
    }

    pub fn request_id(&self) -> Option<&str> {
        match self {
            CloudError::Arm { request_id, .. } => request_id.as_deref(),
            _ => None,
        }
    }
}

/// `{"error": {"code": ..., "message": ...}}`
#[derive(Debug, serde::Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetails,
}

#[derive(Debug, serde::Deserialize)]
struct ErrorDetails {
    code: String,
    message: String,
}

impl From<reqwest::Error> for CloudError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            CloudError::InvalidResponse(err.to_string())
        } else {
            CloudError::RequestFailed(err.to_string())
        }
    }
}

impl From<crate::auth::AuthError> for CloudError {
    fn from(err: crate::auth::AuthError) -> Self {
        CloudError::Authentication(err.to_string())
    }
}

pub type CloudResult<T> = Result<T, CloudError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_request_id() {
        let err = CloudError::Arm {
            operation: "create namespace".to_string(),
            code: "Conflict".to_string(),
            status: 409,
            message: "Namespace name is taken".to_string(),
            request_id: Some("abc-123".to_string()),
        };
        assert_eq!(
            err.to_string(),
            "create namespace failed with Conflict (HTTP 409): Namespace name is taken [request id abc-123]"
        );
    }

    #[test]
    fn not_found_detection_covers_arm_codes() {
        assert!(CloudError::NotFound("x".into()).is_not_found());
        assert!(CloudError::arm("get", "ResourceGroupNotFound", 400, "m").is_not_found());
        assert!(!CloudError::arm("get", "Conflict", 409, "m").is_not_found());
        assert!(!CloudError::RequestFailed("boom".into()).is_not_found());
    }
}
