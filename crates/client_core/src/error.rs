use shared::{domain::EmployeeId, error::ApiErrorBody};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("{path} failed with HTTP {status}: {}", ApiErrorBody::summarize(.body))]
    Network {
        status: u16,
        path: String,
        body: String,
    },
    #[error("{path} was not found")]
    NotFound { path: String },
    #[error("{path} rejected the session token")]
    Unauthorized { path: String },
    #[error("{path} timed out")]
    Timeout { path: String },
    #[error("request to {path} failed: {source}")]
    Transport {
        path: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("unexpected response body from {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("failed to build http client: {0}")]
    Setup(#[source] reqwest::Error),
}

impl ClientError {
    pub(crate) fn from_transport(path: &str, source: reqwest::Error) -> Self {
        let path = path.to_string();
        if source.is_timeout() {
            ClientError::Timeout { path }
        } else if source.is_decode() {
            ClientError::Decode { path, source }
        } else {
            ClientError::Transport { path, source }
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Network { status, .. } => Some(*status),
            ClientError::NotFound { .. } => Some(404),
            ClientError::Unauthorized { .. } => Some(401),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::NotFound { .. })
    }

    pub fn requires_reauth(&self) -> bool {
        matches!(self, ClientError::Unauthorized { .. })
    }

    /// Short message suitable for a page-level banner.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Network { status, body, .. } => {
                let detail = ApiErrorBody::summarize(body);
                if detail.is_empty() {
                    format!("Server returned HTTP {status}")
                } else {
                    format!("Server returned HTTP {status}: {detail}")
                }
            }
            ClientError::NotFound { .. } => "The requested record was not found".to_string(),
            ClientError::Unauthorized { .. } => "Session expired; please sign in again".to_string(),
            ClientError::Timeout { .. } => "Server did not respond in time".to_string(),
            ClientError::Transport { .. } => {
                "Server unreachable; check the API URL and network".to_string()
            }
            ClientError::Decode { .. } => "Server sent a response that could not be read".to_string(),
            ClientError::Setup(_) => "HTTP client could not be initialized".to_string(),
        }
    }
}

/// One member of a fan-out that failed while the rest of the aggregation went on.
#[derive(Debug, Error)]
#[error("enrollments for employee {employee_id} could not be loaded: {source}")]
pub struct PartialAggregationError {
    pub employee_id: EmployeeId,
    #[source]
    pub source: ClientError,
}
