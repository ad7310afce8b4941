use std::path::PathBuf;

use thiserror::Error;

/// Every way a user action against the backend can fail. None of these are
/// retried; the message is shown to the user and the action ends there.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApiError {
    #[error("Error connecting to server")]
    Network(String),

    #[error("{message}")]
    Status { status: u16, message: String },

    /// 2xx response whose body still reports `{"error": ...}`.
    #[error("{0}")]
    Rejected(String),

    #[error("Unexpected response from server: {0}")]
    Decode(String),

    #[error("{0}")]
    Validation(String),

    #[error("Not logged in")]
    NotAuthenticated,
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Status { status: 401, .. })
    }

    /// Server supplied message, if the failure carried one.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Status { message, .. } | Self::Rejected(message) => Some(message),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            log::error!("Error talking to backend: {}", err);
            Self::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid API base URL '{0}'")]
    BaseUrl(String),

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}
