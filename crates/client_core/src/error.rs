use thiserror::Error;

/// Failure reported by a [`crate::RecordSource`] call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordSourceError {
    /// The backend could not be reached at all.
    #[error("review server unreachable: {0}")]
    Connectivity(String),
    /// The request reached the backend and was rejected.
    #[error("{message}")]
    Server { message: String },
}

impl RecordSourceError {
    pub fn connectivity(detail: impl Into<String>) -> Self {
        Self::Connectivity(detail.into())
    }

    pub fn server(message: impl Into<String>) -> Self {
        Self::Server {
            message: message.into(),
        }
    }

    /// A server rejection can be retried in place; a connectivity failure needs a restart.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Server { .. })
    }

    pub fn guidance(&self) -> &'static str {
        match self {
            Self::Connectivity(_) => "The review server cannot be reached; restart the application.",
            Self::Server { .. } => "The review server rejected the request; retry to continue.",
        }
    }
}

impl From<reqwest::Error> for RecordSourceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() || err.is_request() {
            Self::Connectivity(err.to_string())
        } else if err.is_decode() {
            Self::server(format!("invalid response from review server: {err}"))
        } else if let Some(status) = err.status() {
            Self::server(
                status
                    .canonical_reason()
                    .unwrap_or("request rejected")
                    .to_string(),
            )
        } else {
            Self::Connectivity(err.to_string())
        }
    }
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings file '{path}': {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse settings file '{path}': {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },
    #[error("invalid server url '{url}': {reason}")]
    InvalidServerUrl { url: String, reason: String },
    #[error("invalid value '{value}' for {key}")]
    InvalidValue { key: &'static str, value: String },
    #[error("key bindings must be three distinct keys, got relevant={relevant:?} irrelevant={irrelevant:?} undo={undo:?}")]
    ConflictingKeyBindings {
        relevant: char,
        irrelevant: char,
        undo: char,
    },
    #[error("no project id configured; pass --project or set APP__PROJECT_ID")]
    MissingProject,
}
