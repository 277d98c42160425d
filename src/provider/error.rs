// Provider error kinds — every fetch failure ends up as one of these.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    /// No playable sources after every attempt.
    #[error("{provider}: {message}")]
    NotFound {
        provider: &'static str,
        message: String,
        status: u16,
    },

    /// Known-incomplete integration; retrying cannot help.
    #[error("{provider}: {message}")]
    Broken {
        provider: &'static str,
        message: String,
        status: u16,
    },

    /// The provider answered, but not with anything usable.
    #[error("{provider}: {message}")]
    Upstream {
        provider: &'static str,
        message: String,
        status: u16,
    },

    /// The provider could not be reached. Transient; fetchers retry these.
    #[error("{provider}: {message}")]
    Unavailable {
        provider: &'static str,
        message: String,
        status: u16,
    },

    /// The media request lacks something this provider needs.
    #[error("{provider}: {message}")]
    InvalidRequest {
        provider: &'static str,
        message: String,
        status: u16,
    },
}

/// Serialized form handed to API clients.
#[derive(Debug, Serialize)]
pub struct ProviderErrorBody<'a> {
    pub message: &'a str,
    pub provider: &'static str,
    pub status: u16,
    pub kind: &'static str,
}

impl ProviderError {
    pub fn not_found(provider: &'static str, message: impl Into<String>) -> Self {
        Self::NotFound {
            provider,
            message: message.into(),
            status: 404,
        }
    }

    pub fn broken(provider: &'static str, message: impl Into<String>) -> Self {
        Self::Broken {
            provider,
            message: message.into(),
            status: 500,
        }
    }

    pub fn upstream(provider: &'static str, message: impl Into<String>, status: u16) -> Self {
        Self::Upstream {
            provider,
            message: message.into(),
            status,
        }
    }

    pub fn unavailable(provider: &'static str, message: impl Into<String>) -> Self {
        Self::Unavailable {
            provider,
            message: message.into(),
            status: 500,
        }
    }

    pub fn invalid_request(provider: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            provider,
            message: message.into(),
            status: 400,
        }
    }

    pub fn provider(&self) -> &'static str {
        match self {
            Self::NotFound { provider, .. }
            | Self::Broken { provider, .. }
            | Self::Upstream { provider, .. }
            | Self::Unavailable { provider, .. }
            | Self::InvalidRequest { provider, .. } => *provider,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::NotFound { message, .. }
            | Self::Broken { message, .. }
            | Self::Upstream { message, .. }
            | Self::Unavailable { message, .. }
            | Self::InvalidRequest { message, .. } => message,
        }
    }

    pub fn status(&self) -> u16 {
        match self {
            Self::NotFound { status, .. }
            | Self::Broken { status, .. }
            | Self::Upstream { status, .. }
            | Self::Unavailable { status, .. }
            | Self::InvalidRequest { status, .. } => *status,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::Broken { .. } => "broken",
            Self::Upstream { .. } => "upstream",
            Self::Unavailable { .. } => "unavailable",
            Self::InvalidRequest { .. } => "invalid_request",
        }
    }

    /// Transient transport failure: the same request may succeed later.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable { .. })
    }

    pub fn is_known_broken(&self) -> bool {
        matches!(self, Self::Broken { .. })
    }

    pub fn body(&self) -> ProviderErrorBody<'_> {
        ProviderErrorBody {
            message: self.message(),
            provider: self.provider(),
            status: self.status(),
            kind: self.kind(),
        }
    }
}

impl IntoResponse for ProviderError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.body())).into_response()
    }
}
