// Relay failure kinds and the client-visible response each one produces.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Fixed body returned while the relay is switched off.
pub const DISABLED_BODY: &str = "TS proxying is disabled";

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// The relay is switched off for this process.
    #[error("segment relay is disabled")]
    Disabled,

    /// Missing or malformed caller input. Nothing was sent upstream.
    #[error("invalid relay request: {0}")]
    InvalidRequest(String),

    /// The origin answered with a non-success status.
    #[error("upstream rejected request with HTTP {0}")]
    UpstreamRejected(StatusCode),

    /// The origin could not be reached or failed mid-request.
    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// The client went away. Routine, never reported.
    #[error("client disconnected")]
    ClientDisconnected,
}

impl RelayError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Disabled => StatusCode::NOT_FOUND,
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::UpstreamRejected(status) => *status,
            Self::UpstreamUnavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
            // Nobody is listening; the status only exists to satisfy the type.
            Self::ClientDisconnected => StatusCode::OK,
        }
    }

    /// Whether this failure should show up in the logs.
    pub fn is_silent(&self) -> bool {
        matches!(self, Self::ClientDisconnected)
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        match self {
            Self::Disabled => (StatusCode::NOT_FOUND, DISABLED_BODY).into_response(),
            Self::InvalidRequest(reason) => (StatusCode::BAD_REQUEST, reason).into_response(),
            Self::UpstreamRejected(status) => status.into_response(),
            Self::UpstreamUnavailable(_) => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
            Self::ClientDisconnected => StatusCode::OK.into_response(),
        }
    }
}
