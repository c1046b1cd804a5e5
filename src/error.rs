use rocket::{
    http::Status,
    response::{self, Responder},
    serde::json::{json, Json, Value},
    Request,
};
use thiserror::Error;

use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum LeaderboardError {
    #[error("Invalid initials (A–Z / 0–9, up to 3 chars)")]
    InvalidName,
    #[error("store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),
    #[error("store is not configured: {reason}")]
    ConfigurationMissing { reason: String },
    #[error("Request body too large")]
    PayloadTooLarge,
}

impl LeaderboardError {
    pub fn status(&self) -> Status {
        match self {
            Self::InvalidName => Status::BadRequest,
            Self::PayloadTooLarge => Status::PayloadTooLarge,
            Self::StoreUnavailable(_) | Self::ConfigurationMissing { .. } => {
                Status::InternalServerError
            }
        }
    }

    fn body(&self) -> Value {
        match self {
            Self::InvalidName | Self::PayloadTooLarge => json!({ "error": self.to_string() }),
            Self::StoreUnavailable(cause) => json!({
                "error": "Server error",
                "detail": cause.to_string(),
            }),
            Self::ConfigurationMissing { reason } => json!({
                "error": "Store is not configured",
                "detail": reason,
            }),
        }
    }
}

impl<'r> Responder<'r, 'static> for LeaderboardError {
    fn respond_to(self, request: &'r Request<'_>) -> response::Result<'static> {
        let status = self.status();
        if status.code >= 500 {
            tracing::error!(uri = %request.uri(), "{}", self);
        }
        (status, Json(self.body())).respond_to(request)
    }
}

pub type LeaderboardResult<T, E = LeaderboardError> = std::result::Result<T, E>;
