use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::households::HouseholdError;

#[derive(Debug)]
pub enum AppError {
    Unauthorized,
    Forbidden(String),
    BadRequest(String),
    NotFound(String),
    Conflict(String),
    Gone(String),
    /// Infrastructure failure whose message is safe to show to the user.
    Unavailable(String),
    Internal(String),
    Database(sqlx::Error),
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unauthorized => write!(f, "Authentication required"),
            Self::Forbidden(msg) => write!(f, "{msg}"),
            Self::BadRequest(msg) => write!(f, "{msg}"),
            Self::NotFound(msg) => write!(f, "{msg}"),
            Self::Conflict(msg) => write!(f, "{msg}"),
            Self::Gone(msg) => write!(f, "{msg}"),
            Self::Unavailable(msg) => write!(f, "{msg}"),
            Self::Internal(msg) => write!(f, "Internal error: {msg}"),
            Self::Database(e) => write!(f, "Database error: {e}"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::Unauthorized => (StatusCode::UNAUTHORIZED, self.to_string()),
            Self::Forbidden(_) => (StatusCode::FORBIDDEN, self.to_string()),
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            Self::NotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
            Self::Conflict(_) => (StatusCode::CONFLICT, self.to_string()),
            Self::Gone(_) => (StatusCode::GONE, self.to_string()),
            Self::Unavailable(_) => {
                tracing::error!("{self}");
                (StatusCode::SERVICE_UNAVAILABLE, self.to_string())
            }
            Self::Internal(_) | Self::Database(_) => {
                tracing::error!("{self}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        if status.is_client_error() {
            tracing::warn!(status = status.as_u16(), "{message}");
        }

        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        Self::Database(e)
    }
}

impl From<HouseholdError> for AppError {
    fn from(e: HouseholdError) -> Self {
        let message = e.to_string();
        match e {
            HouseholdError::Validation(_) => Self::BadRequest(message),
            HouseholdError::InvalidCode => Self::NotFound(message),
            HouseholdError::ExpiredCode | HouseholdError::ExhaustedCode => Self::Gone(message),
            HouseholdError::AlreadyMember => Self::Conflict(message),
            HouseholdError::NotAdmin => Self::Forbidden(message),
            HouseholdError::HouseholdNotFound(_) => {
                tracing::error!("invite references a missing household: {message}");
                Self::NotFound("Household not found".into())
            }
            HouseholdError::HouseholdCreationFailed(_) => {
                Self::Unavailable("Could not create the household, please try again".into())
            }
            HouseholdError::MembershipCreationFailed { .. } => {
                tracing::error!("{message}");
                Self::Unavailable("Could not set up the household, please try again".into())
            }
            HouseholdError::InviteCreationFailed(_) => {
                Self::Unavailable("Could not create an invite code, please try again".into())
            }
            HouseholdError::JoinFailed(_) => {
                Self::Unavailable("Could not join the household, please try again".into())
            }
            HouseholdError::Store(_) => Self::Internal(message),
        }
    }
}
