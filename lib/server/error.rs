use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use tracing::error;

use crate::logging::format_error_report;
use crate::repository::StoreError;
use crate::swimlane::SwimlaneError;

const STATUS_LONG_MESSAGE: &str =
    "Status can only be one of the following: [backlog | in-progress | complete].";

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct ErrorResponse {
    pub message: String,
    pub long_message: String,
}

impl ErrorResponse {
    fn new(message: &str, long_message: &str) -> Self {
        Self {
            message: message.to_string(),
            long_message: long_message.to_string(),
        }
    }
}

/// Every way a request can fail, before it is rendered as `{message, long_message}`.
#[derive(Debug)]
pub enum ApiError {
    IdNotAnInteger,
    IdNotFound,
    InvalidStatus,
    InvalidPriority,
    InvalidBody(String),
    Store(StoreError),
}

impl ApiError {
    /// Stable label used for the rejection metric.
    pub fn reason(&self) -> &'static str {
        match self {
            ApiError::IdNotAnInteger | ApiError::IdNotFound => "invalid_id",
            ApiError::InvalidStatus => "invalid_status",
            ApiError::InvalidPriority => "invalid_priority",
            ApiError::InvalidBody(_) => "invalid_body",
            ApiError::Store(_) => "store",
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::ClientNotFound(_) => ApiError::IdNotFound,
            StoreError::Swimlane(swimlane) => swimlane.into(),
            other => ApiError::Store(other),
        }
    }
}

impl From<SwimlaneError> for ApiError {
    fn from(err: SwimlaneError) -> Self {
        match err {
            SwimlaneError::InvalidStatus(_) => ApiError::InvalidStatus,
            SwimlaneError::InvalidPriority(_) => ApiError::InvalidPriority,
            SwimlaneError::RecordNotFound { .. } => ApiError::IdNotFound,
        }
    }
}

pub fn map_api_error(err: ApiError) -> (StatusCode, Json<ErrorResponse>) {
    let (status, body) = match err {
        ApiError::IdNotAnInteger => (
            StatusCode::BAD_REQUEST,
            ErrorResponse::new("Invalid id provided.", "Id can only be integer."),
        ),
        ApiError::IdNotFound => (
            StatusCode::BAD_REQUEST,
            ErrorResponse::new("Invalid id provided.", "Cannot find client with that id."),
        ),
        ApiError::InvalidStatus => (
            StatusCode::BAD_REQUEST,
            ErrorResponse::new("Invalid status provided.", STATUS_LONG_MESSAGE),
        ),
        ApiError::InvalidPriority => (
            StatusCode::BAD_REQUEST,
            ErrorResponse::new(
                "Invalid priority provided.",
                "Priority can only be positive integer.",
            ),
        ),
        ApiError::InvalidBody(detail) => (
            StatusCode::BAD_REQUEST,
            ErrorResponse::new("Invalid request body.", &detail),
        ),
        ApiError::Store(store) => {
            error!(
                event = "client_store_failed",
                report = %format_error_report(&store),
                "client store operation failed"
            );
            let status = match store {
                StoreError::TaskJoin(_) => StatusCode::SERVICE_UNAVAILABLE,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            };
            (
                status,
                ErrorResponse::new("Internal server error.", "The client store is unavailable."),
            )
        }
    };
    (status, Json(body))
}
