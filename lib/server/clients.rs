use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use super::error::{map_api_error, ApiError, ErrorResponse};
use crate::state::AppState;
use crate::swimlane::{ClientChange, ClientRecord, Status};

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ErrorResponse>)>;

#[derive(Debug, Serialize)]
pub struct RootResponse {
    pub message: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct ListClientsQuery {
    status: Option<String>,
}

/// `PUT` body. Fields stay untyped so malformed values get the documented error pair instead
/// of a generic deserialization failure.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateClientBody {
    #[serde(default)]
    status: Option<Value>,
    #[serde(default)]
    priority: Option<Value>,
}

impl UpdateClientBody {
    /// Parses a raw `PUT` body regardless of content type. An empty body means no fields.
    fn from_bytes(raw: &[u8]) -> Result<Self, ApiError> {
        if raw.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        serde_json::from_slice(raw).map_err(|err| ApiError::InvalidBody(err.to_string()))
    }

    fn into_change(self) -> Result<ClientChange, ApiError> {
        let status = match self.status {
            None | Some(Value::Null) => None,
            Some(Value::String(label)) => Some(label),
            Some(_) => return Err(ApiError::InvalidStatus),
        };
        let priority = match self.priority {
            None | Some(Value::Null) => None,
            Some(Value::Number(number)) => Some(integral_priority(&number)?),
            Some(_) => return Err(ApiError::InvalidPriority),
        };
        Ok(ClientChange::new(status.as_deref(), priority)?)
    }
}

/// Accepts `3` and `3.0` alike; fractional values are rejected.
fn integral_priority(number: &serde_json::Number) -> Result<i64, ApiError> {
    if let Some(priority) = number.as_i64() {
        return Ok(priority);
    }
    match number.as_f64() {
        Some(value) if value.fract() == 0.0 && value.abs() < i64::MAX as f64 => Ok(value as i64),
        _ => Err(ApiError::InvalidPriority),
    }
}

/// Ids must be plain base-10 integers; `"12abc"` is rejected rather than truncated.
fn parse_client_id(raw: &str) -> Result<i64, ApiError> {
    raw.parse::<i64>().map_err(|_| ApiError::IdNotAnInteger)
}

fn reject(state: &AppState, err: ApiError) -> (StatusCode, Json<ErrorResponse>) {
    state.metrics.record_rejection(err.reason());
    if !matches!(err, ApiError::Store(_)) {
        warn!(
            event = "client_request_rejected",
            reason = err.reason(),
            error = ?err,
            "rejected client request"
        );
    }
    map_api_error(err)
}

pub async fn root_handler() -> Json<RootResponse> {
    Json(RootResponse {
        message: "SHIPTIVITY API. Read documentation to see API docs",
    })
}

pub async fn list_clients(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListClientsQuery>,
) -> ApiResult<Vec<ClientRecord>> {
    let status = match query.status.as_deref() {
        None | Some("") => None,
        Some(label) => Some(
            label
                .parse::<Status>()
                .map_err(|_| reject(&state, ApiError::InvalidStatus))?,
        ),
    };

    state
        .store
        .list(status)
        .await
        .map(Json)
        .map_err(|err| reject(&state, err.into()))
}

pub async fn get_client(
    State(state): State<Arc<AppState>>,
    Path(raw_id): Path<String>,
) -> ApiResult<ClientRecord> {
    let id = parse_client_id(&raw_id).map_err(|err| reject(&state, err))?;

    match state.store.get(id).await {
        Ok(Some(client)) => Ok(Json(client)),
        Ok(None) => Err(reject(&state, ApiError::IdNotFound)),
        Err(err) => Err(reject(&state, err.into())),
    }
}

/// Applies a status and/or priority change and returns every client afterwards.
///
/// Validation order: id syntax, id existence, then the body.
pub async fn update_client(
    State(state): State<Arc<AppState>>,
    Path(raw_id): Path<String>,
    body: Bytes,
) -> ApiResult<Vec<ClientRecord>> {
    let id = parse_client_id(&raw_id).map_err(|err| reject(&state, err))?;

    match state.store.get(id).await {
        Ok(Some(_)) => {}
        Ok(None) => return Err(reject(&state, ApiError::IdNotFound)),
        Err(err) => return Err(reject(&state, err.into())),
    }

    let change = UpdateClientBody::from_bytes(&body)
        .and_then(UpdateClientBody::into_change)
        .map_err(|err| reject(&state, err))?;

    let outcome = state
        .store
        .update(id, change)
        .await
        .map_err(|err| reject(&state, err.into()))?;

    state.metrics.client_updates_total.inc();
    state
        .metrics
        .rows_rewritten_total
        .inc_by(outcome.rows_written as u64);
    Ok(Json(outcome.clients))
}
