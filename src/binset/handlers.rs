//! HTTP handlers for binset operations

use super::controller::BinsetController;
use super::export::{self, Locale};
use super::model::Binset;
use super::shape::Action;
use crate::core::{ApiError, AuthContext, AuthProvider, Caller, Page};
use axum::{
    Json,
    body::{Body, Bytes},
    extract::{FromRef, Path, Query, State},
    http::{Method, header},
    response::Response,
};
use chrono::Local;
use futures::StreamExt;
use std::collections::HashMap;
use std::sync::Arc;

/// Application state shared across binset handlers
#[derive(Clone)]
pub struct BinsetAppState {
    pub controller: Arc<BinsetController>,
    pub auth: Arc<dyn AuthProvider>,
}

impl FromRef<BinsetAppState> for Arc<dyn AuthProvider> {
    fn from_ref(state: &BinsetAppState) -> Self {
        state.auth.clone()
    }
}

/// Row ids are integers; anything else cannot name a row.
fn parse_id(raw: &str) -> Result<i64, ApiError> {
    raw.parse::<i64>().map_err(|_| ApiError::NotFound)
}

/// List binsets
///
/// GET /binset/?bin_name__icontains=a&ordering=-create_time&page=2
pub async fn list_binsets(
    State(state): State<BinsetAppState>,
    Caller(caller): Caller,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Page<Binset>>, ApiError> {
    let page = state.controller.list(&caller, &params).await?;
    Ok(Json(page))
}

/// Get one binset
///
/// GET /binset/{id}/
pub async fn get_binset(
    State(state): State<BinsetAppState>,
    Caller(caller): Caller,
    Path(id): Path<String>,
) -> Result<Json<Binset>, ApiError> {
    let id = parse_id(&id)?;
    let row = state.controller.retrieve(&caller, id).await?;
    Ok(Json(row))
}

/// Create a binset owned by the caller
///
/// POST /binset/
pub async fn create_binset(
    State(state): State<BinsetAppState>,
    Caller(caller): Caller,
    body: Bytes,
) -> Result<Json<Binset>, ApiError> {
    let payload = Action::Create.shape().decode(&body)?;
    let row = state.controller.create(&caller, payload).await?;
    Ok(Json(row))
}

/// Replace every writable field of a binset
///
/// PUT /binset/{id}/
pub async fn update_binset(
    State(state): State<BinsetAppState>,
    Caller(caller): Caller,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<Binset>, ApiError> {
    write_binset(state, caller, Action::Update, &id, &body).await
}

/// Update some writable fields of a binset
///
/// PATCH /binset/{id}/
pub async fn partial_update_binset(
    State(state): State<BinsetAppState>,
    Caller(caller): Caller,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<Binset>, ApiError> {
    write_binset(state, caller, Action::PartialUpdate, &id, &body).await
}

async fn write_binset(
    state: BinsetAppState,
    caller: AuthContext,
    action: Action,
    id: &str,
    body: &[u8],
) -> Result<Json<Binset>, ApiError> {
    let id = parse_id(id)?;
    let row = state.controller.update(&caller, action, id, body).await?;
    Ok(Json(row))
}

/// Soft-delete a binset
///
/// DELETE /binset/{id}/
pub async fn delete_binset(
    State(state): State<BinsetAppState>,
    Caller(caller): Caller,
    Path(id): Path<String>,
) -> Result<Json<Binset>, ApiError> {
    let id = parse_id(&id)?;
    let row = state.controller.destroy(&caller, id).await?;
    Ok(Json(row))
}

/// Stream the caller's binsets as a CSV attachment
///
/// GET /binset/file/?lang=zh-hans
pub async fn export_binsets(
    State(state): State<BinsetAppState>,
    Caller(caller): Caller,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Response, ApiError> {
    let locale = Locale::from_lang(params.get("lang").map(String::as_str));
    let filename = export::export_filename(Local::now());

    let lines = state.controller.export(&caller, locale).await?.inspect(|line| {
        if let Err(e) = line {
            tracing::error!(error = %e, "binset export aborted");
        }
    });

    Response::builder()
        .header(header::CONTENT_TYPE, "text/csv")
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", filename),
        )
        .body(Body::from_stream(lines))
        .map_err(|e| ApiError::Internal(format!("failed to build export response: {}", e)))
}

/// Reject methods the resource does not route
pub async fn method_not_allowed(method: Method) -> ApiError {
    ApiError::method_not_allowed(method.as_str())
}
