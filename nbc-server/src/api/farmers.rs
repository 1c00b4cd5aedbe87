//! Farmer JSON endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use nbc_common::db::{farmers, Table};
use nbc_common::models::{Farmer, NewFarmer};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::back_checks::ColumnsQuery;
use crate::error::ApiResult;
use crate::intake;
use crate::AppState;

/// Farmer record plus an optional base64 audio clip
#[derive(Debug, Deserialize)]
pub struct CreateFarmerRequest {
    #[serde(flatten)]
    pub farmer: NewFarmer,
    #[serde(default)]
    pub audio: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreateFarmerResponse {
    pub farmer: Farmer,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

/// POST /api/farmers (public)
pub async fn create_farmer(
    State(state): State<AppState>,
    Json(request): Json<CreateFarmerRequest>,
) -> ApiResult<(StatusCode, Json<CreateFarmerResponse>)> {
    let saved = intake::store_farmer(&state, request.farmer, request.audio.as_deref()).await?;
    Ok((
        StatusCode::CREATED,
        Json(CreateFarmerResponse {
            farmer: saved.record,
            warning: saved.warning,
        }),
    ))
}

/// GET /api/farmers
pub async fn list_farmers(
    State(state): State<AppState>,
    Query(query): Query<ColumnsQuery>,
) -> ApiResult<Json<Table>> {
    let columns = query.resolve(farmers::EXPORT_COLUMNS);
    Ok(Json(farmers::project_columns(&state.db, &columns).await?))
}

/// GET /api/farmers/:id
pub async fn get_farmer(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Json<Farmer>> {
    Ok(Json(farmers::get(&state.db, id).await?))
}

/// DELETE /api/farmers/:id
pub async fn delete_farmer(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<StatusCode> {
    farmers::delete(&state.db, id).await?;
    info!("Deleted farmer {} via API", id);
    Ok(StatusCode::NO_CONTENT)
}
