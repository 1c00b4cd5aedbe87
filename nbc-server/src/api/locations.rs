//! Woreda and kebele lookup endpoints (public)

use axum::{
    extract::{Path, State},
    Json,
};
use nbc_common::db::locations;
use serde::Serialize;
use serde_json::{json, Value};

use crate::error::ApiResult;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct KebeleList {
    pub woreda: String,
    pub kebeles: Vec<String>,
}

/// GET /api/woredas
pub async fn list_woredas(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let woredas = locations::list_woredas(&state.db).await?;
    Ok(Json(json!({ "woredas": woredas })))
}

/// GET /api/woredas/:name/kebeles
///
/// Unknown woredas yield an empty list.
pub async fn list_kebeles(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<Json<KebeleList>> {
    let kebeles = locations::kebele_names_for_woreda(&state.db, &name).await?;
    Ok(Json(KebeleList { woreda: name, kebeles }))
}
