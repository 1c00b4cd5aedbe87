//! Back check JSON endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use nbc_common::db::{back_checks, Table};
use nbc_common::models::{BackCheck, NewBackCheck};
use serde::Deserialize;
use tracing::info;

use crate::error::ApiResult;
use crate::intake;
use crate::AppState;

/// Optional projection: `?columns=id,woreda,total_guava_sockets`
#[derive(Debug, Default, Deserialize)]
pub struct ColumnsQuery {
    pub columns: Option<String>,
}

impl ColumnsQuery {
    /// Requested columns, or `default` when none were given
    pub fn resolve<'a>(&'a self, default: &[&'a str]) -> Vec<&'a str> {
        match self.columns.as_deref() {
            Some(list) if !list.trim().is_empty() => list
                .split(',')
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .collect(),
            _ => default.to_vec(),
        }
    }
}

/// POST /api/back-checks (public)
pub async fn create_back_check(
    State(state): State<AppState>,
    Json(input): Json<NewBackCheck>,
) -> ApiResult<(StatusCode, Json<BackCheck>)> {
    let record = intake::store_back_check(&state, &input).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// GET /api/back-checks
pub async fn list_back_checks(
    State(state): State<AppState>,
    Query(query): Query<ColumnsQuery>,
) -> ApiResult<Json<Table>> {
    let columns = query.resolve(back_checks::EXPORT_COLUMNS);
    let table = back_checks::project_columns(&state.db, &columns).await?;
    Ok(Json(table))
}

/// GET /api/back-checks/:id
pub async fn get_back_check(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<BackCheck>> {
    Ok(Json(back_checks::get(&state.db, id).await?))
}

/// DELETE /api/back-checks/:id
pub async fn delete_back_check(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    back_checks::delete(&state.db, id).await?;
    info!("Deleted back check {} via API", id);
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_columns_query_resolution() {
        let none = ColumnsQuery::default();
        assert_eq!(none.resolve(&["id", "woreda"]), vec!["id", "woreda"]);

        let some = ColumnsQuery { columns: Some(" id , kebele,,".to_string()) };
        assert_eq!(some.resolve(&["id", "woreda"]), vec!["id", "kebele"]);
    }
}
