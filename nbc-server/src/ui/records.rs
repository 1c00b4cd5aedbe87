//! Protected data views, deletion and downloads

use axum::{
    extract::{Path, Query, State},
    http::header,
    response::{Html, IntoResponse, Redirect, Response},
    Extension,
};
use nbc_common::db::{back_checks, farmers, Table};
use nbc_common::export::{photo_archive, to_csv};
use nbc_common::Error;
use serde::Deserialize;
use tracing::{info, warn};

use crate::error::ApiResult;
use crate::session::CurrentUser;
use crate::ui::layout::{page, render_table};
use crate::view::{Flash, Page, ViewState};
use crate::AppState;

pub const BACK_CHECK_CSV: &str = "nursery_back_checks.csv";
pub const FARMER_CSV: &str = "farmer_distribution.csv";
pub const PHOTO_ZIP: &str = "nursery_photos.zip";

/// Outcome of a redirecting POST, carried back in the query string
#[derive(Debug, Default, Deserialize)]
pub struct Notice {
    pub deleted: Option<i64>,
    pub missing: Option<i64>,
}

impl Notice {
    fn apply(&self, view: ViewState) -> ViewState {
        let view = match self.deleted {
            Some(id) => view.with_flash(Flash::success(format!("Record {} deleted", id))),
            None => view,
        };
        match self.missing {
            Some(id) => view.with_flash(Flash::error(format!("Record {} does not exist", id))),
            None => view,
        }
    }
}

fn download(body: impl IntoResponse, content_type: &str, filename: &str) -> Response {
    (
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        body,
    )
        .into_response()
}

fn records_body(table: &Table, delete_prefix: &str, downloads: &str) -> String {
    let action = |id: i64| format!("{}/{}/delete", delete_prefix, id);
    format!(
        r#"<div class="toolbar"><span>{} record(s)</span>{}</div>{}"#,
        table.len(),
        downloads,
        render_table(table, Some(&action))
    )
}

/// GET /records
pub async fn records_page(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Query(notice): Query<Notice>,
) -> ApiResult<Html<String>> {
    let table = back_checks::project_columns(&state.db, back_checks::EXPORT_COLUMNS).await?;
    let view = notice.apply(ViewState::new(Page::Records).with_user(Some(user)));

    let downloads = r#"<a class="button" href="/records/export.csv">Download CSV</a> <a class="button" href="/records/photos.zip">Download photos (ZIP)</a>"#;
    Ok(Html(page(&view, &records_body(&table, "/records", downloads))))
}

/// POST /records/:id/delete
pub async fn delete_record(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> ApiResult<Redirect> {
    match back_checks::delete(&state.db, id).await {
        Ok(()) => {
            info!("{} deleted back check {}", user, id);
            Ok(Redirect::to(&format!("/records?deleted={}", id)))
        }
        Err(Error::NotFound(_)) => Ok(Redirect::to(&format!("/records?missing={}", id))),
        Err(e) => Err(e.into()),
    }
}

/// GET /records/export.csv
pub async fn export_records_csv(State(state): State<AppState>) -> ApiResult<Response> {
    let table = back_checks::project_columns(&state.db, back_checks::EXPORT_COLUMNS).await?;
    Ok(download(to_csv(&table), "text/csv; charset=utf-8", BACK_CHECK_CSV))
}

/// GET /records/photos.zip
pub async fn export_photos_zip(State(state): State<AppState>) -> ApiResult<Response> {
    let records = back_checks::list_with_photos(&state.db).await?;
    let archive = photo_archive(&records)?;
    if !archive.skipped.is_empty() {
        warn!("Photo archive skipped undecodable records: {:?}", archive.skipped);
    }
    info!("Photo archive with {} entries", archive.entries.len());
    Ok(download(archive.bytes, "application/zip", PHOTO_ZIP))
}

/// GET /farmers
pub async fn farmers_page(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Query(notice): Query<Notice>,
) -> ApiResult<Html<String>> {
    let table = farmers::project_columns(&state.db, farmers::EXPORT_COLUMNS).await?;
    let view = notice.apply(ViewState::new(Page::Farmers).with_user(Some(user)));

    let downloads = r#"<a class="button" href="/farmers/export.csv">Download CSV</a>"#;
    Ok(Html(page(&view, &records_body(&table, "/farmers", downloads))))
}

/// POST /farmers/:id/delete
pub async fn delete_farmer(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> ApiResult<Redirect> {
    match farmers::delete(&state.db, id).await {
        Ok(()) => {
            info!("{} deleted farmer {}", user, id);
            Ok(Redirect::to(&format!("/farmers?deleted={}", id)))
        }
        Err(Error::NotFound(_)) => Ok(Redirect::to(&format!("/farmers?missing={}", id))),
        Err(e) => Err(e.into()),
    }
}

/// GET /farmers/export.csv
pub async fn export_farmers_csv(State(state): State<AppState>) -> ApiResult<Response> {
    let table = farmers::project_columns(&state.db, farmers::EXPORT_COLUMNS).await?;
    Ok(download(to_csv(&table), "text/csv; charset=utf-8", FARMER_CSV))
}
