//! Public data-entry pages: back check form and farmer distribution form

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
    Form,
};
use nbc_common::db::locations;
use tracing::warn;

use crate::forms::{back_check_form, farmer_form, parse_back_check, parse_farmer, validate, FormValues};
use crate::intake;
use crate::session::current_user;
use crate::ui::layout::{page, render_form, FormContext};
use crate::view::{Flash, Page, ViewState};
use crate::AppState;

const FIX_FIELDS: &str = "Please correct the highlighted fields / እባክዎ የተመለከቱትን ያስተካክሉ";

fn back_check_html(view: &ViewState) -> String {
    page(view, &render_form(&back_check_form(), view, &FormContext::default()))
}

/// Woreda names plus the kebeles of the drafted woreda
///
/// Lookup failures degrade to free-text inputs.
async fn location_context(state: &AppState, woreda: &str) -> FormContext {
    let woredas = match locations::list_woredas(&state.db).await {
        Ok(list) => list.into_iter().map(|w| w.name).collect(),
        Err(e) => {
            warn!("Failed to list woredas: {}", e);
            Vec::new()
        }
    };
    let kebeles = if woreda.is_empty() {
        Vec::new()
    } else {
        locations::kebele_names_for_woreda(&state.db, woreda)
            .await
            .unwrap_or_else(|e| {
                warn!("Failed to list kebeles for {}: {}", woreda, e);
                Vec::new()
            })
    };
    FormContext { woredas, kebeles }
}

async fn farmer_html(state: &AppState, view: &ViewState) -> String {
    let ctx = location_context(state, view.draft_value("woreda")).await;
    page(view, &render_form(&farmer_form(), view, &ctx))
}

/// GET /back-check
pub async fn back_check_page(State(state): State<AppState>, headers: HeaderMap) -> Html<String> {
    let view = ViewState::new(Page::BackCheckForm).with_user(current_user(&state, &headers).await);
    Html(back_check_html(&view))
}

/// POST /back-check
pub async fn submit_back_check(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(values): Form<FormValues>,
) -> Response {
    let view = ViewState::new(Page::BackCheckForm).with_user(current_user(&state, &headers).await);

    let errors = validate(&back_check_form(), &values);
    if !errors.is_empty() {
        let view = view.with_flash(Flash::error(FIX_FIELDS)).with_draft(values, errors);
        return (StatusCode::BAD_REQUEST, Html(back_check_html(&view))).into_response();
    }

    match intake::store_back_check(&state, &parse_back_check(&values)).await {
        Ok(record) => {
            let mut message = format!("Back check #{} saved / መረጃው ተቀምጧል", record.id);
            if let Some(remark) = &record.auto_remark {
                message.push_str(&format!(" ({})", remark));
            }
            let view = view.with_flash(Flash::success(message));
            Html(back_check_html(&view)).into_response()
        }
        Err(e) => {
            let (status, _) = e.status_and_code();
            let view = view
                .with_flash(Flash::error(format!("Not saved: {}", e.message())))
                .with_draft(values, Vec::new());
            (status, Html(back_check_html(&view))).into_response()
        }
    }
}

/// GET /farmers/new
pub async fn farmer_page(State(state): State<AppState>, headers: HeaderMap) -> Html<String> {
    let mut view = ViewState::new(Page::FarmerForm).with_user(current_user(&state, &headers).await);
    if !state.uploader.is_enabled() {
        view = view.with_flash(Flash::warning(
            "Audio storage is not configured; voice notes will not be kept",
        ));
    }
    Html(farmer_html(&state, &view).await)
}

/// POST /farmers/new
pub async fn submit_farmer(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(values): Form<FormValues>,
) -> Response {
    let view = ViewState::new(Page::FarmerForm).with_user(current_user(&state, &headers).await);

    let errors = validate(&farmer_form(), &values);
    if !errors.is_empty() {
        let view = view.with_flash(Flash::error(FIX_FIELDS)).with_draft(values, errors);
        return (StatusCode::BAD_REQUEST, Html(farmer_html(&state, &view).await)).into_response();
    }

    let (farmer, audio) = parse_farmer(&values);
    match intake::store_farmer(&state, farmer, audio.as_deref()).await {
        Ok(saved) => {
            let mut view = view.with_flash(Flash::success(format!(
                "Farmer {} saved ({} seedlings)",
                saved.record.name,
                saved.record.counts.total()
            )));
            if let Some(warning) = saved.warning {
                view = view.with_flash(Flash::warning(warning));
            }
            Html(farmer_html(&state, &view).await).into_response()
        }
        Err(e) => {
            let (status, _) = e.status_and_code();
            let view = view
                .with_flash(Flash::error(format!("Not saved: {}", e.message())))
                .with_draft(values, Vec::new());
            (status, Html(farmer_html(&state, &view).await)).into_response()
        }
    }
}
