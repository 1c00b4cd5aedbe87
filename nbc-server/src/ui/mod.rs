//! UI Routes - server-rendered HTML pages
//!
//! # Structure
//! - **Layout** (`layout`): page shell, form and table renderers
//! - **Entry** (`entry`): public back check and farmer forms
//! - **Records** (`records`): protected data views, deletion, CSV/ZIP downloads
//! - **Locations** (`locations`): woreda / kebele administration
//! - **Login** (`login`): login and logout
//! - **Static Assets** (`static_assets`): CSS/JS file serving

use axum::{
    response::Redirect,
    routing::{get, post},
    Router,
};

use crate::view::Page;
use crate::AppState;

pub mod layout;

mod entry;
mod locations;
mod login;
mod records;
mod static_assets;

/// Pages anyone may open
pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(|| async { Redirect::to(Page::BackCheckForm.path()) }))
        .route("/back-check", get(entry::back_check_page).post(entry::submit_back_check))
        .route("/farmers/new", get(entry::farmer_page).post(entry::submit_farmer))
        .route("/login", get(login::login_page).post(login::login_submit))
        .route("/logout", post(login::logout))
        .route("/static/nbc.css", get(static_assets::serve_nbc_css))
        .route("/static/forms.js", get(static_assets::serve_forms_js))
}

/// Pages behind the login guard
pub fn protected_routes() -> Router<AppState> {
    Router::new()
        .route("/records", get(records::records_page))
        .route("/records/:id/delete", post(records::delete_record))
        .route("/records/export.csv", get(records::export_records_csv))
        .route("/records/photos.zip", get(records::export_photos_zip))
        .route("/farmers", get(records::farmers_page))
        .route("/farmers/:id/delete", post(records::delete_farmer))
        .route("/farmers/export.csv", get(records::export_farmers_csv))
        .route("/locations", get(locations::locations_page))
        .route("/locations/woredas", post(locations::add_woreda))
        .route("/locations/woredas/:id/delete", post(locations::remove_woreda))
        .route("/locations/woredas/:id/kebeles", post(locations::add_kebele))
        .route("/locations/kebeles/:id/delete", post(locations::remove_kebele))
}
