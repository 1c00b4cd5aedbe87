//! Static asset handlers
//!
//! Embeds and serves CSS/JS files at compile time

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

const NBC_CSS: &str = include_str!("../../static/nbc.css");
const FORMS_JS: &str = include_str!("../../static/forms.js");

/// GET /static/nbc.css
pub async fn serve_nbc_css() -> Response {
    (
        StatusCode::OK,
        [("content-type", "text/css"), ("cache-control", "no-cache")],
        NBC_CSS,
    )
        .into_response()
}

/// GET /static/forms.js
///
/// Attachment-to-base64 and kebele lookup helpers for the entry forms
pub async fn serve_forms_js() -> Response {
    (
        StatusCode::OK,
        [
            ("content-type", "application/javascript"),
            ("cache-control", "no-cache"),
        ],
        FORMS_JS,
    )
        .into_response()
}
