//! nbc-server library - nursery back check web service
//!
//! Public data-entry forms for field staff, plus login-protected record
//! review, CSV/ZIP export and woreda/kebele administration.

use axum::extract::DefaultBodyLimit;
use axum::Router;
use nbc_common::attachments::Uploader;
use sqlx::SqlitePool;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod error;
pub mod forms;
pub mod intake;
pub mod session;
pub mod ui;
pub mod view;

/// Upper bound for a request body; photos and audio arrive inline as base64
pub const MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Audio clip storage client
    pub uploader: Uploader,
    /// Lifetime of a login session
    pub session_ttl: chrono::Duration,
}

impl AppState {
    /// Create new application state
    pub fn new(db: SqlitePool, uploader: Uploader, session_ttl: chrono::Duration) -> Self {
        Self {
            db,
            uploader,
            session_ttl,
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::middleware;

    // Protected routes (require a login session)
    let protected = Router::new()
        .merge(ui::protected_routes())
        .merge(api::protected_routes())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            session::require_session,
        ));

    // Public routes (entry forms, lookups, health)
    let public = Router::new()
        .merge(ui::public_routes())
        .merge(api::public_routes());

    Router::new()
        .merge(protected)
        .merge(public)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
