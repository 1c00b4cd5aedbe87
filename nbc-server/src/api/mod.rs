//! JSON API handlers

pub mod back_checks;
pub mod farmers;
pub mod health;
pub mod locations;

use axum::{
    routing::{get, post},
    Router,
};

use crate::AppState;

pub use health::health_routes;

/// Endpoints the entry forms and field devices use without a login
pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/api/woredas", get(locations::list_woredas))
        .route("/api/woredas/:name/kebeles", get(locations::list_kebeles))
        .route("/api/back-checks", post(back_checks::create_back_check))
        .route("/api/farmers", post(farmers::create_farmer))
        .merge(health_routes())
}

/// Record listing and deletion, behind the login guard
pub fn protected_routes() -> Router<AppState> {
    Router::new()
        .route("/api/back-checks", get(back_checks::list_back_checks))
        .route(
            "/api/back-checks/:id",
            get(back_checks::get_back_check).delete(back_checks::delete_back_check),
        )
        .route("/api/farmers", get(farmers::list_farmers))
        .route(
            "/api/farmers/:id",
            get(farmers::get_farmer).delete(farmers::delete_farmer),
        )
}
