//! Login and logout

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use nbc_common::auth;
use serde::Deserialize;
use tracing::{error, info, warn};

use crate::session::{clear_cookie, safe_next, session_cookie, session_token};
use crate::ui::layout::{escape, page};
use crate::view::{Flash, Page, ViewState};
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    pub next: Option<String>,
}

fn login_html(view: &ViewState, username: &str, next: Option<&str>) -> String {
    let body = format!(
        r#"<h2>Admin login</h2>
<form method="post" action="/login" class="entry-form login">
    <input type="hidden" name="next" value="{next}">
    <div class="field"><label for="username">Username</label><input type="text" id="username" name="username" value="{username}" autocomplete="username" required></div>
    <div class="field"><label for="password">Password</label><input type="password" id="password" name="password" autocomplete="current-password" required></div>
    <button type="submit" class="primary">Login</button>
</form>"#,
        next = escape(safe_next(next)),
        username = escape(username),
    );
    page(view, &body)
}

/// GET /login
pub async fn login_page(Query(query): Query<NextQuery>) -> Html<String> {
    let view = ViewState::new(Page::Login);
    Html(login_html(&view, "", query.next.as_deref()))
}

/// POST /login
pub async fn login_submit(State(state): State<AppState>, Form(form): Form<LoginForm>) -> Response {
    let username = form.username.trim();
    let next = form.next.as_deref();

    let (status, message) = match auth::verify_credentials(&state.db, username, &form.password).await {
        Ok(true) => match auth::create_session(&state.db, username, state.session_ttl).await {
            Ok(token) => {
                info!("User {} logged in", username);
                return (
                    [(header::SET_COOKIE, session_cookie(&token, state.session_ttl))],
                    Redirect::to(safe_next(next)),
                )
                    .into_response();
            }
            Err(e) => {
                error!("Failed to create session for {}: {}", username, e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Login failed, please retry")
            }
        },
        Ok(false) => {
            warn!("Failed login attempt for {:?}", username);
            (StatusCode::UNAUTHORIZED, "Invalid username or password")
        }
        Err(e) => {
            error!("Credential check failed: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Login failed, please retry")
        }
    };

    let view = ViewState::new(Page::Login).with_flash(Flash::error(message));
    (status, Html(login_html(&view, username, next))).into_response()
}

/// POST /logout
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Some(token) = session_token(&headers) {
        if let Err(e) = auth::delete_session(&state.db, &token).await {
            warn!("Failed to delete session: {}", e);
        }
    }
    (
        [(header::SET_COOKIE, clear_cookie())],
        Redirect::to(Page::BackCheckForm.path()),
    )
        .into_response()
}
