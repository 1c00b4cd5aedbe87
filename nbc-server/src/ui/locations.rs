//! Woreda / kebele administration page

use axum::{
    extract::{Path, Query, State},
    response::{Html, IntoResponse, Redirect, Response},
    Extension, Form,
};
use nbc_common::db::locations;
use serde::Deserialize;
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::session::CurrentUser;
use crate::ui::layout::{escape, page};
use crate::view::{Flash, Page, ViewState};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct NameForm {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct LocationNotice {
    pub added: Option<String>,
    pub removed: Option<String>,
}

async fn locations_html(state: &AppState, view: &ViewState) -> ApiResult<String> {
    let woredas = locations::list_woredas(&state.db).await?;

    let mut body = String::from(
        r#"<h2>Woredas &amp; Kebeles</h2>
<form method="post" action="/locations/woredas" class="inline-form">
    <input type="text" name="name" placeholder="New woreda / አዲስ ወረዳ" required>
    <button type="submit" class="primary">Add woreda</button>
</form>"#,
    );

    if woredas.is_empty() {
        body.push_str(r#"<p class="empty">No woredas configured. Entry forms accept free text until one is added.</p>"#);
    }

    for woreda in &woredas {
        let kebeles = locations::list_kebeles(&state.db, woreda.id).await?;
        let items: String = kebeles
            .iter()
            .map(|k| {
                format!(
                    r#"<li>{} <form method="post" action="/locations/kebeles/{}/delete" class="inline"><button type="submit" class="link danger">remove</button></form></li>"#,
                    escape(&k.name),
                    k.id
                )
            })
            .collect();

        body.push_str(&format!(
            r#"<section class="woreda">
    <h3>{name} <form method="post" action="/locations/woredas/{id}/delete" class="inline" onsubmit="return confirm('Delete woreda and all its kebeles?')"><button type="submit" class="danger">Delete</button></form></h3>
    <ul>{items}</ul>
    <form method="post" action="/locations/woredas/{id}/kebeles" class="inline-form">
        <input type="text" name="name" placeholder="New kebele / አዲስ ቀበሌ" required>
        <button type="submit">Add kebele</button>
    </form>
</section>"#,
            name = escape(&woreda.name),
            id = woreda.id,
            items = items,
        ));
    }

    Ok(page(view, &body))
}

/// Re-render the page with the failure as a flash, keeping the error's status
async fn failure(state: &AppState, user: String, err: ApiError) -> Response {
    let (status, _) = err.status_and_code();
    let view = ViewState::new(Page::Locations)
        .with_user(Some(user))
        .with_flash(Flash::error(err.message()));
    match locations_html(state, &view).await {
        Ok(html) => (status, Html(html)).into_response(),
        Err(e) => e.into_response(),
    }
}

fn back_to_page(notice: &str, name: &str) -> Redirect {
    Redirect::to(&format!(
        "/locations?{}={}",
        notice,
        crate::session::encode_query_value(name)
    ))
}

/// GET /locations
pub async fn locations_page(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Query(notice): Query<LocationNotice>,
) -> ApiResult<Html<String>> {
    let mut view = ViewState::new(Page::Locations).with_user(Some(user));
    if let Some(name) = notice.added {
        view = view.with_flash(Flash::success(format!("{} added", name)));
    }
    if let Some(name) = notice.removed {
        view = view.with_flash(Flash::success(format!("{} removed", name)));
    }
    Ok(Html(locations_html(&state, &view).await?))
}

/// POST /locations/woredas
pub async fn add_woreda(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Form(form): Form<NameForm>,
) -> Response {
    match locations::create_woreda(&state.db, &form.name).await {
        Ok(woreda) => {
            info!("{} added woreda {}", user, woreda.name);
            back_to_page("added", &woreda.name).into_response()
        }
        Err(e) => failure(&state, user, e.into()).await,
    }
}

/// POST /locations/woredas/:id/delete
pub async fn remove_woreda(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Response {
    let result = match locations::get_woreda(&state.db, id).await {
        Ok(woreda) => locations::delete_woreda(&state.db, id).await.map(|_| woreda),
        Err(e) => Err(e),
    };
    match result {
        Ok(woreda) => {
            info!("{} deleted woreda {} with its kebeles", user, woreda.name);
            back_to_page("removed", &woreda.name).into_response()
        }
        Err(e) => failure(&state, user, e.into()).await,
    }
}

/// POST /locations/woredas/:id/kebeles
pub async fn add_kebele(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(woreda_id): Path<i64>,
    Form(form): Form<NameForm>,
) -> Response {
    match locations::create_kebele(&state.db, woreda_id, &form.name).await {
        Ok(kebele) => {
            info!("{} added kebele {} to woreda {}", user, kebele.name, woreda_id);
            back_to_page("added", &kebele.name).into_response()
        }
        Err(e) => failure(&state, user, e.into()).await,
    }
}

/// POST /locations/kebeles/:id/delete
pub async fn remove_kebele(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Response {
    let result = match locations::get_kebele(&state.db, id).await {
        Ok(kebele) => locations::delete_kebele(&state.db, id).await.map(|_| kebele),
        Err(e) => Err(e),
    };
    match result {
        Ok(kebele) => {
            info!("{} deleted kebele {}", user, kebele.name);
            back_to_page("removed", &kebele.name).into_response()
        }
        Err(e) => failure(&state, user, e.into()).await,
    }
}
