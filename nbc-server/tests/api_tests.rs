//! Integration tests for nbc-server routes
//!
//! Tests cover:
//! - Health endpoint (no auth required)
//! - Public entry: JSON create and HTML form submission, draft preservation
//! - Login guard: 401 JSON for the API, redirect for HTML pages
//! - Login/logout session flow
//! - Record listing, deletion, CSV and ZIP downloads
//! - Woreda → kebele lookup
//! - Audio clips stored through a local object-storage server

use axum::{
    body::Body,
    http::{header, HeaderMap, Method, Request, StatusCode, Uri},
    Router,
};
use chrono::Duration;
use nbc_common::attachments::Uploader;
use nbc_common::auth;
use nbc_common::config::UploadConfig;
use nbc_common::db::{back_checks, farmers, init_database, locations};
use nbc_server::{build_router, AppState};
use serde_json::{json, Value};
use sqlx::SqlitePool;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tower::util::ServiceExt; // for `oneshot` method

const USERNAME: &str = "supervisor";
const PASSWORD: &str = "nursery-pass-01";

/// Test helper: fresh database in a temp folder
async fn setup_test_db() -> (TempDir, SqlitePool) {
    let dir = TempDir::new().unwrap();
    let pool = init_database(&dir.path().join("nursery.db")).await.unwrap();
    auth::upsert_user(&pool, USERNAME, PASSWORD).await.unwrap();
    (dir, pool)
}

/// Test helper: app with uploads disabled
fn setup_app(db: SqlitePool) -> Router {
    build_router(AppState::new(db, Uploader::disabled(), Duration::hours(12)))
}

/// Test helper: local object storage answering every request with `status`
///
/// Returns the upload endpoint and the `(method, path, authorization)` of
/// each request it received.
async fn setup_storage(status: StatusCode) -> (String, Arc<Mutex<Vec<(String, String, Option<String>)>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let log = seen.clone();
    let storage = Router::new().fallback(move |method: Method, uri: Uri, headers: HeaderMap| {
        let log = log.clone();
        async move {
            let authorization = headers
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            log.lock()
                .unwrap()
                .push((method.to_string(), uri.path().to_string(), authorization));
            status
        }
    });

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, storage).await.unwrap();
    });
    (format!("http://{}/voice-notes", addr), seen)
}

/// Test helper: app uploading audio to `endpoint`
fn setup_app_with_storage(db: SqlitePool, endpoint: &str) -> Router {
    let uploader = Uploader::new(Some(UploadConfig {
        endpoint: endpoint.to_string(),
        token: Some("field-token".to_string()),
    }))
    .unwrap();
    build_router(AppState::new(db, uploader, Duration::hours(12)))
}

fn test_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn form_request(uri: &str, fields: &[(&str, &str)], cookie: Option<&str>) -> Request<Body> {
    let body = fields
        .iter()
        .map(|(k, v)| format!("{}={}", k, v.replace(' ', "+")))
        .collect::<Vec<_>>()
        .join("&");
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body)).unwrap()
}

fn with_cookie(method: &str, uri: &str, cookie: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::COOKIE, cookie)
        .body(Body::empty())
        .unwrap()
}

async fn body_bytes(body: Body) -> Vec<u8> {
    axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body")
        .to_vec()
}

async fn extract_json(body: Body) -> Value {
    serde_json::from_slice(&body_bytes(body).await).expect("Should parse JSON")
}

async fn extract_text(body: Body) -> String {
    String::from_utf8(body_bytes(body).await).expect("Should be UTF-8")
}

/// Log in and return the `Cookie` header value for the session
async fn login(app: &Router) -> String {
    let response = app
        .clone()
        .oneshot(form_request(
            "/login",
            &[("username", USERNAME), ("password", PASSWORD), ("next", "/records")],
            None,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/records");

    let set_cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
    assert!(set_cookie.contains("HttpOnly"));
    set_cookie.split(';').next().unwrap().to_string()
}

fn merawi_back_check() -> Value {
    json!({
        "woreda": "Merawi",
        "kebele": "Abasem",
        "checker_fa_name": "Derese",
        "fenced": "Yes",
        "guava": { "beds": 3, "length": 12.0, "sockets": 13 },
        "gesho": { "beds": 2, "length": 8.5, "sockets": 12 }
    })
}

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn test_health_endpoint_no_auth_required() {
    let (_dir, db) = setup_test_db().await;
    let app = setup_app(db);

    let response = app.oneshot(test_request("GET", "/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "nbc-server");
    assert_eq!(body["database"], true);
    assert!(body["version"].is_string());
}

// =============================================================================
// Public entry
// =============================================================================

#[tokio::test]
async fn test_json_back_check_create_derives_fields() {
    let (_dir, db) = setup_test_db().await;
    let app = setup_app(db.clone());

    let response = app
        .oneshot(json_request("POST", "/api/back-checks", merawi_back_check()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["guava"]["total_sockets"], 39);
    assert_eq!(body["gesho"]["total_sockets"], 24);
    assert_eq!(body["auto_remark"], "Guava: Correct | Gesho: -4");

    let stored = back_checks::get(&db, body["id"].as_i64().unwrap()).await.unwrap();
    assert_eq!(stored.fenced, "Yes");
}

#[tokio::test]
async fn test_json_back_check_missing_required_fields() {
    let (_dir, db) = setup_test_db().await;
    let app = setup_app(db.clone());

    let response = app
        .oneshot(json_request("POST", "/api/back-checks", json!({ "woreda": "Merawi" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
    assert!(body["error"]["message"].as_str().unwrap().contains("kebele"));
    assert_eq!(back_checks::count(&db).await.unwrap(), 0);
}

#[tokio::test]
async fn test_json_negative_measurement_rejected() {
    let (_dir, db) = setup_test_db().await;
    let app = setup_app(db.clone());

    let mut input = merawi_back_check();
    input["lemon"] = json!({ "beds": -1, "length": 0.0, "sockets": 13 });

    let response = app
        .oneshot(json_request("POST", "/api/back-checks", input))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(back_checks::count(&db).await.unwrap(), 0);
}

#[tokio::test]
async fn test_form_submission_stores_record() {
    let (_dir, db) = setup_test_db().await;
    let app = setup_app(db.clone());

    let response = app
        .oneshot(form_request(
            "/back-check",
            &[
                ("woreda", "W1"),
                ("kebele", "Abasem"),
                ("checker_fa_name", "Derese"),
                ("fenced", "No"),
                ("guava_beds", "2"),
                ("guava_length", "10"),
                ("guava_sockets", "13"),
            ],
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let html = extract_text(response.into_body()).await;
    assert!(html.contains("flash-success"));
    assert!(html.contains("Guava: Correct"));

    let records = back_checks::list(&db).await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].woreda, "W1");
    assert_eq!(records[0].guava.total_sockets, 26);
    assert_eq!(records[0].lemon.total_sockets, 0);
}

#[tokio::test]
async fn test_invalid_form_preserves_draft_without_writing() {
    let (_dir, db) = setup_test_db().await;
    let app = setup_app(db.clone());

    let response = app
        .oneshot(form_request(
            "/back-check",
            &[("woreda", "Merawi"), ("cluster", "C-07"), ("guava_beds", "3")],
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let html = extract_text(response.into_body()).await;
    assert!(html.contains(r#"name="woreda" value="Merawi""#));
    assert!(html.contains(r#"name="cluster" value="C-07""#));
    assert!(html.contains(r#"name="guava_beds" value="3""#));
    assert!(html.contains("Kebele is required"));
    assert_eq!(back_checks::count(&db).await.unwrap(), 0);
}

#[tokio::test]
async fn test_farmer_saved_when_audio_upload_unavailable() {
    let (_dir, db) = setup_test_db().await;
    let app = setup_app(db.clone());

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/farmers",
            json!({
                "name": "Tsehay",
                "woreda": "Merawi",
                "kebele": "Abasem",
                "counts": { "moringa": 20, "papaya": 4 },
                "audio": "data:audio/ogg;base64,T2dnUwACAAAAAAAAAAA="
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = extract_json(response.into_body()).await;
    assert!(body["warning"].as_str().unwrap().contains("without audio"));
    assert!(body["farmer"]["audio_url"].is_null());

    let stored = farmers::list(&db).await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].counts.total(), 24);
}

#[tokio::test]
async fn test_farmer_audio_uploaded_and_url_stored() {
    let (_dir, db) = setup_test_db().await;
    let (endpoint, seen) = setup_storage(StatusCode::OK).await;
    let app = setup_app_with_storage(db.clone(), &endpoint);

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/farmers",
            json!({
                "name": "Tsehay",
                "woreda": "Merawi",
                "kebele": "Abasem",
                "counts": { "moringa": 20 },
                "audio": "data:audio/ogg;base64,T2dnUwACAAAAAAAAAAA="
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = extract_json(response.into_body()).await;
    assert!(body.get("warning").is_none());
    let audio_url = body["farmer"]["audio_url"].as_str().unwrap().to_string();
    assert!(audio_url.starts_with(&format!("{}/", endpoint)), "{}", audio_url);
    assert!(audio_url.ends_with(".ogg"), "{}", audio_url);

    let requests = seen.lock().unwrap().clone();
    assert_eq!(requests.len(), 1);
    let (method, path, authorization) = &requests[0];
    assert_eq!(method, "PUT");
    assert!(audio_url.ends_with(path.as_str()));
    assert_eq!(authorization.as_deref(), Some("Bearer field-token"));

    let stored = farmers::list(&db).await.unwrap();
    assert_eq!(stored[0].audio_url.as_deref(), Some(audio_url.as_str()));
}

#[tokio::test]
async fn test_farmer_form_saved_when_storage_rejects_audio() {
    let (_dir, db) = setup_test_db().await;
    let (endpoint, seen) = setup_storage(StatusCode::INTERNAL_SERVER_ERROR).await;
    let app = setup_app_with_storage(db.clone(), &endpoint);

    let response = app
        .oneshot(form_request(
            "/farmers/new",
            &[
                ("name", "Almaz"),
                ("woreda", "Merawi"),
                ("kebele", "Abasem"),
                ("papaya_count", "6"),
                ("audio", "T2dnUwACAAAAAAAAAAA="),
            ],
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let html = extract_text(response.into_body()).await;
    assert!(html.contains("flash-success"));
    assert!(html.contains("flash-warning"));
    assert!(html.contains("Record saved without audio"));
    assert_eq!(seen.lock().unwrap().len(), 1);

    let stored = farmers::list(&db).await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].name, "Almaz");
    assert_eq!(stored[0].audio_url, None);
}

#[tokio::test]
async fn test_oversized_counts_rejected_before_storage() {
    let (_dir, db) = setup_test_db().await;
    let (endpoint, seen) = setup_storage(StatusCode::OK).await;
    let app = setup_app_with_storage(db.clone(), &endpoint);

    let mut input = merawi_back_check();
    input["guava"] = json!({ "beds": 5_000_000_000i64, "length": 0.0, "sockets": 5_000_000_000i64 });
    let response = app
        .clone()
        .oneshot(json_request("POST", "/api/back-checks", input))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = extract_json(response.into_body()).await;
    assert!(body["error"]["message"].as_str().unwrap().contains("Guava beds"));

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/farmers",
            json!({
                "name": "Tsehay",
                "woreda": "Merawi",
                "kebele": "Abasem",
                "counts": { "wanza": i64::MAX, "guava": i64::MAX },
                "audio": "T2dnUwACAAAAAAAAAAA="
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .oneshot(form_request(
            "/back-check",
            &[
                ("woreda", "Merawi"),
                ("kebele", "Abasem"),
                ("checker_fa_name", "Derese"),
                ("lemon_sockets", "9000000000"),
            ],
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    assert!(seen.lock().unwrap().is_empty());
    assert_eq!(back_checks::count(&db).await.unwrap(), 0);
    assert!(farmers::list(&db).await.unwrap().is_empty());
}

// =============================================================================
// Login guard
// =============================================================================

#[tokio::test]
async fn test_api_listing_requires_session() {
    let (_dir, db) = setup_test_db().await;
    let app = setup_app(db);

    let response = app.oneshot(test_request("GET", "/api/back-checks")).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_records_page_redirects_to_login() {
    let (_dir, db) = setup_test_db().await;
    let app = setup_app(db);

    let response = app.oneshot(test_request("GET", "/records")).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/login?next=/records");
}

#[tokio::test]
async fn test_wrong_password_rejected() {
    let (_dir, db) = setup_test_db().await;
    let app = setup_app(db);

    let response = app
        .oneshot(form_request(
            "/login",
            &[("username", USERNAME), ("password", "not-the-password")],
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.headers().get(header::SET_COOKIE).is_none());
}

#[tokio::test]
async fn test_login_then_logout() {
    let (_dir, db) = setup_test_db().await;
    let app = setup_app(db);
    let cookie = login(&app).await;

    let response = app
        .clone()
        .oneshot(with_cookie("GET", "/records", &cookie))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let html = extract_text(response.into_body()).await;
    assert!(html.contains(USERNAME));

    let response = app
        .clone()
        .oneshot(with_cookie("POST", "/logout", &cookie))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let response = app
        .oneshot(with_cookie("GET", "/api/back-checks", &cookie))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

// =============================================================================
// Records, deletion and downloads
// =============================================================================

#[tokio::test]
async fn test_list_get_delete_back_checks() {
    let (_dir, db) = setup_test_db().await;
    let app = setup_app(db.clone());
    let cookie = login(&app).await;

    let created = back_checks::create(&db, &serde_json::from_value(merawi_back_check()).unwrap())
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(with_cookie("GET", "/api/back-checks?columns=id,woreda,total_gesho_sockets", &cookie))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let table = extract_json(response.into_body()).await;
    assert_eq!(table["columns"], json!(["id", "woreda", "total_gesho_sockets"]));
    assert_eq!(table["rows"][0], json!([created.id, "Merawi", 24]));

    let uri = format!("/api/back-checks/{}", created.id);
    let response = app.clone().oneshot(with_cookie("GET", &uri, &cookie)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.clone().oneshot(with_cookie("DELETE", &uri, &cookie)).await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app.oneshot(with_cookie("GET", &uri, &cookie)).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_nonexistent_record() {
    let (_dir, db) = setup_test_db().await;
    let app = setup_app(db.clone());
    let cookie = login(&app).await;

    back_checks::create(&db, &serde_json::from_value(merawi_back_check()).unwrap())
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(with_cookie("DELETE", "/api/back-checks/9999", &cookie))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"]["code"], "NOT_FOUND");

    let response = app
        .oneshot(with_cookie("POST", "/records/9999/delete", &cookie))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/records?missing=9999");

    assert_eq!(back_checks::count(&db).await.unwrap(), 1);
}

#[tokio::test]
async fn test_csv_download() {
    let (_dir, db) = setup_test_db().await;
    let app = setup_app(db.clone());
    let cookie = login(&app).await;

    for _ in 0..3 {
        back_checks::create(&db, &serde_json::from_value(merawi_back_check()).unwrap())
            .await
            .unwrap();
    }

    let response = app
        .oneshot(with_cookie("GET", "/records/export.csv", &cookie))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers()[header::CONTENT_TYPE].to_str().unwrap().starts_with("text/csv"));
    assert!(response.headers()[header::CONTENT_DISPOSITION]
        .to_str()
        .unwrap()
        .contains("nursery_back_checks.csv"));

    let csv = extract_text(response.into_body()).await;
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 4);
    assert_eq!(lines[0], back_checks::EXPORT_COLUMNS.join(","));
}

#[tokio::test]
async fn test_photo_zip_download() {
    let (_dir, db) = setup_test_db().await;
    let app = setup_app(db.clone());
    let cookie = login(&app).await;

    let mut input = merawi_back_check();
    input["photo"] = json!("data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAQAAAC1HAwCAAAAC0lEQVR42mNkYAAAAAYAAjCB0C8AAAAASUVORK5CYII=");
    let response = app
        .clone()
        .oneshot(json_request("POST", "/api/back-checks", input))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .oneshot(with_cookie("GET", "/records/photos.zip", &cookie))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/zip");

    let bytes = body_bytes(response.into_body()).await;
    assert!(bytes.starts_with(b"PK"));

    let stored = back_checks::list(&db).await.unwrap();
    assert!(stored[0].photo.as_deref().unwrap().starts_with("iVBORw0KGgo"));
}

// =============================================================================
// Locations
// =============================================================================

#[tokio::test]
async fn test_kebele_lookup_is_public() {
    let (_dir, db) = setup_test_db().await;
    let merawi = locations::create_woreda(&db, "Merawi").await.unwrap();
    locations::create_kebele(&db, merawi.id, "Wetet Abay").await.unwrap();
    locations::create_kebele(&db, merawi.id, "Abasem").await.unwrap();
    let app = setup_app(db);

    let response = app
        .clone()
        .oneshot(test_request("GET", "/api/woredas/Merawi/kebeles"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["kebeles"], json!(["Abasem", "Wetet Abay"]));

    let response = app
        .oneshot(test_request("GET", "/api/woredas/Nowhere/kebeles"))
        .await
        .unwrap();
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["kebeles"], json!([]));
}

#[tokio::test]
async fn test_location_admin_flow() {
    let (_dir, db) = setup_test_db().await;
    let app = setup_app(db.clone());
    let cookie = login(&app).await;

    let response = app
        .clone()
        .oneshot(form_request("/locations/woredas", &[("name", "Merawi")], Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let woreda = locations::find_woreda_by_name(&db, "Merawi").await.unwrap().unwrap();
    let response = app
        .clone()
        .oneshot(form_request(
            &format!("/locations/woredas/{}/kebeles", woreda.id),
            &[("name", "Abasem")],
            Some(&cookie),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(locations::kebele_names_for_woreda(&db, "Merawi").await.unwrap(), vec!["Abasem"]);

    // Duplicate woreda re-renders the page with 409
    let response = app
        .clone()
        .oneshot(form_request("/locations/woredas", &[("name", "Merawi")], Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = app
        .oneshot(form_request(
            &format!("/locations/woredas/{}/delete", woreda.id),
            &[],
            Some(&cookie),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert!(locations::kebele_names_for_woreda(&db, "Merawi").await.unwrap().is_empty());
}
