//! HTTP API tests for cfm-recorder
//!
//! Drive the full router with `oneshot` against an in-memory database and
//! a scripted catalog lookup.

mod helpers;

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use cfm_common::db::init_memory_database;
use cfm_recorder::api::identity::{ROLES_HEADER, USER_ID_HEADER, USER_NAME_HEADER};
use cfm_recorder::{build_router, AppState};
use helpers::{candidate, FakeCatalog};
use serde_json::{json, Value};
use tower::util::ServiceExt; // for `oneshot` method
use uuid::Uuid;

struct TestApp {
    app: axum::Router,
    catalog: Arc<FakeCatalog>,
}

/// Test helper: Create app with in-memory state and default threshold 80
async fn setup_app() -> TestApp {
    let pool = init_memory_database().await.expect("memory database");
    let catalog = FakeCatalog::new();
    let state = AppState::new(pool, catalog.clone(), 80);
    TestApp {
        app: build_router(state),
        catalog,
    }
}

/// Test helper: Request on behalf of `user`
fn request(method: &str, uri: &str, user: Uuid, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(USER_ID_HEADER, user.to_string())
        .header(USER_NAME_HEADER, "tester");
    send_body(builder, body)
}

fn admin_request(method: &str, uri: &str, user: Uuid) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(USER_ID_HEADER, user.to_string())
        .header(ROLES_HEADER, "user,admin");
    send_body(builder, None)
}

fn send_body(builder: axum::http::request::Builder, body: Option<Value>) -> Request<Body> {
    match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// Test helper: Extract JSON body from response
async fn extract_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body");
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}

fn playback_body() -> Value {
    json!({
        "artists": ["abc"],
        "recordingTitle": "xyz",
        "releaseTitle": "the album",
        "trackLength": 210,
        "timestamp": 1600000000
    })
}

async fn create(t: &TestApp, user: Uuid, uri: &str) -> Value {
    let response = t
        .app
        .clone()
        .oneshot(request("POST", uri, user, Some(playback_body())))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    extract_json(response.into_body()).await
}

// =============================================================================
// Health / build info
// =============================================================================

#[tokio::test]
async fn test_health_endpoint_no_identity_required() {
    let t = setup_app().await;

    let response = t
        .app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "cfm-recorder");
    assert_eq!(body["database"], true);
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn test_buildinfo_endpoint() {
    let t = setup_app().await;

    let response = t
        .app
        .oneshot(Request::builder().uri("/api/buildinfo").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert!(body["git_hash"].is_string());
    assert!(body["build_profile"].is_string());
}

// =============================================================================
// Identity
// =============================================================================

#[tokio::test]
async fn test_missing_identity_is_unauthorized() {
    let t = setup_app().await;

    let response = t
        .app
        .oneshot(
            Request::builder()
                .uri("/api/v1/playbacks")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_list_all_requires_admin() {
    let t = setup_app().await;
    let user = Uuid::new_v4();

    let response = t
        .app
        .clone()
        .oneshot(request("GET", "/api/v1/playbacks/all", user, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    create(&t, user, "/api/v1/playbacks").await;
    create(&t, Uuid::new_v4(), "/api/v1/playbacks").await;

    let response = t
        .app
        .oneshot(admin_request("GET", "/api/v1/playbacks/all", Uuid::new_v4()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["total_elements"], 2);
}

// =============================================================================
// Playbacks
// =============================================================================

#[tokio::test]
async fn test_create_resolved_playback() {
    let t = setup_app().await;
    let best = candidate(92);
    t.catalog.answer(vec![best.clone()]);

    let body = create(&t, Uuid::new_v4(), "/api/v1/playbacks").await;

    assert_eq!(body["broken"], false);
    assert_eq!(body["recordingId"], best.recording_id.to_string());
    assert_eq!(body["releaseGroupId"], best.release_group_id.to_string());
    // Canonical names from the catalog
    assert_eq!(body["recordingTitle"], "Xyz");
    assert_eq!(body["artists"], json!(["Abc"]));
}

#[tokio::test]
async fn test_threshold_query_overrides_default() {
    let t = setup_app().await;
    t.catalog.answer(vec![candidate(60)]);

    let broken = create(&t, Uuid::new_v4(), "/api/v1/playbacks").await;
    assert_eq!(broken["broken"], true);
    assert!(broken["recordingId"].is_null());

    let resolved = create(&t, Uuid::new_v4(), "/api/v1/playbacks?threshold=50").await;
    assert_eq!(resolved["broken"], false);
}

#[tokio::test]
async fn test_create_validation_error() {
    let t = setup_app().await;

    let response = t
        .app
        .clone()
        .oneshot(request(
            "POST",
            "/api/v1/playbacks",
            Uuid::new_v4(),
            Some(json!({"artists": [], "recordingTitle": "xyz", "releaseTitle": "a"})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"]["code"], "BAD_REQUEST");

    let response = t
        .app
        .oneshot(request(
            "POST",
            "/api/v1/playbacks?threshold=150",
            Uuid::new_v4(),
            Some(playback_body()),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_undecodable_input_is_bad_request() {
    let t = setup_app().await;
    let user = Uuid::new_v4();

    let mut wrong_type = playback_body();
    wrong_type["artists"] = json!("abc");
    let mut malformed_id = playback_body();
    malformed_id["id"] = json!("not-a-uuid");

    let cases = vec![
        request("POST", "/api/v1/playbacks", user, Some(wrong_type)),
        request("POST", "/api/v1/playbacks", user, Some(malformed_id)),
        request(
            "POST",
            "/api/v1/playbacks?threshold=high",
            user,
            Some(playback_body()),
        ),
        request("GET", "/api/v1/playbacks?page=first", user, None),
        request("GET", "/api/v1/playbacks/not-a-uuid", user, None),
        request(
            "PUT",
            "/api/v1/now-playing",
            user,
            Some(json!({"artists": "abc", "recordingTitle": "xyz", "releaseTitle": "a"})),
        ),
    ];

    for req in cases {
        let uri = req.uri().to_string();
        let response = t.app.clone().oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{}", uri);
        let body = extract_json(response.into_body()).await;
        assert_eq!(body["error"]["code"], "BAD_REQUEST", "{}", uri);
        assert!(body["error"]["message"].is_string(), "{}", uri);
    }
}

#[tokio::test]
async fn test_patch_with_unknown_field_is_bad_request() {
    let t = setup_app().await;
    let user = Uuid::new_v4();
    let created = create(&t, user, "/api/v1/playbacks").await;
    let uri = format!("/api/v1/playbacks/{}", created["id"].as_str().unwrap());

    let response = t
        .app
        .clone()
        .oneshot(request("PATCH", &uri, user, Some(json!({"recordingId": null}))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"]["code"], "BAD_REQUEST");

    let response = t
        .app
        .oneshot(request("GET", &uri, user, None))
        .await
        .unwrap();
    let body = extract_json(response.into_body()).await;
    assert_eq!(body, created);
}

#[tokio::test]
async fn test_batch_create() {
    let t = setup_app().await;
    let user = Uuid::new_v4();

    let response = t
        .app
        .oneshot(request(
            "POST",
            "/api/v1/playbacks/batch",
            user,
            Some(json!([playback_body(), {"artists": ["abc"]}, playback_body()])),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    let flags: Vec<bool> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["success"].as_bool().unwrap())
        .collect();
    assert_eq!(flags, vec![true, false, true]);
}

#[tokio::test]
async fn test_list_paging_and_broken_filter() {
    let t = setup_app().await;
    let user = Uuid::new_v4();

    t.catalog.answer(vec![candidate(99)]);
    create(&t, user, "/api/v1/playbacks").await;
    t.catalog.answer(vec![]);
    create(&t, user, "/api/v1/playbacks").await;
    create(&t, user, "/api/v1/playbacks").await;

    let response = t
        .app
        .clone()
        .oneshot(request("GET", "/api/v1/playbacks?page=1&size=2", user, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["total_elements"], 3);
    assert_eq!(body["total_pages"], 2);
    assert_eq!(body["items"].as_array().unwrap().len(), 2);

    let response = t
        .app
        .oneshot(request(
            "GET",
            "/api/v1/playbacks?broken=true&direction=asc",
            user,
            None,
        ))
        .await
        .unwrap();
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["total_elements"], 2);
    assert!(body["items"]
        .as_array()
        .unwrap()
        .iter()
        .all(|item| item["broken"] == true));
}

#[tokio::test]
async fn test_get_patch_delete_lifecycle() {
    let t = setup_app().await;
    let user = Uuid::new_v4();
    let created = create(&t, user, "/api/v1/playbacks").await;
    let uri = format!("/api/v1/playbacks/{}", created["id"].as_str().unwrap());

    let response = t
        .app
        .clone()
        .oneshot(request(
            "PATCH",
            &uri,
            user,
            Some(json!({"releaseTitle": "Deluxe", "source": null})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["releaseTitle"], "Deluxe");
    assert_eq!(body["recordingTitle"], "xyz");
    assert_eq!(body["trackLength"], 210);

    let response = t
        .app
        .clone()
        .oneshot(request("GET", &uri, user, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["releaseTitle"], "Deluxe");

    let response = t
        .app
        .clone()
        .oneshot(request("DELETE", &uri, user, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = t
        .app
        .oneshot(request("GET", &uri, user, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_non_owner_gets_forbidden() {
    let t = setup_app().await;
    let owner = Uuid::new_v4();
    let created = create(&t, owner, "/api/v1/playbacks").await;
    let uri = format!("/api/v1/playbacks/{}", created["id"].as_str().unwrap());

    let response = t
        .app
        .clone()
        .oneshot(request("DELETE", &uri, Uuid::new_v4(), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = t
        .app
        .oneshot(request("GET", &uri, owner, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_detect_endpoint() {
    let t = setup_app().await;
    let user = Uuid::new_v4();
    let created = create(&t, user, "/api/v1/playbacks").await;
    assert_eq!(created["broken"], true);
    let uri = format!(
        "/api/v1/playbacks/{}/detect",
        created["id"].as_str().unwrap()
    );

    t.catalog.go_down();
    let response = t
        .app
        .clone()
        .oneshot(request("POST", &uri, user, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"]["code"], "LOOKUP_UNAVAILABLE");

    t.catalog.answer(vec![candidate(85)]);
    let response = t
        .app
        .oneshot(request("POST", &uri, user, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["broken"], false);
}

#[tokio::test]
async fn test_accumulated_broken_endpoint() {
    let t = setup_app().await;
    let user = Uuid::new_v4();
    create(&t, user, "/api/v1/playbacks").await;
    create(&t, user, "/api/v1/playbacks").await;

    let response = t
        .app
        .oneshot(request(
            "GET",
            "/api/v1/playbacks/broken/accumulated",
            user,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["items"][0]["occurrences"], 2);
    assert_eq!(body["items"][0]["recordingTitle"], "xyz");
}

// =============================================================================
// Now playing
// =============================================================================

#[tokio::test]
async fn test_now_playing() {
    let t = setup_app().await;
    let user = Uuid::new_v4();

    let response = t
        .app
        .clone()
        .oneshot(request("GET", "/api/v1/now-playing", user, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = t
        .app
        .clone()
        .oneshot(request(
            "PUT",
            "/api/v1/now-playing",
            user,
            Some(json!({"artists": ["abc"], "recordingTitle": "xyz", "releaseTitle": "the album"})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = t
        .app
        .oneshot(request("GET", "/api/v1/now-playing", user, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["recordingTitle"], "xyz");
    assert!(body["expiresAt"].as_i64().unwrap() > 0);
}

#[tokio::test]
async fn test_now_playing_shows_canonical_names() {
    let t = setup_app().await;
    let user = Uuid::new_v4();
    let best = candidate(92);
    t.catalog.answer(vec![best.clone()]);

    let response = t
        .app
        .clone()
        .oneshot(request(
            "PUT",
            "/api/v1/now-playing",
            user,
            Some(json!({"artists": ["abc"], "recordingTitle": "xyz", "releaseTitle": "the album"})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let set = extract_json(response.into_body()).await;
    assert_eq!(set["recordingTitle"], "Xyz");

    let response = t
        .app
        .oneshot(request("GET", "/api/v1/now-playing", user, None))
        .await
        .unwrap();
    let body = extract_json(response.into_body()).await;
    assert_eq!(body, set);
    assert_eq!(body["artists"], json!(["Abc"]));
    assert_eq!(body["releaseTitle"], "The Album");
    assert_eq!(body["broken"], false);
    assert_eq!(body["recordingId"], best.recording_id.to_string());
}
