// Integration tests for the tab HTTP surface

mod common;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use common::{backends, memory_logger, shim_for, FakeDevices, FakeHost, FakeRecorderFactory};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use teams_audio_tab::host::IdentityProvider;
use teams_audio_tab::media::ArtifactStore;
use teams_audio_tab::remote::{FunctionClient, RemoteCallWidget};
use teams_audio_tab::tab::{create_router, AppState, Tab};
use tower::ServiceExt;

struct TestApp {
    router: Router,
    state: AppState,
    devices: Arc<FakeDevices>,
}

async fn create_test_app(theme: &str, with_function: bool) -> TestApp {
    let host = Arc::new(FakeHost::with_theme(theme));
    let devices = Arc::new(FakeDevices::new(1));
    let recorders = Arc::new(FakeRecorderFactory::new(vec![vec![82, 73, 70, 70], vec![0, 1]]));
    let (logger, _) = memory_logger("Tab");

    let function = with_function.then(|| {
        let client =
            FunctionClient::new("http://localhost:1", "getUserProfile", Duration::from_secs(2))
                .unwrap();
        let identity: Arc<dyn IdentityProvider> = host.clone();
        RemoteCallWidget::new(Some(identity), client, logger.child("RemoteCall"))
    });

    let tab = Tab::mount(
        "Audio Tab",
        shim_for(&host),
        backends(&devices, &recorders),
        ArtifactStore::default(),
        function,
        logger,
    )
    .await;

    let state = AppState::new(tab);
    TestApp {
        router: create_router(state.clone()),
        state,
        devices,
    }
}

async fn send(app: &TestApp, method: &str, uri: &str) -> (StatusCode, Vec<u8>) {
    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, body.to_vec())
}

async fn send_json(app: &TestApp, method: &str, uri: &str) -> (StatusCode, Value) {
    let (status, body) = send(app, method, uri).await;
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn test_health_check() {
    let app = create_test_app("default", false).await;
    let (status, body) = send(&app, "GET", "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"OK");
}

#[tokio::test]
async fn test_tab_view_reflects_host_context() {
    let app = create_test_app("dark", false).await;
    let (status, view) = send_json(&app, "GET", "/tab").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["theme_class"], "dark");
    assert_eq!(view["welcome"]["title"], "Audio Tab");
    assert_eq!(view["welcome"]["host_name"], "Teams");
    assert_eq!(view["welcome"]["show_function"], false);
    assert_eq!(view["capture_open"], false);
    assert!(view["function"].is_null());
}

#[tokio::test]
async fn test_capture_routes_require_open_panel() {
    let app = create_test_app("default", false).await;

    let (status, body) = send_json(&app, "POST", "/tab/capture/start").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Audio capture panel is not open");

    let (status, _) = send_json(&app, "GET", "/tab/capture").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(app.devices.requests(), 0);
}

#[tokio::test]
async fn test_record_and_fetch_artifact() {
    let app = create_test_app("default", false).await;

    let (status, toggled) = send_json(&app, "POST", "/tab/capture/toggle").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(toggled["capture_open"], true);

    let (_, view) = send_json(&app, "POST", "/tab/capture/start").await;
    assert_eq!(view["state"], "recording");
    assert_eq!(view["is_recording"], true);

    let (_, view) = send_json(&app, "POST", "/tab/capture/stop").await;
    assert_eq!(view["state"], "idle");
    let url = view["artifact"]["url"].as_str().unwrap().to_string();
    assert_eq!(view["playback"]["url"], url.as_str());
    assert_eq!(view["artifact"]["size_bytes"], 6);

    let response = app
        .router
        .clone()
        .oneshot(Request::builder().uri(&url).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "audio/fake");
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&bytes[..], &[82u8, 73, 70, 70, 0, 1]);
}

#[tokio::test]
async fn test_closing_panel_releases_device_and_artifact() {
    let app = create_test_app("default", false).await;

    send_json(&app, "POST", "/tab/capture/toggle").await;
    send_json(&app, "POST", "/tab/capture/start").await;
    assert_eq!(app.devices.live_tracks(), 1);

    let (_, toggled) = send_json(&app, "POST", "/tab/capture/toggle").await;
    assert_eq!(toggled["capture_open"], false);
    assert_eq!(app.devices.live_tracks(), 0);
    assert!(app.state.artifacts.is_empty());
    assert!(!app.state.tab.lock().await.capture_open());
}

#[tokio::test]
async fn test_unknown_artifact_is_not_found() {
    let app = create_test_app("default", false).await;
    let (status, body) = send_json(&app, "GET", "/artifacts/does-not-exist").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Artifact does-not-exist not found");
}

#[tokio::test]
async fn test_device_error_can_be_dismissed() {
    let app = create_test_app("default", false).await;
    app.devices.fail_next("blocked by policy");

    send_json(&app, "POST", "/tab/capture/toggle").await;
    let (_, view) = send_json(&app, "POST", "/tab/capture/start").await;
    assert_eq!(view["state"], "idle");
    assert!(view["error"]
        .as_str()
        .unwrap()
        .contains("blocked by policy"));

    let (status, view) = send_json(&app, "DELETE", "/tab/capture/error").await;
    assert_eq!(status, StatusCode::OK);
    assert!(view["error"].is_null());
}

#[tokio::test]
async fn test_function_routes_without_function() {
    let app = create_test_app("default", false).await;

    let (status, _) = send_json(&app, "GET", "/tab/function").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send_json(&app, "POST", "/tab/function/reload").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_function_reload_reports_error() {
    let app = create_test_app("contrast", true).await;

    let (status, view) = send_json(&app, "GET", "/tab/function").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["function_name"], "getUserProfile");
    assert_eq!(view["loading"], false);

    let (status, view) = send_json(&app, "POST", "/tab/function/reload").await;
    assert_eq!(status, StatusCode::OK);
    assert!(view["data"].is_null());
    assert!(view["error"]
        .as_str()
        .unwrap()
        .starts_with("Cannot call Azure Functions due to network error"));

    let (_, tab) = send_json(&app, "GET", "/tab").await;
    assert_eq!(tab["theme_class"], "contrast");
    assert_eq!(tab["welcome"]["show_function"], true);
}
