//! Page, liveness, asset and fallback routes.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use tower::ServiceExt;

use lti_tool::{create_router, RouterConfig};

use super::test_utils::{body_json, body_string, get, test_router, test_router_with_manifest, MockLtiService};

const MANIFEST: &str = r#"{
    "client/home.ts": {"file": "assets/home-4f2a9c.js", "isEntry": true},
    "client/app.ts": {"file": "assets/app-b81e07.js", "isEntry": true},
    "client/app-init.ts": {"file": "assets/app-init-0c3d11.js", "isEntry": true}
}"#;

// =============================================================================
// Home
// =============================================================================

#[tokio::test]
async fn test_home_page_development_script() {
    let router = test_router(Arc::new(MockLtiService::new()));

    let response = router.oneshot(get("/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let content_type = response.headers().get("content-type").unwrap();
    assert!(content_type.to_str().unwrap().starts_with("text/html"));

    let html = body_string(response).await;
    assert!(html.contains(r#"<h1 class="hero-title">LTI Hello World</h1>"#));
    assert!(html.contains(r#"<script type="module" src="/client/home.js"></script>"#));
    assert!(html.contains("https://&lt;your-host&gt;/lti/register"));
}

#[tokio::test]
async fn test_home_page_uses_manifest_script() {
    let router = test_router_with_manifest(Arc::new(MockLtiService::new()), MANIFEST);

    let html = body_string(router.oneshot(get("/")).await.unwrap()).await;
    assert!(html.contains(r#"src="/assets/home-4f2a9c.js""#));
    assert!(!html.contains("client/home.js"));
}

#[tokio::test]
async fn test_home_page_application_name_is_escaped() {
    let router = create_router(
        Arc::new(MockLtiService::new()),
        RouterConfig::new()
            .with_application_name("Quiz <Beta>")
            .with_tracing(false),
    );

    let html = body_string(router.oneshot(get("/")).await.unwrap()).await;
    assert!(html.contains("<title>Quiz &lt;Beta&gt;</title>"));
    assert!(!html.contains("<Beta>"));
}

// =============================================================================
// Liveness
// =============================================================================

#[tokio::test]
async fn test_up() {
    let router = test_router(Arc::new(MockLtiService::new()));

    let response = router.oneshot(get("/up")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let request_id = response
        .headers()
        .get("x-request-id")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();

    let json = body_json(response).await;
    assert_eq!(json["up"], true);
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
    assert_eq!(json["requestId"], request_id.as_str());
    assert!(json["timestamp"].as_str().is_some());
}

#[tokio::test]
async fn test_request_ids_are_unique() {
    let router = test_router(Arc::new(MockLtiService::new()));

    let first = router.clone().oneshot(get("/up")).await.unwrap();
    let second = router.oneshot(get("/up")).await.unwrap();

    let first_id = first.headers().get("x-request-id").unwrap();
    let second_id = second.headers().get("x-request-id").unwrap();
    assert_ne!(first_id, second_id);
    assert_eq!(first_id.len(), 36);
}

// =============================================================================
// Fallback
// =============================================================================

#[tokio::test]
async fn test_unknown_route_returns_json_404() {
    let router = test_router(Arc::new(MockLtiService::new()));

    let response = router.oneshot(get("/nope/missing")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let request_id = response
        .headers()
        .get("x-request-id")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();

    let json = body_json(response).await;
    assert_eq!(json["error"], "Not found");
    assert_eq!(json["path"], "/nope/missing");
    assert_eq!(json["requestId"], request_id.as_str());
}

#[tokio::test]
async fn test_wrong_method_on_lti_route() {
    let router = test_router(Arc::new(MockLtiService::new()));

    let request = Request::builder()
        .method("DELETE")
        .uri("/lti/launch")
        .header("host", "tool.example")
        .body(Body::empty())
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

// =============================================================================
// Client Assets
// =============================================================================

fn asset_router(dir: &std::path::Path) -> axum::Router {
    create_router(
        Arc::new(MockLtiService::new()),
        RouterConfig::new().with_assets_dir(dir).with_tracing(false),
    )
}

#[tokio::test]
async fn test_serves_built_assets() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir(dir.path().join("assets")).unwrap();
    std::fs::write(
        dir.path().join("assets/app-b81e07.js"),
        "console.log('launch');",
    )
    .unwrap();

    let router = asset_router(dir.path());
    let response = router
        .oneshot(get("/assets/app-b81e07.js"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers().get("content-type").unwrap();
    assert!(content_type.to_str().unwrap().contains("javascript"));
    // Files keep their own validator and are not buffered for an ETag
    assert!(response.headers().contains_key("last-modified"));
    assert!(response.headers().get("etag").is_none());
    assert_eq!(body_string(response).await, "console.log('launch');");
}

#[tokio::test]
async fn test_missing_asset_falls_back_to_404() {
    let dir = tempfile::tempdir().unwrap();
    let router = asset_router(dir.path());

    let response = router.oneshot(get("/assets/gone.js")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let json = body_json(response).await;
    assert_eq!(json["error"], "Not found");
    assert_eq!(json["path"], "/assets/gone.js");
}

#[tokio::test]
async fn test_routes_win_over_assets() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("up"), "shadowed").unwrap();

    let router = asset_router(dir.path());
    let response = router.oneshot(get("/up")).await.unwrap();

    let json = body_json(response).await;
    assert_eq!(json["up"], true);
}
