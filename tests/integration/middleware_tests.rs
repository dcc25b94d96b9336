//! Cross-cutting behavior: security headers, ETags, CORS and error
//! translation.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;

use lti_tool::error::LtiError;
use lti_tool::server::middleware::CONTENT_SECURITY_POLICY;

use super::test_utils::{
    assert_error_body, body_json, form_post, get, test_router, MockLtiService, TOOL_HOST,
};

// =============================================================================
// Security Headers
// =============================================================================

fn assert_security_headers(response: &axum::response::Response) {
    let headers = response.headers();
    assert_eq!(headers.get("x-frame-options").unwrap(), "ALLOWALL");
    assert_eq!(headers.get("x-content-type-options").unwrap(), "nosniff");
    assert_eq!(headers.get("x-xss-protection").unwrap(), "1; mode=block");
    assert_eq!(
        headers.get("referrer-policy").unwrap(),
        "strict-origin-when-cross-origin"
    );
    assert_eq!(
        headers.get("content-security-policy").unwrap(),
        CONTENT_SECURITY_POLICY
    );
}

#[tokio::test]
async fn test_security_headers_on_pages() {
    let router = test_router(Arc::new(MockLtiService::new()));

    let response = router.oneshot(get("/")).await.unwrap();
    assert_security_headers(&response);

    let csp = response
        .headers()
        .get("content-security-policy")
        .unwrap()
        .to_str()
        .unwrap();
    assert!(csp.contains("frame-ancestors *"));
}

#[tokio::test]
async fn test_security_headers_on_errors() {
    let router = test_router(Arc::new(MockLtiService::new()));

    let response = router.clone().oneshot(get("/missing")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_security_headers(&response);

    let response = router
        .oneshot(get("/lti/names_and_roles"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_security_headers(&response);
}

// =============================================================================
// ETag
// =============================================================================

#[tokio::test]
async fn test_etag_on_get() {
    let router = test_router(Arc::new(MockLtiService::new()));

    let first = router.clone().oneshot(get("/")).await.unwrap();
    let second = router.oneshot(get("/")).await.unwrap();

    let etag = first.headers().get("etag").unwrap().to_str().unwrap();
    assert!(etag.starts_with('"') && etag.ends_with('"'));
    assert_eq!(etag.len(), 66);
    // Same page, same tag
    assert_eq!(second.headers().get("etag").unwrap(), etag);
}

#[tokio::test]
async fn test_if_none_match_returns_304() {
    let router = test_router(Arc::new(MockLtiService::new()));

    let response = router.clone().oneshot(get("/lti/jwks")).await.unwrap();
    let etag = response
        .headers()
        .get("etag")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    let full_length = response.into_body().collect().await.unwrap().to_bytes().len();

    let request = Request::builder()
        .uri("/lti/jwks")
        .header("host", TOOL_HOST)
        .header("if-none-match", &etag)
        .body(Body::empty())
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_MODIFIED);
    assert_eq!(response.headers().get("etag").unwrap(), etag.as_str());
    // Never a zero length for a non-empty representation
    assert_eq!(
        response.headers().get("content-length").unwrap(),
        full_length.to_string().as_str()
    );

    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert!(body.is_empty());
}

#[tokio::test]
async fn test_stale_if_none_match_returns_body() {
    let router = test_router(Arc::new(MockLtiService::new()));

    let request = Request::builder()
        .uri("/lti/jwks")
        .header("host", TOOL_HOST)
        .header("if-none-match", "\"stale\"")
        .body(Body::empty())
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_json(response).await["keys"].is_array());
}

#[tokio::test]
async fn test_no_etag_on_post_or_errors() {
    let router = test_router(Arc::new(MockLtiService::new()));

    let response = router
        .clone()
        .oneshot(form_post("/lti/launch", "id_token=a.b.c"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get("etag").is_none());

    let response = router.oneshot(get("/missing")).await.unwrap();
    assert!(response.headers().get("etag").is_none());
}

// =============================================================================
// CORS
// =============================================================================

#[tokio::test]
async fn test_cors_preflight_mirrors_origin() {
    let router = test_router(Arc::new(MockLtiService::new()));

    let request = Request::builder()
        .method("OPTIONS")
        .uri("/lti/names_and_roles")
        .header("host", TOOL_HOST)
        .header("origin", "https://canvas.example")
        .header("access-control-request-method", "GET")
        .header("access-control-request-headers", "authorization")
        .body(Body::empty())
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    assert!(response.status().is_success());

    let headers = response.headers();
    assert_eq!(
        headers.get("access-control-allow-origin").unwrap(),
        "https://canvas.example"
    );
    assert_eq!(
        headers.get("access-control-allow-credentials").unwrap(),
        "true"
    );
    assert_eq!(headers.get("access-control-max-age").unwrap(), "86400");

    let methods = headers
        .get("access-control-allow-methods")
        .unwrap()
        .to_str()
        .unwrap();
    assert!(methods.contains("GET") && methods.contains("POST"));
}

#[tokio::test]
async fn test_cors_on_lti_response() {
    let router = test_router(Arc::new(MockLtiService::new()));

    let request = Request::builder()
        .uri("/lti/jwks")
        .header("host", TOOL_HOST)
        .header("origin", "https://canvas.example")
        .body(Body::empty())
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    let headers = response.headers();
    assert_eq!(
        headers.get("access-control-allow-origin").unwrap(),
        "https://canvas.example"
    );

    let exposed = headers
        .get("access-control-expose-headers")
        .unwrap()
        .to_str()
        .unwrap();
    assert!(exposed.contains("x-request-id"));
}

#[tokio::test]
async fn test_no_cors_outside_lti_routes() {
    let router = test_router(Arc::new(MockLtiService::new()));

    let request = Request::builder()
        .uri("/")
        .header("host", TOOL_HOST)
        .header("origin", "https://canvas.example")
        .body(Body::empty())
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    assert!(response
        .headers()
        .get("access-control-allow-origin")
        .is_none());
}

// =============================================================================
// Error Translation
// =============================================================================

#[tokio::test]
async fn test_transport_error_is_hidden() {
    let service = Arc::new(
        MockLtiService::new()
            .with_launch_error(LtiError::Transport("connection refused (10.0.0.7:8787)".into())),
    );
    let router = test_router(service);

    let response = router
        .oneshot(form_post("/lti/launch", "id_token=a.b.c"))
        .await
        .unwrap();

    assert_error_body(
        response,
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal server error",
    )
    .await;
}

#[tokio::test]
async fn test_invalid_component_response_is_internal() {
    let service = Arc::new(
        MockLtiService::new().with_launch_error(LtiError::InvalidResponse("launch: eof".into())),
    );
    let router = test_router(service);

    let response = router
        .oneshot(form_post("/lti/launch", "id_token=a.b.c"))
        .await
        .unwrap();

    let json = body_json(response).await;
    assert_eq!(json["error"], "Internal server error");
    assert!(!json.to_string().contains("eof"));
}

#[tokio::test]
async fn test_handler_panic_becomes_internal_error() {
    let router = test_router(Arc::new(MockLtiService::new().panicking_on_jwks()));

    let response = router.oneshot(get("/lti/jwks")).await.unwrap();

    assert_security_headers(&response);
    assert_error_body(
        response,
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal server error",
    )
    .await;
}
