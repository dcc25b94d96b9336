//! LTI protocol routes: OIDC round trip, launch, dynamic registration and
//! the tool APIs called from the launch page.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use lti_tool::error::LtiError;
use lti_tool::lti::{decode_signed_response, DeepLinkPayload, PlatformResponse};

use super::test_utils::{
    assert_error_body, body_json, body_string, form_post, get, get_with_bearer,
    post_json_with_bearer, test_router, validated_launch, MockLtiService, SIGNED_DEEP_LINK_JWT,
    TOOL_HOST, VALID_TOOL_JWT,
};

// =============================================================================
// Key Set and OIDC
// =============================================================================

#[tokio::test]
async fn test_jwks() {
    let router = test_router(Arc::new(MockLtiService::new()));

    let response = router.oneshot(get("/lti/jwks")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["keys"][0]["kid"], "tool-key-1");
}

#[tokio::test]
async fn test_init_forwards_request_and_init_script() {
    let service = Arc::new(MockLtiService::new());
    let router = test_router(Arc::clone(&service));

    let response = router
        .oneshot(form_post(
            "/lti/init",
            "iss=https%3A%2F%2Fcanvas.instructure.com&login_hint=42&target_link_uri=https%3A%2F%2Ftool.example%2Flti%2Flaunch",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let html = body_string(response).await;
    assert!(html.contains(r#"src="/client/app-init.js""#));

    let forwarded = service.forwarded.read().await;
    assert_eq!(forwarded.len(), 1);
    assert_eq!(forwarded[0].method, "POST");
    assert_eq!(forwarded[0].url, "http://tool.example/lti/init");
    assert_eq!(forwarded[0].form_value("login_hint").as_deref(), Some("42"));
    assert_eq!(
        service.init_scripts.read().await.as_slice(),
        ["client/app-init.js".to_string()]
    );
}

#[tokio::test]
async fn test_redirect_passes_component_response_through() {
    let router = test_router(Arc::new(MockLtiService::new()));

    let response = router
        .oneshot(form_post("/lti/redirect", "id_token=a.b.c&state=xyz"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(
        response.headers().get("location").unwrap(),
        "https://tool.example/lti/launch?state=xyz"
    );
}

#[tokio::test]
async fn test_forwarded_url_honors_proxy_headers() {
    let service = Arc::new(MockLtiService::new());
    let router = test_router(Arc::clone(&service));

    let request = Request::builder()
        .method("POST")
        .uri("/lti/redirect?x=1")
        .header("host", "10.0.0.5:3000")
        .header("x-forwarded-host", "tool.example")
        .header("x-forwarded-proto", "https")
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from("state=s"))
        .unwrap();

    router.oneshot(request).await.unwrap();

    let forwarded = service.forwarded.read().await;
    assert_eq!(forwarded[0].url, "https://tool.example/lti/redirect?x=1");
    assert_eq!(forwarded[0].host(), Some("tool.example"));
}

// =============================================================================
// Launch
// =============================================================================

fn launch_settings(html: &str) -> Value {
    let start = html.find("window.LAUNCH_SETTINGS = ").unwrap() + "window.LAUNCH_SETTINGS = ".len();
    let end = start + html[start..].find(";\n").unwrap();
    serde_json::from_str(&html[start..end]).unwrap()
}

#[tokio::test]
async fn test_launch_renders_page_with_tool_jwt() {
    let service = Arc::new(MockLtiService::new());
    let router = test_router(Arc::clone(&service));

    let response = router
        .oneshot(form_post("/lti/launch", "id_token=a.b.c&state=state-1"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let html = body_string(response).await;
    assert!(html.contains(r#"<div id="main-content"></div>"#));
    assert!(html.contains(r#"<template id="launch-content">"#));
    assert!(html.contains(r#"src="/client/app.js""#));
    assert!(!html.contains("deep-linking-form"));

    let settings = launch_settings(&html);
    assert_eq!(settings["jwt"], VALID_TOOL_JWT);
    assert_eq!(settings["state"], "state-1");
    assert_eq!(settings["stateVerified"], true);
    assert!(settings.get("deepLinking").is_none());
}

#[tokio::test]
async fn test_launch_tool_jwt_claims() {
    let service = Arc::new(MockLtiService::new());
    let router = test_router(Arc::clone(&service));

    router
        .oneshot(form_post("/lti/launch", "id_token=a.b.c&state=state-1"))
        .await
        .unwrap();

    let issued = service.tool_jwts.read().await;
    assert_eq!(issued.len(), 1);

    let claims = &issued[0];
    assert_eq!(claims.iss, format!("https://{}", TOOL_HOST));
    assert_eq!(claims.client_id, "10000000000042");
    assert_eq!(claims.aud, "10000000000042");
    assert_eq!(claims.deployment_id, "7:deployment");
    assert_eq!(claims.platform_iss, "https://canvas.instructure.com");
    assert_eq!(claims.sub, "learner-1");
    assert_eq!(
        claims.names_and_roles_endpoint_url.as_deref(),
        Some("https://canvas.example/api/lti/courses/1/names_and_roles")
    );
    assert!(claims.deep_link_claim_data.is_none());
    assert_eq!(claims.exp - claims.iat, 3600);
}

#[tokio::test]
async fn test_deep_linking_launch_renders_form() {
    let service = Arc::new(MockLtiService::new().with_launch(validated_launch(true)));
    let router = test_router(Arc::clone(&service));

    let response = router
        .oneshot(form_post("/lti/launch", "id_token=a.b.c&state=state-1"))
        .await
        .unwrap();
    let html = body_string(response).await;

    assert!(html.contains(r#"<button id="deep-linking-button">Deep Link</button>"#));
    assert!(html.contains(r#"<form id="deep-linking-form" method="post">"#));
    assert!(html.contains(r#"<input id="deep-link-jwt" type="hidden" name="JWT" value="" />"#));

    let settings = launch_settings(&html);
    assert_eq!(
        settings["deepLinking"]["deep_link_return_url"],
        "https://canvas.example/courses/1/deep_link"
    );

    let issued = service.tool_jwts.read().await;
    assert_eq!(issued[0].deep_link_claim_data, Some(json!("opaque-data")));
}

#[tokio::test]
async fn test_launch_protocol_error_keeps_status_and_body() {
    let service = Arc::new(
        MockLtiService::new()
            .with_launch_error(LtiError::protocol(StatusCode::FORBIDDEN, "Invalid state")),
    );
    let router = test_router(service);

    let response = router
        .oneshot(form_post("/lti/launch", "id_token=a.b.c&state=forged"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert!(response.headers().get("x-request-id").is_some());
    assert_eq!(body_string(response).await, "Invalid state");
}

#[tokio::test]
async fn test_launch_without_host_is_rejected() {
    let service = Arc::new(MockLtiService::new());
    let router = test_router(Arc::clone(&service));

    let request = Request::builder()
        .method("POST")
        .uri("/lti/launch")
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from("id_token=a.b.c"))
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    assert_error_body(response, StatusCode::BAD_REQUEST, "Host header is required").await;

    // Rejected before the launch reached the component
    assert!(service.forwarded.read().await.is_empty());
}

// =============================================================================
// Dynamic Registration
// =============================================================================

#[tokio::test]
async fn test_registration_page() {
    let router = test_router(Arc::new(MockLtiService::new()));

    let response = router
        .oneshot(get(
            "/lti/register?openid_configuration=https%3A%2F%2Fcanvas.example%2Fconfig&registration_token=registration-token",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let html = body_string(response).await;
    assert!(html.contains(r#"<span id="product-family">canvas</span>"#));
    assert!(html.contains(r#"action="/lti/register_finish""#));
    assert!(html.contains(
        r#"name="registration_endpoint" value="https://canvas.example/api/lti/registrations""#
    ));
    assert!(html.contains(r#"name="registration_token" value="registration-token""#));
}

#[tokio::test]
async fn test_registration_finish_builds_tool_configuration() {
    let service = Arc::new(MockLtiService::new());
    let router = test_router(Arc::clone(&service));

    let response = router
        .oneshot(form_post(
            "/lti/register_finish",
            "registration_endpoint=https%3A%2F%2Fcanvas.example%2Fapi%2Flti%2Fregistrations&registration_token=registration-token",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let html = body_string(response).await;
    assert!(html.contains("<code>10000000000042</code>"));
    assert!(html.contains("org.imsglobal.lti.close"));
    assert!(html.contains(r#""deploymentId":"42:abc""#));

    let configurations = service.tool_configurations.read().await;
    assert_eq!(configurations.len(), 1);

    let config = &configurations[0];
    assert_eq!(config.client_name, "LTI Hello World");
    assert_eq!(config.initiate_login_uri, "https://tool.example/lti/init");
    assert_eq!(config.redirect_uris, ["https://tool.example/lti/redirect"]);
    assert_eq!(config.jwks_uri, "https://tool.example/lti/jwks");
    assert_eq!(config.lti_tool_configuration.domain, TOOL_HOST);
    assert_eq!(
        config.lti_tool_configuration.target_link_uri,
        "https://tool.example/lti/launch"
    );
    // Limited to what the platform advertises
    assert_eq!(
        config.scope,
        "https://purl.imsglobal.org/spec/lti-nrps/scope/contextmembership.readonly"
    );
    assert_eq!(
        config.lti_tool_configuration.claims,
        ["iss", "sub", "name", "email"]
    );
}

#[tokio::test]
async fn test_registration_finish_requires_client_id() {
    let response: PlatformResponse =
        serde_json::from_value(json!({"registration_client_uri": "https://canvas.example/r/1"}))
            .unwrap();
    let router = test_router(Arc::new(
        MockLtiService::new().with_platform_response(response),
    ));

    let response = router
        .oneshot(form_post("/lti/register_finish", "registration_token=t"))
        .await
        .unwrap();

    assert_error_body(
        response,
        StatusCode::BAD_REQUEST,
        "client_id is required in the registration response",
    )
    .await;
}

// =============================================================================
// Names and Roles
// =============================================================================

#[tokio::test]
async fn test_names_and_roles_requires_bearer() {
    let router = test_router(Arc::new(MockLtiService::new()));

    let response = router
        .oneshot(get("/lti/names_and_roles"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_string(response).await, "Missing Authorization header");
}

#[tokio::test]
async fn test_names_and_roles_rejects_unknown_jwt() {
    let router = test_router(Arc::new(MockLtiService::new()));

    let response = router
        .oneshot(get_with_bearer("/lti/names_and_roles", "forged.jwt.value"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_names_and_roles_returns_roster() {
    let router = test_router(Arc::new(MockLtiService::new()));

    let response = router
        .oneshot(get_with_bearer("/lti/names_and_roles", VALID_TOOL_JWT))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["members"].as_array().unwrap().len(), 2);
    assert_eq!(json["members"][1]["roles"][0], "Instructor");
}

// =============================================================================
// Deep Linking
// =============================================================================

#[tokio::test]
async fn test_sign_deep_link_returns_double_encoded_jwt() {
    let service = Arc::new(MockLtiService::new());
    let router = test_router(Arc::clone(&service));

    let payload = DeepLinkPayload::for_accept_types(&["html".to_string()]);
    let response = router
        .oneshot(post_json_with_bearer(
            "/lti/sign_deep_link",
            VALID_TOOL_JWT,
            &json!([payload]),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert!(body.is_string());
    assert_eq!(decode_signed_response(&body).unwrap(), SIGNED_DEEP_LINK_JWT);

    let items = service.deep_link_items.read().await;
    assert_eq!(items.as_slice(), [payload]);
}

#[tokio::test]
async fn test_sign_deep_link_rejects_invalid_payload() {
    let service = Arc::new(MockLtiService::new());
    let router = test_router(Arc::clone(&service));

    let response = router
        .oneshot(post_json_with_bearer(
            "/lti/sign_deep_link",
            VALID_TOOL_JWT,
            &json!([{"type": "video", "url": "https://x.example"}]),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert!(json["error"]
        .as_str()
        .unwrap()
        .starts_with("invalid deep link payload"));
    assert!(json["requestId"].as_str().is_some());
    assert!(service.deep_link_items.read().await.is_empty());
}

#[tokio::test]
async fn test_sign_deep_link_rejects_empty_list() {
    let router = test_router(Arc::new(MockLtiService::new()));

    let response = router
        .oneshot(post_json_with_bearer(
            "/lti/sign_deep_link",
            VALID_TOOL_JWT,
            &json!([]),
        ))
        .await
        .unwrap();

    assert_error_body(
        response,
        StatusCode::BAD_REQUEST,
        "at least one content item is required",
    )
    .await;
}

#[tokio::test]
async fn test_sign_deep_link_requires_bearer_before_body() {
    let router = test_router(Arc::new(MockLtiService::new()));

    let request = Request::builder()
        .method("POST")
        .uri("/lti/sign_deep_link")
        .header("host", TOOL_HOST)
        .header("authorization", "Basic dXNlcjpwYXNz")
        .body(Body::from("not json"))
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
