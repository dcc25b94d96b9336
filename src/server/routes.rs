//! Router configuration.
//!
//! # Route Structure
//!
//! ```text
//! /                        - Home page
//! /up                      - Liveness check
//! /lti/jwks                - Tool key set                    (CORS)
//! /lti/init                - OIDC login initiation           (CORS)
//! /lti/redirect            - OIDC authentication response    (CORS)
//! /lti/launch              - Launch                          (CORS)
//! /lti/register            - Dynamic registration            (CORS)
//! /lti/register_finish     - Dynamic registration finish     (CORS)
//! /lti/names_and_roles     - Roster, bearer                  (CORS)
//! /lti/sign_deep_link      - Deep Linking response, bearer   (CORS)
//! /*                       - Client assets, then 404
//! ```
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use lti_tool::assets::AssetManifest;
//! use lti_tool::lti::{HttpLtiService, DEFAULT_SERVICE_TIMEOUT};
//! use lti_tool::server::{create_router, RouterConfig};
//!
//! let service = HttpLtiService::new("http://127.0.0.1:8787", DEFAULT_SERVICE_TIMEOUT)?;
//! let config = RouterConfig::new()
//!     .with_manifest(Arc::new(AssetManifest::load("dist/client/manifest.json")?))
//!     .with_assets_dir("dist/client");
//!
//! let router = create_router(Arc::new(service), config);
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
//! axum::serve(listener, router).await?;
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    handler::HandlerWithoutStateExt,
    http::{
        header::{AUTHORIZATION, CONTENT_LENGTH, CONTENT_TYPE},
        HeaderName, HeaderValue, Method, Request,
    },
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use super::handlers::{
    home_handler, init_handler, jwks_handler, launch_handler, names_and_roles_handler,
    not_found_handler, redirect_handler, registration_finish_handler, registration_handler,
    sign_deep_link_handler, up_handler, AppState, RequestContext,
};
use super::middleware::{error_translation, etag, panic_response, request_id, SECURITY_HEADERS};
use crate::assets::{AssetManifest, AssetResolver, ClientScripts};
use crate::lti::definitions::{
    DEFAULT_APPLICATION_NAME, LTI_INIT_PATH, LTI_JWKS_PATH, LTI_LAUNCH_PATH,
    LTI_NAMES_AND_ROLES_PATH, LTI_REDIRECT_PATH, LTI_REGISTRATION_FINISH_PATH,
    LTI_REGISTRATION_PATH, LTI_SIGN_DEEP_LINK_PATH, REQUEST_ID_HEADER, ROOT_PATH, UP_PATH,
};
use crate::lti::LtiService;

/// Preflight cache lifetime for LTI routes.
const CORS_MAX_AGE: Duration = Duration::from_secs(86400);

// =============================================================================
// Router Configuration
// =============================================================================

/// Configuration for the HTTP router.
#[derive(Clone)]
pub struct RouterConfig {
    /// Client asset manifest (empty in development)
    pub manifest: Arc<AssetManifest>,

    /// Directory of built client assets served as the fallback
    pub assets_dir: Option<PathBuf>,

    pub application_name: String,

    /// Whether to enable request tracing
    pub enable_tracing: bool,
}

impl RouterConfig {
    /// Development defaults: empty manifest, no asset directory, tracing on.
    pub fn new() -> Self {
        Self {
            manifest: Arc::new(AssetManifest::empty()),
            assets_dir: None,
            application_name: DEFAULT_APPLICATION_NAME.to_string(),
            enable_tracing: true,
        }
    }

    pub fn with_manifest(mut self, manifest: Arc<AssetManifest>) -> Self {
        self.manifest = manifest;
        self
    }

    /// Serve built client assets from `dir`.
    pub fn with_assets_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.assets_dir = Some(dir.into());
        self
    }

    pub fn with_application_name(mut self, name: impl Into<String>) -> Self {
        self.application_name = name.into();
        self
    }

    /// Enable or disable request tracing.
    pub fn with_tracing(mut self, enabled: bool) -> Self {
        self.enable_tracing = enabled;
        self
    }
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Router Builder
// =============================================================================

/// Create the application router.
///
/// Client scripts are resolved against the manifest here, once.
pub fn create_router<S>(service: Arc<S>, config: RouterConfig) -> Router
where
    S: LtiService,
{
    let resolver = AssetResolver::from_shared(Arc::clone(&config.manifest));
    let scripts = ClientScripts::resolve(&resolver);
    info!(
        home = %scripts.home,
        init = %scripts.init,
        launch = %scripts.launch,
        development = resolver.is_development(),
        "Client scripts resolved"
    );

    let state = AppState::new(service, scripts, &config.application_name);

    let pages = Router::new()
        .route(ROOT_PATH, get(home_handler::<S>))
        .route(UP_PATH, get(up_handler));

    let lti = Router::new()
        .route(LTI_JWKS_PATH, get(jwks_handler::<S>))
        .route(LTI_INIT_PATH, post(init_handler::<S>))
        .route(LTI_REDIRECT_PATH, post(redirect_handler::<S>))
        .route(LTI_LAUNCH_PATH, post(launch_handler::<S>))
        .route(LTI_REGISTRATION_PATH, get(registration_handler::<S>))
        .route(
            LTI_REGISTRATION_FINISH_PATH,
            post(registration_finish_handler::<S>),
        )
        .route(LTI_NAMES_AND_ROLES_PATH, get(names_and_roles_handler::<S>))
        .route(LTI_SIGN_DEEP_LINK_PATH, post(sign_deep_link_handler::<S>))
        .layer(build_cors_layer());

    let router = Router::new().merge(pages).merge(lti);
    let router = match &config.assets_dir {
        Some(dir) => router.fallback_service(
            ServeDir::new(dir)
                .call_fallback_on_method_not_allowed(true)
                .fallback(not_found_handler.into_service()),
        ),
        None => router.fallback(not_found_handler),
    };

    let mut router = router
        .with_state(state)
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(middleware::from_fn(error_translation))
        .layer(middleware::from_fn(etag));

    for (name, value) in SECURITY_HEADERS {
        router = router.layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static(name),
            HeaderValue::from_static(value),
        ));
    }

    if config.enable_tracing {
        router = router.layer(TraceLayer::new_for_http().make_span_with(
            |request: &Request<Body>| {
                let request_id = request
                    .extensions()
                    .get::<RequestContext>()
                    .map(|c| c.request_id.as_str())
                    .unwrap_or("unknown");
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    path = %request.uri().path(),
                    request_id = %request_id,
                )
            },
        ));
    }

    router.layer(middleware::from_fn(request_id))
}

/// CORS for the LTI routes.
///
/// Platforms call in from any origin with credentials, so the request origin
/// is mirrored back (a literal `*` is not allowed together with credentials).
fn build_cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .expose_headers([CONTENT_LENGTH, HeaderName::from_static(REQUEST_ID_HEADER)])
        .allow_credentials(true)
        .max_age(CORS_MAX_AGE)
}

// =============================================================================
// Tests
// =============================================================================
