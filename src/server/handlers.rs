//! HTTP request handlers.
//!
//! # Endpoints
//!
//! - `GET /` - Home page
//! - `GET /up` - Liveness check
//! - `GET /lti/jwks` - Tool key set
//! - `POST /lti/init`, `POST /lti/redirect` - OIDC login round trip
//! - `POST /lti/launch` - Launch validation and the launch page
//! - `GET /lti/register`, `POST /lti/register_finish` - Dynamic registration
//! - `GET /lti/names_and_roles` - Course roster (bearer)
//! - `POST /lti/sign_deep_link` - Deep Linking response (bearer)

use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, State},
    http::{header::CONTENT_TYPE, request::Parts, HeaderValue, StatusCode, Uri},
    response::{Html, IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::assets::ClientScripts;
use crate::error::{AppError, LtiError};
use crate::html::{home_html, launch_html, registration_complete_html, registration_html};
use crate::lti::definitions::LTI_REGISTRATION_FINISH_PATH;
use crate::lti::{
    encode_signed_response, handle_platform_response, issue_tool_jwt, tool_configuration,
    BearerToken, DeepLinkPayload, LtiRequest, LtiResponse, LtiService, PlatformConfiguration,
};

// =============================================================================
// Application State
// =============================================================================

/// Shared application state.
pub struct AppState<S: LtiService> {
    /// The external LTI component
    pub service: Arc<S>,

    /// Client scripts, resolved once at startup
    pub scripts: Arc<ClientScripts>,

    /// Shown on pages and sent as the registration client name
    pub application_name: Arc<str>,
}

impl<S: LtiService> AppState<S> {
    pub fn new(service: Arc<S>, scripts: ClientScripts, application_name: &str) -> Self {
        Self {
            service,
            scripts: Arc::new(scripts),
            application_name: Arc::from(application_name),
        }
    }
}

impl<S: LtiService> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
            scripts: Arc::clone(&self.scripts),
            application_name: Arc::clone(&self.application_name),
        }
    }
}

// =============================================================================
// Request Context
// =============================================================================

/// Per-request values set by the request-id middleware.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    pub request_id: String,
}

impl RequestContext {
    pub fn new() -> Self {
        Self {
            request_id: uuid::Uuid::new_v4().to_string(),
        }
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<RequestContext>()
            .cloned()
            .unwrap_or_else(|| RequestContext {
                request_id: "unknown".to_string(),
            }))
    }
}

// =============================================================================
// Response Types
// =============================================================================

/// JSON error body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub error: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            request_id: None,
            timestamp: None,
            path: None,
        }
    }
}

/// Liveness response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpResponse {
    pub up: bool,
    pub version: String,
    pub timestamp: String,
    pub request_id: String,
}

// =============================================================================
// Error Mapping
// =============================================================================

/// The error behind an error response, left in the response extensions for
/// the error translation middleware.
#[derive(Debug, Clone)]
pub struct ErrorReport(pub AppError);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let mut response = match &self {
            // Protocol failures carry their own response body
            AppError::Lti(LtiError::Protocol {
                message,
                content_type,
                ..
            }) => {
                let mut response = (status, message.clone()).into_response();
                if let Some(value) = content_type
                    .as_deref()
                    .and_then(|ct| HeaderValue::from_str(ct).ok())
                {
                    response.headers_mut().insert(CONTENT_TYPE, value);
                }
                response
            }
            _ => (status, Json(ErrorResponse::new(self.public_message()))).into_response(),
        };
        response.extensions_mut().insert(ErrorReport(self));
        response
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// `GET /`
pub async fn home_handler<S: LtiService>(State(state): State<AppState<S>>) -> Html<String> {
    Html(home_html(&state.scripts.home, &state.application_name))
}

/// `GET /up`
///
/// ```json
/// {"up": true, "version": "0.1.0", "timestamp": "2024-01-01T00:00:00Z", "requestId": "..."}
/// ```
pub async fn up_handler(context: RequestContext) -> Json<UpResponse> {
    Json(UpResponse {
        up: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        request_id: context.request_id,
    })
}

/// `GET /lti/jwks`
pub async fn jwks_handler<S: LtiService>(
    State(state): State<AppState<S>>,
) -> Result<Json<Value>, AppError> {
    Ok(Json(state.service.jwks().await?))
}

/// `POST /lti/init`: third-party initiated login.
pub async fn init_handler<S: LtiService>(
    State(state): State<AppState<S>>,
    request: LtiRequest,
) -> Result<LtiResponse, AppError> {
    Ok(state.service.init(request, &state.scripts.init).await?)
}

/// `POST /lti/redirect`: OIDC authentication response.
pub async fn redirect_handler<S: LtiService>(
    State(state): State<AppState<S>>,
    request: LtiRequest,
) -> Result<LtiResponse, AppError> {
    Ok(state.service.redirect(request).await?)
}

/// `POST /lti/launch`
///
/// Validates the launch, issues the tool JWT and renders the launch page.
pub async fn launch_handler<S: LtiService>(
    State(state): State<AppState<S>>,
    request: LtiRequest,
) -> Result<Html<String>, AppError> {
    let host = request.require_host()?;
    let launch = state.service.validate_launch(request).await?;

    debug!(
        deployment_id = %launch.id_token.claims.deployment_id,
        message_type = %launch.id_token.claims.message_type,
        "Launch validated"
    );

    let jwt = issue_tool_jwt(state.service.as_ref(), &launch.id_token, &host).await?;
    let settings = launch.into_settings(jwt);

    Ok(Html(launch_html(&settings, &state.scripts.launch)))
}

/// `GET /lti/register`: dynamic registration landing page.
pub async fn registration_handler<S: LtiService>(
    State(state): State<AppState<S>>,
    request: LtiRequest,
) -> Result<Html<String>, AppError> {
    let context = state.service.registration_init(request).await?;
    Ok(Html(registration_html(&context, LTI_REGISTRATION_FINISH_PATH)))
}

/// `POST /lti/register_finish`
pub async fn registration_finish_handler<S: LtiService>(
    State(state): State<AppState<S>>,
    request: LtiRequest,
) -> Result<Html<String>, AppError> {
    let host = request.require_host()?;
    let client_name = Arc::clone(&state.application_name);
    let configure =
        move |platform: &PlatformConfiguration| tool_configuration(platform, &host, &client_name);

    let response = state
        .service
        .registration_finish(request, &configure)
        .await?;
    handle_platform_response(&response)?;

    Ok(Html(registration_complete_html(&response)))
}

/// `GET /lti/names_and_roles`
pub async fn names_and_roles_handler<S: LtiService>(
    State(state): State<AppState<S>>,
    BearerToken(jwt): BearerToken,
) -> Result<Json<Value>, AppError> {
    Ok(Json(state.service.names_and_roles(&jwt).await?))
}

/// `POST /lti/sign_deep_link`
///
/// Takes a JSON array of content items. The signed response goes back as a
/// JSON string containing `{"jwt": ...}`.
pub async fn sign_deep_link_handler<S: LtiService>(
    State(state): State<AppState<S>>,
    BearerToken(jwt): BearerToken,
    body: Bytes,
) -> Result<Json<String>, AppError> {
    let items: Vec<DeepLinkPayload> = serde_json::from_slice(&body)
        .map_err(|e| AppError::validation(format!("invalid deep link payload: {}", e)))?;
    if items.is_empty() {
        return Err(AppError::validation("at least one content item is required"));
    }

    let signed = state.service.sign_deep_link(&jwt, &items).await?;
    Ok(Json(encode_signed_response(&signed)))
}

/// Responder for unmatched routes.
pub async fn not_found_handler(context: RequestContext, uri: Uri) -> Response {
    debug!(path = uri.path(), request_id = %context.request_id, "Route not found");

    let body = ErrorResponse {
        error: "Not found".to_string(),
        request_id: Some(context.request_id),
        timestamp: None,
        path: Some(uri.path().to_string()),
    };
    (StatusCode::NOT_FOUND, Json(body)).into_response()
}
