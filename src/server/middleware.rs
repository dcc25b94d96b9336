//! Cross-cutting request middleware.
//!
//! Applied to every route, outermost first:
//!
//! ```text
//! request_id ─▶ TraceLayer ─▶ security headers ─▶ etag ─▶ error_translation ─▶ CatchPanicLayer ─▶ router
//! ```

use std::any::Any;

use axum::{
    body::{to_bytes, Body, HttpBody},
    extract::Request,
    http::{
        header::{CONTENT_LENGTH, ETAG, IF_NONE_MATCH, LAST_MODIFIED},
        HeaderName, HeaderValue, Method, StatusCode,
    },
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use sha2::{Digest, Sha256};
use tracing::{error, warn};

use super::handlers::{ErrorReport, ErrorResponse, RequestContext};
use crate::error::{AppError, ErrorKind};
use crate::lti::definitions::REQUEST_ID_HEADER;

/// Value of the `Content-Security-Policy` header. `frame-ancestors *` lets any
/// platform embed the tool in an iframe.
pub const CONTENT_SECURITY_POLICY: &str = "default-src 'self'; \
script-src 'self' 'unsafe-inline' 'unsafe-eval'; \
style-src 'self' 'unsafe-inline'; \
img-src 'self' data: https:; \
font-src 'self' data:; \
connect-src 'self'; \
frame-ancestors *";

/// Security headers set on every response.
pub const SECURITY_HEADERS: [(&str, &str); 5] = [
    ("x-frame-options", "ALLOWALL"),
    ("x-content-type-options", "nosniff"),
    ("x-xss-protection", "1; mode=block"),
    ("referrer-policy", "strict-origin-when-cross-origin"),
    ("content-security-policy", CONTENT_SECURITY_POLICY),
];

// =============================================================================
// Request id
// =============================================================================

/// Tag the request with a fresh [`RequestContext`] and echo its id as
/// `X-Request-Id`.
pub async fn request_id(mut request: Request, next: Next) -> Response {
    let context = RequestContext::new();
    let header = HeaderValue::from_str(&context.request_id).ok();
    request.extensions_mut().insert(context);

    let mut response = next.run(request).await;
    if let Some(value) = header {
        response
            .headers_mut()
            .insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
    }
    response
}

// =============================================================================
// Error translation
// =============================================================================

/// Log every failed request and turn it into the public error body.
///
/// Protocol errors keep the response they were rendered with. Validation and
/// internal errors are rewritten to `{error, requestId, timestamp}`.
pub async fn error_translation(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let request_id = request
        .extensions()
        .get::<RequestContext>()
        .map(|c| c.request_id.clone())
        .unwrap_or_else(|| "unknown".to_string());

    let response = next.run(request).await;

    let Some(ErrorReport(err)) = response.extensions().get::<ErrorReport>().cloned() else {
        return response;
    };

    let timestamp = chrono::Utc::now().to_rfc3339();
    let kind = err.kind();
    let status = response.status();

    if kind == ErrorKind::Internal {
        error!(
            request_id = %request_id,
            timestamp = %timestamp,
            method = %method,
            path = %path,
            error_kind = kind.name(),
            status = status.as_u16(),
            "Request error: {}",
            err
        );
    } else {
        warn!(
            request_id = %request_id,
            timestamp = %timestamp,
            method = %method,
            path = %path,
            error_kind = kind.name(),
            status = status.as_u16(),
            "Request error: {}",
            err
        );
    }

    if kind == ErrorKind::Protocol {
        return response;
    }

    let body = ErrorResponse {
        error: err.public_message(),
        request_id: Some(request_id),
        timestamp: Some(timestamp),
        path: None,
    };
    (err.status(), Json(body)).into_response()
}

/// Response for a panicking handler: an internal error, translated like any
/// other.
pub fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let details = if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic payload".to_string()
    };

    AppError::internal(format!("handler panicked: {}", details)).into_response()
}

// =============================================================================
// ETag
// =============================================================================

/// Largest body the ETag middleware buffers.
pub const MAX_ETAG_BODY: usize = 1024 * 1024;

/// Strong ETag over the response body.
pub fn compute_etag(body: &[u8]) -> String {
    format!("\"{}\"", hex::encode(Sha256::digest(body)))
}

/// Whether an `If-None-Match` value matches `etag`.
pub fn etag_matches(if_none_match: &str, etag: &str) -> bool {
    if_none_match.split(',').map(str::trim).any(|candidate| {
        candidate == "*" || candidate == etag || candidate.strip_prefix("W/") == Some(etag)
    })
}

/// Add an `ETag` to successful GET responses and answer `304 Not Modified`
/// when the client already has the current body.
///
/// Responses with their own `Last-Modified` (static files) and bodies over
/// [`MAX_ETAG_BODY`] or of unknown size pass through untouched.
pub async fn etag(request: Request, next: Next) -> Response {
    let is_get = request.method() == Method::GET;
    let if_none_match = request
        .headers()
        .get(IF_NONE_MATCH)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let response = next.run(request).await;
    if !is_get
        || response.status() != StatusCode::OK
        || response.headers().contains_key(ETAG)
        || response.headers().contains_key(LAST_MODIFIED)
    {
        return response;
    }

    let within_bound = response
        .body()
        .size_hint()
        .upper()
        .is_some_and(|upper| upper <= MAX_ETAG_BODY as u64);
    if !within_bound {
        return response;
    }

    let (mut parts, body) = response.into_parts();
    let bytes = match to_bytes(body, MAX_ETAG_BODY).await {
        Ok(bytes) => bytes,
        Err(e) => {
            error!(error = %e, "Failed to buffer response body for ETag");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new("Internal server error")),
            )
                .into_response();
        }
    };

    let tag = compute_etag(&bytes);
    if let Ok(value) = HeaderValue::from_str(&tag) {
        parts.headers.insert(ETAG, value);
    }

    if if_none_match
        .as_deref()
        .is_some_and(|inm| etag_matches(inm, &tag))
    {
        // A 304 may only state the length of the full representation
        parts.status = StatusCode::NOT_MODIFIED;
        parts.headers.insert(CONTENT_LENGTH, HeaderValue::from(bytes.len()));
        return Response::from_parts(parts, Body::empty());
    }

    Response::from_parts(parts, Body::from(bytes))
}
