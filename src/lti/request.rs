//! Inbound requests forwarded to the LTI component and the responses it
//! renders back.

use axum::{
    body::Body,
    extract::{FromRequest, FromRequestParts, Request},
    http::{header, request::Parts, HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tracing::warn;
use url::form_urlencoded;

use crate::error::{AppError, LtiError};

/// Largest request body forwarded to the LTI component (id tokens are small).
const MAX_FORWARDED_BODY: usize = 1024 * 1024;

// =============================================================================
// Request
// =============================================================================

/// A protocol request as the LTI component sees it.
///
/// Launch, redirect and registration steps need the full request (cookies,
/// host, form body), so handlers capture it whole instead of picking fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LtiRequest {
    pub method: String,

    /// Absolute URL as the browser requested it
    pub url: String,

    pub headers: Vec<(String, String)>,

    /// Raw body, usually `application/x-www-form-urlencoded`
    #[serde(default)]
    pub body: String,
}

impl LtiRequest {
    /// First value of a header, matched case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Host the tool was reached on, honoring reverse proxies.
    pub fn host(&self) -> Option<&str> {
        self.header("x-forwarded-host")
            .or_else(|| self.header(header::HOST.as_str()))
            .filter(|host| !host.is_empty())
    }

    /// Form fields of the body.
    pub fn form(&self) -> Vec<(String, String)> {
        form_urlencoded::parse(self.body.as_bytes())
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect()
    }

    /// A single form field.
    pub fn form_value(&self, key: &str) -> Option<String> {
        form_urlencoded::parse(self.body.as_bytes())
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.into_owned())
    }

    /// The tool host, or a validation error when the request carries none.
    pub fn require_host(&self) -> Result<String, AppError> {
        self.host()
            .map(str::to_string)
            .ok_or_else(|| AppError::validation("Host header is required"))
    }
}

impl<S> FromRequest<S> for LtiRequest
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(request: Request, _state: &S) -> Result<Self, Self::Rejection> {
        let (parts, body) = request.into_parts();

        let headers: Vec<(String, String)> = parts
            .headers
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();

        let host = parts
            .headers
            .get("x-forwarded-host")
            .or_else(|| parts.headers.get(header::HOST))
            .and_then(|h| h.to_str().ok())
            .unwrap_or("localhost");
        let proto = parts
            .headers
            .get("x-forwarded-proto")
            .and_then(|h| h.to_str().ok())
            .unwrap_or("http");
        let path_and_query = parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/");
        let url = format!("{}://{}{}", proto, host, path_and_query);

        let bytes = axum::body::to_bytes(body, MAX_FORWARDED_BODY)
            .await
            .map_err(|e| AppError::validation(format!("invalid request body: {}", e)))?;
        let body = String::from_utf8(bytes.to_vec())
            .map_err(|_| AppError::validation("invalid request body: not UTF-8"))?;

        Ok(LtiRequest {
            method: parts.method.to_string(),
            url,
            headers,
            body,
        })
    }
}

// =============================================================================
// Response
// =============================================================================

/// A response rendered by the LTI component (OIDC redirect, auto-submit form, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LtiResponse {
    pub status: u16,

    #[serde(default)]
    pub headers: Vec<(String, String)>,

    #[serde(default)]
    pub body: String,
}

impl LtiResponse {
    /// 200 HTML response.
    pub fn html(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            headers: vec![(
                header::CONTENT_TYPE.as_str().to_string(),
                "text/html; charset=utf-8".to_string(),
            )],
            body: body.into(),
        }
    }

    /// 302 redirect.
    pub fn redirect(location: impl Into<String>) -> Self {
        Self {
            status: 302,
            headers: vec![(header::LOCATION.as_str().to_string(), location.into())],
            body: String::new(),
        }
    }
}

impl IntoResponse for LtiResponse {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or_else(|_| {
            warn!(status = self.status, "LTI component returned an invalid status");
            StatusCode::BAD_GATEWAY
        });

        let mut headers = HeaderMap::new();
        for (name, value) in &self.headers {
            match (
                HeaderName::try_from(name.as_str()),
                HeaderValue::try_from(value.as_str()),
            ) {
                (Ok(name), Ok(value)) => {
                    headers.append(name, value);
                }
                _ => warn!(header = %name, "Dropping invalid header from LTI component"),
            }
        }

        (status, headers, Body::from(self.body)).into_response()
    }
}

// =============================================================================
// Bearer credential
// =============================================================================

/// The tool JWT presented as `Authorization: Bearer <jwt>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BearerToken(pub String);

impl BearerToken {
    /// Parse an `Authorization` header value.
    pub fn parse(value: &str) -> Option<Self> {
        let (scheme, token) = value.trim().split_once(' ')?;
        let token = token.trim();
        if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
            return None;
        }
        Some(BearerToken(token.to_string()))
    }
}

impl<S> FromRequestParts<S> for BearerToken
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(header::AUTHORIZATION)
            .ok_or_else(|| LtiError::unauthorized("Missing Authorization header"))?;

        value
            .to_str()
            .ok()
            .and_then(BearerToken::parse)
            .ok_or_else(|| LtiError::unauthorized("Authorization header must be a bearer token").into())
    }
}
