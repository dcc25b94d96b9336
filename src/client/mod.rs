//! Launch page logic.
//!
//! The launch page validates the launch, installs the post-launch content,
//! loads the course roster and drives the Deep Linking hand-off. The browser
//! specifics sit behind three seams so the flow runs anywhere:
//!
//! - [`LaunchValidator`]: client-side launch validation (OIDC state check)
//! - [`Fetch`]: HTTP calls to the tool's own API, returning parsed JSON
//! - [`Document`]: the few DOM operations the flow needs

mod fetch;
mod launch;

use async_trait::async_trait;
use http::Method;
use serde_json::Value;
use tracing::warn;

use crate::error::ClientError;
use crate::lti::claims::LaunchSettings;

pub use fetch::ReqwestFetch;
pub use launch::{LaunchController, LaunchOutcome, FAILED_TO_LAUNCH};

/// DOM operations used by the launch flow. Element lookups are by id and
/// report whether the element existed.
pub trait Document {
    /// Replace the whole body with plain text.
    fn set_body_text(&mut self, text: &str);

    fn set_inner_html(&mut self, id: &str, html: &str) -> bool;

    fn set_attribute(&mut self, id: &str, name: &str, value: &str) -> bool;

    /// Submit a form. Navigates away in a browser.
    fn submit_form(&mut self, id: &str) -> bool;
}

/// Client-side launch validation.
#[async_trait]
pub trait LaunchValidator: Send + Sync {
    async fn validate(&self, settings: &LaunchSettings) -> bool;
}

/// A JSON call against the tool's API.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchRequest {
    pub method: Method,

    /// Path or absolute URL
    pub url: String,

    pub headers: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl FetchRequest {
    /// GET with the tool JWT as bearer credential.
    pub fn get(url: impl Into<String>, jwt: &str) -> Self {
        Self {
            method: Method::GET,
            url: url.into(),
            headers: api_headers(jwt),
            body: None,
        }
    }

    /// POST of a JSON body with the tool JWT as bearer credential.
    pub fn post(url: impl Into<String>, jwt: &str, body: Value) -> Self {
        Self {
            method: Method::POST,
            url: url.into(),
            headers: api_headers(jwt),
            body: Some(body),
        }
    }
}

fn api_headers(jwt: &str) -> Vec<(String, String)> {
    vec![
        ("Authorization".to_string(), format!("Bearer {}", jwt)),
        ("Content-Type".to_string(), "application/json".to_string()),
    ]
}

/// HTTP client for the launch flow.
#[async_trait]
pub trait Fetch: Send + Sync {
    /// Perform the request and parse the response body as JSON.
    async fn fetch(&self, request: FetchRequest) -> Result<Value, ClientError>;
}

/// Accepts a launch when the server verified the OIDC state cookie.
///
/// Launches that need platform storage for the state check (no third-party
/// cookies) are rejected.
#[derive(Debug, Clone, Copy, Default)]
pub struct StateVerifiedValidator;

#[async_trait]
impl LaunchValidator for StateVerifiedValidator {
    async fn validate(&self, settings: &LaunchSettings) -> bool {
        if settings.jwt.is_empty() {
            warn!("Launch settings carry no tool JWT");
            return false;
        }
        if !settings.state_verified {
            warn!(
                platform_storage = settings.lti_storage_params.is_some(),
                "Launch state was not verified"
            );
            return false;
        }
        true
    }
}
