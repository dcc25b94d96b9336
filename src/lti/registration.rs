//! LTI Dynamic Registration: the tool's client metadata and the handling of
//! the platform's registration response.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::info;

use super::definitions::{
    AGS_LINEITEM_SCOPE, AGS_RESULT_READONLY_SCOPE, AGS_SCORE_SCOPE, DEEP_LINKING_REQUEST_MESSAGE,
    LTI_INIT_PATH, LTI_JWKS_PATH, LTI_LAUNCH_PATH, LTI_REDIRECT_PATH, NAMES_AND_ROLES_SCOPE,
};
use crate::error::AppError;

/// Identity claims the tool asks the platform to include in launches.
const REQUESTED_CLAIMS: [&str; 6] = ["iss", "sub", "name", "given_name", "family_name", "email"];

/// Service scopes the tool requests.
const REQUESTED_SCOPES: [&str; 4] = [
    AGS_LINEITEM_SCOPE,
    AGS_RESULT_READONLY_SCOPE,
    AGS_SCORE_SCOPE,
    NAMES_AND_ROLES_SCOPE,
];

// =============================================================================
// Platform side
// =============================================================================

/// A message type the platform supports, with its placements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageSupported {
    #[serde(rename = "type")]
    pub message_type: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub placements: Vec<String>,
}

/// `https://purl.imsglobal.org/spec/lti-platform-configuration`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LtiPlatformConfiguration {
    pub product_family_code: String,

    #[serde(default)]
    pub version: String,

    #[serde(default)]
    pub messages_supported: Vec<MessageSupported>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub variables: Vec<String>,
}

/// The platform's OpenID configuration document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformConfiguration {
    pub issuer: String,
    pub authorization_endpoint: String,
    pub token_endpoint: String,
    pub jwks_uri: String,
    pub registration_endpoint: String,

    #[serde(default)]
    pub scopes_supported: Vec<String>,

    #[serde(default)]
    pub claims_supported: Vec<String>,

    #[serde(rename = "https://purl.imsglobal.org/spec/lti-platform-configuration")]
    pub lti_platform_configuration: LtiPlatformConfiguration,
}

/// Everything the registration landing page needs, as prepared by the LTI
/// component from the `openid_configuration` / `registration_token` query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationContext {
    pub platform_configuration: PlatformConfiguration,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registration_token: Option<String>,
}

// =============================================================================
// Tool side
// =============================================================================

/// A launch message the tool registers for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LtiMessage {
    #[serde(rename = "type")]
    pub message_type: String,

    pub target_link_uri: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// `https://purl.imsglobal.org/spec/lti-tool-configuration`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LtiToolConfiguration {
    pub domain: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub target_link_uri: String,

    #[serde(default)]
    pub claims: Vec<String>,

    #[serde(default)]
    pub messages: Vec<LtiMessage>,
}

/// Client metadata posted to the platform's registration endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolConfiguration {
    pub application_type: String,
    pub response_types: Vec<String>,
    pub grant_types: Vec<String>,
    pub initiate_login_uri: String,
    pub redirect_uris: Vec<String>,
    pub client_name: String,
    pub jwks_uri: String,
    pub token_endpoint_auth_method: String,

    /// Space separated scopes
    pub scope: String,

    #[serde(rename = "https://purl.imsglobal.org/spec/lti-tool-configuration")]
    pub lti_tool_configuration: LtiToolConfiguration,
}

/// This tool's registration metadata for a platform.
///
/// Claims and scopes are limited to what the platform advertises; an empty
/// advertisement is taken as "unknown" and everything is requested.
pub fn tool_configuration(
    platform: &PlatformConfiguration,
    tool_host: &str,
    client_name: &str,
) -> ToolConfiguration {
    let base = format!("https://{}", tool_host);
    let launch_url = format!("{}{}", base, LTI_LAUNCH_PATH);

    let claims = supported(&REQUESTED_CLAIMS, &platform.claims_supported);
    let scopes = supported(&REQUESTED_SCOPES, &platform.scopes_supported);

    ToolConfiguration {
        application_type: "web".to_string(),
        response_types: vec!["id_token".to_string()],
        grant_types: vec!["implicit".to_string(), "client_credentials".to_string()],
        initiate_login_uri: format!("{}{}", base, LTI_INIT_PATH),
        redirect_uris: vec![format!("{}{}", base, LTI_REDIRECT_PATH)],
        client_name: client_name.to_string(),
        jwks_uri: format!("{}{}", base, LTI_JWKS_PATH),
        token_endpoint_auth_method: "private_key_jwt".to_string(),
        scope: scopes.join(" "),
        lti_tool_configuration: LtiToolConfiguration {
            domain: tool_host.to_string(),
            description: Some(format!("{} LTI 1.3 tool", client_name)),
            target_link_uri: launch_url.clone(),
            claims,
            messages: vec![LtiMessage {
                message_type: DEEP_LINKING_REQUEST_MESSAGE.to_string(),
                target_link_uri: launch_url,
                label: Some(client_name.to_string()),
            }],
        },
    }
}

fn supported(requested: &[&str], advertised: &[String]) -> Vec<String> {
    requested
        .iter()
        .filter(|item| advertised.is_empty() || advertised.iter().any(|a| a == *item))
        .map(|item| item.to_string())
        .collect()
}

// =============================================================================
// Platform response
// =============================================================================

/// Tool configuration echoed back by the platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisteredToolConfiguration {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployment_id: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The platform's answer to a registration request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registration_client_uri: Option<String>,

    #[serde(
        rename = "https://purl.imsglobal.org/spec/lti-tool-configuration",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub lti_tool_configuration: Option<RegisteredToolConfiguration>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PlatformResponse {
    /// Deployment id assigned by the platform, if it sent one.
    pub fn deployment_id(&self) -> Option<&str> {
        self.lti_tool_configuration
            .as_ref()
            .and_then(|c| c.deployment_id.as_deref())
    }
}

/// Accept the platform's registration response.
///
/// Platform and key records live with the LTI component; the tool only
/// checks the response is usable and records the registration in the log.
pub fn handle_platform_response(response: &PlatformResponse) -> Result<(), AppError> {
    let client_id = response
        .client_id
        .as_deref()
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::validation("client_id is required in the registration response"))?;

    info!(
        client_id = client_id,
        deployment_id = response.deployment_id().unwrap_or("-"),
        registration_client_uri = response.registration_client_uri.as_deref().unwrap_or("-"),
        "Platform registration completed"
    );

    Ok(())
}
