//! Id token claims and the launch settings handed to the launch page.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::definitions::DEEP_LINKING_REQUEST_MESSAGE;

/// `aud` may be a single client id or a list of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Audience {
    Single(String),
    Many(Vec<String>),
}

impl Audience {
    /// First audience entry, if any.
    pub fn first(&self) -> Option<&str> {
        match self {
            Audience::Single(aud) => Some(aud.as_str()),
            Audience::Many(auds) => auds.first().map(String::as_str),
        }
    }
}

/// `https://purl.imsglobal.org/spec/lti/claim/context`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextClaim {
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// Names and Roles Provisioning service claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamesAndRolesClaim {
    pub context_memberships_url: String,

    #[serde(default)]
    pub service_versions: Vec<String>,
}

/// Deep Linking settings sent by the platform with a Deep Linking request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeepLinkingClaim {
    /// Where the signed content items are posted back to
    pub deep_link_return_url: String,

    /// Content item types the platform accepts (`link`, `html`, `image`, ...)
    #[serde(default)]
    pub accept_types: Vec<String>,

    #[serde(default)]
    pub accept_presentation_document_targets: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accept_media_types: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accept_multiple: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_create: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    /// Opaque value that must be echoed back to the platform
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl DeepLinkingClaim {
    /// Whether the platform accepts the given content item type.
    pub fn accepts(&self, item_type: &str) -> bool {
        self.accept_types.iter().any(|t| t == item_type)
    }
}

/// Decoded LTI 1.3 id token, limited to the claims this tool reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdToken {
    pub iss: String,
    pub aud: Audience,
    pub sub: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub azp: Option<String>,

    pub exp: i64,
    pub iat: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,

    #[serde(rename = "https://purl.imsglobal.org/spec/lti/claim/deployment_id")]
    pub deployment_id: String,

    #[serde(rename = "https://purl.imsglobal.org/spec/lti/claim/message_type")]
    pub message_type: String,

    #[serde(
        rename = "https://purl.imsglobal.org/spec/lti/claim/version",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub version: Option<String>,

    #[serde(rename = "https://purl.imsglobal.org/spec/lti/claim/roles", default)]
    pub roles: Vec<String>,

    #[serde(
        rename = "https://purl.imsglobal.org/spec/lti/claim/context",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub context: Option<ContextClaim>,

    #[serde(
        rename = "https://purl.imsglobal.org/spec/lti-nrps/claim/namesroleservice",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub names_and_roles: Option<NamesAndRolesClaim>,

    #[serde(
        rename = "https://purl.imsglobal.org/spec/lti-dl/claim/deep_linking_settings",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub deep_linking: Option<DeepLinkingClaim>,
}

impl IdToken {
    /// The tool's client id: `azp` when present, otherwise the first `aud`.
    pub fn client_id(&self) -> Option<&str> {
        self.azp.as_deref().or_else(|| self.aud.first())
    }

    /// True for Deep Linking launches.
    pub fn is_deep_linking(&self) -> bool {
        self.message_type == DEEP_LINKING_REQUEST_MESSAGE
    }
}

/// A validated id token together with the raw JWT it was decoded from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdTokenWrapper {
    pub raw_token: String,
    pub claims: IdToken,
}

/// Outcome of a successful launch validation by the LTI component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidatedLaunch {
    pub id_token: IdTokenWrapper,

    /// OIDC state of this launch
    pub state: String,

    /// Whether the state cookie matched server-side
    #[serde(default)]
    pub state_verified: bool,

    /// Platform storage parameters for cookie-less state checks
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lti_storage_params: Option<Value>,
}

impl ValidatedLaunch {
    /// Combine the validation result with the signed tool JWT.
    pub fn into_settings(self, jwt: String) -> LaunchSettings {
        LaunchSettings {
            state_verified: self.state_verified,
            state: self.state,
            lti_storage_params: self.lti_storage_params,
            jwt,
            deep_linking: self.id_token.claims.deep_linking,
        }
    }
}

/// Settings injected into the launch page for the client controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchSettings {
    #[serde(default)]
    pub state_verified: bool,

    #[serde(default)]
    pub state: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lti_storage_params: Option<Value>,

    /// Signed tool JWT, used as the bearer credential for tool APIs
    pub jwt: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deep_linking: Option<DeepLinkingClaim>,
}
