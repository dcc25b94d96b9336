//! Deep Linking content items and the signed response envelope.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::claims::DeepLinkingClaim;
use crate::error::ClientError;

/// A content item returned to the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum DeepLinkPayload {
    /// Inline HTML fragment
    Html {
        html: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        title: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        text: Option<String>,
    },

    /// Link to an external page
    Link {
        url: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        title: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        text: Option<String>,
    },

    /// Image by URL
    Image {
        url: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        title: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        text: Option<String>,
    },
}

impl DeepLinkPayload {
    /// The sample item this tool returns, picked by what the platform accepts:
    /// `html` first, then `link`, and `image` otherwise.
    pub fn for_accept_types(accept_types: &[String]) -> Self {
        let accepts = |t: &str| accept_types.iter().any(|a| a == t);

        if accepts("html") {
            DeepLinkPayload::Html {
                html: "<h2>Just saying hi!</h2>".to_string(),
                title: Some("Hello World".to_string()),
                text: Some("A simple hello world example".to_string()),
            }
        } else if accepts("link") {
            DeepLinkPayload::Link {
                url: "https://www.1edtech.org/standards/lti".to_string(),
                title: Some("LTI".to_string()),
                text: Some("Learning Tools Interoperability".to_string()),
            }
        } else {
            DeepLinkPayload::Image {
                url: "https://www.1edtech.org/sites/default/files/logo.png".to_string(),
                title: Some("Logo".to_string()),
                text: Some("A logo".to_string()),
            }
        }
    }

    /// Convenience over [`DeepLinkPayload::for_accept_types`].
    pub fn for_claim(claim: &DeepLinkingClaim) -> Self {
        Self::for_accept_types(&claim.accept_types)
    }

    /// The `type` tag.
    pub fn type_name(&self) -> &'static str {
        match self {
            DeepLinkPayload::Html { .. } => "html",
            DeepLinkPayload::Link { .. } => "link",
            DeepLinkPayload::Image { .. } => "image",
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct SignedDeepLink {
    jwt: String,
}

/// Body of the deep-link-signing response: `{"jwt": ...}` serialized to a
/// string, which the route then sends as a JSON string.
///
/// The double encoding is what existing launch clients decode; keep it until
/// every client reads a plain object.
pub fn encode_signed_response(jwt: &str) -> String {
    serde_json::json!({ "jwt": jwt }).to_string()
}

/// Inverse of [`encode_signed_response`] applied to the parsed response body:
/// the body must be a JSON string whose contents are `{"jwt": ...}`.
pub fn decode_signed_response(body: &Value) -> Result<String, ClientError> {
    let inner = body
        .as_str()
        .ok_or_else(|| ClientError::Decode("expected a JSON-encoded string".to_string()))?;
    let signed: SignedDeepLink =
        serde_json::from_str(inner).map_err(|e| ClientError::Decode(e.to_string()))?;
    Ok(signed.jwt)
}
