//! Tool JWT issued at launch.
//!
//! The tool JWT is the bearer credential the launch page uses for the tool's
//! own APIs (Names and Roles, Deep Link signing). It carries just enough of the
//! validated launch to call platform services later; signing is done by the
//! LTI component with the tool's private key.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::claims::IdTokenWrapper;
use super::service::LtiService;
use crate::error::LtiError;

/// Lifetime of a tool JWT in seconds.
pub const TOOL_JWT_TTL_SECS: i64 = 60 * 60;

/// Claims of the tool JWT.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolJwt {
    pub client_id: String,
    pub deployment_id: String,
    pub platform_iss: String,

    /// Platform user id
    pub sub: String,

    /// The tool itself (`https://{host}`)
    pub iss: String,

    pub aud: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub names_and_roles_endpoint_url: Option<String>,

    /// Deep Linking `data` to echo back when signing content items
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deep_link_claim_data: Option<Value>,

    pub iat: i64,
    pub exp: i64,
}

impl ToolJwt {
    /// Build the claims for a validated launch.
    pub fn from_id_token(id_token: &IdTokenWrapper, tool_host: &str, issued_at: i64) -> Self {
        let claims = &id_token.claims;
        let client_id = claims.client_id().unwrap_or_default().to_string();

        Self {
            aud: client_id.clone(),
            client_id,
            deployment_id: claims.deployment_id.clone(),
            platform_iss: claims.iss.clone(),
            sub: claims.sub.clone(),
            iss: format!("https://{}", tool_host),
            names_and_roles_endpoint_url: claims
                .names_and_roles
                .as_ref()
                .map(|nrps| nrps.context_memberships_url.clone()),
            deep_link_claim_data: claims
                .deep_linking
                .as_ref()
                .and_then(|dl| dl.data.clone()),
            iat: issued_at,
            exp: issued_at + TOOL_JWT_TTL_SECS,
        }
    }
}

/// Build and sign the tool JWT for a validated launch.
pub async fn issue_tool_jwt<S>(
    service: &S,
    id_token: &IdTokenWrapper,
    tool_host: &str,
) -> Result<String, LtiError>
where
    S: LtiService + ?Sized,
{
    let claims = ToolJwt::from_id_token(id_token, tool_host, chrono::Utc::now().timestamp());
    debug!(
        client_id = %claims.client_id,
        deployment_id = %claims.deployment_id,
        "Issuing tool JWT"
    );
    service.sign_tool_jwt(&claims).await
}
