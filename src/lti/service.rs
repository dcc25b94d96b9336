use async_trait::async_trait;
use serde_json::Value;

use super::claims::ValidatedLaunch;
use super::deep_link::DeepLinkPayload;
use super::registration::{PlatformConfiguration, PlatformResponse, RegistrationContext, ToolConfiguration};
use super::request::{LtiRequest, LtiResponse};
use super::tool_jwt::ToolJwt;
use crate::error::LtiError;

/// Callback producing this tool's registration metadata for a platform.
pub type ToolConfigurationFn = dyn Fn(&PlatformConfiguration) -> ToolConfiguration + Send + Sync;

/// The external LTI 1.3 protocol component.
///
/// OIDC state and nonce checks, JWT signing and verification, key management
/// and the platform service calls all live behind this trait. The tool only
/// supplies the tool-specific pieces: the init script, the tool JWT claims and
/// the registration configuration.
#[async_trait]
pub trait LtiService: Send + Sync + 'static {
    /// The tool's public key set.
    async fn jwks(&self) -> Result<Value, LtiError>;

    /// Third-party initiated login. The rendered page loads `init_script`,
    /// which completes the OIDC round trip in the browser.
    async fn init(&self, request: LtiRequest, init_script: &str) -> Result<LtiResponse, LtiError>;

    /// OIDC authentication response from the platform.
    async fn redirect(&self, request: LtiRequest) -> Result<LtiResponse, LtiError>;

    /// Validate the id_token of a launch.
    async fn validate_launch(&self, request: LtiRequest) -> Result<ValidatedLaunch, LtiError>;

    /// Sign tool JWT claims with the tool's private key.
    async fn sign_tool_jwt(&self, claims: &ToolJwt) -> Result<String, LtiError>;

    /// Start dynamic registration: fetch the platform's OpenID configuration.
    async fn registration_init(&self, request: LtiRequest)
        -> Result<RegistrationContext, LtiError>;

    /// Finish dynamic registration, posting the configuration produced by
    /// `tool_configuration` to the platform.
    async fn registration_finish(
        &self,
        request: LtiRequest,
        tool_configuration: &ToolConfigurationFn,
    ) -> Result<PlatformResponse, LtiError>;

    /// Course roster from the platform's Names and Roles service.
    async fn names_and_roles(&self, tool_jwt: &str) -> Result<Value, LtiError>;

    /// Sign content items into a Deep Linking response JWT.
    async fn sign_deep_link(
        &self,
        tool_jwt: &str,
        items: &[DeepLinkPayload],
    ) -> Result<String, LtiError>;
}
