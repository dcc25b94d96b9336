//! LTI 1.3 protocol glue.
//!
//! The protocol itself (OIDC state, JWT signing and verification, platform
//! service calls) is done by an external component behind [`LtiService`].
//! This module holds the types exchanged with it and the tool-specific
//! callbacks it needs.
//!
//! ```text
//! ┌──────────────┐   LtiRequest    ┌──────────────────┐
//! │ route handler│ ──────────────▶ │    LtiService    │
//! │              │ ◀────────────── │ (HttpLtiService) │
//! └──────┬───────┘  LtiResponse /  └──────────────────┘
//!        │          ValidatedLaunch
//!        ▼
//! ┌─────────────────────────────────────────────┐
//! │ tool callbacks                              │
//! │  issue_tool_jwt · tool_configuration ·      │
//! │  handle_platform_response                   │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Components
//!
//! - [`claims`]: id token claims and the launch settings for the launch page
//! - [`tool_jwt`]: the bearer credential issued at launch
//! - [`registration`]: dynamic registration metadata
//! - [`deep_link`]: Deep Linking content items
//! - [`request`]: forwarded requests, rendered responses, bearer extraction
//! - [`HttpLtiService`]: the production `LtiService`

pub mod claims;
pub mod deep_link;
pub mod definitions;
pub mod registration;
mod remote;
pub mod request;
mod service;
pub mod tool_jwt;

pub use claims::{
    Audience, ContextClaim, DeepLinkingClaim, IdToken, IdTokenWrapper, LaunchSettings,
    NamesAndRolesClaim, ValidatedLaunch,
};
pub use deep_link::{decode_signed_response, encode_signed_response, DeepLinkPayload};
pub use registration::{
    handle_platform_response, tool_configuration, PlatformConfiguration, PlatformResponse,
    RegistrationContext, ToolConfiguration,
};
pub use remote::{HttpLtiService, DEFAULT_SERVICE_TIMEOUT};
pub use request::{BearerToken, LtiRequest, LtiResponse};
pub use service::{LtiService, ToolConfigurationFn};
pub use tool_jwt::{issue_tool_jwt, ToolJwt, TOOL_JWT_TTL_SECS};
