//! Route paths, message types and service scopes.

/// Home page.
pub const ROOT_PATH: &str = "/";

/// Liveness endpoint.
pub const UP_PATH: &str = "/up";

/// Prefix shared by every LTI protocol route (CORS applies here only).
pub const LTI_PATH_PREFIX: &str = "/lti";

pub const LTI_JWKS_PATH: &str = "/lti/jwks";
pub const LTI_INIT_PATH: &str = "/lti/init";
pub const LTI_REDIRECT_PATH: &str = "/lti/redirect";
pub const LTI_LAUNCH_PATH: &str = "/lti/launch";
pub const LTI_REGISTRATION_PATH: &str = "/lti/register";
pub const LTI_REGISTRATION_FINISH_PATH: &str = "/lti/register_finish";
pub const LTI_NAMES_AND_ROLES_PATH: &str = "/lti/names_and_roles";
pub const LTI_SIGN_DEEP_LINK_PATH: &str = "/lti/sign_deep_link";

/// Default application name shown on pages and sent as the registration client name.
pub const DEFAULT_APPLICATION_NAME: &str = "LTI Hello World";

/// Response header carrying the per-request identifier.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

// =============================================================================
// Message types
// =============================================================================

/// Message type of a Deep Linking launch.
pub const DEEP_LINKING_REQUEST_MESSAGE: &str = "LtiDeepLinkingRequest";

// =============================================================================
// Scopes
// =============================================================================

pub const AGS_LINEITEM_SCOPE: &str = "https://purl.imsglobal.org/spec/lti-ags/scope/lineitem";
pub const AGS_RESULT_READONLY_SCOPE: &str =
    "https://purl.imsglobal.org/spec/lti-ags/scope/result.readonly";
pub const AGS_SCORE_SCOPE: &str = "https://purl.imsglobal.org/spec/lti-ags/scope/score";
pub const NAMES_AND_ROLES_SCOPE: &str =
    "https://purl.imsglobal.org/spec/lti-nrps/scope/contextmembership.readonly";
