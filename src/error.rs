use http::StatusCode;
use thiserror::Error;

/// Errors raised while loading the client asset manifest at startup.
#[derive(Debug, Error)]
pub enum ManifestError {
    /// The manifest file exists but could not be read
    #[error("Failed to read manifest {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The manifest is not a JSON object of manifest entries
    #[error("Malformed manifest {path}: {message}")]
    Malformed { path: String, message: String },
}

/// Errors produced by the external LTI component.
#[derive(Debug, Clone, Error)]
pub enum LtiError {
    /// Protocol failure carrying the response the component wants returned
    /// (invalid launch, bad registration payload, rejected tool JWT, ...)
    #[error("{message}")]
    Protocol {
        status: StatusCode,
        message: String,
        /// `Content-Type` of the component's response, if it sent one
        content_type: Option<String>,
    },

    /// The component failed on its side (5xx). The body stays in the logs.
    #[error("LTI service failed with {status}: {message}")]
    Upstream { status: StatusCode, message: String },

    /// The component could not be reached
    #[error("LTI service unreachable: {0}")]
    Transport(String),

    /// The component answered with something we could not decode
    #[error("Invalid LTI service response: {0}")]
    InvalidResponse(String),
}

impl LtiError {
    /// Create a protocol error with its own status.
    pub fn protocol(status: StatusCode, message: impl Into<String>) -> Self {
        LtiError::Protocol {
            status,
            message: message.into(),
            content_type: None,
        }
    }

    /// Classify a non-success reply of the component by its status.
    ///
    /// Client errors are protocol responses meant for the caller; server
    /// errors are internal.
    pub fn from_reply(
        status: StatusCode,
        message: impl Into<String>,
        content_type: Option<String>,
    ) -> Self {
        if status.is_server_error() {
            LtiError::Upstream {
                status,
                message: message.into(),
            }
        } else {
            LtiError::Protocol {
                status,
                message: message.into(),
                content_type,
            }
        }
    }

    /// Protocol error for a missing or malformed bearer credential.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::protocol(StatusCode::UNAUTHORIZED, message)
    }
}

/// Classification of an application error, fixed where the error is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad input from the caller (HTTP 400, message surfaced)
    Validation,

    /// Protocol failure with a pre-built response
    Protocol,

    /// Anything else (HTTP 500, message hidden)
    Internal,
}

impl ErrorKind {
    /// Stable name used in structured logs.
    pub fn name(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::Protocol => "protocol",
            ErrorKind::Internal => "internal",
        }
    }
}

/// Errors surfaced by route handlers.
#[derive(Debug, Clone, Error)]
pub enum AppError {
    /// Request data failed validation
    #[error("{0}")]
    Validation(String),

    /// Failure reported by the external LTI component
    #[error(transparent)]
    Lti(#[from] LtiError),

    /// Server-side fault
    #[error("{0}")]
    Internal(String),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        AppError::Internal(message.into())
    }

    /// The error kind. Transport and decoding failures of the LTI component
    /// are server faults, not protocol responses.
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Validation(_) => ErrorKind::Validation,
            AppError::Lti(LtiError::Protocol { .. }) => ErrorKind::Protocol,
            AppError::Lti(_) | AppError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Lti(LtiError::Protocol { status, .. }) => *status,
            _ => match self.kind() {
                ErrorKind::Validation => StatusCode::BAD_REQUEST,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    /// Message safe to show to the caller.
    pub fn public_message(&self) -> String {
        match self.kind() {
            ErrorKind::Validation | ErrorKind::Protocol => self.to_string(),
            ErrorKind::Internal => "Internal server error".to_string(),
        }
    }
}

/// Errors seen by the client launch controller.
#[derive(Debug, Clone, Error)]
pub enum ClientError {
    /// The request never produced a response
    #[error("Network error: {0}")]
    Network(String),

    /// The server answered with a non-success status
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body did not have the expected shape
    #[error("Unexpected response: {0}")]
    Decode(String),

    /// The operation is not possible in the current launch
    #[error("{0}")]
    Unavailable(String),
}
