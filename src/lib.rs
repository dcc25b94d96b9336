//! # LTI Tool
//!
//! An LTI 1.3 tool provider: a web service a learning platform launches
//! through OpenID Connect redirects, after which the tool calls back into
//! platform services (Names and Roles, Deep Linking).
//!
//! The protocol work (OIDC state, JWT signing and verification, key
//! management) is done by an external LTI component behind
//! [`lti::LtiService`]. This crate is the HTTP routing, page rendering and
//! asset resolution around it.
//!
//! ## Architecture
//!
//! - [`assets`] - Client asset manifest and entry resolution
//! - [`html`] - Page builders (home, launch, dynamic registration)
//! - [`lti`] - Protocol types, tool callbacks and the `LtiService` seam
//! - [`server`] - Axum router, handlers and middleware
//! - [`client`] - Launch page controller
//! - [`config`] - CLI and configuration types
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use lti_tool::{create_router, AssetManifest, HttpLtiService, RouterConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let service = HttpLtiService::new(
//!         "http://127.0.0.1:8787",
//!         lti_tool::lti::DEFAULT_SERVICE_TIMEOUT,
//!     )?;
//!     let manifest = AssetManifest::load("dist/client/manifest.json")?;
//!
//!     let router = create_router(
//!         Arc::new(service),
//!         RouterConfig::new().with_manifest(Arc::new(manifest)),
//!     );
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
//!     axum::serve(listener, router).await?;
//!     Ok(())
//! }
//! ```

pub mod assets;
pub mod client;
pub mod config;
pub mod error;
pub mod html;
pub mod lti;
pub mod server;

// Re-export commonly used types
pub use assets::{AssetManifest, AssetResolver, ClientScripts, ManifestEntry};
pub use client::{Document, Fetch, LaunchController, LaunchOutcome, LaunchValidator};
pub use config::{CheckConfig, Cli, Command, ServeConfig};
pub use error::{AppError, ClientError, ErrorKind, LtiError, ManifestError};
pub use lti::{
    DeepLinkPayload, HttpLtiService, LaunchSettings, LtiRequest, LtiResponse, LtiService,
    ToolJwt,
};
pub use server::{create_router, AppState, RequestContext, RouterConfig};
