//! Configuration management.
//!
//! Command-line arguments via clap, each with an environment variable
//! fallback using the `LTI_` prefix.
//!
//! # Example
//!
//! ```ignore
//! use clap::Parser;
//! use lti_tool::config::{Cli, Command};
//!
//! match Cli::parse().into_command() {
//!     Command::Serve(config) => println!("Listening on {}", config.bind_address()),
//!     Command::Check(config) => println!("Manifest: {}", config.manifest_path),
//! }
//! ```
//!
//! # Environment Variables
//!
//! - `LTI_HOST` - Server bind address (default: 0.0.0.0)
//! - `LTI_PORT` - Server port (default: 3000)
//! - `LTI_SERVICE_URL` - Base URL of the LTI endpoint service (required)
//! - `LTI_SERVICE_TIMEOUT` - LTI service request timeout in seconds (default: 30)
//! - `LTI_MANIFEST_PATH` - Client asset manifest (default: dist/client/manifest.json)
//! - `LTI_ASSETS_DIR` - Directory of built client assets to serve
//! - `LTI_APPLICATION_NAME` - Name shown on pages and sent at registration

use std::time::Duration;

use clap::{Args, Parser, Subcommand};

use crate::assets::DEFAULT_MANIFEST_PATH;
use crate::lti::definitions::DEFAULT_APPLICATION_NAME;

// =============================================================================
// Default Values
// =============================================================================

/// Default server host.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default server port.
pub const DEFAULT_PORT: u16 = 3000;

/// Default LTI service timeout in seconds.
pub const DEFAULT_SERVICE_TIMEOUT_SECS: u64 = 30;

// =============================================================================
// CLI Arguments
// =============================================================================

/// LTI Tool - an LTI 1.3 tool provider.
#[derive(Parser, Debug, Clone)]
#[command(name = "lti-tool")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    pub fn into_command(self) -> Command {
        self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Start the HTTP server.
    Serve(ServeConfig),

    /// Check the client asset manifest and print how entries resolve.
    Check(CheckConfig),
}

/// Options of the `serve` command.
#[derive(Args, Debug, Clone)]
pub struct ServeConfig {
    // =========================================================================
    // Server Configuration
    // =========================================================================
    /// Host address to bind the server to.
    #[arg(long, default_value = DEFAULT_HOST, env = "LTI_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(short, long, default_value_t = DEFAULT_PORT, env = "LTI_PORT")]
    pub port: u16,

    // =========================================================================
    // LTI Service Configuration
    // =========================================================================
    /// Base URL of the LTI endpoint service.
    #[arg(long, env = "LTI_SERVICE_URL")]
    pub lti_service_url: String,

    /// Timeout for LTI service requests, in seconds.
    #[arg(long, default_value_t = DEFAULT_SERVICE_TIMEOUT_SECS, env = "LTI_SERVICE_TIMEOUT")]
    pub lti_service_timeout: u64,

    // =========================================================================
    // Client Assets
    // =========================================================================
    /// Path of the client asset manifest written by the bundler.
    ///
    /// A missing file runs the server with development asset paths.
    #[arg(long, default_value = DEFAULT_MANIFEST_PATH, env = "LTI_MANIFEST_PATH")]
    pub manifest_path: String,

    /// Directory of built client assets served for unmatched paths.
    #[arg(long, env = "LTI_ASSETS_DIR")]
    pub assets_dir: Option<String>,

    /// Application name shown on pages and sent at registration.
    #[arg(long, default_value = DEFAULT_APPLICATION_NAME, env = "LTI_APPLICATION_NAME")]
    pub application_name: String,

    // =========================================================================
    // Logging Configuration
    // =========================================================================
    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Disable request tracing.
    #[arg(long, default_value_t = false)]
    pub no_tracing: bool,
}

impl ServeConfig {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.lti_service_url.is_empty() {
            return Err(
                "LTI service URL is required. Set --lti-service-url or LTI_SERVICE_URL"
                    .to_string(),
            );
        }

        match url::Url::parse(&self.lti_service_url) {
            Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
            Ok(url) => {
                return Err(format!(
                    "LTI service URL must use http or https, got {}",
                    url.scheme()
                ))
            }
            Err(e) => return Err(format!("Invalid LTI service URL: {}", e)),
        }

        if self.lti_service_timeout == 0 {
            return Err("lti_service_timeout must be greater than 0".to_string());
        }

        if self.application_name.trim().is_empty() {
            return Err("application_name must not be empty".to_string());
        }

        Ok(())
    }

    /// Get the server bind address as "host:port".
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn service_timeout(&self) -> Duration {
        Duration::from_secs(self.lti_service_timeout)
    }
}

/// Options of the `check` command.
#[derive(Args, Debug, Clone)]
pub struct CheckConfig {
    /// Path of the client asset manifest.
    #[arg(long, default_value = DEFAULT_MANIFEST_PATH, env = "LTI_MANIFEST_PATH")]
    pub manifest_path: String,

    /// Enable verbose logging.
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

// =============================================================================
// Tests
// =============================================================================
