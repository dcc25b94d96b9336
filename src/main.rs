//! LTI Tool - an LTI 1.3 tool provider.
//!
//! This binary starts the HTTP server and configures all components.

use clap::Parser;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lti_tool::{
    assets::{AssetManifest, AssetResolver, ClientScripts},
    config::{CheckConfig, Cli, Command, ServeConfig},
    lti::{definitions::LTI_REGISTRATION_PATH, HttpLtiService},
    server::{create_router, RouterConfig},
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.into_command() {
        Command::Serve(config) => run_serve(config).await,
        Command::Check(config) => run_check(config),
    }
}

// =============================================================================
// Serve Command
// =============================================================================

async fn run_serve(config: ServeConfig) -> ExitCode {
    init_logging(config.verbose);

    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    info!("LTI Tool v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration:");
    info!("  Application: {}", config.application_name);
    info!("  LTI service: {}", config.lti_service_url);
    info!("  LTI service timeout: {}s", config.lti_service_timeout);
    info!("  Manifest: {}", config.manifest_path);
    if let Some(ref dir) = config.assets_dir {
        info!("  Assets: {}", dir);
    }

    let manifest = match AssetManifest::load(&config.manifest_path) {
        Ok(manifest) => Arc::new(manifest),
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let service = match HttpLtiService::new(&config.lti_service_url, config.service_timeout()) {
        Ok(service) => Arc::new(service),
        Err(e) => {
            error!("Failed to create LTI service client: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let router = create_router(service, build_router_config(&config, manifest));

    let addr = config.bind_address();

    info!("");
    info!("────────────────────────────────────────────────────────────────");
    info!("  Server listening on: http://{}", addr);
    info!("");
    info!("  Try these endpoints:");
    info!("    curl http://{}/up", addr);
    info!("");
    info!("  Dynamic registration URL:");
    info!("    https://<public-host>{}", LTI_REGISTRATION_PATH);
    info!("────────────────────────────────────────────────────────────────");
    info!("");

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to {}: {}", addr, e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = axum::serve(listener, router).await {
        error!("Server error: {}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "lti_tool=debug,tower_http=debug"
    } else {
        "lti_tool=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Build RouterConfig from the application ServeConfig.
fn build_router_config(config: &ServeConfig, manifest: Arc<AssetManifest>) -> RouterConfig {
    let mut router_config = RouterConfig::new()
        .with_manifest(manifest)
        .with_application_name(config.application_name.clone())
        .with_tracing(!config.no_tracing);

    if let Some(ref dir) = config.assets_dir {
        router_config = router_config.with_assets_dir(dir);
    }

    router_config
}

// =============================================================================
// Check Command
// =============================================================================

fn run_check(config: CheckConfig) -> ExitCode {
    if config.verbose {
        init_logging(true);
    }

    println!("LTI Tool Asset Check");
    println!("═════════════════════════════════");
    println!();

    let manifest = match AssetManifest::load(&config.manifest_path) {
        Ok(manifest) => manifest,
        Err(e) => {
            println!("✗ Manifest: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let resolver = AssetResolver::new(manifest);
    if resolver.is_development() {
        println!(
            "✓ Manifest: {} not found or empty, using development paths",
            config.manifest_path
        );
    } else {
        println!(
            "✓ Manifest: {} ({} entries)",
            config.manifest_path,
            resolver.manifest().len()
        );
        println!();
        println!("Entries:");
        println!("─────────────────");
        for (name, path) in resolver.resolve_all() {
            println!("  {} → {}", name, path);
        }
    }

    println!();
    println!("Client scripts:");
    println!("─────────────────");
    let scripts = ClientScripts::resolve(&resolver);
    println!("  home   → {}", scripts.home);
    println!("  init   → {}", scripts.init);
    println!("  launch → {}", scripts.launch);

    println!();
    println!("═════════════════════════════════");
    if resolver.misses() > 0 {
        println!(
            "✗ {} client script(s) missing from the manifest",
            resolver.misses()
        );
        return ExitCode::FAILURE;
    }
    println!("✓ All checks passed!");

    ExitCode::SUCCESS
}
