//! Client asset resolution.
//!
//! The bundler writes a manifest mapping logical entry names (the source
//! script, e.g. `client/app.ts`) to the hashed file it deployed. Pages embed
//! the resolved path so browsers always load the current build.
//!
//! ```text
//! ┌──────────────────┐     ┌────────────────┐     ┌──────────────────────┐
//! │  manifest.json   │ ──▶ │ AssetManifest  │ ──▶ │    AssetResolver     │
//! │ (build artifact) │     │ (Arc, frozen)  │     │ resolve / resolve_all│
//! └──────────────────┘     └────────────────┘     └──────────────────────┘
//! ```
//!
//! # Modes
//!
//! - **Development**: no manifest, every entry maps to its fallback name
//!   (`client/app.ts` → `client/app.js`).
//! - **Production**: entries come from the manifest. A missing entry falls back
//!   to the development name and is logged, never returned as an error.
//!
//! # Example
//!
//! ```
//! use lti_tool::assets::{AssetManifest, AssetResolver};
//!
//! let resolver = AssetResolver::new(AssetManifest::empty());
//! assert_eq!(resolver.resolve("client/app.ts"), "client/app.js");
//! ```

mod manifest;

pub use manifest::{
    fallback_path, AssetManifest, AssetResolver, ClientScripts, ManifestEntry,
    DEFAULT_MANIFEST_PATH, HOME_ENTRY, INIT_ENTRY, LAUNCH_ENTRY,
};
