//! Bundler manifest loading and entry resolution.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, error, info};

use crate::error::ManifestError;

/// Default location of the client manifest written by the bundler.
pub const DEFAULT_MANIFEST_PATH: &str = "dist/client/manifest.json";

/// Logical entry for the home page script.
pub const HOME_ENTRY: &str = "client/home.ts";

/// Logical entry for the script served after OIDC initiation.
pub const INIT_ENTRY: &str = "client/app-init.ts";

/// Logical entry for the launch page script.
pub const LAUNCH_ENTRY: &str = "client/app.ts";

/// Source extensions replaced by `.js` when no manifest entry exists.
/// Longest first so `.tsx` is not read as `.ts`.
const SOURCE_EXTENSIONS: [&str; 2] = [".tsx", ".ts"];

const RUNTIME_EXTENSION: &str = ".js";

// =============================================================================
// Manifest
// =============================================================================

/// One entry of the bundler manifest.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestEntry {
    /// Deployed file path, relative to the asset root
    pub file: String,

    /// Chunk name
    #[serde(default)]
    pub name: Option<String>,

    /// Source path the chunk was built from
    #[serde(default)]
    pub src: Option<String>,

    /// Whether this chunk is a bundle entry point
    #[serde(default)]
    pub is_entry: bool,

    /// Keys of chunks this entry imports
    #[serde(default)]
    pub imports: Vec<String>,
}

/// The bundler manifest, loaded once at startup and never modified.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssetManifest {
    entries: BTreeMap<String, ManifestEntry>,
}

impl AssetManifest {
    /// An empty manifest (development mode).
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a manifest from already parsed entries.
    pub fn from_entries(entries: impl IntoIterator<Item = (String, ManifestEntry)>) -> Self {
        Self {
            entries: entries.into_iter().collect(),
        }
    }

    /// Parse a manifest from its JSON text.
    pub fn from_json(json: &str) -> Result<Self, ManifestError> {
        Self::parse(json, "<inline>")
    }

    /// Load the manifest from disk.
    ///
    /// A missing file is not an error: it means the client was not built and
    /// the server runs with development paths.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ManifestError> {
        let path = path.as_ref();
        let shown = path.display().to_string();

        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(
                    path = %shown,
                    "No client manifest found, using development asset paths"
                );
                return Ok(Self::empty());
            }
            Err(source) => {
                return Err(ManifestError::Read {
                    path: shown,
                    source,
                })
            }
        };

        let manifest = Self::parse(&text, &shown)?;
        info!(
            path = %shown,
            entries = manifest.len(),
            "Loaded client manifest"
        );
        Ok(manifest)
    }

    fn parse(json: &str, path: &str) -> Result<Self, ManifestError> {
        let entries: BTreeMap<String, ManifestEntry> =
            serde_json::from_str(json).map_err(|e| ManifestError::Malformed {
                path: path.to_string(),
                message: e.to_string(),
            })?;
        Ok(Self { entries })
    }

    /// Look up an entry by logical name.
    pub fn get(&self, entry_name: &str) -> Option<&ManifestEntry> {
        self.entries.get(entry_name)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no manifest data is loaded (development mode).
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over `(logical name, entry)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ManifestEntry)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Development path for an entry: the source extension becomes `.js`.
///
/// Names without a known source extension are returned unchanged.
pub fn fallback_path(entry_name: &str) -> String {
    SOURCE_EXTENSIONS
        .iter()
        .find_map(|ext| entry_name.strip_suffix(ext))
        .map(|stem| format!("{}{}", stem, RUNTIME_EXTENSION))
        .unwrap_or_else(|| entry_name.to_string())
}

// =============================================================================
// Resolver
// =============================================================================

/// Resolves logical entry names to deployed asset paths.
///
/// Resolution never fails. Entries missing from a non-empty manifest are
/// counted so deploy drift is observable via [`AssetResolver::misses`].
#[derive(Debug, Clone)]
pub struct AssetResolver {
    manifest: Arc<AssetManifest>,
    misses: Arc<AtomicU64>,
}

impl AssetResolver {
    /// Create a resolver over a manifest.
    pub fn new(manifest: AssetManifest) -> Self {
        Self::from_shared(Arc::new(manifest))
    }

    /// Create a resolver over an already shared manifest.
    pub fn from_shared(manifest: Arc<AssetManifest>) -> Self {
        Self {
            manifest,
            misses: Arc::new(AtomicU64::new(0)),
        }
    }

    /// The underlying manifest.
    pub fn manifest(&self) -> &AssetManifest {
        &self.manifest
    }

    /// True when resolving with development fallback names.
    pub fn is_development(&self) -> bool {
        self.manifest.is_empty()
    }

    /// Resolve a logical entry name to the path the browser should load.
    pub fn resolve(&self, entry_name: &str) -> String {
        debug!(entry = entry_name, "Resolving client asset path");

        if self.manifest.is_empty() {
            let path = fallback_path(entry_name);
            debug!(entry = entry_name, path = %path, "No manifest data, using development path");
            return path;
        }

        match self.manifest.get(entry_name) {
            Some(entry) => {
                debug!(entry = entry_name, path = %entry.file, "Found entry in manifest");
                entry.file.clone()
            }
            None => {
                let total = self.misses.fetch_add(1, Ordering::Relaxed) + 1;
                let path = fallback_path(entry_name);
                error!(
                    event = "asset_manifest_miss",
                    entry = entry_name,
                    fallback = %path,
                    total_misses = total,
                    "Entry not found in manifest, using unhashed path"
                );
                path
            }
        }
    }

    /// Every known logical name with its deployed path.
    pub fn resolve_all(&self) -> BTreeMap<String, String> {
        self.manifest
            .iter()
            .map(|(name, entry)| (name.to_string(), entry.file.clone()))
            .collect()
    }

    /// Number of lookups that missed a non-empty manifest.
    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }
}

/// Script paths for the server-rendered pages, resolved once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientScripts {
    /// Script loaded by the home page
    pub home: String,

    /// Script loaded by the page the LTI component renders after OIDC init
    pub init: String,

    /// Script loaded by the launch page
    pub launch: String,
}

impl ClientScripts {
    /// Resolve the three page scripts.
    pub fn resolve(resolver: &AssetResolver) -> Self {
        Self {
            home: resolver.resolve(HOME_ENTRY),
            init: resolver.resolve(INIT_ENTRY),
            launch: resolver.resolve(LAUNCH_ENTRY),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
