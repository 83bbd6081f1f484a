//! Content types for static assets.
//!
//! System type registries tend to miss a few of the extensions the bundled
//! front-end ships (fonts, source maps), so bootstrap registers them here.

use mime::Mime;
use std::collections::HashMap;
use std::path::Path;
use std::sync::RwLock;
use tracing::warn;

/// Extensions registered on bootstrap, with their content types.
pub const STATIC_ASSET_TYPES: [(&str, &str); 9] = [
    ("map", "application/json"),
    ("woff", "application/font-woff"),
    ("woff2", "application/font-woff2"),
    ("eot", "application/vnd.ms-fontobject"),
    ("ttf", "application/x-font-ttf"),
    ("ttc", "application/x-font-ttf"),
    ("otf", "font/opentype"),
    ("svg", "image/svg+xml"),
    ("log", "text/plain"),
];

/// Extension to content type lookup.
#[derive(Debug, Default)]
pub struct MimeRegistry {
    types: RwLock<HashMap<String, Mime>>,
}

impl MimeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Associates `ext` (with or without a leading dot) with `mime`.
    pub fn add_type(&self, ext: &str, mime: Mime) {
        let mut types = self.types.write().unwrap_or_else(|e| e.into_inner());
        types.insert(normalize(ext), mime);
    }

    /// Registers [`STATIC_ASSET_TYPES`]. Returns how many were added.
    pub fn register_static_asset_types(&self) -> usize {
        let mut added = 0;
        for (ext, content_type) in STATIC_ASSET_TYPES {
            match content_type.parse::<Mime>() {
                Ok(mime) => {
                    self.add_type(ext, mime);
                    added += 1;
                }
                Err(e) => warn!(ext, content_type, error = %e, "Skipping invalid content type"),
            }
        }
        added
    }

    pub fn get(&self, ext: &str) -> Option<Mime> {
        let types = self.types.read().unwrap_or_else(|e| e.into_inner());
        types.get(&normalize(ext)).cloned()
    }

    /// Looks up the content type for a path by its extension.
    pub fn guess<P: AsRef<Path>>(&self, path: P) -> Option<Mime> {
        let ext = path.as_ref().extension()?.to_str()?;
        self.get(ext)
    }

    pub fn len(&self) -> usize {
        self.types.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn normalize(ext: &str) -> String {
    ext.trim_start_matches('.').to_ascii_lowercase()
}
