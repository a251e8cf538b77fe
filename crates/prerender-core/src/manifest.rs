//! Client asset manifest.
//!
//! Produced upstream by the client bundler and read-only for a generation run:
//! a mapping from module identifier to the asset files emitted for it, plus the
//! entrypoint modules every page loads.

use std::{collections::HashMap, path::Path};

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Kind of an emitted asset file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    /// JavaScript loaded with a `<script>` tag.
    Script,
    /// CSS loaded with a `<link rel="stylesheet">` tag.
    Stylesheet,
    /// Anything else (source maps, images, fonts...). Never referenced by pages.
    Other,
}

impl AssetKind {
    /// Infer the kind from a file name's extension.
    #[must_use]
    pub fn from_file_name(file: &str) -> Self {
        let file = file.split(['?', '#']).next().unwrap_or(file);
        let extension = file
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "js" | "mjs" | "cjs" => Self::Script,
            "css" => Self::Stylesheet,
            _ => Self::Other,
        }
    }
}

/// A single emitted asset file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetFile {
    /// File name relative to the site base URL.
    pub file: String,

    /// Explicit kind; inferred from the extension when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<AssetKind>,
}

impl AssetFile {
    /// Create an asset whose kind is inferred from its extension.
    #[must_use]
    pub fn new(file: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            kind: None,
        }
    }

    /// Effective kind of this asset.
    #[must_use]
    pub fn kind(&self) -> AssetKind {
        self.kind.unwrap_or_else(|| AssetKind::from_file_name(&self.file))
    }
}

/// Module identifier → emitted asset files, plus the always-loaded entrypoints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    /// Modules included on every page, in load order.
    #[serde(default)]
    pub entrypoints: Vec<String>,

    /// Asset files per module, in the order the bundler declared them.
    #[serde(default)]
    pub modules: HashMap<String, Vec<AssetFile>>,
}

impl Manifest {
    /// Create an empty manifest.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a manifest from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| CoreError::manifest(path, format!("cannot read file: {e}")))?;
        serde_json::from_str(&content).map_err(|e| CoreError::manifest(path, e.to_string()))
    }

    /// Add an entrypoint module.
    #[must_use]
    pub fn with_entrypoint(mut self, module: impl Into<String>) -> Self {
        self.entrypoints.push(module.into());
        self
    }

    /// Register the files emitted for a module.
    #[must_use]
    pub fn with_module<I, F>(mut self, module: impl Into<String>, files: I) -> Self
    where
        I: IntoIterator<Item = F>,
        F: Into<String>,
    {
        self.modules.insert(
            module.into(),
            files.into_iter().map(AssetFile::new).collect(),
        );
        self
    }

    /// Files emitted for a module, if the manifest knows it.
    #[must_use]
    pub fn files(&self, module: &str) -> Option<&[AssetFile]> {
        self.modules.get(module).map(Vec::as_slice)
    }
}
