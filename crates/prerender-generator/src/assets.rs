//! Asset resolution.
//!
//! Works out which scripts and stylesheets a page needs from the modules it
//! used while rendering.

use std::collections::HashSet;

use prerender_core::{AssetKind, Manifest};
use tracing::trace;

/// Scripts and stylesheets a page loads, in load order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssetBundles {
    /// Script files, relative to the base URL.
    pub scripts: Vec<String>,

    /// Stylesheet files, relative to the base URL.
    pub stylesheets: Vec<String>,
}

impl AssetBundles {
    /// Whether the page references no asset at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scripts.is_empty() && self.stylesheets.is_empty()
    }
}

/// Resolve the assets of a page.
///
/// The manifest entrypoints come first, then the page's own modules. Modules
/// missing from the manifest are skipped, and a file shared by several
/// modules is only listed the first time it is seen.
#[must_use]
pub fn resolve_bundles<S: AsRef<str>>(manifest: &Manifest, modules: &[S]) -> AssetBundles {
    let mut bundles = AssetBundles::default();
    let mut seen = HashSet::new();

    let requested = manifest
        .entrypoints
        .iter()
        .map(String::as_str)
        .chain(modules.iter().map(AsRef::as_ref));

    for module in requested {
        let Some(files) = manifest.files(module) else {
            trace!(module, "module not in manifest, skipping");
            continue;
        };

        for asset in files {
            if !seen.insert(asset.file.as_str()) {
                continue;
            }

            match asset.kind() {
                AssetKind::Script => bundles.scripts.push(asset.file.clone()),
                AssetKind::Stylesheet => bundles.stylesheets.push(asset.file.clone()),
                AssetKind::Other => {}
            }
        }
    }

    bundles
}

#[cfg(test)]
mod tests {
    use prerender_core::AssetFile;

    use super::*;

    fn test_manifest() -> Manifest {
        Manifest::new()
            .with_entrypoint("main")
            .with_module(
                "main",
                ["assets/js/runtime.js", "assets/js/main.js", "assets/css/styles.css"],
            )
            .with_module(
                "@site/docs/intro.md",
                ["assets/js/intro.js", "assets/js/main.js", "assets/js/intro.js.map"],
            )
            .with_module("@theme/DocPage", ["assets/css/doc.css", "assets/js/doc.js"])
    }

    #[test]
    fn test_entrypoints_always_included() {
        let bundles = resolve_bundles::<&str>(&test_manifest(), &[]);

        assert_eq!(bundles.scripts, vec!["assets/js/runtime.js", "assets/js/main.js"]);
        assert_eq!(bundles.stylesheets, vec!["assets/css/styles.css"]);
    }

    #[test]
    fn test_page_modules_follow_entrypoints() {
        let bundles = resolve_bundles(&test_manifest(), &["@theme/DocPage", "@site/docs/intro.md"]);

        assert_eq!(
            bundles.scripts,
            vec![
                "assets/js/runtime.js",
                "assets/js/main.js",
                "assets/js/doc.js",
                "assets/js/intro.js",
            ]
        );
        assert_eq!(
            bundles.stylesheets,
            vec!["assets/css/styles.css", "assets/css/doc.css"]
        );
    }

    #[test]
    fn test_duplicates_keep_first_position() {
        let modules = ["@site/docs/intro.md", "main", "@site/docs/intro.md"];
        let bundles = resolve_bundles(&test_manifest(), &modules);

        let main_count = bundles
            .scripts
            .iter()
            .filter(|s| s.as_str() == "assets/js/main.js")
            .count();
        assert_eq!(main_count, 1);
        assert_eq!(bundles.scripts[1], "assets/js/main.js");
        assert_eq!(bundles.scripts.len(), 3);
    }

    #[test]
    fn test_unknown_modules_skipped() {
        let bundles = resolve_bundles(&Manifest::new(), &["missing", "also-missing"]);
        assert!(bundles.is_empty());
    }

    #[test]
    fn test_non_script_assets_ignored() {
        let bundles = resolve_bundles(&test_manifest(), &["@site/docs/intro.md"]);
        assert!(bundles.scripts.iter().all(|s| !s.ends_with(".map")));
    }

    #[test]
    fn test_explicit_kind_respected() {
        let mut manifest = Manifest::new();
        manifest.modules.insert(
            "chunk".to_string(),
            vec![AssetFile {
                file: "assets/chunk-42".to_string(),
                kind: Some(AssetKind::Script),
            }],
        );

        let bundles = resolve_bundles(&manifest, &["chunk"]);
        assert_eq!(bundles.scripts, vec!["assets/chunk-42"]);
    }
}
