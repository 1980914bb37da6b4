//! Static asset processing and script loading.
//!
//! Assets are copied from the static directory into the output, optionally with
//! a content hash in the file name. The resulting [`AssetManifest`] is what
//! [`ScriptLoader`] resolves script sources against in production.

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use folio_parser::syntax::html_escape;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::{debug, info};

/// Asset processing errors.
#[derive(Debug, Error)]
pub enum AssetError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid asset path.
    #[error("invalid asset path: {0}")]
    InvalidPath(PathBuf),

    /// Manifest serialization error.
    #[error("manifest error: {0}")]
    Manifest(#[from] serde_json::Error),
}

/// Result type for asset operations.
pub type Result<T> = std::result::Result<T, AssetError>;

/// Maps source asset paths (`/app/theme.js`) to emitted paths
/// (`/app/theme.1a2b3c4d.js`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssetManifest {
    assets: BTreeMap<String, String>,
}

impl AssetManifest {
    /// Create a new empty manifest.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an emitted asset.
    pub fn add(&mut self, source: impl Into<String>, emitted: impl Into<String>) {
        self.assets.insert(source.into(), emitted.into());
    }

    /// Emitted path for a source path. A missing leading slash is tolerated.
    #[must_use]
    pub fn get(&self, source: &str) -> Option<&str> {
        let key = format!("/{}", source.trim_start_matches('/'));
        self.assets.get(&key).map(String::as_str)
    }

    /// Number of assets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.assets.len()
    }

    /// Whether the manifest is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    /// Serialize the manifest to pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.assets)?)
    }

    /// Load a manifest previously written with [`AssetManifest::to_json`].
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(Self {
            assets: serde_json::from_str(json)?,
        })
    }
}

/// Copies static assets, optionally fingerprinting them.
#[derive(Debug)]
pub struct AssetProcessor {
    fingerprint: bool,
    fingerprint_extensions: Vec<String>,
}

impl AssetProcessor {
    /// Create a new asset processor.
    #[must_use]
    pub fn new(fingerprint: bool) -> Self {
        Self {
            fingerprint,
            fingerprint_extensions: ["css", "js", "mjs", "woff2", "png", "jpg", "svg", "webp"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }

    /// Copy every asset under `source_dir` into `dest_dir`.
    pub fn process(&self, source_dir: &Path, dest_dir: &Path) -> Result<AssetManifest> {
        info!(
            source = %source_dir.display(),
            dest = %dest_dir.display(),
            "processing assets"
        );

        let mut manifest = AssetManifest::new();
        if !source_dir.exists() {
            debug!("static directory does not exist, skipping");
            return Ok(manifest);
        }

        self.process_dir(source_dir, source_dir, dest_dir, &mut manifest)?;

        info!(count = manifest.len(), "assets processed");
        Ok(manifest)
    }

    fn process_dir(
        &self,
        base_dir: &Path,
        current_dir: &Path,
        dest_base: &Path,
        manifest: &mut AssetManifest,
    ) -> Result<()> {
        for entry in fs::read_dir(current_dir)? {
            let path = entry?.path();

            if path
                .file_name()
                .is_some_and(|n| n.to_string_lossy().starts_with('.'))
            {
                continue;
            }

            if path.is_dir() {
                self.process_dir(base_dir, &path, dest_base, manifest)?;
            } else if path.is_file() {
                self.process_file(base_dir, &path, dest_base, manifest)?;
            }
        }
        Ok(())
    }

    fn process_file(
        &self,
        base_dir: &Path,
        file_path: &Path,
        dest_base: &Path,
        manifest: &mut AssetManifest,
    ) -> Result<()> {
        let relative = file_path
            .strip_prefix(base_dir)
            .map_err(|_| AssetError::InvalidPath(file_path.to_path_buf()))?;

        let extension = file_path
            .extension()
            .map(|e| e.to_string_lossy().to_string());
        let fingerprint = self.fingerprint
            && extension
                .as_ref()
                .is_some_and(|ext| self.fingerprint_extensions.contains(ext));

        let dest_relative = match (fingerprint, extension) {
            (true, Some(ext)) => {
                let bytes = fs::read(file_path)?;
                let stem = file_path.file_stem().unwrap_or_default().to_string_lossy();
                relative.with_file_name(format!("{stem}.{}.{ext}", content_hash(&bytes)))
            }
            _ => relative.to_path_buf(),
        };

        let dest_path = dest_base.join(&dest_relative);
        if let Some(parent) = dest_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(file_path, &dest_path)?;

        manifest.add(url_path(relative), url_path(&dest_relative));
        debug!(src = %file_path.display(), dest = %dest_path.display(), "copied asset");
        Ok(())
    }
}

/// Short content hash used in fingerprinted file names.
pub fn content_hash(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    digest[..4].iter().map(|b| format!("{b:02x}")).collect()
}

fn url_path(path: &Path) -> String {
    format!("/{}", path.display()).replace('\\', "/")
}

/// Emits `<script>` tags for static scripts.
///
/// In production, sources resolve through the manifest and inline scripts are
/// read from the output directory. In development, sources are used as-is.
#[derive(Debug, Clone, Copy)]
pub struct ScriptLoader<'a> {
    manifest: &'a AssetManifest,
    output_dir: &'a Path,
    production: bool,
}

impl<'a> ScriptLoader<'a> {
    /// Create a loader.
    pub fn new(manifest: &'a AssetManifest, output_dir: &'a Path, production: bool) -> Self {
        Self {
            manifest,
            output_dir,
            production,
        }
    }

    /// Module script tag for `src`.
    ///
    /// In production a source missing from the manifest yields no tag.
    pub fn script_tag(&self, src: &str, is_async: bool) -> String {
        let async_attr = if is_async { " async" } else { "" };
        let tag = |src: &str| {
            format!(
                r#"<script type="module"{async_attr} src="{}"></script>"#,
                html_escape(src)
            )
        };
        if !self.production {
            return tag(src);
        }
        match self.manifest.get(src) {
            Some(emitted) => tag(emitted),
            None => {
                debug!(src, "script not in manifest, omitting");
                String::new()
            }
        }
    }

    /// Contents of an inlined script, or `None` in development or when the
    /// source is not in the manifest.
    pub fn inline_contents(&self, src: &str) -> Result<Option<String>> {
        if !self.production {
            return Ok(None);
        }
        let Some(emitted) = self.manifest.get(src) else {
            debug!(src, "inline script not in manifest");
            return Ok(None);
        };
        let path = self.output_dir.join(emitted.trim_start_matches('/'));
        Ok(Some(fs::read_to_string(path)?))
    }

    /// Inline `<script>` for `src`, or a `src` tag in development.
    pub fn inline_script(&self, src: &str) -> Result<String> {
        if !self.production {
            return Ok(format!(r#"<script src="{}"></script>"#, html_escape(src)));
        }
        Ok(self
            .inline_contents(src)?
            .map(|contents| format!("<script>{contents}</script>"))
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn write(dir: &Path, rel: &str, contents: &str) {
        let path = dir.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    #[test]
    fn test_asset_manifest() {
        let mut manifest = AssetManifest::new();
        manifest.add("/app/theme.js", "/app/theme.abc12345.js");

        assert_eq!(manifest.get("/app/theme.js"), Some("/app/theme.abc12345.js"));
        assert_eq!(manifest.get("app/theme.js"), Some("/app/theme.abc12345.js"));
        assert_eq!(manifest.get("/missing.js"), None);
    }

    #[test]
    fn test_manifest_json() {
        let mut manifest = AssetManifest::new();
        manifest.add("/style.css", "/style.abc123.css");

        let json = manifest.to_json().unwrap();
        assert!(json.contains(r#""/style.css": "/style.abc123.css""#));
        assert_eq!(AssetManifest::from_json(&json).unwrap(), manifest);
    }

    #[test]
    fn test_process_assets() {
        let source = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        write(source.path(), "style.css", "body {}");
        write(source.path(), "app/theme.js", "console.log(1)");
        write(source.path(), ".hidden", "x");

        let manifest = AssetProcessor::new(false)
            .process(source.path(), dest.path())
            .unwrap();

        assert_eq!(manifest.len(), 2);
        assert_eq!(manifest.get("/app/theme.js"), Some("/app/theme.js"));
        assert!(dest.path().join("style.css").exists());
        assert!(!dest.path().join(".hidden").exists());
    }

    #[test]
    fn test_process_with_fingerprinting() {
        let source = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        write(source.path(), "app/theme.js", "console.log(1)");
        write(source.path(), "robots.txt", "User-agent: *");

        let manifest = AssetProcessor::new(true)
            .process(source.path(), dest.path())
            .unwrap();

        let hash = content_hash(b"console.log(1)");
        let emitted = format!("/app/theme.{hash}.js");
        assert_eq!(manifest.get("/app/theme.js"), Some(emitted.as_str()));
        assert!(dest.path().join(emitted.trim_start_matches('/')).exists());
        assert_eq!(manifest.get("/robots.txt"), Some("/robots.txt"));
    }

    #[test]
    fn test_missing_static_dir() {
        let dest = TempDir::new().unwrap();
        let manifest = AssetProcessor::new(true)
            .process(&dest.path().join("nope"), dest.path())
            .unwrap();
        assert!(manifest.is_empty());
    }

    #[test]
    fn test_content_hash_deterministic() {
        assert_eq!(content_hash(b"abc"), content_hash(b"abc"));
        assert_ne!(content_hash(b"abc"), content_hash(b"abd"));
        assert_eq!(content_hash(b"abc").len(), 8);
    }

    #[test]
    fn test_script_tag_production() {
        let mut manifest = AssetManifest::new();
        manifest.add("/app/client.js", "/app/client.1234abcd.js");
        let dir = TempDir::new().unwrap();
        let loader = ScriptLoader::new(&manifest, dir.path(), true);

        assert_eq!(
            loader.script_tag("/app/client.js", true),
            r#"<script type="module" async src="/app/client.1234abcd.js"></script>"#
        );
        assert_eq!(loader.script_tag("/app/missing.js", false), "");
    }

    #[test]
    fn test_script_tag_development() {
        let manifest = AssetManifest::new();
        let dir = TempDir::new().unwrap();
        let loader = ScriptLoader::new(&manifest, dir.path(), false);

        assert_eq!(
            loader.script_tag("/app/client.js", false),
            r#"<script type="module" src="/app/client.js"></script>"#
        );
        assert_eq!(
            loader.inline_script("/app/theme.js").unwrap(),
            r#"<script src="/app/theme.js"></script>"#
        );
        assert_eq!(loader.inline_contents("/app/theme.js").unwrap(), None);
    }

    #[test]
    fn test_script_sources_are_escaped() {
        let mut manifest = AssetManifest::new();
        manifest.add("/app/a\"b.js", "/app/a\"b.1234abcd.js");
        let dir = TempDir::new().unwrap();

        let production = ScriptLoader::new(&manifest, dir.path(), true);
        assert_eq!(
            production.script_tag("/app/a\"b.js", true),
            r#"<script type="module" async src="/app/a&quot;b.1234abcd.js"></script>"#
        );

        let development = ScriptLoader::new(&manifest, dir.path(), false);
        assert_eq!(
            development.script_tag("/x.js?a=1&b=<2>", false),
            r#"<script type="module" src="/x.js?a=1&amp;b=&lt;2&gt;"></script>"#
        );
        assert_eq!(
            development.inline_script("/t'.js").unwrap(),
            r#"<script src="/t&#x27;.js"></script>"#
        );
    }

    #[test]
    fn test_inline_script_production() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "app/theme.1234abcd.js", "document.documentElement.dataset.theme='dark'");
        let mut manifest = AssetManifest::new();
        manifest.add("/app/theme.js", "/app/theme.1234abcd.js");
        let loader = ScriptLoader::new(&manifest, dir.path(), true);

        assert_eq!(
            loader.inline_script("/app/theme.js").unwrap(),
            "<script>document.documentElement.dataset.theme='dark'</script>"
        );
        assert_eq!(loader.inline_script("/app/other.js").unwrap(), "");
    }
}
