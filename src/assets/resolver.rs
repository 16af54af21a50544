//! Request-to-file resolution and the optional cache write.

use std::path::{Path, PathBuf};

use bytes::Bytes;
use tokio::fs;
use tracing::{debug, warn};

use super::category::AssetCategory;
use super::error::AssetError;
use super::path::{AssetPath, AssetRequest};
use crate::Response;
use crate::config::AssetConfig;

/// Permissions requested for created cache directories (before umask).
#[cfg(unix)]
const CACHE_DIR_MODE: u32 = 0o777;

/// A successfully resolved asset.
#[derive(Debug, Clone)]
pub struct ResolvedAsset {
    content: Bytes,
    mime_type: &'static str,
    source: PathBuf,
}

impl ResolvedAsset {
    pub fn content(&self) -> &Bytes {
        &self.content
    }

    pub fn mime_type(&self) -> &'static str {
        self.mime_type
    }

    /// File the content was read from.
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Sets `Content-Type` on `response` and appends the content to its body.
    pub fn write_into(&self, response: &mut Response) {
        response.set_header("Content-Type", self.mime_type);
        response.write_body(&self.content);
    }

    /// Sets `Content-Type` and the content's `Content-Length` on `response`
    /// without writing the content, for `HEAD` requests.
    pub fn write_head_into(&self, response: &mut Response) {
        response.set_header("Content-Type", self.mime_type);
        response.set_content_length(self.content.len());
    }
}

/// Resolves asset requests against the vendor theme tree.
///
/// Stateless apart from its configuration; share it behind an `Arc`.
///
/// # Examples
///
/// ```rust,no_run
/// use theme_assets::{AssetCategory, AssetConfig, AssetRequest, AssetResolver};
///
/// # async fn demo() -> Result<(), theme_assets::AssetError> {
/// let resolver = AssetResolver::new(AssetConfig::new("/app"));
/// let request = AssetRequest::new("cache/blue/shop/catalog/css/main.min", "css", AssetCategory::Css);
/// let asset = resolver.resolve(&request).await?;
/// assert_eq!(asset.mime_type(), "text/css");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct AssetResolver {
    config: AssetConfig,
}

impl AssetResolver {
    pub fn new(config: AssetConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AssetConfig {
        &self.config
    }

    /// Resolves `request` using the category it carries.
    pub async fn resolve(&self, request: &AssetRequest) -> Result<ResolvedAsset, AssetError> {
        self.resolve_as(request, request.category()).await
    }

    /// Resolves `request`, choosing the MIME type by `category`.
    ///
    /// Validation happens before any filesystem access. When the static cache
    /// is enabled, a failure to create the cache directory fails the whole
    /// call even though the content has already been read.
    pub async fn resolve_as(
        &self,
        request: &AssetRequest,
        category: AssetCategory,
    ) -> Result<ResolvedAsset, AssetError> {
        let path = request.parse()?;
        let ext = request.ext();
        let source = path.source_path(&self.config.root_dir, ext);

        debug!(
            file = request.file(),
            category = %category,
            source = %source.display(),
            "resolving static asset"
        );

        match fs::metadata(&source).await {
            Ok(meta) if meta.is_file() => {}
            _ => return Err(AssetError::FileNotFound { path: source }),
        }

        let content = match fs::read(&source).await {
            Ok(content) => Bytes::from(content),
            Err(e) => {
                return Err(AssetError::Read {
                    path: source,
                    source: e,
                });
            }
        };

        if let Some(cache_root) = &self.config.static_cache {
            write_cache(cache_root, &path, ext, &content).await?;
        }

        let mime_type = category.content_type(&content);

        Ok(ResolvedAsset {
            content,
            mime_type,
            source,
        })
    }
}

/// Writes `content` to the cache tree.
///
/// Directory creation failure is an error; the file write itself is
/// best-effort and only logged. Concurrent writers of the same file race and
/// the last one wins.
async fn write_cache(
    cache_root: &Path,
    path: &AssetPath,
    ext: &str,
    content: &[u8],
) -> Result<(), AssetError> {
    let dir = path.cache_dir(cache_root);
    create_cache_dir(&dir)
        .await
        .map_err(|e| AssetError::CacheDirectoryCreateFailed {
            path: dir.clone(),
            source: e,
        })?;

    let target = path.cache_path(cache_root, ext);
    match fs::write(&target, content).await {
        Ok(()) => debug!(target = %target.display(), bytes = content.len(), "static cache written"),
        Err(e) => warn!(target = %target.display(), error = %e, "failed to write static cache file"),
    }
    Ok(())
}

async fn create_cache_dir(dir: &Path) -> std::io::Result<()> {
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    builder.mode(CACHE_DIR_MODE);
    builder.create(dir).await
}
