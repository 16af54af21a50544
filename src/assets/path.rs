//! Asset request parameters and the `cache/{theme}/{package}/{module}/{type}/{filename}`
//! path convention.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};

use super::category::AssetCategory;
use super::error::AssetError;
use crate::Request;

// Anchored on both ends. A match anywhere inside `file` would let
// `dirname(file)` climb outside the cache root.
static ASSET_PATH: LazyLock<Regex> = LazyLock::new(|| {
    RegexBuilder::new(
        r"^cache/([a-z0-9_-]+)/([a-z0-9_-]+)/([a-z0-9_-]+)/([a-z]+)/([a-z0-9_./-]+)$",
    )
    .case_insensitive(true)
    .unicode(false)
    .build()
    .expect("asset path pattern is valid")
});

static EXTENSION: LazyLock<Regex> = LazyLock::new(|| {
    RegexBuilder::new(r"^[a-z0-9]+$")
        .case_insensitive(true)
        .unicode(false)
        .build()
        .expect("extension pattern is valid")
});

/// Vendor directory every theme package is installed under.
const VENDOR_DIR: &str = "vendor/eureka";

/// The `file`/`ext` pair identifying one asset, plus the requested category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetRequest {
    file: String,
    ext: String,
    category: AssetCategory,
}

impl AssetRequest {
    /// Builds a request from raw parameter values; surrounding whitespace is trimmed.
    pub fn new(file: &str, ext: &str, category: AssetCategory) -> Self {
        Self {
            file: file.trim().to_owned(),
            ext: ext.trim().to_owned(),
            category,
        }
    }

    /// Reads `file`, `ext` and `type` from the query string.
    ///
    /// Returns `Ok(None)` when neither `file` nor `ext` is present, i.e. the
    /// request is not an asset request at all.
    pub fn from_query(request: &Request) -> Result<Option<Self>, AssetError> {
        match (request.query_param("file"), request.query_param("ext")) {
            (None, None) => Ok(None),
            (None, Some(_)) => Err(AssetError::MissingParameter { name: "file" }),
            (Some(_), None) => Err(AssetError::MissingParameter { name: "ext" }),
            (Some(file), Some(ext)) => {
                let Ok(category) = request
                    .query_param("type")
                    .unwrap_or_default()
                    .parse::<AssetCategory>();
                Ok(Some(Self::new(file, ext, category)))
            }
        }
    }

    pub fn file(&self) -> &str {
        &self.file
    }

    pub fn ext(&self) -> &str {
        &self.ext
    }

    pub fn category(&self) -> AssetCategory {
        self.category
    }

    /// Validates `file` and `ext` without touching the filesystem.
    pub fn parse(&self) -> Result<AssetPath, AssetError> {
        let path = AssetPath::parse(&self.file)?;
        if !EXTENSION.is_match(&self.ext) {
            return Err(AssetError::InvalidExtension {
                ext: self.ext.clone(),
            });
        }
        Ok(path)
    }
}

/// Components of a validated asset path.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use theme_assets::assets::AssetPath;
///
/// let path = AssetPath::parse("cache/blue/shop/catalog/css/main.min").unwrap();
/// assert_eq!(path.theme(), "blue");
/// assert_eq!(
///     path.source_path(Path::new("/app"), "css"),
///     Path::new("/app/vendor/eureka/theme-blue-shop/src/static/catalog/css/main.min.css"),
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetPath {
    file: String,
    theme: String,
    package: String,
    module: String,
    kind: String,
    filename: String,
}

impl AssetPath {
    /// Matches `file` against the asset path convention.
    ///
    /// The first segment must be the literal `cache` (any case). The filename
    /// may span several segments but none of them may be `..`.
    pub fn parse(file: &str) -> Result<Self, AssetError> {
        let invalid = || AssetError::InvalidPath {
            file: file.to_owned(),
        };

        let caps = ASSET_PATH.captures(file).ok_or_else(invalid)?;
        let filename = &caps[5];
        if filename.split('/').any(|segment| segment == "..") {
            return Err(invalid());
        }

        Ok(Self {
            file: file.to_owned(),
            theme: caps[1].to_owned(),
            package: caps[2].to_owned(),
            module: caps[3].to_owned(),
            kind: caps[4].to_owned(),
            filename: filename.to_owned(),
        })
    }

    pub fn theme(&self) -> &str {
        &self.theme
    }

    pub fn package(&self) -> &str {
        &self.package
    }

    pub fn module(&self) -> &str {
        &self.module
    }

    /// The asset type directory (`css`, `js`, `img`, ...).
    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// The single candidate file under `root` for this asset.
    pub fn source_path(&self, root: &Path, ext: &str) -> PathBuf {
        root.join(format!(
            "{VENDOR_DIR}/theme-{}-{}/src/static/{}/{}/{}.{ext}",
            self.theme, self.package, self.module, self.kind, self.filename
        ))
    }

    /// Directory under `cache_root` mirroring the directory part of `file`.
    pub fn cache_dir(&self, cache_root: &Path) -> PathBuf {
        let dir = Path::new(&self.file).parent().unwrap_or(Path::new(""));
        cache_root.join(dir)
    }

    /// Where the cache copy of this asset is written under `cache_root`.
    pub fn cache_path(&self, cache_root: &Path, ext: &str) -> PathBuf {
        let served = format!("{}.{ext}", self.filename);
        let name = Path::new(&served)
            .file_name()
            .map_or_else(|| served.clone().into(), ToOwned::to_owned);
        self.cache_dir(cache_root).join(name)
    }
}
