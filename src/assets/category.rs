//! Asset categories and their MIME policies.

use std::fmt;
use std::str::FromStr;

use super::sniff;

/// How the `Content-Type` of a served asset is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MimePolicy {
    /// Always this type, regardless of content.
    Fixed(&'static str),
    /// Inspect the bytes actually read from disk.
    Sniff,
}

/// The kind of asset being served.
///
/// Selected per request through the `type` query parameter, or pinned on a
/// [`StaticAssetMiddleware`](super::StaticAssetMiddleware).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AssetCategory {
    Css,
    Js,
    Image,
    Font,
    #[default]
    Other,
}

impl AssetCategory {
    pub const fn mime_policy(self) -> MimePolicy {
        match self {
            Self::Css => MimePolicy::Fixed("text/css"),
            Self::Js => MimePolicy::Fixed("application/javascript"),
            Self::Image | Self::Font | Self::Other => MimePolicy::Sniff,
        }
    }

    /// Content type for `content` served under this category.
    pub fn content_type(self, content: &[u8]) -> &'static str {
        match self.mime_policy() {
            MimePolicy::Fixed(mime) => mime,
            MimePolicy::Sniff => sniff::sniff(content),
        }
    }

    /// Category routed to by the front web server for a file extension.
    ///
    /// Extensions outside the rewrite table are not asset requests.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "css" => Some(Self::Css),
            "js" => Some(Self::Js),
            "jpg" | "jpeg" | "png" => Some(Self::Image),
            "eot" | "svg" | "ttf" | "woff" | "woff2" => Some(Self::Font),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Css => "css",
            Self::Js => "js",
            Self::Image => "image",
            Self::Font => "font",
            Self::Other => "other",
        }
    }
}

impl FromStr for AssetCategory {
    type Err = std::convert::Infallible;

    /// Parses the `type` query parameter; unknown values fall back to `Other`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "css" => Self::Css,
            "js" => Self::Js,
            "image" => Self::Image,
            "font" => Self::Font,
            _ => Self::Other,
        })
    }
}

impl fmt::Display for AssetCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
