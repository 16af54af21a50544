//! Static theme asset resolution.
//!
//! Asset URLs follow `cache/{theme}/{package}/{module}/{type}/{filename}` and
//! map onto the vendor tree:
//!
//! ```text
//! <root>/vendor/eureka/theme-{theme}-{package}/src/static/{module}/{type}/{filename}.{ext}
//! ```
//!
//! The [`AssetCategory`] decides the `Content-Type`: CSS and JS use fixed
//! types, everything else is sniffed from the file content. When the static
//! cache is enabled every served file is also copied to
//! `<cache>/<dirname(file)>/<filename>.<ext>` so the front web server can
//! serve it directly next time.

mod category;
mod error;
mod middleware;
mod path;
mod resolver;
pub mod sniff;

pub use category::{AssetCategory, MimePolicy};
pub use error::AssetError;
pub use middleware::{StaticAssetMiddleware, StaticRewriteMiddleware};
pub use path::{AssetPath, AssetRequest};
pub use resolver::{AssetResolver, ResolvedAsset};
