//! # theme-assets
//!
//! Middleware that serves static theme assets (CSS, JS, images, fonts) out of
//! vendor theme packages, with an optional on-disk cache copy.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use theme_assets::{AssetConfig, AssetResolver, Request, StaticAssetMiddleware, StaticRewriteMiddleware};
//! use theme_assets::context::Context;
//! use theme_assets::middleware::{LoggerMiddleware, Next, from_middleware};
//!
//! # async fn demo(raw: &[u8]) -> Result<(), Box<dyn std::error::Error>> {
//! let config = AssetConfig::load_from("config/assets.toml")?;
//! let resolver = Arc::new(AssetResolver::new(config));
//!
//! let stack = vec![
//!     from_middleware(Arc::new(LoggerMiddleware)),
//!     from_middleware(Arc::new(StaticRewriteMiddleware::new("/static"))),
//!     from_middleware(Arc::new(StaticAssetMiddleware::new(resolver))),
//! ];
//!
//! let (request, _) = Request::parse(raw)?;
//! let response = Next::new(stack).run(Context::new(request)).await;
//! let _wire = response.into_bytes();
//! # Ok(())
//! # }
//! ```

pub mod assets;
pub mod config;
pub mod context;
pub mod http;
pub mod middleware;

// ── Convenience re-exports ────────────────────────────────────────────────────
pub use assets::{
    AssetCategory, AssetError, AssetRequest, AssetResolver, ResolvedAsset, StaticAssetMiddleware,
    StaticRewriteMiddleware,
};
pub use config::AssetConfig;
pub use http::{Headers, Method, Request, Response, StatusCode};
