//! Middleware exposing the resolver to the request pipeline.
//!
//! - [`StaticRewriteMiddleware`] turns `/static/<file>.<ext>` paths into
//!   asset requests, the way the front web server's rewrite rules do.
//! - [`StaticAssetMiddleware`] resolves asset requests and writes the
//!   response.

use std::pin::Pin;
use std::sync::Arc;

use percent_encoding::percent_decode_str;
use tracing::{error, warn};

use super::category::AssetCategory;
use super::error::AssetError;
use super::path::AssetRequest;
use super::resolver::AssetResolver;
use crate::{
    Method, Response, StatusCode,
    context::Context,
    middleware::{Middleware, Next},
};

/// Serves asset requests through an [`AssetResolver`].
///
/// The asset request is taken from the context extensions (placed there by
/// [`StaticRewriteMiddleware`]) or from the `file`/`ext`/`type` query
/// parameters. Requests carrying neither are passed to the next layer.
///
/// | Outcome                        | Response                                      |
/// |--------------------------------|-----------------------------------------------|
/// | resolved                       | `200`, `Content-Type` set, body = file bytes  |
/// | resolved, `HEAD`               | `200`, same headers and length, no body       |
/// | method other than GET/HEAD     | `405` with `Allow: GET, HEAD`                 |
/// | resolver error                 | [`AssetError::status_code`], reason phrase    |
///
/// Error details (including filesystem paths) are logged, never sent.
///
/// # Examples
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use theme_assets::{AssetCategory, AssetConfig, AssetResolver, StaticAssetMiddleware};
/// use theme_assets::middleware::from_middleware;
///
/// let resolver = Arc::new(AssetResolver::new(AssetConfig::new("/app")));
/// let css = from_middleware(Arc::new(
///     StaticAssetMiddleware::new(resolver).with_category(AssetCategory::Css),
/// ));
/// ```
pub struct StaticAssetMiddleware {
    resolver: Arc<AssetResolver>,
    category: Option<AssetCategory>,
}

impl StaticAssetMiddleware {
    /// Category is taken from each request.
    pub fn new(resolver: Arc<AssetResolver>) -> Self {
        Self {
            resolver,
            category: None,
        }
    }

    /// Pins the category for every request served by this middleware.
    #[must_use]
    pub fn with_category(mut self, category: AssetCategory) -> Self {
        self.category = Some(category);
        self
    }
}

impl Middleware for StaticAssetMiddleware {
    fn handle(&self, ctx: Context, next: Next) -> Pin<Box<dyn Future<Output = Response> + Send>> {
        let resolver = Arc::clone(&self.resolver);
        let pinned = self.category;

        Box::pin(async move {
            let mut ctx = ctx;
            let lookup = match ctx.extensions_mut().remove::<AssetRequest>() {
                Some(request) => Ok(request),
                None => match AssetRequest::from_query(ctx.request()) {
                    Ok(Some(request)) => Ok(request),
                    Ok(None) => return next.run(ctx).await,
                    Err(e) => Err(e),
                },
            };

            if !ctx.request().method().is_read_only() {
                warn!(method = %ctx.request().method(), path = ctx.request().path(), "method not allowed for static asset");
                return Response::new(StatusCode::MethodNotAllowed)
                    .header("Allow", "GET, HEAD")
                    .body(StatusCode::MethodNotAllowed.canonical_reason());
            }

            let request = match lookup {
                Ok(request) => request,
                Err(e) => return error_response(&e),
            };
            let category = pinned.unwrap_or(request.category());
            let head = *ctx.request().method() == Method::Head;

            match resolver.resolve_as(&request, category).await {
                Ok(asset) => {
                    let mut response = Response::new(StatusCode::Ok);
                    if head {
                        asset.write_head_into(&mut response);
                    } else {
                        asset.write_into(&mut response);
                    }
                    response
                }
                Err(e) => error_response(&e),
            }
        })
    }
}

fn error_response(err: &AssetError) -> Response {
    let status = err.status_code();
    if status.is_server_error() {
        error!(error = %err, "static asset resolution failed");
    } else {
        warn!(error = %err, "static asset request rejected");
    }
    Response::new(status).body(status.canonical_reason())
}

/// Maps `<prefix>/<file>.<ext>` request paths onto asset requests.
///
/// | Extension                         | Category |
/// |-----------------------------------|----------|
/// | `css`                             | css      |
/// | `js`                              | js       |
/// | `jpg`, `jpeg`, `png`              | image    |
/// | `eot`, `svg`, `ttf`, `woff`, `woff2` | font  |
///
/// Paths outside the prefix or with other extensions pass through untouched.
pub struct StaticRewriteMiddleware {
    prefix: String,
}

impl StaticRewriteMiddleware {
    /// `prefix` is the URL path the assets are published under, e.g. `/static`.
    pub fn new(prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        Self {
            prefix: prefix.trim_end_matches('/').to_owned(),
        }
    }

    /// The asset request a path rewrites to, if any.
    pub fn rewrite(&self, path: &str) -> Option<AssetRequest> {
        let rest = path.strip_prefix(&self.prefix)?.strip_prefix('/')?;
        let decoded = percent_decode_str(rest).decode_utf8().ok()?;
        let (file, ext) = decoded.rsplit_once('.')?;
        let category = AssetCategory::from_extension(ext)?;
        Some(AssetRequest::new(file, ext, category))
    }
}

impl Middleware for StaticRewriteMiddleware {
    fn handle(&self, ctx: Context, next: Next) -> Pin<Box<dyn Future<Output = Response> + Send>> {
        let rewritten = self.rewrite(ctx.request().path());

        Box::pin(async move {
            let mut ctx = ctx;
            if let Some(request) = rewritten {
                ctx.extensions_mut().insert(request);
            }
            next.run(ctx).await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AssetConfig;
    use crate::middleware::{MiddlewareHandler, from_middleware};
    use crate::{Method, Request};
    use std::fs;
    use tempfile::TempDir;

    const CSS_BODY: &[u8] = b".cart{display:none}";
    const PNG_BODY: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";

    fn fixture() -> TempDir {
        let root = TempDir::new().unwrap();
        let base = root
            .path()
            .join("vendor/eureka/theme-blue-shop/src/static/catalog");
        fs::create_dir_all(base.join("css")).unwrap();
        fs::create_dir_all(base.join("img")).unwrap();
        fs::write(base.join("css/main.min.css"), CSS_BODY).unwrap();
        fs::write(base.join("img/logo.png"), PNG_BODY).unwrap();
        root
    }

    fn fallthrough() -> MiddlewareHandler {
        Arc::new(|_ctx: Context, _next: Next| {
            Box::pin(async move { Response::new(StatusCode::Ok).body("fallthrough") })
        })
    }

    async fn serve(stack: Vec<MiddlewareHandler>, method: Method, target: &str) -> Response {
        Next::new(stack)
            .run(Context::new(Request::new(method, target)))
            .await
    }

    fn asset_stack(root: &TempDir) -> Vec<MiddlewareHandler> {
        let resolver = Arc::new(AssetResolver::new(AssetConfig::new(root.path())));
        vec![
            from_middleware(Arc::new(StaticRewriteMiddleware::new("/static/"))),
            from_middleware(Arc::new(StaticAssetMiddleware::new(resolver))),
            fallthrough(),
        ]
    }

    // ── StaticAssetMiddleware ─────────────────────────────────────────────────

    #[tokio::test]
    async fn serves_css_from_query() {
        let root = fixture();
        let response = serve(
            asset_stack(&root),
            Method::Get,
            "/static.php?type=css&file=cache/blue/shop/catalog/css/main.min&ext=css",
        )
        .await;

        assert_eq!(response.status(), StatusCode::Ok);
        assert_eq!(response.headers().get("content-type"), Some("text/css"));
        assert_eq!(response.body_ref(), CSS_BODY);
    }

    #[tokio::test]
    async fn pinned_category_wins_over_type_param() {
        let root = fixture();
        let resolver = Arc::new(AssetResolver::new(AssetConfig::new(root.path())));
        let stack = vec![from_middleware(Arc::new(
            StaticAssetMiddleware::new(resolver).with_category(AssetCategory::Image),
        ))];

        let response = serve(
            stack,
            Method::Get,
            "/static.php?type=css&file=cache/blue/shop/catalog/img/logo&ext=png",
        )
        .await;
        assert_eq!(response.headers().get("content-type"), Some("image/png"));
    }

    #[tokio::test]
    async fn non_asset_requests_fall_through() {
        let root = fixture();
        let response = serve(asset_stack(&root), Method::Post, "/checkout?step=2").await;
        assert_eq!(response.status(), StatusCode::Ok);
        assert_eq!(response.body_ref(), b"fallthrough");
    }

    #[tokio::test]
    async fn invalid_path_is_bad_request() {
        let root = fixture();
        let response = serve(
            asset_stack(&root),
            Method::Get,
            "/static.php?type=css&file=not/a/valid/path&ext=css",
        )
        .await;
        assert_eq!(response.status(), StatusCode::BadRequest);
    }

    #[tokio::test]
    async fn missing_ext_is_bad_request() {
        let root = fixture();
        let response = serve(
            asset_stack(&root),
            Method::Get,
            "/static.php?file=cache/blue/shop/catalog/css/main.min",
        )
        .await;
        assert_eq!(response.status(), StatusCode::BadRequest);
    }

    #[tokio::test]
    async fn missing_file_is_not_found_without_leaking_path() {
        let root = fixture();
        let response = serve(
            asset_stack(&root),
            Method::Get,
            "/static.php?type=css&file=cache/blue/shop/catalog/css/absent&ext=css",
        )
        .await;
        assert_eq!(response.status(), StatusCode::NotFound);
        assert_eq!(response.body_ref(), b"Not Found");
    }

    #[tokio::test]
    async fn cache_directory_failure_is_server_error() {
        let root = fixture();
        let cache = TempDir::new().unwrap();
        fs::write(cache.path().join("cache"), b"blocking file").unwrap();
        let resolver = Arc::new(AssetResolver::new(
            AssetConfig::new(root.path()).with_static_cache(cache.path()),
        ));
        let stack = vec![from_middleware(Arc::new(StaticAssetMiddleware::new(resolver)))];

        let response = serve(
            stack,
            Method::Get,
            "/static.php?type=css&file=cache/blue/shop/catalog/css/main.min&ext=css",
        )
        .await;
        assert_eq!(response.status(), StatusCode::InternalServerError);
        assert_eq!(response.body_ref(), b"Internal Server Error");
    }

    #[tokio::test]
    async fn head_sends_headers_without_body() {
        let root = fixture();
        let response = serve(
            asset_stack(&root),
            Method::Head,
            "/static.php?type=css&file=cache/blue/shop/catalog/css/main.min&ext=css",
        )
        .await;

        assert_eq!(response.status(), StatusCode::Ok);
        assert_eq!(response.headers().get("content-type"), Some("text/css"));
        assert!(response.body_ref().is_empty());

        let wire = String::from_utf8(response.into_bytes().to_vec()).unwrap();
        assert!(wire.contains(&format!("Content-Length: {}\r\n", CSS_BODY.len())));
        assert!(wire.ends_with("\r\n\r\n"));
    }

    #[tokio::test]
    async fn write_methods_are_rejected() {
        let root = fixture();
        let response = serve(
            asset_stack(&root),
            Method::Put,
            "/static.php?type=css&file=cache/blue/shop/catalog/css/main.min&ext=css",
        )
        .await;
        assert_eq!(response.status(), StatusCode::MethodNotAllowed);
        assert_eq!(response.headers().get("allow"), Some("GET, HEAD"));
    }

    #[tokio::test]
    async fn parsed_wire_request_round_trip() {
        let root = fixture();
        let raw = b"GET /static.php?type=image&file=cache%2Fblue%2Fshop%2Fcatalog%2Fimg%2Flogo&ext=png HTTP/1.1\r\nHost: shop.local\r\n\r\n";
        let (request, _) = Request::parse(raw).unwrap();

        let response = Next::new(asset_stack(&root))
            .run(Context::new(request))
            .await;
        let wire = response.into_bytes();
        assert!(wire.starts_with(b"HTTP/1.1 200 OK\r\n"));
        assert!(wire.ends_with(PNG_BODY));
        let head = String::from_utf8_lossy(&wire[..wire.len() - PNG_BODY.len()]).into_owned();
        assert!(head.contains("Content-Type: image/png\r\n"));
        assert!(head.contains(&format!("Content-Length: {}\r\n", PNG_BODY.len())));
    }

    // ── StaticRewriteMiddleware ───────────────────────────────────────────────

    #[test]
    fn rewrite_maps_extension_to_category() {
        let rewrite = StaticRewriteMiddleware::new("/static");
        let request = rewrite
            .rewrite("/static/cache/blue/shop/catalog/img/logo.png")
            .unwrap();
        assert_eq!(request.file(), "cache/blue/shop/catalog/img/logo");
        assert_eq!(request.ext(), "png");
        assert_eq!(request.category(), AssetCategory::Image);

        let request = rewrite
            .rewrite("/static/cache/blue/shop/catalog/css/main.min.css")
            .unwrap();
        assert_eq!(request.file(), "cache/blue/shop/catalog/css/main.min");
        assert_eq!(request.category(), AssetCategory::Css);
    }

    #[test]
    fn rewrite_ignores_other_paths() {
        let rewrite = StaticRewriteMiddleware::new("/static");
        assert_eq!(rewrite.rewrite("/assets/cache/a/b/c/css/x.css"), None);
        assert_eq!(rewrite.rewrite("/staticx/cache/a/b/c/css/x.css"), None);
        assert_eq!(rewrite.rewrite("/static/cache/a/b/c/img/x.gif"), None);
        assert_eq!(rewrite.rewrite("/static/readme"), None);
    }

    #[tokio::test]
    async fn rewritten_path_is_served() {
        let root = fixture();
        let response = serve(
            asset_stack(&root),
            Method::Get,
            "/static/cache/blue/shop/catalog/css/main.min.css",
        )
        .await;
        assert_eq!(response.status(), StatusCode::Ok);
        assert_eq!(response.headers().get("content-type"), Some("text/css"));
        assert_eq!(response.body_ref(), CSS_BODY);
    }
}
