//! HTTP/1.x request head parsing using the [`httparse`] crate.
//!
//! Asset requests arrive as `GET /static.php?type=css&file=...&ext=css`, so
//! the interesting part here is the query string: values are decoded once on
//! parse and served through [`Request::query_param`].

use std::collections::HashMap;

use percent_encoding::percent_decode_str;
use thiserror::Error;

use super::{Headers, Method};

/// Errors that can occur while parsing an HTTP/1.x request.
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("request is incomplete, more data needed")]
    Incomplete,

    #[error("HTTP parse error: {0}")]
    Parse(#[from] httparse::Error),

    #[error("missing required field: {field}")]
    MissingField { field: &'static str },
}

/// A parsed HTTP request.
///
/// # Examples
///
/// ```
/// use theme_assets::http::request::Request;
///
/// let raw = b"GET /static.php?type=css&file=cache%2Fblue HTTP/1.1\r\nHost: localhost\r\n\r\n";
/// let (request, _offset) = Request::parse(raw).unwrap();
///
/// assert_eq!(request.path(), "/static.php");
/// assert_eq!(request.query_param("type"), Some("css"));
/// assert_eq!(request.query_param("file"), Some("cache/blue"));
/// ```
#[derive(Debug)]
pub struct Request {
    method: Method,
    path: String,
    headers: Headers,
    query: Option<String>,
    params: HashMap<String, String>,
}

impl Request {
    /// Maximum number of headers we support per request.
    const MAX_HEADERS: usize = 64;

    /// Builds a request directly from a method and a request target
    /// (`/path?query`), without going through the wire format.
    pub fn new(method: Method, target: &str) -> Self {
        let (path, query) = split_target(target);
        let params = query.as_deref().map(parse_query_string).unwrap_or_default();
        Self {
            method,
            path,
            headers: Headers::new(),
            query,
            params,
        }
    }

    /// Parse a raw HTTP/1.x request from a byte slice.
    ///
    /// Returns the parsed `Request` and the byte offset at which the body begins
    /// in `buf` (i.e. immediately after the `\r\n\r\n` header terminator).
    ///
    /// # Errors
    ///
    /// - [`RequestError::Incomplete`]: more data is needed to complete the request headers.
    /// - [`RequestError::Parse`]: the data is malformed and cannot be parsed.
    /// - [`RequestError::MissingField`]: a required field (method, path, version) is absent.
    pub fn parse(buf: &[u8]) -> Result<(Self, usize), RequestError> {
        let mut headers = [httparse::EMPTY_HEADER; Self::MAX_HEADERS];
        let mut raw_req = httparse::Request::new(&mut headers);

        let body_offset = match raw_req.parse(buf)? {
            httparse::Status::Complete(offset) => offset,
            httparse::Status::Partial => return Err(RequestError::Incomplete),
        };

        let Ok(method) = raw_req
            .method
            .ok_or(RequestError::MissingField { field: "method" })?
            .parse::<Method>();

        let target = raw_req
            .path
            .ok_or(RequestError::MissingField { field: "path" })?;

        if raw_req.version.is_none() {
            return Err(RequestError::MissingField { field: "version" });
        }

        let mut header_map = Headers::with_capacity(raw_req.headers.len());
        for header in raw_req.headers.iter() {
            if let Ok(value) = std::str::from_utf8(header.value) {
                header_map.insert(header.name, value);
            }
        }

        let mut request = Self::new(method, target);
        request.headers = header_map;

        Ok((request, body_offset))
    }

    /// Returns the HTTP method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the request path (without the query string).
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Returns the raw query string (without the leading `?`), if any.
    pub fn query_string(&self) -> Option<&str> {
        self.query.as_deref()
    }

    /// Returns a decoded query parameter value by key.
    pub fn query_param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }
}

fn split_target(target: &str) -> (String, Option<String>) {
    match target.split_once('?') {
        Some((path, query)) => (path.to_owned(), Some(query.to_owned())),
        None => (target.to_owned(), None),
    }
}

/// Parses a URL query string (`key=value&key2=value2`) into a `HashMap`.
///
/// `+` is decoded as a space, then percent escapes are decoded (invalid UTF-8
/// is replaced lossily). Later duplicates win.
fn parse_query_string(query: &str) -> HashMap<String, String> {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            (decode_component(key), decode_component(value))
        })
        .collect()
}

fn decode_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    percent_decode_str(&spaced).decode_utf8_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_asset_query() {
        let raw = b"GET /static.php?type=js&file=cache/blue/shop/catalog/js/app&ext=js HTTP/1.1\r\nHost: localhost\r\n\r\n";
        let (req, offset) = Request::parse(raw).unwrap();
        assert_eq!(req.method(), &Method::Get);
        assert_eq!(req.path(), "/static.php");
        assert_eq!(req.query_param("file"), Some("cache/blue/shop/catalog/js/app"));
        assert_eq!(req.query_param("ext"), Some("js"));
        assert_eq!(offset, raw.len());
    }

    #[test]
    fn query_values_are_percent_decoded() {
        let req = Request::new(Method::Get, "/s?file=cache%2Fa%2Fb+c&ext=%20css%20");
        assert_eq!(req.query_param("file"), Some("cache/a/b c"));
        assert_eq!(req.query_param("ext"), Some(" css "));
    }

    #[test]
    fn key_without_value_is_empty() {
        let req = Request::new(Method::Get, "/s?file&&ext=css");
        assert_eq!(req.query_param("file"), Some(""));
        assert_eq!(req.query_param("ext"), Some("css"));
    }

    #[test]
    fn no_query_string() {
        let req = Request::new(Method::Head, "/static/app.css");
        assert_eq!(req.path(), "/static/app.css");
        assert_eq!(req.query_string(), None);
        assert_eq!(req.query_param("file"), None);
    }

    #[test]
    fn incomplete_request() {
        let raw = b"GET / HTTP/1.1\r\nHost:";
        assert!(matches!(Request::parse(raw), Err(RequestError::Incomplete)));
    }

    #[test]
    fn malformed_request() {
        let raw = b"GET\0 / HTTP/1.1\r\n\r\n";
        assert!(matches!(Request::parse(raw), Err(RequestError::Parse(_))));
    }
}
