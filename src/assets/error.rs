use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::StatusCode;

/// Everything that can go wrong while resolving one asset request.
///
/// Every variant aborts the request; nothing is retried and no fallback
/// content is served.
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("missing required query parameter: {name}")]
    MissingParameter { name: &'static str },

    #[error("invalid asset path: {file:?}")]
    InvalidPath { file: String },

    #[error("invalid asset extension: {ext:?}")]
    InvalidExtension { ext: String },

    #[error("file does not exist (file: {})", path.display())]
    FileNotFound { path: PathBuf },

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The cache copy could not be written because its directory could not
    /// be created. Fatal even though the content was already read.
    #[error("unable to create cache directory {}: {source}", path.display())]
    CacheDirectoryCreateFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl AssetError {
    /// Status the HTTP layer should answer with.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingParameter { .. }
            | Self::InvalidPath { .. }
            | Self::InvalidExtension { .. } => StatusCode::BadRequest,
            Self::FileNotFound { .. } => StatusCode::NotFound,
            Self::Read { .. } | Self::CacheDirectoryCreateFailed { .. } => {
                StatusCode::InternalServerError
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_by_category() {
        let bad = AssetError::InvalidPath {
            file: "not/a/valid/path".into(),
        };
        let missing = AssetError::FileNotFound {
            path: "/app/vendor/eureka/x.css".into(),
        };
        let cache = AssetError::CacheDirectoryCreateFailed {
            path: "/var/cache".into(),
            source: io::Error::from(io::ErrorKind::PermissionDenied),
        };
        assert_eq!(bad.status_code(), StatusCode::BadRequest);
        assert_eq!(missing.status_code(), StatusCode::NotFound);
        assert_eq!(cache.status_code(), StatusCode::InternalServerError);
    }

    #[test]
    fn not_found_message_names_the_path() {
        let err = AssetError::FileNotFound {
            path: "/app/vendor/eureka/theme-blue-shop/src/static/catalog/css/main.css".into(),
        };
        assert_eq!(
            err.to_string(),
            "file does not exist (file: /app/vendor/eureka/theme-blue-shop/src/static/catalog/css/main.css)"
        );
    }
}
