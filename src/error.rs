//! Error types / 错误类型

use thiserror::Error;

/// Library error / 库错误
#[derive(Error, Debug)]
pub enum Error {
    /// The string is not a usable s3:// URI / 无效的 s3 URI
    #[error("invalid s3 uri `{uri}`: {reason}")]
    InvalidUri { uri: String, reason: String },

    /// No store factory registered for the scheme / 未注册的 URI scheme
    #[error("unsupported uri scheme: {0}")]
    UnsupportedScheme(String),

    /// A key segment did not percent-decode to UTF-8 / 对象键解码失败
    #[error("failed to decode object key from `{path}`: {source}")]
    KeyDecode {
        path: String,
        #[source]
        source: std::string::FromUtf8Error,
    },

    #[error("object not found: s3://{bucket}/{key}")]
    NotFound { bucket: String, key: String },

    #[error("unknown permission `{0}`")]
    UnknownPermission(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Error raised by the storage backend, passed through untouched / 后端错误
    #[error("{operation} failed: {source}")]
    Backend {
        operation: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error(transparent)]
    Url(#[from] url::ParseError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Wrap a backend error for the named operation / 包装后端错误
    pub fn backend<E>(operation: &'static str, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Backend {
            operation,
            source: Box::new(source),
        }
    }

    pub fn invalid_uri(uri: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidUri {
            uri: uri.into(),
            reason: reason.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
