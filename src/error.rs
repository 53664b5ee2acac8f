use std::path::PathBuf;
use thiserror::Error;

/// Failure while talking to a translation API.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The API answered with a non-success status code
    #[error("API request failed ({status}): {body}")]
    Http { status: u16, body: String },

    /// The request timed out
    #[error("API request timed out")]
    Timeout,

    /// Connection or other transport-level failure
    #[error("API transport error: {0}")]
    Transport(#[source] reqwest::Error),

    /// The request could not be built or was redirected away
    #[error("Invalid API request: {0}")]
    InvalidRequest(#[source] reqwest::Error),

    /// The response could not be parsed or lacked the expected structure
    #[error("Malformed API response: {0}")]
    MalformedResponse(String),

    /// Required credential is missing
    #[error("Provider {0} is not configured")]
    NotConfigured(&'static str),

    /// The provider does not know the requested locale
    #[error("Provider {provider} does not support locale: {locale}")]
    UnsupportedLocale {
        provider: &'static str,
        locale: String,
    },
}

impl ProviderError {
    /// Timeouts, connection failures and 5xx responses are worth retrying.
    /// Everything else (4xx, malformed payloads, config problems) fails fast.
    pub fn is_transient(&self) -> bool {
        match self {
            ProviderError::Timeout => true,
            ProviderError::Transport(_) => true,
            ProviderError::Http { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ProviderError::Timeout
        } else if err.is_decode() {
            ProviderError::MalformedResponse(err.to_string())
        } else if err.is_builder() || err.is_redirect() {
            ProviderError::InvalidRequest(err)
        } else {
            ProviderError::Transport(err)
        }
    }
}

/// Failure reading or writing a catalog file.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot parse catalog {path}: {reason}")]
    Parse { path: PathBuf, reason: String },
}

impl StoreError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.into(),
            source,
        }
    }
}
