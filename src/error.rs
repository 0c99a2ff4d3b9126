use camino::Utf8PathBuf;

/// Error types for the geoproxy library.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Provider configuration file was not found at the expected path.
    #[error("provider file not found: {path}")]
    ProvidersNotFound { path: Utf8PathBuf },

    /// Provider configuration file is not valid JSON.
    #[error("provider file {path} is not valid JSON")]
    ProvidersParse {
        path: Utf8PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The top-level provider collection is absent or is not a list.
    #[error("missing '{key}' list in provider configuration")]
    MissingProviderList { key: &'static str },

    /// A provider entry lacks a required field or has an empty value for it.
    #[error("missing '{field}' for provider entry {index}")]
    MissingProviderField { field: &'static str, index: usize },

    /// A provider field is present but cannot be used.
    #[error("invalid '{field}' for provider entry {index}: {reason}")]
    InvalidProviderField {
        field: &'static str,
        index: usize,
        reason: String,
    },

    /// A server option failed validation.
    #[error("invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    /// A debug-mode fixture could not be read.
    #[error("cannot read fixture {path}")]
    Fixture {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An outbound provider request failed.
    #[error("provider request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// A provider response body is not valid JSON.
    #[error("invalid JSON response: {0}")]
    Json(#[from] serde_json::Error),

    /// An I/O error occurred.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for Results using the library error.
pub type Result<T> = std::result::Result<T, Error>;
