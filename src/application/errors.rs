//! Shared application error types

/// Errors raised while parsing manifest and lock files.
///
/// These never escape the parsing layer: scanners record them as non-fatal
/// strings on the ecosystem report and keep whatever was parsed so far.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("missing field: {field}")]
    MissingField { field: String },
}

/// Errors from upstream HTTP APIs (advisory databases and package registries).
///
/// Resolvers convert these into degraded results at the call site; they are
/// never allowed to abort a repository's analysis.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("invalid response body: {0}")]
    Json(#[from] serde_json::Error),
}
