use thiserror::Error;

/// Main error type for toolbox-gen
#[derive(Error, Debug)]
pub enum ToolboxError {
    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// TOML parsing errors
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// TOML serialization errors
    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// HTTP/API errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Missing configuration
    #[error("Missing required configuration: {0}")]
    MissingConfig(String),

    /// Every configured repository failed
    #[error("No repositories could be analyzed ({attempted} attempted)")]
    NoRepositoriesAnalyzed { attempted: usize },
}

/// Result type alias for toolbox-gen operations
pub type Result<T> = std::result::Result<T, ToolboxError>;

impl ToolboxError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }
}

/// Outcome of a single failed API request
#[derive(Error, Debug)]
pub enum FetchError {
    /// 403: missing permission or exhausted rate limit
    #[error("access forbidden (rate limited: {rate_limited})")]
    Forbidden { rate_limited: bool },

    /// 404: the endpoint does not exist
    #[error("not found")]
    NotFound,

    /// Any other non-200 status
    #[error("unexpected HTTP status {0}")]
    Status(u16),

    /// The request did not complete within the timeout
    #[error("request timed out")]
    Timeout,

    /// Connection or other transport-level failure
    #[error("transport error: {0}")]
    Transport(String),

    /// The body could not be decoded as JSON
    #[error("malformed response body: {0}")]
    MalformedBody(String),
}

impl FetchError {
    /// Whether another attempt could succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            FetchError::Status(_) | FetchError::Timeout | FetchError::Transport(_)
        )
    }
}
