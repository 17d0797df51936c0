/// Shared error type used across all conduit crates.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP: {0}")]
    Http(String),

    #[error("timeout: {0}")]
    Timeout(String),

    /// The server answered with a non-null `error_code` or `error_info`.
    #[error("conduit method {method} failed: {} ({})", .info.as_deref().unwrap_or("no info"), .code.as_deref().unwrap_or("no code"))]
    Conduit {
        method: String,
        code: Option<String>,
        info: Option<String>,
    },

    /// A handshake was attempted without the named credential.
    #[error("missing credential: {0}")]
    MissingCredential(&'static str),

    #[error("config: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// The remote error code, if this is a Conduit error envelope.
    pub fn conduit_code(&self) -> Option<&str> {
        match self {
            Error::Conduit { code, .. } => code.as_deref(),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
