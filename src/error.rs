// Error types for the argo-watcher integration
//
// Every failure in the resolver and the downstream client surfaces as one of
// these variants. Callers (tool layer, readiness probe) branch on them.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ArgoError {
    /// A caller-supplied time expression or argument could not be parsed.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The request never produced an HTTP response (DNS, refused, timeout).
    #[error("Transport error: {0}")]
    Transport(String),

    /// The downstream service answered with a non-2xx status.
    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    /// The downstream payload did not match the expected shape.
    #[error("Validation error: {0}")]
    Validation(String),
}

impl ArgoError {
    pub const fn error_type(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "invalid_input",
            Self::Transport(_) => "transport",
            Self::HttpStatus { .. } => "http_status",
            Self::Validation(_) => "validation",
        }
    }
}

/// Status failures are mapped by the client before any body is read, so a
/// reqwest error reaching `?` is always a transport failure.
impl From<reqwest::Error> for ArgoError {
    fn from(e: reqwest::Error) -> Self {
        Self::Transport(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ArgoError>;
