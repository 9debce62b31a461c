use thiserror::Error;

/// Main error type for Geneagrapher
#[derive(Error, Debug)]
pub enum GeneagrapherError {
    /// Connection could not be opened, or was lost mid-exchange
    #[error("Geneagrapher backend is currently unavailable.")]
    ServiceUnavailable { reason: String },

    /// Service sent a message that is neither progress nor a graph
    #[error("Request to Geneagrapher backend failed.")]
    UnexpectedResponse { response: String },

    /// Start node argument did not match `ID[:a|:d|:ad|:da]`
    #[error("Invalid start node: {0}")]
    InvalidStartNode(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File system I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding errors
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl GeneagrapherError {
    pub(crate) fn unavailable(reason: impl Into<String>) -> Self {
        Self::ServiceUnavailable {
            reason: reason.into(),
        }
    }

    /// Diagnostic key/value pairs shown beneath the message in failure reports.
    pub fn extras(&self) -> Vec<(&'static str, String)> {
        match self {
            Self::ServiceUnavailable { reason } => vec![("Reason", reason.clone())],
            Self::UnexpectedResponse { response } => vec![("Response", response.clone())],
            _ => Vec::new(),
        }
    }
}

/// Convenient Result type using GeneagrapherError
pub type Result<T> = std::result::Result<T, GeneagrapherError>;
