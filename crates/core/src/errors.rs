use thiserror::Error;

/// Fallback shown when the backend rejects a request without a message.
pub const GENERIC_FAILURE: &str = "Something went wrong, please try again";

#[derive(Error, Debug)]
pub enum DeskError {
    #[error("Network error: {0}")]
    Transport(String),

    #[error("Request rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Unexpected response: {0}")]
    Decode(String),

    #[error("Camera error: {0}")]
    Hardware(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("A request from this form is already in flight")]
    Busy,

    #[error("{} of {attempted} records failed: {}", .failures.len(), .failures.join("; "))]
    PartialFailure {
        attempted: usize,
        failures: Vec<String>,
    },

    #[error("Internal error: {0}")]
    Internal(#[from] eyre::Report),
}

impl DeskError {
    /// Message suitable for a dialog or alert.
    ///
    /// Backend rejections carry their message verbatim; everything else
    /// falls back to the error's display form.
    pub fn user_message(&self) -> String {
        match self {
            DeskError::Rejected { message, .. } if !message.trim().is_empty() => message.clone(),
            DeskError::Rejected { .. } => GENERIC_FAILURE.to_string(),
            other => other.to_string(),
        }
    }

    /// True for failures that say nothing about the request itself.
    pub fn is_transient(&self) -> bool {
        matches!(self, DeskError::Transport(_))
    }
}

impl From<serde_json::Error> for DeskError {
    fn from(err: serde_json::Error) -> Self {
        DeskError::Decode(err.to_string())
    }
}

pub type DeskResult<T> = Result<T, DeskError>;
