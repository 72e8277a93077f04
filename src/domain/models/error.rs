use thiserror::Error;

/// Everything that can stop a student action. None of these end the session:
/// the page is rendered again with a banner and the student can retry.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ActivityError {
    /// A required field was empty or out of range. Caught before any
    /// network call.
    #[error("{0}")]
    Validation(String),

    /// The activity code does not resolve for this tool.
    #[error("Activity code not found. Please check the code and try again.")]
    NotFound,

    /// The uploaded file could not be decoded as a JPEG or PNG image.
    #[error("The uploaded file is not a valid image. Please choose a different file.")]
    InvalidImage,

    /// The tool is missing credentials and cannot run.
    #[error("This tool is not configured. Missing settings: {}", .0.join(", "))]
    NotConfigured(Vec<String>),

    /// The prompt store or AI provider failed.
    #[error("{0}")]
    Service(String),
}

impl ActivityError {
    pub fn service(what: &str, err: anyhow::Error) -> ActivityError {
        tracing::error!(error = ?err, what, "external service call failed");
        return ActivityError::Service(format!("{what} failed: {err}"));
    }
}
