//! Error types for the edit pipeline.

/// Fixed fallback shown when the service returns neither an image nor an
/// explanation.
pub const GENERIC_REFUSAL: &str =
    "The AI could not process the edit request. Please try a different prompt.";

/// Fixed message for transport-level faults, shown in place of raw
/// network/deserialization detail.
pub const COMMUNICATION_ERROR: &str =
    "An error occurred while communicating with the Gemini API.";

/// Errors that can occur while ingesting an image or running an edit.
#[derive(Debug, thiserror::Error)]
pub enum EditError {
    /// Service credential missing from the environment.
    #[error("API key is missing. Please ensure the environment is configured correctly.")]
    Config,

    /// The supplied image is not a well-formed `data:image/*;base64,...` payload.
    #[error("Invalid image format. Please upload a valid image file.")]
    InvalidImage(String),

    /// Credential rejected by the service.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// API returned a non-success status.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// The service answered but produced no image; carries its own
    /// explanation when it gave one.
    #[error("{0}")]
    Refusal(String),

    /// Network or HTTP error.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Failed to decode base64 image data.
    #[error("failed to decode: {0}")]
    Decode(String),

    /// I/O error (reading the input file, saving the result).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl EditError {
    /// Flattens the error into the plain text shown to the user.
    ///
    /// Transport and wire-format faults are collapsed into a fixed
    /// communication message; every other variant already reads as a
    /// user-facing sentence.
    pub fn user_message(&self) -> String {
        match self {
            Self::Network(_) | Self::Json(_) | Self::Decode(_) => COMMUNICATION_ERROR.to_string(),
            other => other.to_string(),
        }
    }
}

/// Result type alias for edit operations.
pub type Result<T> = std::result::Result<T, EditError>;
