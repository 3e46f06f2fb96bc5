//! Error handling for tiktok-dl

use thiserror::Error;

/// Main error type for tiktok-dl
///
/// Every variant is scoped to a single URL; the batch runner logs it and moves on.
#[derive(Debug, Error)]
pub enum TiktokError {
    #[error("Url is invalid {0}")]
    InvalidUrl(String),

    #[error("Unable to extract {0}")]
    ExtractionError(String),

    #[error("{video_id}: Failed to parse JSON: {source}")]
    JsonDecodeError {
        video_id: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Video not available {0}")]
    VideoUnavailable(String),

    #[error("Video {0} is already recorded in the archive")]
    AlreadyArchived(String),

    #[error("Video {0} was already handled in this run")]
    DuplicateVideo(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("HTTP error {status} for {url}")]
    HttpStatus { status: u16, url: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Metadata does not match schema: {0}")]
    SchemaViolation(String),

    #[error("Output template error: {0}")]
    Template(#[from] TemplateError),
}

impl TiktokError {
    /// Skip conditions that are reported as warnings rather than failures
    pub fn is_warning(&self) -> bool {
        matches!(
            self,
            TiktokError::VideoUnavailable(_)
                | TiktokError::AlreadyArchived(_)
                | TiktokError::DuplicateVideo(_)
        )
    }
}

/// Failures while rendering the output filename template
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("unknown placeholder {{{0}}}")]
    UnknownPlaceholder(String),

    #[error("placeholder {{{0}}} needs create_time, which this video lacks")]
    MissingValue(String),

    #[error("malformed template at byte {position}: {reason}")]
    Syntax { position: usize, reason: &'static str },
}
