use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("invalid adapter configuration: {0}")]
    InvalidConfig(String),
    #[error("generation endpoint returned {status}: {message}")]
    Api { status: StatusCode, message: String },
    #[error("chapter {number} came back with no content")]
    EmptyChapter { number: u32 },
    #[error("expected chapter number {expected} but the endpoint returned {actual}")]
    UnexpectedChapterNumber { expected: u32, actual: u32 },
}
