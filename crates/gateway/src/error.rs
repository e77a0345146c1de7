use axum::extract::multipart::{MultipartError, MultipartRejection};
use thiserror::Error;

/// Everything that can go wrong while serving one `/detect` request.
///
/// None of these reach the client as an HTTP error; the handler folds them
/// into a warning on an empty response.
#[derive(Error, Debug)]
pub enum DetectError {
    #[error("Invalid multipart request: {0}")]
    Rejected(#[from] MultipartRejection),

    #[error("Failed to read upload: {0}")]
    Upload(#[from] MultipartError),

    #[error("Multipart body has no `file` field")]
    MissingFile,

    #[error("Cannot decode image: {0}")]
    Decode(#[from] image::ImageError),

    #[error("Inference failed: {0:#}")]
    Inference(anyhow::Error),

    #[error("Inference task did not complete: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl DetectError {
    /// Short label for metrics attributes.
    pub fn kind(&self) -> &'static str {
        match self {
            DetectError::Rejected(_) => "rejected",
            DetectError::Upload(_) => "upload",
            DetectError::MissingFile => "missing_file",
            DetectError::Decode(_) => "decode",
            DetectError::Inference(_) => "inference",
            DetectError::Task(_) => "task",
        }
    }
}
