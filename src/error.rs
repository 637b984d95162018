//! Error handling and custom error types
//!
//! Provides unified error handling across the uploader using thiserror.

use crate::models::UploadedAssets;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    #[error("S3 error: {0}")]
    S3(String),

    #[error("URL decoding error: {0}")]
    UrlDecode(String),

    #[error("Asset generation error: {0}")]
    AssetGeneration(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invariant violation: {0}")]
    Invariant(String),

    #[error("Upload incomplete after {} object(s): {source}", .uploaded.len())]
    Incomplete {
        uploaded: UploadedAssets,
        #[source]
        source: Box<Error>,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
