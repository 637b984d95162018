//! Uploads a single planned job to object storage.

use crate::mime::{content_type_for, SNIFF_LEN};
use crate::models::UploadJob;
use crate::storage::{PutRequest, StorageService};
use crate::{Error, Result};
use std::path::Path;
use tokio::io::AsyncReadExt;
use tracing::info;

pub struct Uploader {
    storage: Box<dyn StorageService>,
}

impl Uploader {
    pub fn new(storage: Box<dyn StorageService>) -> Self {
        Self { storage }
    }

    /// Upload `job` and return the decoded public location of the object.
    pub async fn upload(&self, job: &UploadJob) -> Result<String> {
        let (prefix, content_length) = read_prefix(&job.source_path).await?;
        let content_type = content_type_for(&job.source_path, &prefix);

        info!(
            "[{}] Uploading {} to s3://{}/{} ({}, {} bytes)",
            job.role,
            job.source_path.display(),
            job.bucket,
            job.destination_key,
            content_type,
            content_length
        );

        let location = self
            .storage
            .put_object(&PutRequest {
                bucket: job.bucket.clone(),
                key: job.destination_key.clone(),
                source_path: job.source_path.clone(),
                content_type: content_type.to_string(),
                content_length,
            })
            .await?;

        decode_location(&location)
    }
}

/// Read at most [`SNIFF_LEN`] bytes from the start of `path` plus its total size.
async fn read_prefix(path: &Path) -> Result<(Vec<u8>, u64)> {
    let file = tokio::fs::File::open(path).await?;
    let content_length = file.metadata().await?.len();

    let mut prefix = Vec::with_capacity(SNIFF_LEN);
    file.take(SNIFF_LEN as u64).read_to_end(&mut prefix).await?;

    Ok((prefix, content_length))
}

/// Decode a percent-encoded location. Every `%` must start a two-digit hex escape.
fn decode_location(location: &str) -> Result<String> {
    let bytes = location.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let escape = bytes.get(i + 1..i + 3).unwrap_or(&[]);
            if escape.len() != 2 || !escape.iter().all(u8::is_ascii_hexdigit) {
                let end = bytes.len().min(i + 3);
                return Err(Error::UrlDecode(format!(
                    "invalid escape {:?} in {}",
                    String::from_utf8_lossy(&bytes[i..end]),
                    location
                )));
            }
            i += 3;
        } else {
            i += 1;
        }
    }

    urlencoding::decode(location)
        .map(|decoded| decoded.into_owned())
        .map_err(|e| Error::UrlDecode(format!("{} in {}", e, location)))
}
