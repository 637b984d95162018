//! Object storage backends for publishing artifacts
//!
//! Uploads are single puts with a public-read ACL and AES256 server-side
//! encryption, against S3 or an in-memory store for tests and dry runs.

pub mod client;
pub mod mock;

pub use client::{S3Storage, StorageCredentials};
pub use mock::MockStorage;

use crate::Result;
use async_trait::async_trait;
use std::path::PathBuf;

/// One object to store, with the body read from `source_path`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutRequest {
    pub bucket: String,
    pub key: String,
    pub source_path: PathBuf,
    pub content_type: String,
    pub content_length: u64,
}

#[async_trait]
pub trait StorageService: Send + Sync {
    /// Store the object and return its (percent-encoded) location.
    async fn put_object(&self, request: &PutRequest) -> Result<String>;
}

/// Virtual-hosted-style public URL of `key` in `bucket`.
pub fn public_url(bucket: &str, key: &str) -> String {
    format!("https://{}.s3.amazonaws.com/{}", bucket, key)
}

/// Percent-encode each path segment of an object key, keeping the separators.
pub fn encode_key(key: &str) -> String {
    key.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}
