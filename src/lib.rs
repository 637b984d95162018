//! Publisher for mobile build artifacts
//!
//! Plans S3 destination keys for an `.apk` or `.ipa` and its generated
//! companion assets (icon, version manifest, install page, OTA manifest),
//! uploads them as public-read objects and reports their public URLs.

pub mod app;
pub mod assets;
pub mod error;
pub mod mime;
pub mod models;
pub mod planner;
pub mod storage;
pub mod uploader;

pub use error::{Error, Result};
