//! Companion asset generation
//!
//! Writes the icon, version manifest, install page and (for iOS) the OTA
//! manifest that are published next to each binary.

pub mod generator;
pub mod mock;

pub use generator::SiteGenerator;
pub use mock::MockAssetGenerator;

use crate::models::{ArtifactMetadata, PublicLinks};
use crate::Result;
use async_trait::async_trait;

#[async_trait]
pub trait AssetGenerator: Send + Sync {
    /// Write the companion files into the artifact's platform assets directory.
    async fn generate_assets(&self, artifact: &ArtifactMetadata, links: &PublicLinks)
        -> Result<()>;
}
