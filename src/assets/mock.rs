use super::AssetGenerator;
use crate::models::{
    ArtifactMetadata, PublicLinks, APP_ICON_FILE, INDEX_HTML_FILE, IOS_PLIST_FILE,
    VERSION_JSON_FILE,
};
use crate::{Error, Result};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

/// Writes small placeholder files and records every call.
#[derive(Clone)]
pub struct MockAssetGenerator {
    calls: Arc<Mutex<Vec<PublicLinks>>>,
    failure: Option<String>,
}

impl MockAssetGenerator {
    pub fn new() -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            failure: None,
        }
    }

    pub fn with_failure(mut self, message: String) -> Self {
        self.failure = Some(message);
        self
    }

    pub fn get_call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn get_calls(&self) -> Vec<PublicLinks> {
        self.calls.lock().unwrap().clone()
    }
}

impl Default for MockAssetGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AssetGenerator for MockAssetGenerator {
    async fn generate_assets(
        &self,
        artifact: &ArtifactMetadata,
        links: &PublicLinks,
    ) -> Result<()> {
        self.calls.lock().unwrap().push(links.clone());

        if let Some(message) = &self.failure {
            return Err(Error::AssetGeneration(message.clone()));
        }

        let dir = artifact.layout.assets_dir(artifact.platform);
        tokio::fs::create_dir_all(&dir).await?;
        tokio::fs::write(dir.join(APP_ICON_FILE), b"icon").await?;
        tokio::fs::write(dir.join(VERSION_JSON_FILE), b"{}").await?;
        tokio::fs::write(dir.join(INDEX_HTML_FILE), b"<html></html>").await?;
        if artifact.platform.is_ios() {
            tokio::fs::write(dir.join(IOS_PLIST_FILE), b"<?xml version=\"1.0\"?>").await?;
        }
        Ok(())
    }
}
