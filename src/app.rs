//! Application orchestration for planning and publishing an artifact.

use crate::assets::{AssetGenerator, SiteGenerator};
use crate::models::{
    ArtifactMetadata, Config, PublishReport, UploadJob, UploadedAsset, UploadedAssets,
};
use crate::planner;
use crate::storage::{MockStorage, S3Storage, StorageCredentials, StorageService};
use crate::uploader::Uploader;
use crate::{Error, Result};
use tracing::{error, info};

/// Uploads that completed before a batch stopped, plus the error that stopped it.
///
/// Objects listed in `uploaded` already exist remotely; nothing is rolled back.
#[derive(Debug)]
pub struct PartialUpload {
    pub uploaded: UploadedAssets,
    pub error: Error,
}

impl From<PartialUpload> for Error {
    fn from(partial: PartialUpload) -> Self {
        Error::Incomplete {
            uploaded: partial.uploaded,
            source: Box::new(partial.error),
        }
    }
}

/// Coordinates asset generation, planning and sequential uploads.
pub struct App {
    generator: Box<dyn AssetGenerator>,
    uploader: Uploader,
}

/// Injectable service bundle used to construct [`App`] in tests/harnesses.
pub struct AppServices {
    pub generator: Box<dyn AssetGenerator>,
    pub storage: Box<dyn StorageService>,
}

impl App {
    /// Build an app from concrete service dependencies.
    pub fn with_services(services: AppServices) -> Self {
        Self {
            generator: services.generator,
            uploader: Uploader::new(services.storage),
        }
    }

    /// Construct an app backed by S3 (or in-memory storage for dry runs).
    pub async fn from_config(config: &Config) -> Result<Self> {
        let storage: Box<dyn StorageService> = if config.dry_run {
            info!("DRY_RUN enabled, uploads go to in-memory storage");
            Box::new(MockStorage::dry_run())
        } else {
            let access_key_id = config.access_key_id.clone().ok_or_else(|| {
                Error::Config("AWS_ACCESS_KEY_ID not set".to_string())
            })?;
            let secret_access_key = config.secret_access_key.clone().ok_or_else(|| {
                Error::Config("AWS_SECRET_ACCESS_KEY not set".to_string())
            })?;
            Box::new(
                S3Storage::new(StorageCredentials {
                    access_key_id,
                    secret_access_key,
                    region: config.region.clone(),
                    endpoint: config.endpoint.clone(),
                })
                .await?,
            )
        };

        Ok(Self::with_services(AppServices {
            generator: Box::new(SiteGenerator::new(config.icon.clone())),
            storage,
        }))
    }

    /// Upload `jobs` strictly in order, stopping at the first failure.
    pub async fn upload_all(
        &self,
        jobs: &[UploadJob],
    ) -> std::result::Result<UploadedAssets, PartialUpload> {
        let mut uploaded = UploadedAssets::new();

        for (index, job) in jobs.iter().enumerate() {
            match self.uploader.upload(job).await {
                Ok(url) => {
                    info!("[{}] Uploaded {}/{}: {}", job.role, index + 1, jobs.len(), url);
                    uploaded.push(UploadedAsset {
                        role: job.role,
                        key: job.destination_key.clone(),
                        url,
                    });
                }
                Err(e) => {
                    error!(
                        "[{}] Upload {}/{} failed, {} object(s) already uploaded: {}",
                        job.role,
                        index + 1,
                        jobs.len(),
                        uploaded.len(),
                        e
                    );
                    return Err(PartialUpload { uploaded, error: e });
                }
            }
        }

        Ok(uploaded)
    }

    /// Generate assets, plan the uploads and publish them.
    pub async fn publish(
        &self,
        bucket: &str,
        dest_base_dir: &str,
        artifact: &ArtifactMetadata,
    ) -> Result<PublishReport> {
        let plan =
            planner::plan_uploads(bucket, dest_base_dir, artifact, self.generator.as_ref()).await?;
        let assets = self.upload_all(&plan.jobs).await?;

        info!("Published {} objects, download URL: {}", assets.len(), plan.links.download_url);

        Ok(PublishReport {
            links: plan.links,
            assets,
        })
    }
}
