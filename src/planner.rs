//! Destination key and public URL planning for one artifact.
//!
//! Every key lives under the build directory `{dest_base_dir}/{version}/{build_id}`.
//! The companion file names are fixed, so publishing the same version and
//! build again overwrites the previous objects.

use crate::assets::AssetGenerator;
use crate::models::{
    ArtifactMetadata, AssetRole, PublicLinks, UploadJob, UploadPlan, APP_ICON_FILE,
    INDEX_HTML_FILE, IOS_PLIST_FILE, VERSION_JSON_FILE,
};
use crate::storage::public_url;
use crate::{Error, Result};
use tracing::info;

pub fn build_dir(dest_base_dir: &str, version: &str, build_id: &str) -> String {
    format!("{}/{}/{}", dest_base_dir, version, build_id)
}

fn binary_name(artifact: &ArtifactMetadata) -> Result<String> {
    artifact
        .source_file
        .file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
        .ok_or_else(|| {
            Error::Invariant(format!(
                "Artifact path has no file name: {}",
                artifact.source_file.display()
            ))
        })
}

/// Compute the public URLs the artifact will have once uploaded.
pub fn public_links(
    bucket: &str,
    dest_base_dir: &str,
    artifact: &ArtifactMetadata,
) -> Result<PublicLinks> {
    let dir = build_dir(dest_base_dir, &artifact.version, &artifact.build_id);
    let binary = binary_name(artifact)?;

    Ok(PublicLinks {
        download_url: public_url(bucket, &format!("{}/{}", dir, binary)),
        manifest_url: artifact
            .platform
            .is_ios()
            .then(|| public_url(bucket, &format!("{}/{}", dir, IOS_PLIST_FILE))),
    })
}

/// Compute the ordered upload jobs without touching the filesystem.
pub fn upload_jobs(
    bucket: &str,
    dest_base_dir: &str,
    artifact: &ArtifactMetadata,
) -> Result<Vec<UploadJob>> {
    let dir = build_dir(dest_base_dir, &artifact.version, &artifact.build_id);
    let binary = binary_name(artifact)?;
    let platform = artifact.platform;

    let asset = |role: AssetRole, file_name: &str| UploadJob {
        role,
        bucket: bucket.to_string(),
        source_path: artifact.layout.asset_path(platform, file_name),
        destination_key: format!("{}/{}", dir, file_name),
    };

    let mut jobs = vec![
        asset(AssetRole::Icon, APP_ICON_FILE),
        asset(AssetRole::VersionManifest, VERSION_JSON_FILE),
        asset(AssetRole::IndexPage, INDEX_HTML_FILE),
        UploadJob {
            role: AssetRole::Binary,
            bucket: bucket.to_string(),
            source_path: artifact.source_file.clone(),
            destination_key: format!("{}/{}", dir, binary),
        },
    ];

    if platform.is_ios() {
        jobs.push(asset(AssetRole::PlatformManifest, IOS_PLIST_FILE));
    }

    Ok(jobs)
}

/// Generate the companion assets and plan every upload for `artifact`.
///
/// Asset generation failures are returned unchanged and no jobs are produced.
pub async fn plan_uploads(
    bucket: &str,
    dest_base_dir: &str,
    artifact: &ArtifactMetadata,
    generator: &dyn AssetGenerator,
) -> Result<UploadPlan> {
    let links = public_links(bucket, dest_base_dir, artifact)?;
    let jobs = upload_jobs(bucket, dest_base_dir, artifact)?;

    generator.generate_assets(artifact, &links).await?;

    info!(
        "Planned {} uploads for {} {} ({}) into s3://{}/{}",
        jobs.len(),
        artifact.platform,
        artifact.version,
        artifact.build_id,
        bucket,
        build_dir(dest_base_dir, &artifact.version, &artifact.build_id)
    );

    Ok(UploadPlan { jobs, links })
}
