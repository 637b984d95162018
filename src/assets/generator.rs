use super::AssetGenerator;
use crate::models::{
    ArtifactMetadata, PublicLinks, VersionManifest, APP_ICON_FILE, INDEX_HTML_FILE,
    IOS_PLIST_FILE, VERSION_JSON_FILE,
};
use crate::{Error, Result};
use async_trait::async_trait;
use chrono::Utc;
use image::{DynamicImage, ImageBuffer, ImageFormat, Rgba};
use std::path::{Path, PathBuf};
use tracing::info;

pub const ICON_SIZE: u32 = 192;

const PLACEHOLDER_COLOR: Rgba<u8> = Rgba([0x3D, 0x5A, 0xFE, 0xFF]);

/// Generates the install site for one build into the platform assets directory.
pub struct SiteGenerator {
    icon_source: Option<PathBuf>,
}

impl SiteGenerator {
    pub fn new(icon_source: Option<PathBuf>) -> Self {
        Self { icon_source }
    }

    fn render_icon_sync(icon_source: Option<PathBuf>, dest: PathBuf) -> Result<()> {
        let icon = match icon_source {
            Some(source) => image::open(&source)?.resize_exact(
                ICON_SIZE,
                ICON_SIZE,
                image::imageops::FilterType::Lanczos3,
            ),
            None => DynamicImage::ImageRgba8(ImageBuffer::from_pixel(
                ICON_SIZE,
                ICON_SIZE,
                PLACEHOLDER_COLOR,
            )),
        };
        icon.save_with_format(dest, ImageFormat::Png)?;
        Ok(())
    }

    async fn render_icon(&self, dest: &Path) -> Result<()> {
        tokio::task::spawn_blocking({
            let icon_source = self.icon_source.clone();
            let dest = dest.to_path_buf();
            move || Self::render_icon_sync(icon_source, dest)
        })
        .await
        .map_err(|e| Error::Invariant(format!("Icon rendering task join error: {}", e)))?
    }
}

#[async_trait]
impl AssetGenerator for SiteGenerator {
    async fn generate_assets(
        &self,
        artifact: &ArtifactMetadata,
        links: &PublicLinks,
    ) -> Result<()> {
        let bundle_id = match (artifact.platform.is_ios(), artifact.bundle_id.as_deref()) {
            (true, None) => {
                return Err(Error::AssetGeneration(
                    "iOS artifacts need a bundle identifier".to_string(),
                ))
            }
            (_, bundle_id) => bundle_id,
        };

        let dir = artifact.layout.assets_dir(artifact.platform);
        tokio::fs::create_dir_all(&dir).await?;

        self.render_icon(&dir.join(APP_ICON_FILE)).await?;

        let manifest = VersionManifest {
            title: artifact.title.clone(),
            version: artifact.version.clone(),
            build: artifact.build_id.clone(),
            platform: artifact.platform,
            download_url: links.download_url.clone(),
            manifest_url: links.manifest_url.clone(),
            generated_at: Utc::now(),
        };
        tokio::fs::write(
            dir.join(VERSION_JSON_FILE),
            serde_json::to_string_pretty(&manifest)?,
        )
        .await?;

        if let (true, Some(bundle_id)) = (artifact.platform.is_ios(), bundle_id) {
            tokio::fs::write(
                dir.join(IOS_PLIST_FILE),
                render_ota_manifest(artifact, bundle_id, &links.download_url),
            )
            .await?;
        }

        tokio::fs::write(dir.join(INDEX_HTML_FILE), render_index_page(artifact, links)).await?;

        info!(
            "Generated {} assets for {} {} ({}) in {}",
            artifact.platform,
            artifact.title,
            artifact.version,
            artifact.build_id,
            dir.display()
        );
        Ok(())
    }
}

fn install_link(links: &PublicLinks) -> String {
    match &links.manifest_url {
        Some(manifest_url) => format!(
            "itms-services://?action=download-manifest&url={}",
            manifest_url
        ),
        None => links.download_url.clone(),
    }
}

fn render_index_page(artifact: &ArtifactMetadata, links: &PublicLinks) -> String {
    let title = escape_markup(&artifact.title);
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title} {version}</title>
</head>
<body>
<img src="{icon}" width="{size}" height="{size}" alt="{title}">
<h1>{title}</h1>
<p>Version {version} (build {build}) for {platform}</p>
<p><a href="{link}">Install</a></p>
</body>
</html>
"#,
        title = title,
        version = escape_markup(&artifact.version),
        build = escape_markup(&artifact.build_id),
        platform = artifact.platform,
        icon = APP_ICON_FILE,
        size = ICON_SIZE,
        link = escape_markup(&install_link(links)),
    )
}

fn render_ota_manifest(artifact: &ArtifactMetadata, bundle_id: &str, download_url: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd">
<plist version="1.0">
<dict>
  <key>items</key>
  <array>
    <dict>
      <key>assets</key>
      <array>
        <dict>
          <key>kind</key>
          <string>software-package</string>
          <key>url</key>
          <string>{url}</string>
        </dict>
      </array>
      <key>metadata</key>
      <dict>
        <key>bundle-identifier</key>
        <string>{bundle_id}</string>
        <key>bundle-version</key>
        <string>{version}</string>
        <key>kind</key>
        <string>software</string>
        <key>title</key>
        <string>{title}</string>
      </dict>
    </dict>
  </array>
</dict>
</plist>
"#,
        url = escape_markup(download_url),
        bundle_id = escape_markup(bundle_id),
        version = escape_markup(&artifact.version),
        title = escape_markup(&artifact.title),
    )
}

fn escape_markup(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
