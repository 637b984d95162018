use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const APP_ICON_FILE: &str = "appicon.png";
pub const VERSION_JSON_FILE: &str = "version.json";
pub const INDEX_HTML_FILE: &str = "index.html";
pub const IOS_PLIST_FILE: &str = "app.plist";

pub const ANDROID_ASSETS_SUBDIR: &str = "android";
pub const IOS_ASSETS_SUBDIR: &str = "ios";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Ios,
    Android,
}

impl Platform {
    /// Infer the platform from a package extension (`.ipa` or `.apk`).
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "ipa" => Some(Platform::Ios),
            "apk" => Some(Platform::Android),
            _ => None,
        }
    }

    pub fn is_ios(&self) -> bool {
        matches!(self, Platform::Ios)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Platform::Ios => write!(f, "ios"),
            Platform::Android => write!(f, "android"),
        }
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ios" => Ok(Platform::Ios),
            "android" => Ok(Platform::Android),
            other => Err(format!(
                "Invalid platform '{}'. Expected 'ios' or 'android'",
                other
            )),
        }
    }
}

/// Where generated companion files live on the local filesystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetLayout {
    pub assets_root: PathBuf,
}

impl AssetLayout {
    pub fn new(assets_root: impl Into<PathBuf>) -> Self {
        Self {
            assets_root: assets_root.into(),
        }
    }

    pub fn assets_dir(&self, platform: Platform) -> PathBuf {
        match platform {
            Platform::Android => self.assets_root.join(ANDROID_ASSETS_SUBDIR),
            Platform::Ios => self.assets_root.join(IOS_ASSETS_SUBDIR),
        }
    }

    pub fn asset_path(&self, platform: Platform, file_name: &str) -> PathBuf {
        self.assets_dir(platform).join(file_name)
    }
}

impl Default for AssetLayout {
    fn default() -> Self {
        Self::new("assets")
    }
}

#[derive(Debug, Clone)]
pub struct ArtifactMetadata {
    pub title: String,
    pub version: String,
    pub build_id: String,
    /// Required for the iOS OTA manifest.
    pub bundle_id: Option<String>,
    pub source_file: PathBuf,
    pub platform: Platform,
    pub layout: AssetLayout,
}

/// Stable identity of an upload job within one build directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetRole {
    Icon,
    VersionManifest,
    IndexPage,
    Binary,
    PlatformManifest,
}

impl fmt::Display for AssetRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AssetRole::Icon => "icon",
            AssetRole::VersionManifest => "version_manifest",
            AssetRole::IndexPage => "index_page",
            AssetRole::Binary => "binary",
            AssetRole::PlatformManifest => "platform_manifest",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadJob {
    pub role: AssetRole,
    pub bucket: String,
    pub source_path: PathBuf,
    pub destination_key: String,
}

/// Public URLs the planner expects the artifact to have once uploaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublicLinks {
    pub download_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manifest_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct UploadPlan {
    pub jobs: Vec<UploadJob>,
    pub links: PublicLinks,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadedAsset {
    pub role: AssetRole,
    pub key: String,
    pub url: String,
}

/// Uploaded objects in submission order, addressable by role.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct UploadedAssets {
    assets: Vec<UploadedAsset>,
}

impl UploadedAssets {
    pub fn new() -> Self {
        Self { assets: Vec::new() }
    }

    pub fn push(&mut self, asset: UploadedAsset) {
        self.assets.push(asset);
    }

    pub fn get(&self, role: AssetRole) -> Option<&UploadedAsset> {
        self.assets.iter().find(|a| a.role == role)
    }

    pub fn url(&self, role: AssetRole) -> Option<&str> {
        self.get(role).map(|a| a.url.as_str())
    }

    pub fn urls(&self) -> Vec<&str> {
        self.assets.iter().map(|a| a.url.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &UploadedAsset> {
        self.assets.iter()
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PublishReport {
    #[serde(flatten)]
    pub links: PublicLinks,
    pub assets: UploadedAssets,
}

/// Contents of the generated `version.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionManifest {
    pub title: String,
    pub version: String,
    pub build: String,
    pub platform: Platform,
    pub download_url: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub manifest_url: Option<String>,
    pub generated_at: chrono::DateTime<chrono::Utc>,
}

// Configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub region: String,
    pub endpoint: Option<String>,
    pub bucket: Option<String>,
    pub dest_dir: String,
    pub assets_dir: PathBuf,
    pub icon: Option<PathBuf>,
    pub dry_run: bool,
}

impl Config {
    pub fn from_env() -> crate::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> crate::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let dry_run = non_empty("DRY_RUN")
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true"))
            .unwrap_or(false);

        let access_key_id = non_empty("AWS_ACCESS_KEY_ID");
        let secret_access_key = non_empty("AWS_SECRET_ACCESS_KEY");

        if !dry_run {
            if access_key_id.is_none() {
                return Err(crate::Error::Config(
                    "AWS_ACCESS_KEY_ID not set".to_string(),
                ));
            }
            if secret_access_key.is_none() {
                return Err(crate::Error::Config(
                    "AWS_SECRET_ACCESS_KEY not set".to_string(),
                ));
            }
        }

        Ok(Self {
            access_key_id,
            secret_access_key,
            region: non_empty("AWS_REGION").unwrap_or_else(|| "us-east-1".to_string()),
            endpoint: non_empty("S3_ENDPOINT"),
            bucket: non_empty("S3_BUCKET"),
            dest_dir: non_empty("S3_DEST_DIR").unwrap_or_else(|| "builds".to_string()),
            assets_dir: PathBuf::from(non_empty("ASSETS_DIR").unwrap_or_else(|| "assets".to_string())),
            icon: non_empty("APP_ICON").map(PathBuf::from),
            dry_run,
        })
    }
}
