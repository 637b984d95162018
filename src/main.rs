use anyhow::{Context, Result};
use artifact_uploader::app::App;
use artifact_uploader::models::{ArtifactMetadata, AssetLayout, Config, Platform};
use clap::Parser;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "artifact-uploader")]
#[command(about = "Upload a mobile build and its install page to S3")]
struct CliArgs {
    /// Path to the .apk or .ipa to publish.
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// Application version, e.g. 1.2.0.
    #[arg(long = "version")]
    app_version: String,

    /// Build identifier, e.g. a CI build number.
    #[arg(long)]
    build: String,

    /// Target platform; inferred from the file extension when omitted.
    #[arg(long, value_parser = parse_platform_arg)]
    platform: Option<Platform>,

    /// Destination bucket (defaults to S3_BUCKET).
    #[arg(long)]
    bucket: Option<String>,

    /// Destination base directory (defaults to S3_DEST_DIR).
    #[arg(long)]
    dest_dir: Option<String>,

    /// Display name used on the install page.
    #[arg(long)]
    title: Option<String>,

    /// Bundle identifier, required for iOS builds.
    #[arg(long)]
    bundle_id: Option<String>,

    /// Source image for the app icon (defaults to APP_ICON).
    #[arg(long)]
    icon: Option<PathBuf>,

    /// Local directory for generated assets (defaults to ASSETS_DIR).
    #[arg(long)]
    assets_dir: Option<PathBuf>,
}

fn parse_platform_arg(input: &str) -> std::result::Result<Platform, String> {
    input.parse()
}

fn resolve_platform(args: &CliArgs) -> Result<Platform> {
    match args.platform {
        Some(platform) => Ok(platform),
        None => Platform::from_path(&args.file).with_context(|| {
            format!(
                "Cannot infer platform from '{}'. Pass --platform ios|android",
                args.file.display()
            )
        }),
    }
}

fn default_title(file: &std::path::Path) -> String {
    file.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "app".to_string())
}

async fn run(args: CliArgs) -> Result<()> {
    let mut config = Config::from_env()?;
    if let Some(icon) = args.icon.clone() {
        config.icon = Some(icon);
    }
    if let Some(assets_dir) = args.assets_dir.clone() {
        config.assets_dir = assets_dir;
    }

    let bucket = args
        .bucket
        .clone()
        .or_else(|| config.bucket.clone())
        .context("No bucket given. Pass --bucket or set S3_BUCKET")?;
    let dest_dir = args.dest_dir.clone().unwrap_or_else(|| config.dest_dir.clone());

    let artifact = ArtifactMetadata {
        title: args.title.clone().unwrap_or_else(|| default_title(&args.file)),
        version: args.app_version.clone(),
        build_id: args.build.clone(),
        bundle_id: args.bundle_id.clone(),
        platform: resolve_platform(&args)?,
        source_file: args.file,
        layout: AssetLayout::new(&config.assets_dir),
    };

    let app = App::from_config(&config).await?;
    let report = app.publish(&bucket, &dest_dir, &artifact).await?;

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "artifact_uploader=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("Starting artifact-uploader");

    let args = CliArgs::parse();

    match run(args).await {
        Ok(()) => {
            info!("Upload completed successfully");
            Ok(())
        }
        Err(e) => {
            error!("Upload failed: {:#}", e);
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_platform_arg() {
        assert_eq!(parse_platform_arg("IOS").unwrap(), Platform::Ios);
        let err = parse_platform_arg("symbian").unwrap_err();
        assert!(err.contains("ios"));
    }

    #[test]
    fn test_platform_inferred_from_extension() {
        let args = CliArgs::parse_from([
            "artifact-uploader",
            "/tmp/build.apk",
            "--version",
            "1.2.0",
            "--build",
            "45",
        ]);
        assert_eq!(resolve_platform(&args).unwrap(), Platform::Android);
        assert_eq!(default_title(&args.file), "build");
    }

    #[test]
    fn test_unknown_extension_requires_platform_flag() {
        let args = CliArgs::parse_from([
            "artifact-uploader",
            "/tmp/build.zip",
            "--version",
            "1.2.0",
            "--build",
            "45",
        ]);
        assert!(resolve_platform(&args).is_err());

        let args = CliArgs::parse_from([
            "artifact-uploader",
            "/tmp/build.zip",
            "--version",
            "1.2.0",
            "--build",
            "45",
            "--platform",
            "ios",
        ]);
        assert_eq!(resolve_platform(&args).unwrap(), Platform::Ios);
    }
}
