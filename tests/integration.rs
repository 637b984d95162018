use artifact_uploader::{
    app::{App, AppServices},
    assets::{MockAssetGenerator, SiteGenerator},
    mime::APK_CONTENT_TYPE,
    models::{ArtifactMetadata, AssetLayout, AssetRole, Platform, VersionManifest},
    planner,
    storage::MockStorage,
    Error,
};
use pretty_assertions::assert_eq;
use std::fs;
use std::path::Path;

fn android_artifact(root: &Path) -> ArtifactMetadata {
    let source_file = root.join("build.apk");
    fs::write(&source_file, b"PK\x03\x04android-package").unwrap();
    ArtifactMetadata {
        title: "Field".to_string(),
        version: "1.2.0".to_string(),
        build_id: "45".to_string(),
        bundle_id: None,
        source_file,
        platform: Platform::Android,
        layout: AssetLayout::new(root.join("assets")),
    }
}

#[tokio::test]
async fn test_full_android_workflow_with_site_generator() {
    let dir = tempfile::tempdir().unwrap();
    let storage = MockStorage::new();
    let app = App::with_services(AppServices {
        generator: Box::new(SiteGenerator::new(None)),
        storage: Box::new(storage.clone()),
    });

    let artifact = android_artifact(dir.path());
    let report = app.publish("releases", "app", &artifact).await.unwrap();

    assert_eq!(
        report.links.download_url,
        "https://releases.s3.amazonaws.com/app/1.2.0/45/build.apk"
    );
    assert_eq!(report.links.manifest_url, None);
    assert_eq!(
        report.assets.urls(),
        vec![
            "https://releases.s3.amazonaws.com/app/1.2.0/45/appicon.png",
            "https://releases.s3.amazonaws.com/app/1.2.0/45/version.json",
            "https://releases.s3.amazonaws.com/app/1.2.0/45/index.html",
            "https://releases.s3.amazonaws.com/app/1.2.0/45/build.apk",
        ]
    );

    let binary = storage
        .get_object("releases", "app/1.2.0/45/build.apk")
        .unwrap();
    assert_eq!(binary.content_type, APK_CONTENT_TYPE);
    assert_eq!(binary.data, b"PK\x03\x04android-package");

    let icon = storage
        .get_object("releases", "app/1.2.0/45/appicon.png")
        .unwrap();
    assert_eq!(icon.content_type, "image/png");

    let index = storage
        .get_object("releases", "app/1.2.0/45/index.html")
        .unwrap();
    assert_eq!(index.content_type, "text/html");
    let page = String::from_utf8(index.data).unwrap();
    assert!(page.contains(&report.links.download_url));

    let manifest = storage
        .get_object("releases", "app/1.2.0/45/version.json")
        .unwrap();
    let manifest: VersionManifest = serde_json::from_slice(&manifest.data).unwrap();
    assert_eq!(manifest.download_url, report.links.download_url);
}

#[tokio::test]
async fn test_failure_on_third_of_five_jobs() {
    let dir = tempfile::tempdir().unwrap();
    let source_file = dir.path().join("Field.ipa");
    fs::write(&source_file, b"PK\x03\x04ipa").unwrap();
    let artifact = ArtifactMetadata {
        title: "Field".to_string(),
        version: "2.0.0".to_string(),
        build_id: "9".to_string(),
        bundle_id: Some("com.example.field".to_string()),
        source_file,
        platform: Platform::Ios,
        layout: AssetLayout::new(dir.path().join("assets")),
    };

    let storage = MockStorage::new().with_failure_on_call(3);
    let app = App::with_services(AppServices {
        generator: Box::new(MockAssetGenerator::new()),
        storage: Box::new(storage.clone()),
    });

    let plan = planner::plan_uploads("releases", "app", &artifact, &MockAssetGenerator::new())
        .await
        .unwrap();
    assert_eq!(plan.jobs.len(), 5);

    let partial = app.upload_all(&plan.jobs).await.unwrap_err();
    assert_eq!(partial.uploaded.len(), 2);
    assert_eq!(
        partial.uploaded.iter().map(|a| a.role).collect::<Vec<_>>(),
        vec![AssetRole::Icon, AssetRole::VersionManifest]
    );
    assert!(matches!(partial.error, Error::S3(_)));
    // jobs 4 and 5 never reach the backend
    assert_eq!(storage.get_upload_count(), 3);
}

#[tokio::test]
async fn test_report_serializes_for_cli_output() {
    let dir = tempfile::tempdir().unwrap();
    let app = App::with_services(AppServices {
        generator: Box::new(MockAssetGenerator::new()),
        storage: Box::new(MockStorage::new()),
    });

    let report = app
        .publish("releases", "app", &android_artifact(dir.path()))
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::to_value(&report).unwrap();

    assert_eq!(
        json["download_url"],
        "https://releases.s3.amazonaws.com/app/1.2.0/45/build.apk"
    );
    assert!(json.get("manifest_url").is_none());
    assert_eq!(json["assets"].as_array().unwrap().len(), 4);
    assert_eq!(json["assets"][3]["role"], "binary");
}
