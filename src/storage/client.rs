use super::{encode_key, public_url, PutRequest, StorageService};
use crate::{Error, Result};
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::RequestChecksumCalculation;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{ObjectCannedAcl, ServerSideEncryption};
use aws_sdk_s3::{config::Region, Client as S3Client};
use tracing::debug;

/// Static credentials handed to the S3 client.
#[derive(Clone)]
pub struct StorageCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub region: String,
    /// S3-compatible endpoint; `None` talks to AWS.
    pub endpoint: Option<String>,
}

impl std::fmt::Debug for StorageCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("region", &self.region)
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

pub struct S3Storage {
    client: S3Client,
    endpoint: Option<String>,
}

impl S3Storage {
    pub async fn new(credentials: StorageCredentials) -> Result<Self> {
        let StorageCredentials {
            access_key_id,
            secret_access_key,
            region,
            endpoint,
        } = credentials;

        let provider = aws_sdk_s3::config::Credentials::new(
            access_key_id,
            secret_access_key,
            None,
            None,
            "artifact-uploader",
        );

        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .credentials_provider(provider)
            .region(Region::new(region));
        if let Some(endpoint) = &endpoint {
            loader = loader.endpoint_url(endpoint);
        }
        let shared = loader.load().await;

        // Custom endpoints (MinIO, local mocks) rarely resolve bucket subdomains.
        // Checksums only when required: S3-compatible stores reject aws-chunked trailers.
        let s3_config = aws_sdk_s3::config::Builder::from(&shared)
            .force_path_style(endpoint.is_some())
            .request_checksum_calculation(RequestChecksumCalculation::WhenRequired)
            .build();

        Ok(Self {
            client: S3Client::from_conf(s3_config),
            endpoint: endpoint.map(|e| e.trim_end_matches('/').to_string()),
        })
    }

    fn location(&self, bucket: &str, key: &str) -> String {
        let encoded = encode_key(key);
        match &self.endpoint {
            Some(endpoint) => format!("{}/{}/{}", endpoint, bucket, encoded),
            None => public_url(bucket, &encoded),
        }
    }
}

#[async_trait]
impl StorageService for S3Storage {
    async fn put_object(&self, request: &PutRequest) -> Result<String> {
        let body = ByteStream::from_path(&request.source_path)
            .await
            .map_err(|e| {
                Error::Io(std::io::Error::other(format!(
                    "{}: {}",
                    request.source_path.display(),
                    e
                )))
            })?;

        debug!(
            "PUT s3://{}/{} ({} bytes)",
            request.bucket, request.key, request.content_length
        );

        self.client
            .put_object()
            .bucket(&request.bucket)
            .key(&request.key)
            .body(body)
            .content_length(request.content_length as i64)
            .content_type(&request.content_type)
            .acl(ObjectCannedAcl::PublicRead)
            .server_side_encryption(ServerSideEncryption::Aes256)
            .send()
            .await
            .map_err(|e| {
                Error::S3(format!(
                    "failed to upload file, {}",
                    DisplayErrorContext(&e)
                ))
            })?;

        Ok(self.location(&request.bucket, &request.key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use wiremock::matchers::{body_bytes, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn credentials(endpoint: Option<String>) -> StorageCredentials {
        StorageCredentials {
            access_key_id: "AKIDEXAMPLE".to_string(),
            secret_access_key: "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY".to_string(),
            region: "us-east-1".to_string(),
            endpoint,
        }
    }

    fn temp_source(contents: &[u8]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents).unwrap();
        file
    }

    #[tokio::test]
    async fn test_location_for_aws_is_virtual_hosted() {
        let storage = S3Storage::new(credentials(None)).await.unwrap();
        assert_eq!(
            storage.location("releases", "app/1.2.0/45/My App.ipa"),
            "https://releases.s3.amazonaws.com/app/1.2.0/45/My%20App.ipa"
        );
    }

    #[tokio::test]
    async fn test_credentials_debug_redacts_secret() {
        let rendered = format!("{:?}", credentials(None));
        assert!(rendered.contains("<redacted>"));
        assert!(!rendered.contains("EXAMPLEKEY"));
    }

    #[tokio::test]
    async fn test_put_object_sends_acl_and_encryption_headers() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/releases/app/1.2.0/45/build.apk"))
            .and(header("x-amz-acl", "public-read"))
            .and(header("x-amz-server-side-encryption", "AES256"))
            .and(header("content-type", "application/vnd.android.package-archive"))
            .and(body_bytes(b"PK\x03\x04apk-bytes".to_vec()))
            .respond_with(ResponseTemplate::new(200).insert_header("ETag", "\"abc\""))
            .expect(1)
            .mount(&server)
            .await;

        let storage = S3Storage::new(credentials(Some(server.uri()))).await.unwrap();
        let source = temp_source(b"PK\x03\x04apk-bytes");

        let location = storage
            .put_object(&PutRequest {
                bucket: "releases".to_string(),
                key: "app/1.2.0/45/build.apk".to_string(),
                source_path: source.path().to_path_buf(),
                content_type: "application/vnd.android.package-archive".to_string(),
                content_length: 13,
            })
            .await
            .unwrap();

        assert_eq!(
            location,
            format!("{}/releases/app/1.2.0/45/build.apk", server.uri())
        );
    }

    #[tokio::test]
    async fn test_put_object_wraps_backend_failure() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(403).set_body_string(
                "<Error><Code>AccessDenied</Code><Message>Access Denied</Message></Error>",
            ))
            .mount(&server)
            .await;

        let storage = S3Storage::new(credentials(Some(server.uri()))).await.unwrap();
        let source = temp_source(b"data");

        let err = storage
            .put_object(&PutRequest {
                bucket: "releases".to_string(),
                key: "app/1/2/version.json".to_string(),
                source_path: source.path().to_path_buf(),
                content_type: "text/plain; charset=utf-8".to_string(),
                content_length: 4,
            })
            .await
            .unwrap_err();

        assert!(matches!(err, Error::S3(_)));
        let message = err.to_string();
        assert!(message.contains("failed to upload file"));
        assert!(message.contains("AccessDenied"), "{}", message);
    }
}
