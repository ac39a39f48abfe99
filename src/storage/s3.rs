//! S3-compatible object store (AWS S3, R2, OSS, MinIO)

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::retry::RetryConfig;
use aws_sdk_s3::config::{Credentials, Region, RequestChecksumCalculation};
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_s3::operation::head_object::HeadObjectError;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client as S3Client;
use futures::TryStreamExt;
use http_body::Frame;
use http_body_util::StreamBody;

use super::backend::{ObjectMetadata, ObjectStore, PutRequest};
use crate::config::StorageConfig;
use crate::error::{Result, SyncError};

/// Object store backed by `aws-sdk-s3`
#[derive(Clone)]
pub struct S3Store {
    client: S3Client,
}

impl S3Store {
    /// Wrap an already-configured client
    pub fn new(client: S3Client) -> Self {
        Self { client }
    }

    /// Build a client from static credentials, region and optional endpoint.
    ///
    /// Requests are sent once, without SDK retries. Checksums are only added
    /// where an operation requires them, so uploads are plain bodies (chunked
    /// when the length is unknown) and never aws-chunked with a trailer.
    pub async fn connect(config: &StorageConfig) -> Self {
        let credentials = Credentials::new(
            config.access_key_id.clone(),
            config.access_key_secret.clone(),
            None,
            None,
            "depsync",
        );

        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .credentials_provider(credentials);
        if let Some(endpoint) = &config.endpoint {
            loader = loader.endpoint_url(endpoint);
        }
        let sdk_config = loader.load().await;

        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(config.path_style)
            .retry_config(RetryConfig::disabled())
            .request_checksum_calculation(RequestChecksumCalculation::WhenRequired)
            .build();

        tracing::debug!(
            "S3 client ready (region={}, endpoint={}, path_style={})",
            config.region,
            config.endpoint.as_deref().unwrap_or("default"),
            config.path_style
        );

        Self::new(S3Client::from_conf(s3_config))
    }

    pub fn client(&self) -> &S3Client {
        &self.client
    }
}

/// Whether a HEAD failure means the object is absent
fn is_not_found<R>(err: &SdkError<HeadObjectError, R>, status: Option<u16>) -> bool {
    // HEAD responses carry no error body, so a bare 404 counts on its own
    if status == Some(404) {
        return true;
    }
    // Some S3-compatible services answer with NoSuchKey instead of NotFound
    err.as_service_error()
        .is_some_and(|e| e.is_not_found() || e.code() == Some("NoSuchKey"))
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn head_object(&self, bucket: &str, key: &str) -> Result<Option<ObjectMetadata>> {
        match self.client.head_object().bucket(bucket).key(key).send().await {
            Ok(response) => Ok(Some(ObjectMetadata {
                user_metadata: response.metadata().cloned().unwrap_or_default(),
                content_length: response
                    .content_length()
                    .and_then(|len| u64::try_from(len).ok()),
            })),
            Err(e) => {
                let status = e.raw_response().map(|r| r.status().as_u16());
                if is_not_found(&e, status) {
                    Ok(None)
                } else {
                    Err(SyncError::ObjectStore(format!(
                        "S3 HeadObject: {}",
                        DisplayErrorContext(&e)
                    )))
                }
            }
        }
    }

    async fn put_object(&self, request: PutRequest<'_>) -> Result<()> {
        let PutRequest {
            bucket,
            key,
            body,
            content_length,
            metadata,
        } = request;

        let body = ByteStream::from_body_1_x(StreamBody::new(body.map_ok(Frame::data)));

        let mut put = self
            .client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(body)
            .set_metadata(Some(metadata));
        if let Some(len) = content_length.and_then(|len| i64::try_from(len).ok()) {
            put = put.content_length(len);
        }

        put.send().await.map_err(|e| {
            SyncError::ObjectStore(format!(
                "S3 PutObject: {}",
                DisplayErrorContext(&e)
            ))
        })?;

        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "s3"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_s3::error::ErrorMetadata;
    use aws_sdk_s3::types::error::NotFound;

    fn service_error(err: HeadObjectError) -> SdkError<HeadObjectError, ()> {
        SdkError::service_error(err, ())
    }

    fn coded(code: &str) -> HeadObjectError {
        HeadObjectError::generic(ErrorMetadata::builder().code(code).build())
    }

    #[test]
    fn test_modeled_not_found() {
        let err = service_error(HeadObjectError::NotFound(NotFound::builder().build()));
        assert!(is_not_found(&err, Some(404)));
        assert!(is_not_found(&err, None));
    }

    #[test]
    fn test_no_such_key_with_other_status() {
        assert!(is_not_found(&service_error(coded("NoSuchKey")), Some(403)));
        assert!(is_not_found(&service_error(coded("NoSuchKey")), Some(400)));
    }

    #[test]
    fn test_bare_404() {
        let err = service_error(HeadObjectError::generic(ErrorMetadata::builder().build()));
        assert!(is_not_found(&err, Some(404)));
    }

    #[test]
    fn test_access_denied_is_an_error() {
        assert!(!is_not_found(&service_error(coded("AccessDenied")), Some(403)));
        assert!(!is_not_found(&service_error(coded("Forbidden")), Some(403)));
        let err = service_error(HeadObjectError::generic(ErrorMetadata::builder().build()));
        assert!(!is_not_found(&err, Some(503)));
    }
}
