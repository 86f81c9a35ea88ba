use crate::{StorageBackend, StorageError, StorageResult, StoredObject};
use async_trait::async_trait;
use aws_sdk_s3::Client;
use tracing::{debug, error};

pub struct S3Storage {
    client: Client,
    bucket: String,
    region: String,
}

impl S3Storage {
    pub fn new(client: Client, bucket: String, region: String) -> Self {
        debug!(
            "Initializing S3 storage client for bucket '{}' in region '{}'",
            bucket, region
        );

        Self {
            client,
            bucket,
            region,
        }
    }

    /// Validate and sanitize the S3 object key
    fn validate_key(&self, path: &str) -> StorageResult<String> {
        let clean_path = path.trim_start_matches('/');

        if clean_path.is_empty() {
            return Err(StorageError::InvalidPath("Empty path".to_string()));
        }

        if clean_path.contains("..") {
            return Err(StorageError::InvalidPath(format!(
                "Path contains invalid sequences: {}",
                path
            )));
        }

        Ok(clean_path.to_string())
    }
}

#[async_trait]
impl StorageBackend for S3Storage {
    async fn retrieve(&self, path: &str) -> StorageResult<StoredObject> {
        let key = self.validate_key(path)?;

        debug!(
            "Retrieving object from S3: bucket={}, region={}, key={}",
            self.bucket, self.region, key
        );

        let result = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(&key)
            .send()
            .await
            .map_err(|e| {
                let missing = e
                    .as_service_error()
                    .is_some_and(|service_error| service_error.is_no_such_key())
                    || e
                        .raw_response()
                        .is_some_and(|response| response.status().as_u16() == 404);

                if missing {
                    debug!("Object does not exist in S3: {}", key);
                    StorageError::NotFound(path.to_string())
                } else {
                    error!("Failed to retrieve object from S3: {}", e);
                    StorageError::Backend(format!("S3 get_object failed: {}", e))
                }
            })?;

        let content_type = result.content_type().map(|ct| ct.to_string());

        let data = result
            .body
            .collect()
            .await
            .map_err(|e| {
                error!("Failed to read S3 object body: {}", e);
                StorageError::Backend(format!("Failed to read S3 body: {}", e))
            })?
            .into_bytes()
            .to_vec();

        debug!(
            "Retrieved object from S3: {} bytes, content-type: {:?}",
            data.len(),
            content_type
        );

        Ok(StoredObject { data, content_type })
    }
}
