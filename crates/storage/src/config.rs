use crate::{LocalStorage, StorageBackend, StorageError, StorageResult};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[cfg(feature = "s3")]
use crate::S3Storage;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StorageType {
    Local {
        path: PathBuf,
    },
    S3 {
        bucket: String,
        region: String,
        access_key_id: Option<String>,
        secret_access_key: Option<String>,
        session_token: Option<String>,
        endpoint: Option<String>,
    },
}

impl Default for StorageType {
    fn default() -> Self {
        Self::Local {
            path: PathBuf::from("data/storage"),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(flatten)]
    pub storage_type: StorageType,
}

impl StorageConfig {
    pub fn new(storage_type: StorageType) -> Self {
        Self { storage_type }
    }

    /// Create a storage backend from the configuration
    pub async fn create_backend(&self) -> StorageResult<Arc<dyn StorageBackend>> {
        match &self.storage_type {
            StorageType::Local { path } => {
                if !path.exists() {
                    tokio::fs::create_dir_all(path).await.map_err(|e| {
                        StorageError::Backend(format!("Failed to create storage directory: {}", e))
                    })?;
                }

                info!("Serving source images from local directory {:?}", path);
                Ok(Arc::new(LocalStorage::new(path.clone())))
            }

            #[cfg(feature = "s3")]
            StorageType::S3 {
                bucket,
                region,
                access_key_id,
                secret_access_key,
                session_token,
                endpoint,
            } => {
                if bucket.is_empty() {
                    return Err(StorageError::Backend(
                        "S3 backend selected but no bucket configured".to_string(),
                    ));
                }

                let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
                    .region(aws_config::Region::new(region.clone()));

                // Static keys replace the default provider chain (env, profile, ECS/EC2 roles)
                if let (Some(access_key), Some(secret_key)) = (access_key_id, secret_access_key) {
                    let credentials = aws_sdk_s3::config::Credentials::new(
                        access_key,
                        secret_key,
                        session_token.clone(),
                        None,
                        "pictor-config",
                    );
                    loader = loader.credentials_provider(credentials);
                } else {
                    tracing::debug!("No static S3 credentials configured, using the default provider chain");
                }

                let sdk_config = loader.load().await;
                let mut config_builder = aws_sdk_s3::config::Builder::from(&sdk_config);

                // Custom endpoints (MinIO, R2) need path-style addressing
                if let Some(endpoint_url) = endpoint {
                    config_builder = config_builder
                        .endpoint_url(endpoint_url)
                        .force_path_style(true);
                }

                let client = aws_sdk_s3::Client::from_conf(config_builder.build());

                info!("Serving source images from S3 bucket '{}'", bucket);
                Ok(Arc::new(S3Storage::new(
                    client,
                    bucket.clone(),
                    region.clone(),
                )))
            }

            #[cfg(not(feature = "s3"))]
            StorageType::S3 { .. } => Err(StorageError::Backend(
                "S3 storage requested but pictor was built without the `s3` feature".to_string(),
            )),
        }
    }
}
