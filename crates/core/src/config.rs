use crate::descriptor::DimensionLimits;
use crate::transform::TransformOptions;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Process-wide configuration, built once at startup.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct PictorConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub transform: TransformConfig,
    pub features: FeatureFlags,
}

impl PictorConfig {
    /// Apply the bare environment variables the service has always honoured
    /// (`SOURCE_BUCKETS`, `ENABLE_WEBP` and the AWS client settings).
    pub fn apply_legacy_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(bucket) = lookup("SOURCE_BUCKETS").filter(|b| !b.is_empty()) {
            self.storage.backend = StorageKind::S3;
            self.storage.s3.bucket = bucket;
        }

        if let Some(region) = lookup("AWS_REGION") {
            self.storage.s3.region = region;
        }
        if let Some(endpoint) = lookup("AWS_ENDPOINT_URL") {
            self.storage.s3.endpoint = Some(endpoint);
        }
        if let Some(key) = lookup("AWS_ACCESS_KEY_ID") {
            self.storage.s3.access_key_id = Some(key);
        }
        if let Some(secret) = lookup("AWS_SECRET_ACCESS_KEY") {
            self.storage.s3.secret_access_key = Some(secret);
        }
        if let Some(token) = lookup("AWS_SESSION_TOKEN") {
            self.storage.s3.session_token = Some(token);
        }

        if let Some(value) = lookup("ENABLE_WEBP") {
            self.features.enable_webp = FeatureFlags::webp_from_env(Some(&value));
        }
    }

    pub fn transform_options(&self) -> TransformOptions {
        TransformOptions {
            webp_enabled: self.features.enable_webp,
            quality: self.transform.quality.clamp(1, 100),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Object fetch timeout in seconds.
    pub fetch_timeout: u64,
    /// Transform and encode timeout in seconds.
    pub process_timeout: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            fetch_timeout: 10,
            process_timeout: 20,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageKind,
    pub local: LocalStorageConfig,
    pub s3: S3StorageConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    #[default]
    Local,
    S3,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LocalStorageConfig {
    pub base_path: PathBuf,
}

impl Default for LocalStorageConfig {
    fn default() -> Self {
        Self {
            base_path: PathBuf::from("data/storage"),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct S3StorageConfig {
    pub bucket: String,
    pub region: String,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    /// Only used alongside static keys; otherwise the SDK's default
    /// provider chain supplies credentials.
    pub session_token: Option<String>,
    pub endpoint: Option<String>,
}

impl Default for S3StorageConfig {
    fn default() -> Self {
        Self {
            bucket: String::new(),
            region: "us-east-1".to_string(),
            access_key_id: None,
            secret_access_key: None,
            session_token: None,
            endpoint: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TransformConfig {
    /// Upper bound for requested width and height.
    pub max_dimension: u32,
    /// Upper bound for requested width times height.
    pub max_pixels: u64,
    /// JPEG quality, 1-100.
    pub quality: u8,
}

impl TransformConfig {
    pub fn limits(&self) -> DimensionLimits {
        DimensionLimits {
            max_dimension: self.max_dimension,
            max_pixels: self.max_pixels,
        }
    }
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            max_dimension: DimensionLimits::default().max_dimension,
            max_pixels: DimensionLimits::default().max_pixels,
            quality: TransformOptions::default().quality,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct FeatureFlags {
    pub enable_webp: bool,
    /// Report the encoded output type as `Content-Type` instead of the
    /// stored object's type.
    pub report_output_content_type: bool,
}

impl FeatureFlags {
    /// Only the exact string `"true"` enables WebP.
    pub fn webp_from_env(value: Option<&str>) -> bool {
        value == Some("true")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::OutputType;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = PictorConfig::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.storage.backend, StorageKind::Local);
        assert!(!config.features.enable_webp);
        assert!(!config.features.report_output_content_type);
        assert_eq!(config.transform_options().output_type(), OutputType::Jpeg);
    }

    #[test]
    fn test_webp_env_values() {
        assert!(FeatureFlags::webp_from_env(Some("true")));
        for value in [None, Some(""), Some("TRUE"), Some("True"), Some("1"), Some("yes"), Some("false")] {
            assert!(!FeatureFlags::webp_from_env(value), "{value:?}");
        }
    }

    #[test]
    fn test_legacy_env_enables_webp() {
        let mut config = PictorConfig::default();
        config.apply_legacy_env(env(&[("ENABLE_WEBP", "true")]));
        assert_eq!(config.transform_options().output_type(), OutputType::WebP);
    }

    #[test]
    fn test_legacy_env_non_true_disables_webp() {
        let mut config = PictorConfig::default();
        config.features.enable_webp = true;
        config.apply_legacy_env(env(&[("ENABLE_WEBP", "1")]));
        assert!(!config.features.enable_webp);
    }

    #[test]
    fn test_legacy_env_unset_keeps_config() {
        let mut config = PictorConfig::default();
        config.apply_legacy_env(env(&[]));
        assert!(!config.features.enable_webp);
        assert_eq!(config.storage.backend, StorageKind::Local);
    }

    #[test]
    fn test_source_buckets_selects_s3() {
        let mut config = PictorConfig::default();
        config.apply_legacy_env(env(&[
            ("SOURCE_BUCKETS", "listing-images"),
            ("AWS_REGION", "eu-west-1"),
            ("AWS_ENDPOINT_URL", "http://localhost:9000"),
        ]));

        assert_eq!(config.storage.backend, StorageKind::S3);
        assert_eq!(config.storage.s3.bucket, "listing-images");
        assert_eq!(config.storage.s3.region, "eu-west-1");
        assert_eq!(
            config.storage.s3.endpoint.as_deref(),
            Some("http://localhost:9000")
        );
    }

    #[test]
    fn test_temporary_credentials_from_env() {
        let mut config = PictorConfig::default();
        config.apply_legacy_env(env(&[
            ("SOURCE_BUCKETS", "listing-images"),
            ("AWS_ACCESS_KEY_ID", "ASIAEXAMPLE"),
            ("AWS_SECRET_ACCESS_KEY", "secret"),
            ("AWS_SESSION_TOKEN", "session"),
        ]));

        assert_eq!(config.storage.s3.access_key_id.as_deref(), Some("ASIAEXAMPLE"));
        assert_eq!(config.storage.s3.secret_access_key.as_deref(), Some("secret"));
        assert_eq!(config.storage.s3.session_token.as_deref(), Some("session"));
    }

    #[test]
    fn test_quality_is_clamped() {
        let mut config = PictorConfig::default();
        config.transform.quality = 0;
        assert_eq!(config.transform_options().quality, 1);
        config.transform.quality = 200;
        assert_eq!(config.transform_options().quality, 100);
    }

    #[test]
    fn test_deserialize_partial_json() {
        let config: PictorConfig = serde_json::from_str(
            r#"{"server": {"port": 9000}, "features": {"enable_webp": true}}"#,
        )
        .unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert!(config.features.enable_webp);
    }
}
