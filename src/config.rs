use serde::{Deserialize, Serialize};

/// Configuration for one bucket mirror.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Region of the target bucket.
    pub region: String,

    /// Static access key. Ignored when the client is built from the
    /// ambient environment.
    pub access_key: String,

    /// Static secret key.
    pub secret_key: String,

    /// Bucket holding the mirrored media tree.
    pub bucket: String,

    /// Gzip file bodies on upload, re-read from disk at level 9.
    pub gzip_enabled: bool,

    /// Verbatim Cache-Control header for uploaded objects. None means no
    /// header is set.
    pub cache_control_header: Option<String>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            region: "us-east-1".to_string(),
            access_key: String::new(),
            secret_key: String::new(),
            bucket: String::new(),
            gzip_enabled: false,
            cache_control_header: None,
        }
    }
}

impl StoreConfig {
    pub fn new(bucket: &str, region: &str) -> Self {
        Self {
            bucket: bucket.to_string(),
            region: region.to_string(),
            ..Default::default()
        }
    }
}
