use crate::{error, model};

pub mod mock;
pub mod s3;

/// Synchronous facade over the object-storage transport.
///
/// Each method maps 1:1 onto the backing client's primitive; no retries or
/// caching here. Transport failures surface as `StoreError::Transport`.
pub trait StorageGateway {
    fn put(&self, bucket: &str, payload: &model::UploadPayload) -> Result<(), error::StoreError>;

    /// Fetches an object body. A missing object is `Ok(None)`, not an
    /// error.
    fn get(&self, bucket: &str, key: &str) -> Result<Option<Vec<u8>>, error::StoreError>;

    fn delete(&self, bucket: &str, key: &str) -> Result<(), error::StoreError>;

    /// Server-side copy. The destination is left publicly readable, same
    /// as uploads.
    fn copy(&self, bucket: &str, src_key: &str, dst_key: &str) -> Result<(), error::StoreError>;

    fn exists(&self, bucket: &str, key: &str) -> Result<bool, error::StoreError>;

    /// One page of a listing. `marker` is the strictly-after key from the
    /// previous page; `delimiter` rolls child directories up into
    /// `common_prefixes`.
    fn list(
        &self,
        bucket: &str,
        prefix: Option<&str>,
        delimiter: Option<&str>,
        marker: Option<&str>,
        max_keys: i32,
    ) -> Result<model::Listing, error::StoreError>;

    /// Deletes every object whose key starts with `prefix`. The empty
    /// prefix empties the bucket. Partial failure propagates.
    fn delete_all_under_prefix(&self, bucket: &str, prefix: &str) -> Result<(), error::StoreError>;
}
