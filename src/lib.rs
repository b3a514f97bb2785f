//! Mirrors a CMS media directory tree onto an object-storage bucket and
//! serves reads back from it.
//!
//! Local relative paths map to object keys with `/` separators;
//! directories exist only as key prefixes, listed one level at a time with
//! the `/` delimiter. Uploads are public-read and can be gzip-compressed
//! with a Cache-Control header. Batch import collects per-file errors
//! instead of aborting; single-file save/copy/rename/delete are
//! best-effort and never block the caller's primary operation.

mod dir;

pub mod config;
pub mod error;
pub mod gateway;
pub mod media;
pub mod model;
pub mod payload;
pub mod sync;
pub mod util;

pub use config::StoreConfig;
pub use error::{Result, StoreError};
pub use gateway::StorageGateway;
pub use media::{LocalMediaFiles, MediaFiles};
pub use model::{Listing, ManagedFile, ObjectRecord, Subdirectory, UploadPayload};
pub use sync::MediaStore;
