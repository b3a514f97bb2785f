use std::{fs, io::Write, path::Path};

use flate2::{write::GzEncoder, Compression};

use crate::{config, error, model, util};

/// Maximum gzip compression level. Fixed so repeated uploads of the same
/// content produce byte-identical objects.
pub const GZIP_COMPRESSION_LEVEL: u32 = 9;

pub const ACL_PUBLIC_READ: &str = "public-read";

/// Builds the put payload for one managed file.
///
/// When gzip is enabled the body is re-read from the local media tree and
/// compressed; any body already held in memory is ignored on that path. An
/// empty compressor result fails the upload for this file instead of
/// pushing an empty object.
pub fn build_payload(
    file: &model::ManagedFile,
    media_base_dir: &str,
    config: &config::StoreConfig,
) -> Result<model::UploadPayload, error::StoreError> {
    let key = util::path::object_key(&file.directory, &file.filename);

    let content_type = mime_guess::from_path(&file.filename)
        .first_or_octet_stream()
        .to_string();

    let mut content_encoding = None;
    let body = if config.gzip_enabled {
        let raw = read_local(media_base_dir, file)?;
        let compressed = gzip(&raw)?;
        if compressed.is_empty() {
            return Err(error::StoreError::Compression(key));
        }

        content_encoding = Some("gzip".to_string());
        compressed
    } else {
        match &file.content {
            Some(content) => content.clone(),
            None => read_local(media_base_dir, file)?,
        }
    };

    let cache_control = config
        .cache_control_header
        .as_ref()
        .filter(|header| !header.is_empty())
        .cloned();

    Ok(model::UploadPayload {
        key,
        body,
        content_type,
        content_encoding,
        cache_control,
        acl: ACL_PUBLIC_READ.to_string(),
    })
}

fn read_local(
    media_base_dir: &str,
    file: &model::ManagedFile,
) -> Result<Vec<u8>, error::StoreError> {
    let path = Path::new(media_base_dir)
        .join(&file.directory)
        .join(&file.filename);

    Ok(fs::read(path)?)
}

fn gzip(raw: &[u8]) -> Result<Vec<u8>, error::StoreError> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::new(GZIP_COMPRESSION_LEVEL));
    encoder.write_all(raw)?;

    Ok(encoder.finish()?)
}
