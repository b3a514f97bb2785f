use aws_sdk_s3::{
    config::{Credentials, Region},
    primitives::ByteStream,
    types::{Delete, ObjectCannedAcl, ObjectIdentifier},
};

use crate::{config, error, gateway, model, util};

/// Builds a client from explicit static credentials.
pub fn client_from_config(config: &config::StoreConfig) -> aws_sdk_s3::Client {
    let credentials = Credentials::new(
        config.access_key.clone(),
        config.secret_key.clone(),
        None,
        None,
        "mediasync",
    );

    let conf = aws_sdk_s3::Config::builder()
        .region(Region::new(config.region.clone()))
        .credentials_provider(credentials)
        .behavior_version_latest()
        .build();

    aws_sdk_s3::Client::from_conf(conf)
}

/// Builds a client from the ambient environment (profile, env vars, IMDS).
pub fn client_from_env() -> aws_sdk_s3::Client {
    let config = util::poll::wait(aws_config::load_from_env());

    aws_sdk_s3::Client::new(&config)
}

impl gateway::StorageGateway for aws_sdk_s3::Client {
    fn put(&self, bucket: &str, payload: &model::UploadPayload) -> Result<(), error::StoreError> {
        let mut req = self
            .put_object()
            .bucket(bucket)
            .key(&payload.key)
            .body(ByteStream::from(payload.body.clone()))
            .content_type(&payload.content_type)
            .acl(ObjectCannedAcl::from(payload.acl.as_str()));

        if let Some(encoding) = &payload.content_encoding {
            req = req.content_encoding(encoding);
        }

        if let Some(cache_control) = &payload.cache_control {
            req = req.cache_control(cache_control);
        }

        util::poll::wait(req.send()).map_err(|err| {
            error::StoreError::Transport(format!(
                "failed to put_object at: {}, {}",
                payload.key, err
            ))
        })?;

        Ok(())
    }

    fn get(&self, bucket: &str, key: &str) -> Result<Option<Vec<u8>>, error::StoreError> {
        let req = self.get_object().bucket(bucket).key(key);

        let object = match util::poll::wait(req.send()) {
            Err(err) => {
                if let Some(svc_err) = err.as_service_error() {
                    if svc_err.is_no_such_key() {
                        return Ok(None);
                    }
                }

                return Err(error::StoreError::Transport(format!(
                    "failed to get_object: {}, {}",
                    key, err
                )));
            }
            Ok(object) => object,
        };

        let bytes = util::poll::wait(object.body.collect()).map_err(|err| {
            error::StoreError::Transport(format!("failed to collect body: {}, {}", key, err))
        })?;

        Ok(Some(bytes.into_bytes().to_vec()))
    }

    fn delete(&self, bucket: &str, key: &str) -> Result<(), error::StoreError> {
        let req = self.delete_object().bucket(bucket).key(key);

        util::poll::wait(req.send()).map_err(|err| {
            error::StoreError::Transport(format!("failed to delete_object: {}, {}", key, err))
        })?;

        Ok(())
    }

    fn copy(&self, bucket: &str, src_key: &str, dst_key: &str) -> Result<(), error::StoreError> {
        let req = self
            .copy_object()
            .bucket(bucket)
            .copy_source(format!("{}/{}", bucket, src_key))
            .key(dst_key)
            .acl(ObjectCannedAcl::PublicRead);

        util::poll::wait(req.send()).map_err(|err| {
            error::StoreError::Transport(format!(
                "failed to copy_object: {} -> {}, {}",
                src_key, dst_key, err
            ))
        })?;

        Ok(())
    }

    fn exists(&self, bucket: &str, key: &str) -> Result<bool, error::StoreError> {
        let req = self.head_object().bucket(bucket).key(key);

        match util::poll::wait(req.send()) {
            Ok(_) => Ok(true),
            Err(err) => {
                if let Some(svc_err) = err.as_service_error() {
                    if svc_err.is_not_found() {
                        return Ok(false);
                    }
                }

                Err(error::StoreError::Transport(format!(
                    "failed to head_object: {}, {}",
                    key, err
                )))
            }
        }
    }

    fn list(
        &self,
        bucket: &str,
        prefix: Option<&str>,
        delimiter: Option<&str>,
        marker: Option<&str>,
        max_keys: i32,
    ) -> Result<model::Listing, error::StoreError> {
        let req = self
            .list_objects_v2()
            .bucket(bucket)
            .set_prefix(prefix.map(|p| p.to_string()))
            .set_delimiter(delimiter.map(|d| d.to_string()))
            .set_start_after(marker.map(|m| m.to_string()))
            .max_keys(max_keys);

        let lo = util::poll::wait(req.send()).map_err(|err| {
            error::StoreError::Transport(format!(
                "failed to list_objects at: {}, {}",
                prefix.unwrap_or(""),
                err
            ))
        })?;

        let entries = lo
            .contents()
            .iter()
            .filter_map(|object| object.key().map(|key| key.to_string()))
            .collect();

        let common_prefixes = lo
            .common_prefixes()
            .iter()
            .filter_map(|cp| cp.prefix().map(|prefix| prefix.to_string()))
            .collect();

        Ok(model::Listing {
            entries,
            common_prefixes,
        })
    }

    fn delete_all_under_prefix(&self, bucket: &str, prefix: &str) -> Result<(), error::StoreError> {
        loop {
            let listing =
                gateway::StorageGateway::list(self, bucket, Some(prefix), None, None, 1000)?;
            if listing.entries.is_empty() {
                return Ok(());
            }

            let mut objects = Vec::new();
            for key in &listing.entries {
                let id = ObjectIdentifier::builder().key(key).build().map_err(|err| {
                    error::StoreError::Transport(format!(
                        "failed to build delete id: {}, {}",
                        key, err
                    ))
                })?;
                objects.push(id);
            }

            let delete = Delete::builder()
                .set_objects(Some(objects))
                .build()
                .map_err(|err| {
                    error::StoreError::Transport(format!("failed to build batch delete: {}", err))
                })?;

            let req = self.delete_objects().bucket(bucket).delete(delete);

            let out = util::poll::wait(req.send()).map_err(|err| {
                error::StoreError::Transport(format!(
                    "failed to delete_objects under: {}, {}",
                    prefix, err
                ))
            })?;

            if !out.errors().is_empty() {
                let first = &out.errors()[0];
                return Err(error::StoreError::Transport(format!(
                    "batch delete under {} left {} object(s), first: {}",
                    prefix,
                    out.errors().len(),
                    first.message().unwrap_or("unknown")
                )));
            }
        }
    }
}
