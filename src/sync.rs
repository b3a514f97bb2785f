use tracing::{error, info, span, warn, Level};

use crate::{config, error, gateway, media, model, payload, util};

/// Mirror of the local media tree in one object-storage bucket.
///
/// One instance owns one logical sync session: the export cursor and the
/// error log live here and are dropped with the store. The gateway and the
/// local-filesystem collaborator are injected so tests can substitute
/// fakes.
pub struct MediaStore {
    gateway: Box<dyn gateway::StorageGateway>,
    media: Box<dyn media::MediaFiles>,
    config: config::StoreConfig,
    errors: Vec<String>,
    cursor: Option<String>,
    suppressed: u64,
}

impl MediaStore {
    pub fn new(
        gateway: Box<dyn gateway::StorageGateway>,
        media: Box<dyn media::MediaFiles>,
        config: config::StoreConfig,
    ) -> Self {
        Self {
            gateway,
            media,
            config,
            errors: Vec::new(),
            cursor: None,
            suppressed: 0,
        }
    }

    pub fn storage_name(&self) -> &'static str {
        "Amazon S3"
    }

    pub fn media_base_dir(&self) -> &str {
        self.media.media_base_dir()
    }

    pub(crate) fn bucket(&self) -> &str {
        &self.config.bucket
    }

    pub(crate) fn gateway(&self) -> &dyn gateway::StorageGateway {
        self.gateway.as_ref()
    }

    /// Fetches one object. A missing object is `StoreError::NotFound`,
    /// distinct from transport failure.
    pub fn load_by_key(&self, key: &str) -> Result<model::ObjectRecord, error::StoreError> {
        let span = span!(Level::INFO, "load_by_key", context = "load_by_key");
        let _e = span.enter();
        info!(key = key, "called");

        match self.gateway.get(self.bucket(), key)? {
            Some(content) => Ok(model::ObjectRecord {
                id: key.to_string(),
                filename: key.to_string(),
                content,
            }),
            None => Err(error::StoreError::NotFound(key.to_string())),
        }
    }

    pub fn file_exists(&self, key: &str) -> Result<bool, error::StoreError> {
        self.gateway.exists(self.bucket(), key)
    }

    /// Pulls the next page of the bucket into transfer batches.
    ///
    /// `offset == 0` starts a fresh pass; later calls continue from the
    /// previous page's last key. An empty listing means the pass is done
    /// and returns `Ok(None)`. Directory placeholder keys are skipped.
    pub fn export_files(
        &mut self,
        offset: usize,
        count: i32,
    ) -> Result<Option<Vec<model::ManagedFile>>, error::StoreError> {
        let span = span!(Level::INFO, "export_files", context = "export_files");
        let _e = span.enter();
        info!(offset = offset, count = count, "called");

        if offset == 0 {
            self.cursor = None;
        }

        let listing =
            self.gateway
                .list(self.bucket(), None, None, self.cursor.as_deref(), count)?;

        if listing.entries.is_empty() {
            return Ok(None);
        }

        let mut files = Vec::new();
        for key in &listing.entries {
            if key.ends_with('/') {
                continue;
            }

            let content = match self.gateway.get(self.bucket(), key)? {
                Some(content) => content,
                None => continue,
            };

            let (directory, filename) = util::path::split_key(key);
            files.push(model::ManagedFile {
                directory: directory.to_string(),
                filename: filename.to_string(),
                content: Some(content),
            });
        }

        // The cursor moves only once every body on the page is in hand;
        // a failed fetch leaves it on the previous page so a retry sees
        // the same objects again.
        self.cursor = listing.entries.last().cloned();

        Ok(Some(files))
    }

    /// Pushes a batch of local files into the bucket.
    ///
    /// Every file is attempted; a failing item never aborts the batch.
    /// Failures come back together as `StoreError::PartialBatch` and are
    /// also appended to the session error log.
    pub fn import_files(&mut self, files: &[model::ManagedFile]) -> Result<(), error::StoreError> {
        let span = span!(Level::INFO, "import_files", context = "import_files");
        let _e = span.enter();
        info!(count = files.len(), "called");

        let base_dir = self.media.media_base_dir().to_string();

        let mut batch_errors = Vec::new();
        for file in files {
            let key = util::path::object_key(&file.directory, &file.filename);

            let result = payload::build_payload(file, &base_dir, &self.config)
                .and_then(|p| self.gateway.put(self.bucket(), &p));

            if let Err(err) = result {
                error!(error_message=%err, error_group="import_files");
                batch_errors.push(format!("{}: {}", key, err));
            }
        }

        if batch_errors.is_empty() {
            return Ok(());
        }

        self.errors.extend(batch_errors.iter().cloned());

        Err(error::StoreError::PartialBatch(batch_errors))
    }

    /// Best-effort single-file push, used by save-on-write triggers where
    /// the caller cannot react to failure. Errors are logged and counted,
    /// never returned.
    pub fn save_file(&mut self, filename: &str) {
        let span = span!(Level::INFO, "save_file", context = "save_file");
        let _e = span.enter();
        info!(filename = filename, "called");

        let base_dir = self.media.media_base_dir().to_string();

        let result = self
            .media
            .collect_file_info(&base_dir, filename)
            .and_then(|file| payload::build_payload(&file, &base_dir, &self.config))
            .and_then(|p| self.gateway.put(self.bucket(), &p));

        if let Err(err) = result {
            self.suppress("save_file", err);
        }
    }

    /// Best-effort server-side copy; failure never blocks the caller.
    pub fn copy_file(&mut self, old_path: &str, new_path: &str) {
        let span = span!(Level::INFO, "copy_file", context = "copy_file");
        let _e = span.enter();
        info!(old_path = old_path, new_path = new_path, "called");

        if let Err(err) = self.gateway.copy(self.bucket(), old_path, new_path) {
            self.suppress("copy_file", err);
        }
    }

    /// Best-effort rename: copy, then delete the old key.
    pub fn rename_file(&mut self, old_path: &str, new_path: &str) {
        let span = span!(Level::INFO, "rename_file", context = "rename_file");
        let _e = span.enter();
        info!(old_path = old_path, new_path = new_path, "called");

        let result = self
            .gateway
            .copy(self.bucket(), old_path, new_path)
            .and_then(|_| self.gateway.delete(self.bucket(), old_path));

        if let Err(err) = result {
            self.suppress("rename_file", err);
        }
    }

    /// Best-effort delete; failure never blocks the caller.
    pub fn delete_file(&mut self, path: &str) {
        let span = span!(Level::INFO, "delete_file", context = "delete_file");
        let _e = span.enter();
        info!(path = path, "called");

        if let Err(err) = self.gateway.delete(self.bucket(), path) {
            self.suppress("delete_file", err);
        }
    }

    /// Deletes every object in the bucket. Destructive and unconfirmed;
    /// callers gate this behind their own confirmation step. Failures
    /// propagate.
    pub fn clear(&mut self) -> Result<(), error::StoreError> {
        let span = span!(Level::INFO, "clear", context = "clear");
        let _e = span.enter();
        info!("called");

        self.gateway.delete_all_under_prefix(self.bucket(), "")
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Errors accumulated by imports over this session.
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// Count of failures that were logged and swallowed by the
    /// best-effort paths. Non-zero means the mirror may be degraded.
    pub fn suppressed_failures(&self) -> u64 {
        self.suppressed
    }

    fn suppress(&mut self, group: &'static str, err: error::StoreError) {
        warn!(error_message=%err, error_group=group, "suppressed");
        self.suppressed += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::mock::MockGateway;
    use crate::media::LocalMediaFiles;
    use std::fs;

    struct NoMedia;

    impl media::MediaFiles for NoMedia {
        fn media_base_dir(&self) -> &str {
            "/unused"
        }

        fn collect_file_info(
            &self,
            _base_dir: &str,
            filename: &str,
        ) -> Result<model::ManagedFile, error::StoreError> {
            Err(error::StoreError::NotFound(filename.to_string()))
        }
    }

    fn store(mock: &MockGateway) -> MediaStore {
        MediaStore::new(
            Box::new(mock.clone()),
            Box::new(NoMedia),
            config::StoreConfig::new("test-bucket", "us-east-1"),
        )
    }

    fn managed(directory: &str, filename: &str, content: &[u8]) -> model::ManagedFile {
        model::ManagedFile {
            directory: directory.to_string(),
            filename: filename.to_string(),
            content: Some(content.to_vec()),
        }
    }

    #[test]
    fn test_load_by_key() {
        let mock = MockGateway::new();
        mock.insert("catalog/a.jpg", b"jpeg");

        let store = store(&mock);

        let record = store.load_by_key("catalog/a.jpg").unwrap();
        assert_eq!(record.id, "catalog/a.jpg");
        assert_eq!(record.filename, "catalog/a.jpg");
        assert_eq!(record.content, b"jpeg");
    }

    #[test]
    fn test_load_by_key_missing() {
        let mock = MockGateway::new();
        let store = store(&mock);

        let err = store.load_by_key("missing").unwrap_err();
        assert!(err.is_not_found(), "expected NotFound, got: {}", err);
    }

    #[test]
    fn test_import_files_partial_failure() {
        let mock = MockGateway::new();
        mock.fail_put("x/bad.txt");

        let mut store = store(&mock);

        let files = vec![
            managed("x", "a.txt", b"one"),
            managed("x", "bad.txt", b"two"),
            managed("x", "z.txt", b"three"),
        ];

        let err = store.import_files(&files).unwrap_err();
        let batch = match err {
            error::StoreError::PartialBatch(batch) => batch,
            other => panic!("expected PartialBatch, got: {}", other),
        };

        assert_eq!(batch.len(), 1);
        assert!(batch[0].contains("x/bad.txt"), "unexpected: {}", batch[0]);

        // Every put was attempted, none skipped after the failure.
        assert_eq!(mock.recorded_puts().len(), 3);
        assert_eq!(mock.body("x/z.txt"), Some(b"three".to_vec()));

        assert!(store.has_errors());
        assert_eq!(store.errors().len(), 1);
    }

    #[test]
    fn test_import_files_build_failure_continues() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("x")).unwrap();
        fs::write(dir.path().join("x/a.txt"), b"alpha").unwrap();
        fs::write(dir.path().join("x/z.txt"), b"zeta").unwrap();

        let base = dir.path().to_str().unwrap();

        let mock = MockGateway::new();
        let mut config = config::StoreConfig::new("test-bucket", "us-east-1");
        config.gzip_enabled = true;

        let mut store = MediaStore::new(
            Box::new(mock.clone()),
            Box::new(LocalMediaFiles::new(base)),
            config,
        );

        // The gzip re-read of the middle file fails before any put; the
        // batch still pushes the other two.
        let files = vec![
            managed("x", "a.txt", b"alpha"),
            managed("x", "missing.txt", b"gone"),
            managed("x", "z.txt", b"zeta"),
        ];

        let err = store.import_files(&files).unwrap_err();
        let batch = match err {
            error::StoreError::PartialBatch(batch) => batch,
            other => panic!("expected PartialBatch, got: {}", other),
        };

        assert_eq!(batch.len(), 1);
        assert!(
            batch[0].contains("x/missing.txt"),
            "unexpected: {}",
            batch[0]
        );

        assert_eq!(mock.recorded_puts().len(), 2);
        assert!(mock.body("x/a.txt").is_some());
        assert!(mock.body("x/z.txt").is_some());
        assert_eq!(store.errors().len(), 1);
    }

    #[test]
    fn test_import_files_all_ok() {
        let mock = MockGateway::new();
        let mut store = store(&mock);

        let files = vec![managed("x", "y.txt", b"hi")];
        store.import_files(&files).unwrap();

        assert!(!store.has_errors());
        assert_eq!(mock.body("x/y.txt"), Some(b"hi".to_vec()));
    }

    #[test]
    fn test_export_files_pagination() {
        let mock = MockGateway::new();
        mock.insert("a.jpg", b"1");
        mock.insert("b.jpg", b"2");
        mock.insert("c.jpg", b"3");

        let mut store = store(&mock);

        let page = store.export_files(0, 2).unwrap().unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].filename, "a.jpg");
        assert_eq!(page[1].filename, "b.jpg");

        let page = store.export_files(2, 2).unwrap().unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].filename, "c.jpg");
        assert_eq!(page[0].content, Some(b"3".to_vec()));

        let done = store.export_files(4, 2).unwrap();
        assert!(done.is_none(), "expected end of export");
    }

    #[test]
    fn test_export_files_restart_resets_cursor() {
        let mock = MockGateway::new();
        mock.insert("a.jpg", b"1");
        mock.insert("b.jpg", b"2");

        let mut store = store(&mock);

        let page = store.export_files(0, 1).unwrap().unwrap();
        assert_eq!(page[0].filename, "a.jpg");

        let page = store.export_files(0, 1).unwrap().unwrap();
        assert_eq!(page[0].filename, "a.jpg", "offset 0 must restart the pass");
    }

    #[test]
    fn test_export_files_failed_fetch_keeps_cursor() {
        let mock = MockGateway::new();
        mock.insert("a.jpg", b"1");
        mock.insert("b.jpg", b"2");
        mock.insert("c.jpg", b"3");
        mock.fail_get_once("b.jpg");

        let mut store = store(&mock);

        let err = store.export_files(0, 2).unwrap_err();
        assert!(
            matches!(err, error::StoreError::Transport(_)),
            "expected Transport, got: {}",
            err
        );

        // Continuing the session must re-yield the failed page, not skip
        // past it.
        let mut exported = Vec::new();
        let mut offset = 2;
        while let Some(page) = store.export_files(offset, 2).unwrap() {
            offset += page.len();
            exported.extend(page.into_iter().map(|f| f.filename));
        }

        assert_eq!(exported, vec!["a.jpg", "b.jpg", "c.jpg"]);
    }

    #[test]
    fn test_export_files_skips_directory_keys() {
        let mock = MockGateway::new();
        mock.insert("catalog/", b"");
        mock.insert("catalog/a.jpg", b"jpeg");

        let mut store = store(&mock);

        let page = store.export_files(0, 10).unwrap().unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].directory, "catalog");
        assert_eq!(page[0].filename, "a.jpg");
    }

    #[test]
    fn test_save_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("catalog/images")).unwrap();
        fs::write(dir.path().join("catalog/images/a.jpg"), b"jpegbytes").unwrap();

        let base = dir.path().to_str().unwrap();

        let mock = MockGateway::new();
        let mut store = MediaStore::new(
            Box::new(mock.clone()),
            Box::new(LocalMediaFiles::new(base)),
            config::StoreConfig::new("test-bucket", "us-east-1"),
        );

        store.save_file("catalog/images/a.jpg");

        let puts = mock.recorded_puts();
        assert_eq!(puts.len(), 1);
        assert_eq!(puts[0].key, "catalog/images/a.jpg");
        assert_eq!(puts[0].content_type, "image/jpeg");
        assert_eq!(puts[0].content_encoding, None);
        assert_eq!(puts[0].acl, "public-read");
        assert_eq!(store.suppressed_failures(), 0);
    }

    #[test]
    fn test_save_file_missing_is_suppressed() {
        let mock = MockGateway::new();
        let mut store = store(&mock);

        store.save_file("not/there.png");

        assert_eq!(store.suppressed_failures(), 1);
        assert!(!store.has_errors(), "suppressed failures stay off the log");
        assert_eq!(mock.recorded_puts().len(), 0);
    }

    #[test]
    fn test_rename_file() {
        let mock = MockGateway::new();
        mock.insert("old/a.jpg", b"jpeg");

        let mut store = store(&mock);
        store.rename_file("old/a.jpg", "new/a.jpg");

        assert_eq!(mock.keys(), vec!["new/a.jpg".to_string()]);
        assert_eq!(store.suppressed_failures(), 0);
    }

    #[test]
    fn test_copy_file_missing_source_is_suppressed() {
        let mock = MockGateway::new();
        let mut store = store(&mock);

        store.copy_file("missing/a.jpg", "new/a.jpg");

        assert_eq!(store.suppressed_failures(), 1);
        assert!(!store.has_errors());
    }

    #[test]
    fn test_delete_file_missing_returns_normally() {
        let mock = MockGateway::new();
        let mut store = store(&mock);

        store.delete_file("not/there.jpg");

        assert_eq!(store.suppressed_failures(), 0);
        assert!(!store.has_errors());
    }

    #[test]
    fn test_file_exists() {
        let mock = MockGateway::new();
        mock.insert("catalog/a.jpg", b"jpeg");

        let store = store(&mock);

        assert!(store.file_exists("catalog/a.jpg").unwrap());
        assert!(!store.file_exists("catalog/b.jpg").unwrap());
    }

    #[test]
    fn test_storage_name() {
        let mock = MockGateway::new();
        let store = store(&mock);

        assert_eq!(store.storage_name(), "Amazon S3");
    }

    #[test]
    fn test_clear() {
        let mock = MockGateway::new();
        mock.insert("a.jpg", b"1");
        mock.insert("catalog/b.jpg", b"2");

        let mut store = store(&mock);
        store.clear().unwrap();

        assert!(mock.keys().is_empty());
    }
}
