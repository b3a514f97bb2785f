//! Directory emulation over the flat key space.
//!
//! The bucket stores no directory entities; a "directory" is the set of
//! keys sharing a prefix, listed one level at a time with the `/`
//! delimiter.

use tracing::{info, span, Level};

use crate::{error, model, sync::MediaStore, util};

impl MediaStore {
    /// Immediate child directories under a local media path, derived from
    /// the listing's common prefixes. One level deep, non-recursive.
    pub fn get_subdirectories(
        &self,
        path: &str,
    ) -> Result<Vec<model::Subdirectory>, error::StoreError> {
        let span = span!(Level::INFO, "get_subdirectories", context = "get_subdirectories");
        let _e = span.enter();
        info!(path = path, "called");

        let prefix = self.media_prefix(path);

        let listing = self
            .gateway()
            .list(self.bucket(), Some(&prefix), Some("/"), None, 1000)?;

        let subdirectories = listing
            .common_prefixes
            .into_iter()
            .map(|name| model::Subdirectory { name })
            .collect();

        Ok(subdirectories)
    }

    /// Files directly under a local media path, bodies fetched eagerly.
    ///
    /// The prefix marker itself and any directory placeholder key are
    /// never returned as file content. One fetch per entry; large
    /// directories are a known scaling limit.
    pub fn get_directory_files(
        &self,
        path: &str,
    ) -> Result<Vec<model::ManagedFile>, error::StoreError> {
        let span = span!(Level::INFO, "get_directory_files", context = "get_directory_files");
        let _e = span.enter();
        info!(path = path, "called");

        let prefix = self.media_prefix(path);

        let listing = self
            .gateway()
            .list(self.bucket(), Some(&prefix), Some("/"), None, 1000)?;

        let mut files = Vec::new();
        for key in &listing.entries {
            if key == &prefix || key.ends_with('/') {
                continue;
            }

            let content = match self.gateway().get(self.bucket(), key)? {
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

        Ok(files)
    }

    /// Deletes every object under a local media path. Not atomic: the
    /// gateway's batch delete can fail part-way, and that failure
    /// propagates.
    pub fn delete_directory(&self, path: &str) -> Result<(), error::StoreError> {
        let span = span!(Level::INFO, "delete_directory", context = "delete_directory");
        let _e = span.enter();
        info!(path = path, "called");

        let prefix = self.media_prefix(path);

        self.gateway().delete_all_under_prefix(self.bucket(), &prefix)
    }

    fn media_prefix(&self, path: &str) -> String {
        let relative = util::path::media_relative(self.media_base_dir(), path);

        util::path::to_prefix(relative)
    }
}

#[cfg(test)]
mod tests {
    use crate::config::StoreConfig;
    use crate::gateway::mock::MockGateway;
    use crate::media::LocalMediaFiles;
    use crate::sync::MediaStore;

    fn store(mock: &MockGateway) -> MediaStore {
        MediaStore::new(
            Box::new(mock.clone()),
            Box::new(LocalMediaFiles::new("/media")),
            StoreConfig::new("test-bucket", "us-east-1"),
        )
    }

    #[test]
    fn test_get_subdirectories() {
        let mock = MockGateway::new();
        mock.insert("catalog/a/1.jpg", b"1");
        mock.insert("catalog/b/2.jpg", b"2");

        let store = store(&mock);

        let subdirectories = store.get_subdirectories("/media/catalog").unwrap();
        let names: Vec<&str> = subdirectories.iter().map(|s| s.name.as_str()).collect();

        assert_eq!(names, vec!["catalog/a/", "catalog/b/"]);
    }

    #[test]
    fn test_get_subdirectories_empty() {
        let mock = MockGateway::new();
        mock.insert("catalog/1.jpg", b"1");

        let store = store(&mock);

        let subdirectories = store.get_subdirectories("/media/catalog").unwrap();
        assert!(subdirectories.is_empty(), "leaf files are not directories");
    }

    #[test]
    fn test_get_directory_files() {
        let mock = MockGateway::new();
        mock.insert("catalog/", b"");
        mock.insert("catalog/a.jpg", b"jpeg");
        mock.insert("catalog/sub/b.jpg", b"nested");

        let store = store(&mock);

        let files = store.get_directory_files("/media/catalog").unwrap();

        assert_eq!(files.len(), 1, "placeholder and nested keys excluded");
        assert_eq!(files[0].directory, "catalog");
        assert_eq!(files[0].filename, "a.jpg");
        assert_eq!(files[0].content, Some(b"jpeg".to_vec()));
    }

    #[test]
    fn test_get_directory_files_root() {
        let mock = MockGateway::new();
        mock.insert("root.jpg", b"1");
        mock.insert("catalog/a.jpg", b"2");

        let store = store(&mock);

        let files = store.get_directory_files("/media").unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].filename, "root.jpg");
    }

    #[test]
    fn test_delete_directory() {
        let mock = MockGateway::new();
        mock.insert("catalog/a.jpg", b"1");
        mock.insert("catalog/sub/b.jpg", b"2");
        mock.insert("other/c.jpg", b"3");

        let store = store(&mock);
        store.delete_directory("/media/catalog").unwrap();

        assert_eq!(mock.keys(), vec!["other/c.jpg".to_string()]);
    }
}
