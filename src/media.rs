use std::{fs, path::Path};

use crate::{error, model, util};

/// Local-filesystem collaborator. The CMS side owns traversal; the store
/// only needs single-file info and the media base directory.
pub trait MediaFiles {
    fn media_base_dir(&self) -> &str;

    fn collect_file_info(
        &self,
        base_dir: &str,
        filename: &str,
    ) -> Result<model::ManagedFile, error::StoreError>;
}

/// Default collaborator backed by the local media directory.
pub struct LocalMediaFiles {
    base_dir: String,
}

impl LocalMediaFiles {
    pub fn new(base_dir: &str) -> Self {
        Self {
            base_dir: base_dir.to_string(),
        }
    }
}

impl MediaFiles for LocalMediaFiles {
    fn media_base_dir(&self) -> &str {
        &self.base_dir
    }

    fn collect_file_info(
        &self,
        base_dir: &str,
        filename: &str,
    ) -> Result<model::ManagedFile, error::StoreError> {
        let relative = util::path::media_relative(base_dir, filename);
        let (directory, name) = util::path::split_key(relative);

        let content = fs::read(Path::new(base_dir).join(relative))?;

        Ok(model::ManagedFile {
            directory: directory.to_string(),
            filename: name.to_string(),
            content: Some(content),
        })
    }
}
