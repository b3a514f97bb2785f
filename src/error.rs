use thiserror::Error;

pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors surfaced by the media store.
///
/// Best-effort mirror operations (save/copy/rename/delete of single files)
/// never return these; they log and count the failure instead.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage transport error: {0}")]
    Transport(String),

    #[error("object not found: {0}")]
    NotFound(String),

    #[error("gzip produced no output for: {0}")]
    Compression(String),

    #[error("{} file(s) failed to import", .0.len())]
    PartialBatch(Vec<String>),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}
