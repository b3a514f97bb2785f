/// One unit of sync between the local media tree and the bucket.
///
/// `directory` joined with `filename` by `/` forms the object key. An empty
/// `directory` puts the file at the bucket root.
#[derive(Clone, Debug, PartialEq)]
pub struct ManagedFile {
    pub directory: String,
    pub filename: String,
    pub content: Option<Vec<u8>>,
}

/// A fetched remote object. `id` and `filename` are both the object key.
#[derive(Clone, Debug, PartialEq)]
pub struct ObjectRecord {
    pub id: String,
    pub filename: String,
    pub content: Vec<u8>,
}

/// Everything a put needs, built immediately before the call and dropped
/// after it.
#[derive(Clone, Debug, PartialEq)]
pub struct UploadPayload {
    pub key: String,
    pub body: Vec<u8>,
    pub content_type: String,
    pub content_encoding: Option<String>,
    pub cache_control: Option<String>,
    pub acl: String,
}

/// One page of a prefix/delimiter listing. `entries` are object keys in
/// lexicographic order; `common_prefixes` are the one-level "directories"
/// rolled up under the delimiter.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Listing {
    pub entries: Vec<String>,
    pub common_prefixes: Vec<String>,
}

/// An emulated child directory, named by its full key prefix.
#[derive(Clone, Debug, PartialEq)]
pub struct Subdirectory {
    pub name: String,
}
