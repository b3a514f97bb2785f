/// Joins a directory and filename into an object key.
///
/// Keys always use forward slashes. An empty directory yields the bare
/// filename, never a leading slash. Embedded `..` is not normalized here;
/// the local filesystem layer owns that.
pub fn object_key(directory: &str, filename: &str) -> String {
    if directory.is_empty() {
        return filename.to_string();
    }

    format!("{}/{}", directory, filename)
}

/// Splits a key into its directory and filename components.
pub fn split_key(key: &str) -> (&str, &str) {
    match key.rsplit_once('/') {
        Some((directory, filename)) => (directory, filename),
        None => ("", key),
    }
}

/// Normalizes a relative directory path into a listing prefix: no leading
/// slash, exactly one trailing slash. Idempotent. The empty (root) path
/// maps to the empty prefix, which lists the whole bucket.
pub fn to_prefix(path: &str) -> String {
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() {
        return String::new();
    }

    format!("{}/", trimmed)
}

/// Strips the media base directory from a local path, leaving the part
/// that maps into the bucket. Paths outside the base are used as given.
pub fn media_relative<'a>(base_dir: &str, path: &'a str) -> &'a str {
    let stripped = path.strip_prefix(base_dir).unwrap_or(path);

    stripped.trim_start_matches('/')
}
