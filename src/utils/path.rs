//! File system path to filename string helper.

use std::path::Path;

/// The error type for the path lookup helper.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The path has no final component.
    #[error("Path {0} doesn't point to a file or a directory")]
    NoFileName(Box<Path>),
    /// The path is not valid Unicode.
    #[error("Failed to convert a file path to a string, because it's not a valid Unicode string")]
    OsStrInvalidUnicode,
}

type Result<T> = std::result::Result<T, Error>;

/// Extract the final component of a path as a [`String`]. MIX entries are
/// always addressed by bare filename, whatever directory they came from.
pub fn path_to_filename(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    path.file_name()
        .ok_or_else(|| Error::NoFileName(path.into()))?
        .to_str()
        .ok_or(Error::OsStrInvalidUnicode)
        .map(|s| s.to_string())
}
