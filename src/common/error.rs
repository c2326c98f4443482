//! Error types for persistree.

use thiserror::Error;

/// Convenient Result type alias.
///
/// Instead of writing `Result<T, Error>` everywhere, we can write `Result<T>`.
pub type Result<T> = std::result::Result<T, Error>;

/// All possible errors in persistree.
///
/// A duplicate key is not an error: `BTree::insert` reports it as `Ok(false)`.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error from creating, opening, mapping, syncing or growing the file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The file does not start with the store magic bytes.
    #[error("not a persistree store file (bad magic)")]
    BadMagic,

    /// The file was written by an unknown format version.
    #[error("unsupported store format version {0}")]
    UnsupportedVersion(u32),

    /// The file holds records of a different size than the opener expects.
    ///
    /// Usually means the key, value or fanout type changed between runs.
    #[error("record size mismatch: expected {expected} bytes, file has {found}")]
    RecordSizeMismatch { expected: u64, found: u64 },

    /// The file's metadata block has a different size than the opener expects.
    #[error("metadata size mismatch: expected {expected} bytes, file has {found}")]
    MetadataSizeMismatch { expected: u32, found: u32 },

    /// The header CRC32 does not match its contents.
    #[error("store header checksum mismatch")]
    HeaderChecksumMismatch,

    /// The file is shorter than its header says it should be.
    #[error("store file too small: expected at least {expected} bytes, found {actual}")]
    FileTooSmall { expected: u64, actual: u64 },

    /// The metadata type does not fit in the header.
    #[error("metadata of {size} bytes exceeds the {max} byte header block")]
    MetadataTooLarge { size: usize, max: usize },

    /// A store cannot be created with zero capacity.
    #[error("initial capacity must be greater than zero")]
    InvalidCapacity,

    /// Growing the store would overflow the addressable file size.
    #[error("store capacity overflow")]
    CapacityOverflow,

    /// The store is full and may not grow past its configured limit.
    #[error("store is full: capacity limit of {limit} records reached")]
    CapacityLimit { limit: u64 },

    /// The tree fanout is too small to split.
    #[error("fanout {0} is too small, must be at least 2")]
    InvalidFanout(usize),

    /// Record index past the end of the store.
    #[error("record index {index} out of bounds (len {len})")]
    IndexOutOfBounds { index: u64, len: u64 },

    /// A structural check found the tree in an inconsistent state.
    #[error("tree corrupted: {0}")]
    Corrupted(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::IndexOutOfBounds { index: 7, len: 3 };
        assert_eq!(format!("{}", err), "record index 7 out of bounds (len 3)");

        let err = Error::InvalidFanout(1);
        assert_eq!(format!("{}", err), "fanout 1 is too small, must be at least 2");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();

        match err {
            Error::Io(_) => {} // Success
            _ => panic!("Expected Io error"),
        }
    }

    #[test]
    fn test_io_error_source() {
        use std::error::Error as _;

        let io_err = std::io::Error::new(std::io::ErrorKind::Other, "disk gone");
        let err = Error::from(io_err);
        assert!(err.source().is_some());
        assert!(Error::BadMagic.source().is_none());
    }
}
