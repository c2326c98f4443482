//! Store file header.
//!
//! Every store file starts with a [`StoreHeader`] containing:
//! - Magic bytes and format version
//! - Record size and metadata block size (layout guards)
//! - Capacity and number of records in use
//! - CRC32 checksum of the whole header region

use crate::common::config::{FIXED_HEADER_SIZE, FORMAT_VERSION, HEADER_SIZE, MAGIC};
use crate::common::{Error, Result};

/// Fixed fields stored at the beginning of every store file.
///
/// # Layout (128 bytes)
/// ```text
/// Offset  Size  Field
/// ------  ----  -----
/// 0       8     magic
/// 8       4     version (little-endian)
/// 12      4     metadata_len (little-endian)
/// 16      8     record_size (little-endian)
/// 24      8     capacity (little-endian)
/// 32      8     len (little-endian)
/// 40      84    metadata block (owned by the array's user)
/// 124     4     checksum (CRC32 of bytes 0..124, little-endian)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreHeader {
    /// Format version.
    pub version: u32,
    /// Encoded size of the metadata block.
    pub metadata_len: u32,
    /// Encoded size of each record.
    pub record_size: u64,
    /// Number of record slots the file has room for.
    pub capacity: u64,
    /// Number of record slots in use.
    pub len: u64,
}

impl StoreHeader {
    /// Offset of each field within the header.
    pub const OFFSET_MAGIC: usize = 0;
    pub const OFFSET_VERSION: usize = 8;
    pub const OFFSET_METADATA_LEN: usize = 12;
    pub const OFFSET_RECORD_SIZE: usize = 16;
    pub const OFFSET_CAPACITY: usize = 24;
    pub const OFFSET_LEN: usize = 32;
    pub const OFFSET_METADATA: usize = FIXED_HEADER_SIZE;
    pub const OFFSET_CHECKSUM: usize = HEADER_SIZE - 4;

    /// Create a header for the current format version.
    pub fn new(record_size: u64, metadata_len: u32, capacity: u64, len: u64) -> Self {
        Self {
            version: FORMAT_VERSION,
            metadata_len,
            record_size,
            capacity,
            len,
        }
    }

    /// Read the fixed fields from a header region.
    ///
    /// Checks the magic bytes and the checksum, but not the version or sizes;
    /// those are compared against the opener's expectations by the caller.
    ///
    /// # Panics
    /// Panics if `data.len() < HEADER_SIZE`.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        assert!(data.len() >= HEADER_SIZE, "buffer too small for StoreHeader");

        if data[Self::OFFSET_MAGIC..Self::OFFSET_MAGIC + 8] != MAGIC {
            return Err(Error::BadMagic);
        }
        if !Self::verify_checksum(data) {
            return Err(Error::HeaderChecksumMismatch);
        }

        Ok(Self {
            version: read_u32(data, Self::OFFSET_VERSION),
            metadata_len: read_u32(data, Self::OFFSET_METADATA_LEN),
            record_size: read_u64(data, Self::OFFSET_RECORD_SIZE),
            capacity: read_u64(data, Self::OFFSET_CAPACITY),
            len: read_u64(data, Self::OFFSET_LEN),
        })
    }

    /// Write magic and fixed fields to the beginning of a header region.
    ///
    /// The metadata block and checksum are left alone; call [`seal`](Self::seal)
    /// once the metadata block is in place too.
    ///
    /// # Panics
    /// Panics if `data.len() < HEADER_SIZE`.
    pub fn write_to(&self, data: &mut [u8]) {
        assert!(data.len() >= HEADER_SIZE, "buffer too small for StoreHeader");

        data[Self::OFFSET_MAGIC..Self::OFFSET_MAGIC + 8].copy_from_slice(&MAGIC);
        data[Self::OFFSET_VERSION..Self::OFFSET_VERSION + 4]
            .copy_from_slice(&self.version.to_le_bytes());
        data[Self::OFFSET_METADATA_LEN..Self::OFFSET_METADATA_LEN + 4]
            .copy_from_slice(&self.metadata_len.to_le_bytes());
        data[Self::OFFSET_RECORD_SIZE..Self::OFFSET_RECORD_SIZE + 8]
            .copy_from_slice(&self.record_size.to_le_bytes());
        data[Self::OFFSET_CAPACITY..Self::OFFSET_CAPACITY + 8]
            .copy_from_slice(&self.capacity.to_le_bytes());
        data[Self::OFFSET_LEN..Self::OFFSET_LEN + 8].copy_from_slice(&self.len.to_le_bytes());
    }

    /// Compute CRC32 checksum of a header region.
    ///
    /// The checksum covers every byte before the checksum field.
    pub fn compute_checksum(data: &[u8]) -> u32 {
        let mut hasher = crc32fast::Hasher::new();
        hasher.update(&data[..Self::OFFSET_CHECKSUM]);
        hasher.finalize()
    }

    /// Compute the checksum and store it in the header region.
    pub fn seal(data: &mut [u8]) {
        let checksum = Self::compute_checksum(data);
        data[Self::OFFSET_CHECKSUM..Self::OFFSET_CHECKSUM + 4]
            .copy_from_slice(&checksum.to_le_bytes());
    }

    /// Verify the stored checksum matches the header contents.
    pub fn verify_checksum(data: &[u8]) -> bool {
        read_u32(data, Self::OFFSET_CHECKSUM) == Self::compute_checksum(data)
    }
}

fn read_u32(data: &[u8], offset: usize) -> u32 {
    let mut bytes = [0u8; 4];
    bytes.copy_from_slice(&data[offset..offset + 4]);
    u32::from_le_bytes(bytes)
}

fn read_u64(data: &[u8], offset: usize) -> u64 {
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&data[offset..offset + 8]);
    u64::from_le_bytes(bytes)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sealed(header: &StoreHeader) -> [u8; HEADER_SIZE] {
        let mut buffer = [0u8; HEADER_SIZE];
        header.write_to(&mut buffer);
        StoreHeader::seal(&mut buffer);
        buffer
    }

    #[test]
    fn test_header_roundtrip() {
        let original = StoreHeader::new(77, 8, 1024, 513);
        let buffer = sealed(&original);

        let recovered = StoreHeader::from_bytes(&buffer).unwrap();
        assert_eq!(original, recovered);
        assert_eq!(recovered.version, FORMAT_VERSION);
    }

    #[test]
    fn test_header_byte_layout() {
        let header = StoreHeader {
            version: 0x04030201,
            metadata_len: 8,
            record_size: 0x10,
            capacity: 0x0807060504030201,
            len: 3,
        };
        let buffer = sealed(&header);

        assert_eq!(&buffer[..8], &MAGIC);
        assert_eq!(buffer[8], 0x01); // version byte 0 (LSB)
        assert_eq!(buffer[11], 0x04); // version byte 3 (MSB)
        assert_eq!(buffer[12], 8);
        assert_eq!(buffer[16], 0x10);
        assert_eq!(buffer[24], 0x01); // capacity byte 0 (LSB)
        assert_eq!(buffer[31], 0x08); // capacity byte 7 (MSB)
        assert_eq!(buffer[32], 3);
    }

    #[test]
    fn test_bad_magic_rejected() {
        let mut buffer = sealed(&StoreHeader::new(16, 0, 4, 0));
        buffer[0] = b'X';
        StoreHeader::seal(&mut buffer);

        assert!(matches!(StoreHeader::from_bytes(&buffer), Err(Error::BadMagic)));
    }

    #[test]
    fn test_checksum_covers_metadata_block() {
        let mut buffer = sealed(&StoreHeader::new(16, 8, 4, 0));
        assert!(StoreHeader::verify_checksum(&buffer));

        buffer[StoreHeader::OFFSET_METADATA] ^= 0xFF;
        assert!(!StoreHeader::verify_checksum(&buffer));
        assert!(matches!(
            StoreHeader::from_bytes(&buffer),
            Err(Error::HeaderChecksumMismatch)
        ));
    }

    #[test]
    fn test_checksum_deterministic() {
        let a = sealed(&StoreHeader::new(32, 8, 64, 10));
        let b = sealed(&StoreHeader::new(32, 8, 64, 10));
        assert_eq!(a, b);

        let c = sealed(&StoreHeader::new(32, 8, 64, 11));
        assert_ne!(
            StoreHeader::compute_checksum(&a),
            StoreHeader::compute_checksum(&c)
        );
    }
}
