//! Growable memory-mapped array of fixed-size records.
//!
//! The [`MmapArray`] handles all direct file operations:
//! - Creating and validating the store file
//! - Reading and writing records by index
//! - Appending records, growing and remapping the file when full
//! - Persisting a small metadata block next to the header

use std::fs::{File, OpenOptions};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use memmap2::MmapMut;
use tracing::{debug, info, warn};

use crate::common::config::{
    StoreOptions, SyncMode, FORMAT_VERSION, GROWTH_FACTOR, HEADER_SIZE, MAX_METADATA_SIZE,
};
use crate::common::{Error, Result};
use crate::storage::header::StoreHeader;
use crate::storage::record::Record;

/// A persistent, growable array of `T` records plus one `M` metadata block.
///
/// # File Layout
/// ```text
/// ┌──────────┬───────────┬───────────┬─────────┬─────────────────────┐
/// │  Header  │ Record 0  │ Record 1  │   ...   │ Record capacity-1   │
/// │ (128 B)  │ (T bytes) │ (T bytes) │         │ (T bytes)           │
/// └──────────┴───────────┴───────────┴─────────┴─────────────────────┘
/// ```
///
/// Record `i` is located at file offset `HEADER_SIZE + i × T::ENCODED_SIZE`.
///
/// # Remapping
/// [`push`](Self::push) may grow the file and replace the mapping. The array
/// never hands out references into the mapping: [`get`](Self::get) decodes an
/// owned copy and [`set`](Self::set) encodes one back, so nothing can dangle.
///
/// # Thread Safety
/// `MmapArray` is **single-threaded**. Callers serialize access.
pub struct MmapArray<T, M> {
    file: File,
    mmap: MmapMut,
    path: PathBuf,
    /// Number of record slots in the file.
    capacity: u64,
    /// Number of record slots in use.
    len: u64,
    /// Capacity growth may not exceed.
    max_capacity: Option<u64>,
    metadata: M,
    sync_mode: SyncMode,
    _record: PhantomData<T>,
}

impl<T: Record, M: Record + Default> MmapArray<T, M> {
    /// Open a store file, or create it if it doesn't exist.
    ///
    /// # Errors
    /// Returns an error if the file cannot be created, opened or mapped, or
    /// if an existing file's header does not match `T` and `M`.
    pub fn open<P: AsRef<Path>>(path: P, options: &StoreOptions) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::open_existing(path, options)
        } else {
            Self::create(path, options)
        }
    }

    /// Create a new store file.
    ///
    /// # Errors
    /// Returns an error if the file already exists or cannot be created.
    pub fn create<P: AsRef<Path>>(path: P, options: &StoreOptions) -> Result<Self> {
        let path = path.as_ref();
        Self::check_metadata_size()?;
        if options.initial_capacity == 0
            || options
                .max_capacity
                .is_some_and(|max| max < options.initial_capacity)
        {
            return Err(Error::InvalidCapacity);
        }

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(path)?;
        file.set_len(Self::file_len(options.initial_capacity)?)?;

        let mut array = Self {
            mmap: Self::map(&file)?,
            file,
            path: path.to_path_buf(),
            capacity: options.initial_capacity,
            len: 0,
            max_capacity: options.max_capacity,
            metadata: M::default(),
            sync_mode: options.sync_mode,
            _record: PhantomData,
        };
        array.write_header()?;
        array.mmap.flush()?;

        info!(
            path = %array.path.display(),
            record_size = T::ENCODED_SIZE,
            capacity = array.capacity,
            "created store"
        );
        Ok(array)
    }

    /// Open an existing store file.
    ///
    /// # Errors
    /// Returns an error if the file doesn't exist, cannot be mapped, or its
    /// header is invalid for this record and metadata type.
    pub fn open_existing<P: AsRef<Path>>(path: P, options: &StoreOptions) -> Result<Self> {
        let path = path.as_ref();
        Self::check_metadata_size()?;

        let file = OpenOptions::new().read(true).write(true).open(path)?;
        let actual = file.metadata()?.len();
        if actual < HEADER_SIZE as u64 {
            return Err(Error::FileTooSmall {
                expected: HEADER_SIZE as u64,
                actual,
            });
        }

        let mmap = Self::map(&file)?;
        let header = StoreHeader::from_bytes(&mmap[..HEADER_SIZE])?;

        if header.version != FORMAT_VERSION {
            return Err(Error::UnsupportedVersion(header.version));
        }
        if header.record_size != T::ENCODED_SIZE as u64 {
            return Err(Error::RecordSizeMismatch {
                expected: T::ENCODED_SIZE as u64,
                found: header.record_size,
            });
        }
        if header.metadata_len != M::ENCODED_SIZE as u32 {
            return Err(Error::MetadataSizeMismatch {
                expected: M::ENCODED_SIZE as u32,
                found: header.metadata_len,
            });
        }
        // A crash between set_len and the header rewrite during growth leaves
        // the file longer than the header says; that is fine.
        let expected = Self::file_len(header.capacity)?;
        if actual < expected || header.len > header.capacity {
            return Err(Error::FileTooSmall { expected, actual });
        }

        let metadata_bytes = &mmap[StoreHeader::OFFSET_METADATA..StoreHeader::OFFSET_CHECKSUM];
        M::validate(metadata_bytes)?;
        let metadata = M::decode_from(metadata_bytes);

        info!(
            path = %path.display(),
            len = header.len,
            capacity = header.capacity,
            "opened store"
        );
        Ok(Self {
            file,
            mmap,
            path: path.to_path_buf(),
            capacity: header.capacity,
            len: header.len,
            max_capacity: options.max_capacity,
            metadata,
            sync_mode: options.sync_mode,
            _record: PhantomData,
        })
    }

    // ========================================================================
    // Record access
    // ========================================================================

    /// Read record `index`.
    ///
    /// # Errors
    /// - `Error::IndexOutOfBounds` if `index >= len()`
    /// - whatever `T::validate` reports for the stored bytes
    pub fn get(&self, index: u64) -> Result<T> {
        let offset = self.offset_of(index)?;
        let bytes = &self.mmap[offset..offset + T::ENCODED_SIZE];
        T::validate(bytes)?;
        Ok(T::decode_from(bytes))
    }

    /// Overwrite record `index`.
    ///
    /// # Errors
    /// Returns `Error::IndexOutOfBounds` if `index >= len()`.
    pub fn set(&mut self, index: u64, record: &T) -> Result<()> {
        let offset = self.offset_of(index)?;
        self.write_record(offset, record)
    }

    /// Append a record, growing the file if it is full.
    ///
    /// Returns the index of the new record. The record bytes are written
    /// before `len` is bumped in the header.
    ///
    /// # Errors
    /// - `Error::CapacityLimit` if the store is full and may not grow
    /// - I/O errors if the file cannot be grown or remapped
    ///
    /// On error nothing is written and `len` is unchanged.
    pub fn push(&mut self, record: &T) -> Result<u64> {
        if self.len == self.capacity {
            self.grow()?;
        }

        let index = self.len;
        let offset = HEADER_SIZE + (index as usize) * T::ENCODED_SIZE;
        self.write_record(offset, record)?;

        self.len += 1;
        self.write_header()?;
        Ok(index)
    }

    // ========================================================================
    // Metadata block
    // ========================================================================

    /// The metadata block persisted alongside the header.
    #[inline]
    pub fn metadata(&self) -> &M {
        &self.metadata
    }

    /// Replace and persist the metadata block.
    pub fn set_metadata(&mut self, metadata: M) -> Result<()> {
        self.metadata = metadata;
        self.write_header()
    }

    // ========================================================================
    // Sizes and durability
    // ========================================================================

    /// Number of records in use.
    #[inline]
    pub fn len(&self) -> u64 {
        self.len
    }

    /// Check if no records are in use.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of records the file has room for before it must grow.
    #[inline]
    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    /// Path of the backing file.
    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sync every dirty page of the mapping to disk.
    pub fn flush(&self) -> Result<()> {
        self.mmap.flush()?;
        Ok(())
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn check_metadata_size() -> Result<()> {
        if M::ENCODED_SIZE > MAX_METADATA_SIZE {
            return Err(Error::MetadataTooLarge {
                size: M::ENCODED_SIZE,
                max: MAX_METADATA_SIZE,
            });
        }
        Ok(())
    }

    fn file_len(capacity: u64) -> Result<u64> {
        capacity
            .checked_mul(T::ENCODED_SIZE as u64)
            .and_then(|bytes| bytes.checked_add(HEADER_SIZE as u64))
            .filter(|&bytes| usize::try_from(bytes).is_ok())
            .ok_or(Error::CapacityOverflow)
    }

    #[allow(unsafe_code)]
    fn map(file: &File) -> Result<MmapMut> {
        // SAFETY: the file is opened read-write by this process only; the
        // single-writer contract means nobody truncates it underneath us.
        let mmap = unsafe { MmapMut::map_mut(file)? };
        Ok(mmap)
    }

    fn offset_of(&self, index: u64) -> Result<usize> {
        if index >= self.len {
            return Err(Error::IndexOutOfBounds {
                index,
                len: self.len,
            });
        }
        Ok(HEADER_SIZE + (index as usize) * T::ENCODED_SIZE)
    }

    fn write_record(&mut self, offset: usize, record: &T) -> Result<()> {
        record.encode_to(&mut self.mmap[offset..offset + T::ENCODED_SIZE]);
        if self.sync_mode == SyncMode::Always {
            self.mmap.flush_range(offset, T::ENCODED_SIZE)?;
        }
        Ok(())
    }

    fn write_header(&mut self) -> Result<()> {
        let header = StoreHeader::new(
            T::ENCODED_SIZE as u64,
            M::ENCODED_SIZE as u32,
            self.capacity,
            self.len,
        );

        let region = &mut self.mmap[..HEADER_SIZE];
        header.write_to(region);
        region[StoreHeader::OFFSET_METADATA..StoreHeader::OFFSET_CHECKSUM].fill(0);
        self.metadata
            .encode_to(&mut region[StoreHeader::OFFSET_METADATA..]);
        StoreHeader::seal(region);

        if self.sync_mode == SyncMode::Always {
            self.mmap.flush_range(0, HEADER_SIZE)?;
        }
        Ok(())
    }

    /// Multiply capacity by `GROWTH_FACTOR`, extend the file and remap it.
    ///
    /// Growth stops at `max_capacity` when one is set.
    fn grow(&mut self) -> Result<()> {
        let mut new_capacity = self
            .capacity
            .checked_mul(GROWTH_FACTOR)
            .ok_or(Error::CapacityOverflow)?;
        if let Some(limit) = self.max_capacity {
            if self.capacity >= limit {
                return Err(Error::CapacityLimit { limit });
            }
            new_capacity = new_capacity.min(limit);
        }
        let new_len = Self::file_len(new_capacity)?;

        self.mmap.flush()?;
        self.file.set_len(new_len)?;
        self.mmap = Self::map(&self.file)?;
        self.capacity = new_capacity;
        self.write_header()?;

        debug!(
            path = %self.path.display(),
            capacity = new_capacity,
            bytes = new_len,
            "grew store"
        );
        Ok(())
    }
}

impl<T, M> Drop for MmapArray<T, M> {
    fn drop(&mut self) {
        if let Err(e) = self.mmap.flush() {
            warn!(path = %self.path.display(), error = %e, "failed to flush store on drop");
        }
    }
}
