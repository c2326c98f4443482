//! Configuration constants and store options for persistree.

/// Size of the persisted store header in bytes.
///
/// Records start immediately after the header, at offset `HEADER_SIZE`.
pub const HEADER_SIZE: usize = 128;

/// Magic bytes at offset 0 of every store file.
pub const MAGIC: [u8; 8] = *b"PSTREE\0\x01";

/// On-disk format version written into new store files.
pub const FORMAT_VERSION: u32 = 1;

/// Bytes of the header taken by fixed fields (magic through len).
pub const FIXED_HEADER_SIZE: usize = 40;

/// Largest metadata block that fits between the fixed fields and the checksum.
pub const MAX_METADATA_SIZE: usize = HEADER_SIZE - FIXED_HEADER_SIZE - 4;

/// Number of records a freshly created store has room for.
pub const DEFAULT_INITIAL_CAPACITY: u64 = 16;

/// Capacity multiplier applied every time the store runs out of room.
pub const GROWTH_FACTOR: u64 = 2;

/// Fanout used when a tree type does not name one.
pub const DEFAULT_FANOUT: usize = 64;

/// When written records are forced out to the backing file.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    /// `msync` every record and header write as it happens.
    ///
    /// A split's new sibling is on disk before anything links to it, even
    /// across an OS crash. Slow.
    Always,
    /// Rely on the shared mapping; sync on `flush()`, growth and drop.
    ///
    /// Writes survive a process crash but not necessarily a power loss.
    #[default]
    OnFlush,
}

/// Options for creating or opening a store file.
///
/// # Example
/// ```
/// use persistree::common::config::{StoreOptions, SyncMode};
///
/// let options = StoreOptions {
///     initial_capacity: 1024,
///     ..StoreOptions::default()
/// };
/// assert_eq!(options.sync_mode, SyncMode::OnFlush);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreOptions {
    /// Record capacity of a newly created file. Ignored when opening.
    pub initial_capacity: u64,
    /// Capacity the store never grows past. `None` means unbounded.
    ///
    /// Appends beyond it fail with `Error::CapacityLimit`.
    pub max_capacity: Option<u64>,
    /// Write-back policy.
    pub sync_mode: SyncMode,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            initial_capacity: DEFAULT_INITIAL_CAPACITY,
            max_capacity: None,
            sync_mode: SyncMode::default(),
        }
    }
}
