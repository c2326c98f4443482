//! Fixed-size record encoding.
//!
//! Everything persisted in a store file (keys, values, nodes, the metadata
//! block) is a [`Record`]: a type with a constant encoded size that writes
//! itself as little-endian bytes. Variable-length types cannot implement it,
//! which is what keeps every node record the same size.

use crate::common::{NodeId, Result};

/// A value with a fixed-size byte encoding.
///
/// `encode_to` and `decode_from` are given slices of at least
/// `ENCODED_SIZE` bytes; only the first `ENCODED_SIZE` bytes are touched.
///
/// # Example
/// ```
/// use persistree::storage::Record;
///
/// let mut buf = [0u8; 4];
/// 0xDEADBEEFu32.encode_to(&mut buf);
/// assert_eq!(buf, [0xEF, 0xBE, 0xAD, 0xDE]);
/// assert_eq!(u32::decode_from(&buf), 0xDEADBEEF);
/// ```
pub trait Record: Sized {
    /// Number of bytes the encoding occupies.
    const ENCODED_SIZE: usize;

    /// Write the encoding into `buf[..ENCODED_SIZE]`.
    fn encode_to(&self, buf: &mut [u8]);

    /// Read a value back from `buf[..ENCODED_SIZE]`.
    fn decode_from(buf: &[u8]) -> Self;

    /// Reject bytes that no value of this type encodes to.
    ///
    /// Stores call this before `decode_from` on anything read back from a
    /// file. Types whose every bit pattern is valid keep the default.
    fn validate(_buf: &[u8]) -> Result<()> {
        Ok(())
    }
}

macro_rules! impl_record_le {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Record for $ty {
                const ENCODED_SIZE: usize = std::mem::size_of::<$ty>();

                #[inline]
                fn encode_to(&self, buf: &mut [u8]) {
                    buf[..Self::ENCODED_SIZE].copy_from_slice(&self.to_le_bytes());
                }

                #[inline]
                fn decode_from(buf: &[u8]) -> Self {
                    let mut bytes = [0u8; std::mem::size_of::<$ty>()];
                    bytes.copy_from_slice(&buf[..Self::ENCODED_SIZE]);
                    <$ty>::from_le_bytes(bytes)
                }
            }
        )*
    };
}

impl_record_le!(u8, u16, u32, u64, u128, i8, i16, i32, i64, i128, f32, f64);

impl Record for bool {
    const ENCODED_SIZE: usize = 1;

    fn encode_to(&self, buf: &mut [u8]) {
        buf[0] = u8::from(*self);
    }

    fn decode_from(buf: &[u8]) -> Self {
        buf[0] != 0
    }
}

/// Zero-sized values turn a tree into an ordered set.
impl Record for () {
    const ENCODED_SIZE: usize = 0;

    fn encode_to(&self, _buf: &mut [u8]) {}

    fn decode_from(_buf: &[u8]) -> Self {}
}

impl<const M: usize> Record for [u8; M] {
    const ENCODED_SIZE: usize = M;

    fn encode_to(&self, buf: &mut [u8]) {
        buf[..M].copy_from_slice(self);
    }

    fn decode_from(buf: &[u8]) -> Self {
        let mut out = [0u8; M];
        out.copy_from_slice(&buf[..M]);
        out
    }
}

impl<A: Record, B: Record> Record for (A, B) {
    const ENCODED_SIZE: usize = A::ENCODED_SIZE + B::ENCODED_SIZE;

    fn encode_to(&self, buf: &mut [u8]) {
        self.0.encode_to(buf);
        self.1.encode_to(&mut buf[A::ENCODED_SIZE..]);
    }

    fn decode_from(buf: &[u8]) -> Self {
        (A::decode_from(buf), B::decode_from(&buf[A::ENCODED_SIZE..]))
    }
}

impl Record for NodeId {
    const ENCODED_SIZE: usize = 8;

    fn encode_to(&self, buf: &mut [u8]) {
        self.0.encode_to(buf);
    }

    fn decode_from(buf: &[u8]) -> Self {
        NodeId(u64::decode_from(buf))
    }
}
