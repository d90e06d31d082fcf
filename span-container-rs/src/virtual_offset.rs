//! Packed virtual offsets.
//!
//! A virtual offset addresses a position inside a container-structured file.
//! The high 48 bits hold the byte offset of a container in the file (the
//! coarse offset), the low 16 bits an offset inside that container once it is
//! decoded (the fine offset).

use std::fmt;

/// A 64-bit packed file pointer: 48-bit coarse byte offset, 16-bit fine offset.
#[repr(transparent)]
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VirtualOffset(u64);

impl VirtualOffset {
    /// Number of bits used for the fine offset.
    pub const FINE_BITS: u32 = 16;

    /// Largest coarse offset that can be packed.
    pub const MAX_COARSE: u64 = (1 << (64 - Self::FINE_BITS)) - 1;

    /// Wraps a raw packed value. Every `u64` is a valid virtual offset.
    #[inline]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Packs a coarse byte offset and a fine offset.
    ///
    /// Bits of `coarse` above [`Self::MAX_COARSE`] are dropped.
    #[inline]
    pub const fn from_parts(coarse: u64, fine: u16) -> Self {
        Self(((coarse & Self::MAX_COARSE) << Self::FINE_BITS) | fine as u64)
    }

    /// The raw packed value.
    #[inline]
    pub const fn raw(&self) -> u64 {
        self.0
    }

    /// The byte offset of the addressed container in the file.
    #[inline]
    pub const fn coarse_offset(&self) -> u64 {
        self.0 >> Self::FINE_BITS
    }

    /// The offset inside the decoded container.
    #[inline]
    pub const fn fine_offset(&self) -> u16 {
        self.0 as u16
    }
}

impl From<u64> for VirtualOffset {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Debug for VirtualOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VirtualOffset")
            .field("coarse", &self.coarse_offset())
            .field("fine", &self.fine_offset())
            .field("raw", &self.0)
            .finish()
    }
}

impl fmt::Display for VirtualOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.coarse_offset(), self.fine_offset())
    }
}
