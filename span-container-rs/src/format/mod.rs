//! Decoder seams used by the span iterator, and the default container file format.
//!
//! The iterator only needs two things from a file format: a way to decode the
//! file header once, and a way to decode exactly one container at the current
//! source position. Both are expressed as traits here so other formats can be
//! plugged in; [`ContainerFileFormat`] is the implementation used by default.

pub mod container_file;
pub mod container_flags;
pub mod container_writer;
pub mod encoder_type;
pub mod format_options;

pub use container_file::{ContainerFileFormat, ContainerFileHeader, FileContainer};
pub use container_flags::ContainerFlags;
pub use container_writer::ContainerWriter;
pub use encoder_type::EncoderType;
pub use format_options::FormatOptions;

use crate::error::SpanError;
use crate::ext::io_ext::SeekableSource;
use std::fmt;

/// Major/minor version of a container file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FormatVersion {
    pub major: u8,
    pub minor: u8,
}

impl FormatVersion {
    pub const fn new(major: u8, minor: u8) -> Self {
        Self { major, minor }
    }
}

impl fmt::Display for FormatVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// A decoded file header.
pub trait FileHeader {
    /// The version that governs how containers in the file are decoded.
    fn version(&self) -> FormatVersion;
}

/// A decoded container.
pub trait Container {
    /// Byte offset in the source at which decoding of this container began.
    fn offset(&self) -> u64;

    /// Records the byte offset at which decoding of this container began.
    fn set_offset(&mut self, offset: u64);
}

/// Decodes the file-level header.
pub trait HeaderReader {
    type Header: FileHeader;

    /// Reads the header at the current position.
    ///
    /// On success the source must be positioned on the first byte after the header.
    fn read_header<R>(&self, source: &mut R) -> Result<Self::Header, SpanError>
    where
        R: SeekableSource + ?Sized;
}

/// Decodes one container.
pub trait ContainerReader {
    type Container: Container;

    /// Reads exactly one container at the current position.
    ///
    /// On success the source must be positioned on the first byte after the
    /// container's full encoded extent.
    fn read_container<R>(
        &self,
        version: FormatVersion,
        source: &mut R,
    ) -> Result<Self::Container, SpanError>
    where
        R: SeekableSource + ?Sized;
}
