//! # span-container-rs
//!
//! `span-container-rs` reads the containers of a container-structured file that
//! fall inside a set of byte spans, instead of scanning the whole file.
//!
//! Spans are given as pairs of packed virtual offsets (48-bit byte offset in
//! the high bits, 16-bit intra-container offset in the low bits), the way an
//! index lookup hands them out. The iterator reads the file header once, then
//! seeks to each span in turn and decodes containers until the span ends.
//!
//! ## Features
//! - Span-bounded, forward-only container iteration over any `Read + Seek`
//! - Pluggable header and container decoders through [`format::HeaderReader`]
//!   and [`format::ContainerReader`]
//! - A default container file format with raw and zlib payloads, EOF markers
//!   and header checksums, plus a writer for it
//!
//! ### Example: Reading the containers of one span
//! ```rust
//! use span_container_rs::format::{ContainerWriter, EncoderType, FormatVersion};
//! use span_container_rs::{SpanContainerIterator, VirtualOffset};
//! use std::io::Cursor;
//!
//! let mut writer = ContainerWriter::new(Vec::new(), FormatVersion::new(3, 0), [0u8; 20], "demo")?;
//! let first = writer.write_container(EncoderType::Raw, 1, b"first")?;
//! let second = writer.write_container(EncoderType::ZLib, 1, b"second")?;
//! writer.write_container(EncoderType::Raw, 1, b"third")?;
//! let bytes = writer.into_inner()?;
//!
//! // One span covering the first two containers.
//! let coordinates = [
//!     VirtualOffset::from_parts(first, 0).raw(),
//!     VirtualOffset::from_parts(second, 0).raw(),
//! ];
//! let mut iter = SpanContainerIterator::from_spans(Cursor::new(bytes), &coordinates)?;
//!
//! let mut offsets = Vec::new();
//! while iter.has_next()? {
//!     offsets.push(iter.next_container()?.offset);
//! }
//! assert_eq!(offsets, vec![first, second]);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod error;
pub mod ext;
pub mod format;
pub mod span;
pub mod span_container_iterator;
pub mod virtual_offset;

pub use error::SpanError;
pub use ext::io_ext::SeekableSource;
pub use span::Span;
pub use span_container_iterator::SpanContainerIterator;
pub use virtual_offset::VirtualOffset;
