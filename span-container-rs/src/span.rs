use crate::error::SpanError;
use crate::ext::io_ext::SeekableSource;
use crate::format::{Container, ContainerReader, FormatVersion};
use crate::virtual_offset::VirtualOffset;
use std::fmt;

/// A half-open range `[start, end)` of the file, bounded by two virtual offsets.
///
/// Containers are read at container granularity: only the coarse part of each
/// boundary is enforced. A container may start exactly at the coarse offset of
/// `end`, since the fine part of `end` points somewhere inside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    start: VirtualOffset,
    end: VirtualOffset,
}

impl Span {
    /// Creates a span, failing with [`SpanError::InvalidRange`] unless `start < end`.
    ///
    /// The comparison uses the raw packed values, so two offsets into the same
    /// container form a valid span as long as their fine parts are ordered.
    pub fn new(start: VirtualOffset, end: VirtualOffset) -> Result<Self, SpanError> {
        if start.raw() >= end.raw() {
            return Err(SpanError::InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// Builds spans from a flat list of coordinates, two per span, in input order.
    ///
    /// Spans are neither sorted nor merged.
    pub fn from_coordinates(coordinates: &[u64]) -> Result<Vec<Span>, SpanError> {
        if coordinates.is_empty() {
            return Err(SpanError::EmptyCoordinates);
        }
        if coordinates.len() % 2 != 0 {
            return Err(SpanError::OddCoordinateCount(coordinates.len()));
        }
        coordinates
            .chunks_exact(2)
            .map(|pair| Span::new(VirtualOffset::new(pair[0]), VirtualOffset::new(pair[1])))
            .collect()
    }

    pub fn start(&self) -> VirtualOffset {
        self.start
    }

    pub fn end(&self) -> VirtualOffset {
        self.end
    }

    /// Whether a container starting at `position` still belongs to this span.
    #[inline]
    pub fn has_remaining(&self, position: u64) -> bool {
        position <= self.end.coarse_offset()
    }

    /// Seeks `source` forward to the start of the span if it is still before it.
    ///
    /// Never seeks backward.
    pub fn advance_if_needed<R>(&self, source: &mut R) -> Result<(), SpanError>
    where
        R: SeekableSource + ?Sized,
    {
        let start = self.start.coarse_offset();
        if source.position()? < start {
            source.seek_to(start)?;
        }
        Ok(())
    }

    /// Decodes the next container of this span.
    ///
    /// Fails with [`SpanError::OutOfBounds`] without decoding anything when the
    /// source is already past the end of the span.
    pub fn read_next<R, C>(
        &self,
        source: &mut R,
        reader: &C,
        version: FormatVersion,
    ) -> Result<C::Container, SpanError>
    where
        R: SeekableSource + ?Sized,
        C: ContainerReader,
    {
        self.advance_if_needed(source)?;

        let offset = source.position()?;
        let end = self.end.coarse_offset();
        if offset > end {
            return Err(SpanError::OutOfBounds {
                position: offset,
                end,
            });
        }

        let mut container = reader.read_container(version, source)?;
        container.set_offset(offset);
        Ok(container)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}
