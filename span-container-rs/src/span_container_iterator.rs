use crate::error::SpanError;
use crate::ext::io_ext::SeekableSource;
use crate::format::{Container, ContainerFileFormat, ContainerReader, FileHeader, HeaderReader};
use crate::span::Span;
use tracing::{debug, trace};

/// Which span the iterator is reading from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cursor {
    /// Containers are read from `spans[span]`.
    Active { span: usize },
    /// Every span has been consumed; `last` is the final span.
    Exhausted { last: usize },
}

impl Cursor {
    /// Leaves the current span for the next one, or becomes exhausted.
    fn advance(self, span_count: usize) -> Self {
        match self {
            Cursor::Active { span } if span + 1 < span_count => Cursor::Active { span: span + 1 },
            Cursor::Active { span } => Cursor::Exhausted { last: span },
            exhausted @ Cursor::Exhausted { .. } => exhausted,
        }
    }

    fn span_index(self) -> usize {
        match self {
            Cursor::Active { span } => span,
            Cursor::Exhausted { last } => last,
        }
    }
}

/// Iterates the containers of a seekable file that fall inside a list of spans.
///
/// Spans come from pairs of packed virtual offsets, typically produced by an
/// index lookup. They are visited in the order given; within a span containers
/// are read one after another until the source moves past the span's end.
///
/// The iterator owns the source and moves it while reading, so it must not be
/// shared with another reader. Spans are not validated against each other.
/// The source is never moved backwards: a span overlapping the previous one
/// continues from the current position, and a span lying entirely behind the
/// current position yields nothing.
///
/// Two ways to consume it: the explicit [`has_next`](Self::has_next) /
/// [`next_container`](Self::next_container) pair, or the [`Iterator`]
/// implementation, which yields `Result`s and stops after the first error.
pub struct SpanContainerIterator<R, F = ContainerFileFormat>
where
    R: SeekableSource,
    F: HeaderReader + ContainerReader,
{
    source: R,
    format: F,
    header: F::Header,
    first_container_offset: u64,
    spans: Vec<Span>,
    cursor: Cursor,
    failed: bool,
}

impl<R> SpanContainerIterator<R, ContainerFileFormat>
where
    R: SeekableSource,
{
    /// Opens `source` with the default container file format.
    ///
    /// `coordinates` holds packed virtual offsets, two per span.
    pub fn from_spans(source: R, coordinates: &[u64]) -> Result<Self, SpanError> {
        Self::with_format(ContainerFileFormat::default(), source, coordinates)
    }
}

impl<R, F> SpanContainerIterator<R, F>
where
    R: SeekableSource,
    F: HeaderReader + ContainerReader,
{
    /// Opens `source` with the given format.
    ///
    /// The coordinates are checked first, then the header is read from the
    /// start of the source. Any failure is returned here rather than on the
    /// first pull.
    pub fn with_format(format: F, mut source: R, coordinates: &[u64]) -> Result<Self, SpanError> {
        let spans = Span::from_coordinates(coordinates)?;

        source.seek_to(0)?;
        let header = format.read_header(&mut source)?;
        let first_container_offset = source.position()?;
        debug!(
            version = %header.version(),
            first_container_offset,
            spans = spans.len(),
            "Opened span container iterator"
        );

        Ok(Self {
            source,
            format,
            header,
            first_container_offset,
            spans,
            cursor: Cursor::Active { span: 0 },
            failed: false,
        })
    }

    /// Whether another container can be read.
    ///
    /// Moves on to the following spans while the current one is used up.
    /// Only queries the source position; nothing is decoded and repeated
    /// calls give the same answer.
    pub fn has_next(&mut self) -> Result<bool, SpanError> {
        loop {
            let Cursor::Active { span } = self.cursor else {
                return Ok(false);
            };
            let position = self.source.position()?;
            if self.spans[span].has_remaining(position) {
                return Ok(true);
            }

            self.cursor = self.cursor.advance(self.spans.len());
            match self.cursor {
                Cursor::Active { span } => {
                    debug!(span, position, bounds = %self.spans[span], "Moved to next span")
                }
                Cursor::Exhausted { .. } => debug!(position, "All spans consumed"),
            }
        }
    }

    /// Decodes the next container of the current span.
    ///
    /// Call [`has_next`](Self::has_next) first: once the spans are used up
    /// this fails with [`SpanError::OutOfBounds`].
    pub fn next_container(&mut self) -> Result<F::Container, SpanError> {
        let span = &self.spans[self.cursor.span_index()];
        let container = span.read_next(&mut self.source, &self.format, self.header.version())?;
        trace!(offset = container.offset(), "Read container");
        Ok(container)
    }

    /// Always fails: the iterator is a read-only view of the file.
    pub fn remove(&mut self) -> Result<(), SpanError> {
        Err(SpanError::Unsupported("remove"))
    }

    /// The file header, decoded when the iterator was created.
    pub fn header(&self) -> &F::Header {
        &self.header
    }

    /// Byte offset right after the header, where the first container starts.
    pub fn first_container_offset(&self) -> u64 {
        self.first_container_offset
    }

    pub fn spans(&self) -> &[Span] {
        &self.spans
    }

    /// Index of the span being read, or `None` once every span is consumed.
    pub fn active_span(&self) -> Option<usize> {
        match self.cursor {
            Cursor::Active { span } => Some(span),
            Cursor::Exhausted { .. } => None,
        }
    }

    pub fn format(&self) -> &F {
        &self.format
    }

    /// Gives the source back.
    pub fn into_inner(self) -> R {
        self.source
    }
}

impl<R, F> Iterator for SpanContainerIterator<R, F>
where
    R: SeekableSource,
    F: HeaderReader + ContainerReader,
{
    type Item = Result<F::Container, SpanError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let result = match self.has_next() {
            Ok(false) => return None,
            Ok(true) => self.next_container(),
            Err(e) => Err(e),
        };
        self.failed = result.is_err();
        Some(result)
    }
}
