use crate::virtual_offset::VirtualOffset;

/// Represents all possible errors that can occur while iterating containers.
///
/// Construction failures, boundary violations and decoder failures are all
/// reported through this enum so that callers can tell "no more data" apart
/// from a real failure.
#[derive(Debug)]
pub enum SpanError {
    /// The coordinate list has an odd length; every span needs two coordinates.
    OddCoordinateCount(usize),
    /// The coordinate list is empty.
    EmptyCoordinates,
    /// A span was built with `start >= end` (compared as raw virtual offsets).
    InvalidRange {
        start: VirtualOffset,
        end: VirtualOffset,
    },
    /// A container read was attempted past the end boundary of its span.
    OutOfBounds {
        /// The source position at which the read was attempted.
        position: u64,
        /// The coarse byte offset of the span's end boundary.
        end: u64,
    },
    /// The data read from the source is malformed.
    InvalidData(String),
    /// The data failed an integrity check.
    FileCorrupted(String),
    /// The data uses a version or encoding this crate cannot decode.
    UnsupportedFormat(String),
    /// The requested operation is not supported by a read-only view.
    Unsupported(&'static str),
    /// Represents an error that occurs during I/O operations.
    Io(std::io::Error),
}

impl SpanError {
    /// Returns `true` for errors raised while building an iterator from coordinates.
    pub fn is_construction(&self) -> bool {
        matches!(
            self,
            SpanError::OddCoordinateCount(_)
                | SpanError::EmptyCoordinates
                | SpanError::InvalidRange { .. }
        )
    }
}

impl std::fmt::Display for SpanError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SpanError::OddCoordinateCount(count) => {
                write!(f, "Coordinate count must be even, got {count}")
            }
            SpanError::EmptyCoordinates => write!(f, "No coordinates given"),
            SpanError::InvalidRange { start, end } => {
                write!(f, "Span start {start} is not before end {end}")
            }
            SpanError::OutOfBounds { position, end } => write!(
                f,
                "No more containers in span: position {position} is past end {end}"
            ),
            SpanError::InvalidData(err) => write!(f, "Invalid data: {err}"),
            SpanError::FileCorrupted(err) => write!(f, "File is corrupted: {err}"),
            SpanError::UnsupportedFormat(err) => write!(f, "Unsupported format: {err}"),
            SpanError::Unsupported(op) => write!(f, "Operation not allowed: {op}"),
            SpanError::Io(err) => write!(f, "I/O error: {err}"),
        }
    }
}

impl std::error::Error for SpanError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SpanError::Io(err) => Some(err),
            _ => None,
        }
    }
}

/// Allows automatic conversion from `std::io::Error` to `SpanError`.
impl From<std::io::Error> for SpanError {
    fn from(error: std::io::Error) -> Self {
        SpanError::Io(error)
    }
}
