use std::io;
use std::io::Read;
use std::io::Seek;
use std::io::SeekFrom;

/// A random-access byte source.
///
/// Implemented for every `Read + Seek` type, so files, buffered files and
/// in-memory cursors can all be iterated.
pub trait SeekableSource: Read + Seek {
    /// Moves the source to the absolute byte offset `pos`.
    fn seek_to(&mut self, pos: u64) -> io::Result<()>;

    /// Returns the current absolute byte offset.
    fn position(&mut self) -> io::Result<u64>;
}

impl<T> SeekableSource for T
where
    T: Read + Seek + ?Sized,
{
    fn seek_to(&mut self, pos: u64) -> io::Result<()> {
        self.seek(SeekFrom::Start(pos))?;
        Ok(())
    }

    fn position(&mut self) -> io::Result<u64> {
        self.stream_position()
    }
}

/// Reads length-prefixed byte runs from any `Read` type.
pub trait BytesReadExt: Read {
    /// Reads exactly `length` bytes into a freshly allocated buffer.
    fn read_bytes(&mut self, length: usize) -> io::Result<Vec<u8>>;
}

impl<T> BytesReadExt for T
where
    T: Read + ?Sized,
{
    fn read_bytes(&mut self, length: usize) -> io::Result<Vec<u8>> {
        let mut result: Vec<u8> = Vec::new();

        result
            .try_reserve_exact(length)
            .map_err(|e| io::Error::new(io::ErrorKind::OutOfMemory, e))?;
        result.resize(length, 0);

        self.read_exact(&mut result)?;

        Ok(result)
    }
}
