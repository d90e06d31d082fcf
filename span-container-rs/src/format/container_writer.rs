use crate::format::container_file::{
    ContainerFileHeader, CONTAINER_FIXED_SIZE, CONTAINER_CHECKSUM_SIZE, FILE_ID_SIZE,
};
use crate::format::{ContainerFlags, EncoderType, FormatVersion};
use byteorder::{LittleEndian, WriteBytesExt};
use flate2::write::ZlibEncoder;
use flate2::Compression;
use std::io::{self, Error, ErrorKind, Write};

/// Writes a container file: the file header followed by any number of containers.
///
/// Every write reports the byte offset at which the container starts, which is
/// what an index packs into the coarse part of a virtual offset.
pub struct ContainerWriter<W: Write> {
    writer: W,
    version: FormatVersion,
    position: u64,
}

impl<W: Write> ContainerWriter<W> {
    /// Writes the file header and returns a writer positioned on the first container.
    pub fn new(
        mut writer: W,
        version: FormatVersion,
        file_id: [u8; FILE_ID_SIZE],
        text: &str,
    ) -> io::Result<Self> {
        let text_length = u32::try_from(text.len())
            .map_err(|_| Error::new(ErrorKind::InvalidInput, "Header text too long"))?;

        writer.write_all(&ContainerFileHeader::MAGIC)?;
        writer.write_u8(version.major)?;
        writer.write_u8(version.minor)?;
        writer.write_all(&file_id)?;
        writer.write_u32::<LittleEndian>(text_length)?;
        writer.write_all(text.as_bytes())?;

        Ok(Self {
            writer,
            version,
            position: ContainerFileHeader::FIXED_SIZE as u64 + text.len() as u64,
        })
    }

    /// Writes one container and returns its start offset.
    pub fn write_container(
        &mut self,
        encoder: EncoderType,
        record_count: u32,
        payload: &[u8],
    ) -> io::Result<u64> {
        let encoded = match encoder {
            EncoderType::Raw => payload.to_vec(),
            EncoderType::ZLib => {
                let mut zlib = ZlibEncoder::new(Vec::new(), Compression::default());
                zlib.write_all(payload)?;
                zlib.finish()?
            }
            _ => {
                return Err(Error::new(
                    ErrorKind::InvalidInput,
                    format!("Cannot write {encoder:?} containers"),
                ))
            }
        };
        self.write_encoded(encoder, ContainerFlags::empty(), record_count, &encoded)
    }

    /// Writes the empty container that marks the end of the file and returns its start offset.
    pub fn write_eof(&mut self) -> io::Result<u64> {
        self.write_encoded(EncoderType::Raw, ContainerFlags::EOF, 0, &[])
    }

    fn write_encoded(
        &mut self,
        encoder: EncoderType,
        flags: ContainerFlags,
        record_count: u32,
        encoded: &[u8],
    ) -> io::Result<u64> {
        let length = i32::try_from(encoded.len())
            .map_err(|_| Error::new(ErrorKind::InvalidInput, "Container payload too large"))?;

        let mut fixed = Vec::with_capacity(CONTAINER_FIXED_SIZE);
        fixed.write_i32::<LittleEndian>(length)?;
        fixed.write_u8(encoder.as_byte())?;
        fixed.write_u8(flags.bits())?;
        fixed.write_u32::<LittleEndian>(record_count)?;
        self.writer.write_all(&fixed)?;

        let mut written = fixed.len() as u64;
        if self.version.major >= 3 {
            self.writer
                .write_u32::<LittleEndian>(crc32fast::hash(&fixed))?;
            written += CONTAINER_CHECKSUM_SIZE as u64;
        }
        self.writer.write_all(encoded)?;
        written += encoded.len() as u64;

        let offset = self.position;
        self.position += written;
        Ok(offset)
    }

    /// The offset at which the next container will be written.
    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn version(&self) -> FormatVersion {
        self.version
    }

    /// Flushes and returns the underlying writer.
    pub fn into_inner(mut self) -> io::Result<W> {
        self.writer.flush()?;
        Ok(self.writer)
    }
}
