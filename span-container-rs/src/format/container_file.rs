//! The default container file format.
//!
//! A file starts with a header (`CTNR` signature, version, file id and a free
//! text block) followed by containers. Each container has a small fixed header
//! (payload length, encoder type, flags, record count), a CRC32 of that fixed
//! header from major version 3 onwards, and the payload itself. All integers
//! are little-endian.

use crate::error::SpanError;
use crate::ext::io_ext::{BytesReadExt, SeekableSource};
use crate::format::{
    Container, ContainerFlags, ContainerReader, EncoderType, FileHeader, FormatOptions,
    FormatVersion, HeaderReader,
};
use byteorder::{LittleEndian, ReadBytesExt};
use flate2::read::ZlibDecoder;
use std::io::Read;
use std::ops::RangeInclusive;
use tracing::debug;

/// Size of the opaque file identifier in the file header.
pub const FILE_ID_SIZE: usize = 20;

/// Size of the fixed part of a container header: length, encoder, flags, record count.
pub(crate) const CONTAINER_FIXED_SIZE: usize = 10;

/// Size of the container header checksum carried by version 3 files.
pub(crate) const CONTAINER_CHECKSUM_SIZE: usize = 4;

/// The decoded file header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerFileHeader {
    /// Version that governs container decoding.
    pub version: FormatVersion,
    /// Opaque identifier of the file.
    pub file_id: [u8; FILE_ID_SIZE],
    /// Free text carried by the header.
    pub text: String,
}

impl ContainerFileHeader {
    pub const MAGIC: [u8; 4] = *b"CTNR";

    /// Size of the header without its text block.
    pub const FIXED_SIZE: usize = 4 + 2 + FILE_ID_SIZE + 4;

    /// Major versions this crate can decode.
    pub const SUPPORTED_MAJOR: RangeInclusive<u8> = 2..=3;

    /// The file id as lowercase hex.
    pub fn file_id_hex(&self) -> String {
        hex::encode(self.file_id)
    }

    /// Total encoded size of the header in bytes.
    pub fn encoded_size(&self) -> u64 {
        Self::FIXED_SIZE as u64 + self.text.len() as u64
    }
}

impl FileHeader for ContainerFileHeader {
    fn version(&self) -> FormatVersion {
        self.version
    }
}

/// A decoded container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileContainer {
    /// Byte offset in the file at which this container starts.
    pub offset: u64,
    /// Number of bytes the container occupies in the file, header included.
    pub encoded_size: u64,
    /// How the payload was stored.
    pub encoder: EncoderType,
    pub flags: ContainerFlags,
    /// Number of records in the payload.
    pub record_count: u32,
    /// The payload, inflated unless inflation was turned off.
    pub data: Vec<u8>,
}

impl FileContainer {
    /// Whether this is the empty container that terminates a file.
    pub fn is_eof(&self) -> bool {
        self.flags.contains(ContainerFlags::EOF)
    }

    /// Offset of the first byte after this container.
    pub fn end_offset(&self) -> u64 {
        self.offset + self.encoded_size
    }
}

impl Container for FileContainer {
    fn offset(&self) -> u64 {
        self.offset
    }

    fn set_offset(&mut self, offset: u64) {
        self.offset = offset;
    }
}

/// Header and container decoder for the default file format.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContainerFileFormat {
    options: FormatOptions,
}

impl ContainerFileFormat {
    pub fn new(options: FormatOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &FormatOptions {
        &self.options
    }

    fn decode_payload(
        &self,
        encoder: EncoderType,
        payload: Vec<u8>,
    ) -> Result<Vec<u8>, SpanError> {
        match encoder {
            EncoderType::Raw => Ok(payload),
            EncoderType::ZLib if !self.options.inflate => Ok(payload),
            EncoderType::ZLib => {
                let limit = self.options.max_container_size;
                let mut decoder = ZlibDecoder::new(&payload[..]).take(u64::from(limit) + 1);
                let mut data = Vec::new();
                decoder.read_to_end(&mut data).map_err(|e| {
                    SpanError::InvalidData(format!("Failed to inflate container payload: {e}"))
                })?;
                if data.len() as u64 > u64::from(limit) {
                    return Err(SpanError::InvalidData(format!(
                        "Inflated container payload exceeds limit {limit}"
                    )));
                }
                Ok(data)
            }
            EncoderType::Encrypted => Err(SpanError::UnsupportedFormat(
                "Encrypted containers".to_string(),
            )),
            EncoderType::Unknown(byte) => Err(SpanError::InvalidData(format!(
                "Unknown encoder type {byte:#04X}"
            ))),
        }
    }
}

impl HeaderReader for ContainerFileFormat {
    type Header = ContainerFileHeader;

    fn read_header<R>(&self, source: &mut R) -> Result<Self::Header, SpanError>
    where
        R: SeekableSource + ?Sized,
    {
        let mut magic = [0u8; 4];
        source.read_exact(&mut magic)?;
        if magic != ContainerFileHeader::MAGIC {
            return Err(SpanError::InvalidData(format!(
                "Invalid file signature: {}",
                hex::encode(magic)
            )));
        }

        let version = FormatVersion::new(source.read_u8()?, source.read_u8()?);
        if !ContainerFileHeader::SUPPORTED_MAJOR.contains(&version.major) {
            return Err(SpanError::UnsupportedFormat(format!("Version {version}")));
        }

        let mut file_id = [0u8; FILE_ID_SIZE];
        source.read_exact(&mut file_id)?;

        let text_length = source.read_u32::<LittleEndian>()?;
        if text_length > self.options.max_header_size {
            return Err(SpanError::InvalidData(format!(
                "Header text length {text_length} exceeds limit {}",
                self.options.max_header_size
            )));
        }
        let text = source.read_bytes(text_length as usize)?;
        debug!(
            %version,
            file_id = %hex::encode(file_id),
            text_length,
            "Decoded container file header"
        );

        Ok(ContainerFileHeader {
            version,
            file_id,
            text: String::from_utf8_lossy(&text).into_owned(),
        })
    }
}

impl ContainerReader for ContainerFileFormat {
    type Container = FileContainer;

    fn read_container<R>(
        &self,
        version: FormatVersion,
        source: &mut R,
    ) -> Result<Self::Container, SpanError>
    where
        R: SeekableSource + ?Sized,
    {
        let offset = source.position()?;

        let mut fixed = [0u8; CONTAINER_FIXED_SIZE];
        source.read_exact(&mut fixed)?;
        let mut fields = &fixed[..];
        let length = fields.read_i32::<LittleEndian>()?;
        let encoder = EncoderType::from(fields.read_u8()?);
        let flags = ContainerFlags::from_bits_retain(fields.read_u8()?);
        let record_count = fields.read_u32::<LittleEndian>()?;
        let mut encoded_size = CONTAINER_FIXED_SIZE as u64;

        if version.major >= 3 {
            let checksum = source.read_u32::<LittleEndian>()?;
            encoded_size += CONTAINER_CHECKSUM_SIZE as u64;
            if self.options.verify_checksums {
                let actual = crc32fast::hash(&fixed);
                if actual != checksum {
                    return Err(SpanError::FileCorrupted(format!(
                        "Container header at {offset} has checksum {checksum:#010X}, expected {actual:#010X}"
                    )));
                }
            }
        }

        let length = u32::try_from(length).map_err(|_| {
            SpanError::InvalidData(format!("Negative container length {length} at {offset}"))
        })?;
        if length > self.options.max_container_size {
            return Err(SpanError::InvalidData(format!(
                "Container length {length} at {offset} exceeds limit {}",
                self.options.max_container_size
            )));
        }

        let payload = source.read_bytes(length as usize)?;
        encoded_size += u64::from(length);

        Ok(FileContainer {
            offset,
            encoded_size,
            encoder,
            flags,
            record_count,
            data: self.decode_payload(encoder, payload)?,
        })
    }
}
