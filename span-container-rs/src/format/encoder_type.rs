/// Represents the encoding used for a container payload.
///
/// This enum describes how the payload bytes of a container are stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncoderType {
    /// Plain raw data, uncompressed and unencrypted.
    Raw,
    /// Zlib compressed data.
    ZLib,
    /// Encrypted data.
    Encrypted,
    /// Unknown or unsupported type, stores the raw byte value.
    Unknown(u8),
}

impl EncoderType {
    /// The byte written to the container header for this encoding.
    pub fn as_byte(self) -> u8 {
        match self {
            EncoderType::Raw => 0x4E,
            EncoderType::ZLib => 0x5A,
            EncoderType::Encrypted => 0x45,
            EncoderType::Unknown(byte) => byte,
        }
    }
}

impl From<u8> for EncoderType {
    fn from(byte: u8) -> Self {
        match byte {
            0x4E => EncoderType::Raw,
            0x5A => EncoderType::ZLib,
            0x45 => EncoderType::Encrypted,
            other => EncoderType::Unknown(other),
        }
    }
}
