/// Decoder settings for [`ContainerFileFormat`](super::ContainerFileFormat).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatOptions {
    /// Containers whose payload length exceeds this many bytes are rejected.
    pub max_container_size: u32,
    /// Headers whose text block exceeds this many bytes are rejected.
    pub max_header_size: u32,
    /// Whether the header checksum of version 3 containers is checked.
    pub verify_checksums: bool,
    /// Whether zlib payloads are inflated; when `false` they are kept encoded.
    pub inflate: bool,
}

impl FormatOptions {
    pub const DEFAULT_MAX_CONTAINER_SIZE: u32 = 64 * 1024 * 1024;
    pub const DEFAULT_MAX_HEADER_SIZE: u32 = 16 * 1024 * 1024;

    pub fn with_max_container_size(mut self, max_container_size: u32) -> Self {
        self.max_container_size = max_container_size;
        self
    }

    pub fn with_max_header_size(mut self, max_header_size: u32) -> Self {
        self.max_header_size = max_header_size;
        self
    }

    pub fn with_verify_checksums(mut self, verify_checksums: bool) -> Self {
        self.verify_checksums = verify_checksums;
        self
    }

    pub fn with_inflate(mut self, inflate: bool) -> Self {
        self.inflate = inflate;
        self
    }
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            max_container_size: Self::DEFAULT_MAX_CONTAINER_SIZE,
            max_header_size: Self::DEFAULT_MAX_HEADER_SIZE,
            verify_checksums: true,
            inflate: true,
        }
    }
}
