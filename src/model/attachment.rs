//! Decoded attachment containers.

/// Payload and filename recovered from one attachment container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentFile {
    /// Sanitized filename: the stored name, or a fallback derived from the
    /// container path when the stored one is missing or unusable.
    pub name: String,

    /// Raw binary payload. Empty when the container declares no content.
    pub data: Vec<u8>,
}

impl AttachmentFile {
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Payload size in bytes.
    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }
}
