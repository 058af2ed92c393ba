//! Subject anchor selection.
//!
//! The container header can echo the subject (in an index block) before the
//! message frame. The first occurrence at or after the structural header is
//! taken as the real start of the message. This is an observed property of
//! the supported client version, not a documented one.

use tracing::{debug, trace};

use crate::error::{ArchiveError, Result};
use crate::olk15::format::FormatProfile;
use crate::olk15::scanner;

/// A located subject inside a container buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Anchor {
    /// Offset of the first byte of the encoded subject.
    pub offset: usize,
    /// Length of the encoded subject in bytes.
    pub len: usize,
}

impl Anchor {
    /// Offset immediately after the matched subject.
    pub fn end(&self) -> usize {
        self.offset + self.len
    }
}

/// Find the most plausible start-of-message anchor for `subject`.
///
/// An empty subject anchors at the end of the structural header, so mails
/// without a subject still yield the frames that follow it.
pub fn locate(buffer: &[u8], subject: &str, profile: &FormatProfile) -> Result<Anchor> {
    let pattern = scanner::encode_utf16le(subject);

    if pattern.is_empty() {
        if buffer.len() < profile.header_size {
            return Err(ArchiveError::NotFound {
                subject: String::new(),
            });
        }
        return Ok(Anchor {
            offset: profile.header_size,
            len: 0,
        });
    }

    if let Some(early) = scanner::find(buffer, &pattern, 0).filter(|&o| o < profile.header_size) {
        trace!(offset = early, "Ignoring subject echo inside the header");
    }

    match scanner::find(buffer, &pattern, profile.header_size) {
        Some(offset) => {
            debug!(offset, len = pattern.len(), "Subject anchor located");
            Ok(Anchor {
                offset,
                len: pattern.len(),
            })
        }
        None => Err(ArchiveError::NotFound {
            subject: subject.to_string(),
        }),
    }
}

/// Every offset where `subject` occurs, including echoes inside the header.
///
/// Used for diagnosing containers of unknown variants.
pub fn candidates(buffer: &[u8], subject: &str) -> Vec<usize> {
    scanner::find_all(buffer, &scanner::encode_utf16le(subject))
}
