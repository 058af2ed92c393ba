//! OLK15 binary mail-store decoding.
//!
//! Container files hold one mail body or one attachment in an undocumented
//! layout. Message bodies are located by searching for the subject in
//! UTF-16LE and walking the length-prefixed frames that follow it;
//! attachments carry a filename region followed by payload frames.
//! All layout constants live in [`format::FormatProfile`].

pub mod anchor;
pub mod attachment;
pub mod format;
pub mod message;
pub mod scanner;

use encoding_rs::UTF_16LE;

use crate::error::{FrameError, Result};

pub use self::format::{FormatProfile, LengthUnit};

/// Locate `subject` and return the concatenated message frames (UTF-16LE bytes).
///
/// Unlike the store facade this reports every condition as an error,
/// including a missing subject.
pub fn decode_message(buffer: &[u8], subject: &str, profile: &FormatProfile) -> Result<Vec<u8>> {
    let anchor = anchor::locate(buffer, subject, profile)?;
    Ok(message::extract(buffer, anchor, profile)?)
}

/// Decode an attachment container into its payload and stored filename.
pub fn decode_attachment(
    buffer: &[u8],
    profile: &FormatProfile,
) -> Result<attachment::RawAttachment> {
    Ok(attachment::extract(buffer, profile)?)
}

/// Position and declared length of one frame, for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct FrameInfo {
    pub offset: usize,
    pub length: usize,
}

/// List up to `limit` frames starting at `start`, stopping after a
/// zero-length frame, at the end of the buffer, or at the first error.
///
/// `unit` is what the length fields count; lengths are reported in bytes.
pub fn frame_layout(
    buffer: &[u8],
    start: usize,
    profile: &FormatProfile,
    unit: LengthUnit,
    limit: usize,
) -> (Vec<FrameInfo>, Option<FrameError>) {
    let mut frames = Vec::new();
    let mut offset = start;
    while offset < buffer.len() && frames.len() < limit {
        match scanner::read_scaled(buffer, offset, profile.length_width, unit.scale()) {
            Ok(frame) => {
                frames.push(FrameInfo {
                    offset,
                    length: frame.declared_length,
                });
                if frame.declared_length == 0 {
                    break;
                }
                offset = frame.next_offset;
            }
            Err(e) => return (frames, Some(e)),
        }
    }
    (frames, None)
}

/// Decode UTF-16LE bytes, replacing invalid sequences with U+FFFD.
pub fn decode_text(bytes: &[u8]) -> String {
    let (text, _had_errors) = UTF_16LE.decode_without_bom_handling(bytes);
    text.into_owned()
}
