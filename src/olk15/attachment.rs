//! Attachment payload extraction.
//!
//! Attachment containers have no subject anchor: a fixed-width filename
//! region opens the file and the rest is one or more length-prefixed frames
//! holding the binary payload.

use byteorder::{ByteOrder, LittleEndian};
use tracing::trace;

use crate::error::FrameError;
use crate::olk15::format::{FormatProfile, NameLayout};
use crate::olk15::scanner;

/// Raw result of decoding an attachment container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawAttachment {
    /// Sanitized filename, if the container held a usable one.
    pub name: Option<String>,
    /// Concatenated frame payloads.
    pub data: Vec<u8>,
}

/// Decode an attachment container.
///
/// An empty file yields an empty payload and no name.
pub fn extract(buffer: &[u8], profile: &FormatProfile) -> Result<RawAttachment, FrameError> {
    if buffer.is_empty() {
        return Ok(RawAttachment {
            name: None,
            data: Vec::new(),
        });
    }

    let name = read_name_field(buffer, profile)?;
    let data = read_payload(buffer, profile.name_width, profile)?;
    Ok(RawAttachment { name, data })
}

/// Read and sanitize the filename stored in the leading region.
pub fn read_name_field(buffer: &[u8], profile: &FormatProfile) -> Result<Option<String>, FrameError> {
    let width = profile.name_width;
    let field = buffer.get(..width).ok_or(FrameError::Truncated {
        offset: 0,
        needed: width,
        available: buffer.len(),
    })?;

    let raw = match profile.name_layout {
        NameLayout::NullTerminated => field,
        NameLayout::LengthPrefixed if width < 2 => {
            return Err(FrameError::InvalidLayout {
                offset: 0,
                reason: format!("name field of {width} bytes cannot hold a u16 length"),
            });
        }
        NameLayout::LengthPrefixed => {
            let declared = usize::from(LittleEndian::read_u16(field));
            let ceiling = width - 2;
            if declared > ceiling {
                return Err(FrameError::UnreasonableLength {
                    offset: 0,
                    length: declared as u64,
                    ceiling,
                });
            }
            &field[2..2 + declared]
        }
    };

    Ok(sanitize_filename(&decode_name(raw)))
}

fn read_payload(buffer: &[u8], start: usize, profile: &FormatProfile) -> Result<Vec<u8>, FrameError> {
    let mut data = Vec::new();
    let mut offset = start;
    let mut frames = 0usize;

    while offset < buffer.len() {
        let frame = scanner::read_length_prefixed(buffer, offset, profile.length_width)?;
        if frame.declared_length == 0 {
            break;
        }
        if frames >= profile.max_frames {
            return Err(FrameError::RunawayExtraction {
                frames: profile.max_frames,
                offset,
            });
        }
        trace!(offset, length = frame.declared_length, "Attachment frame");
        data.extend_from_slice(frame.payload);
        frames += 1;
        offset = frame.next_offset;
    }

    Ok(data)
}

/// Decode a stored name, which is either narrow text or UTF-16LE.
///
/// Narrow text ends at the first NUL with only NUL padding after it, and is
/// valid UTF-8 without control characters. Anything else is read as
/// UTF-16LE up to the first NUL code unit, which also covers wide names
/// with no zero bytes at all (CJK, Cyrillic). A field that is neither
/// falls back to lossy UTF-8.
fn decode_name(raw: &[u8]) -> String {
    let end = memchr::memchr(0, raw).unwrap_or(raw.len());
    let narrow = &raw[..end];
    let padded = raw[end..].iter().all(|&b| b == 0);
    if padded {
        if let Ok(text) = std::str::from_utf8(narrow) {
            if !text.chars().any(char::is_control) {
                return text.to_string();
            }
        }
    }

    let units: Vec<u16> = raw
        .chunks_exact(2)
        .map(LittleEndian::read_u16)
        .take_while(|&u| u != 0)
        .collect();
    match String::from_utf16(&units) {
        Ok(text) if !text.chars().any(char::is_control) => text,
        _ => String::from_utf8_lossy(narrow).into_owned(),
    }
}

/// Make a stored name safe to use as a single path component.
///
/// Keeps only the part after the last `/` or `\`, strips NUL padding and
/// surrounding whitespace, and replaces control and reserved characters.
/// Returns `None` when nothing usable remains.
pub fn sanitize_filename(raw: &str) -> Option<String> {
    let base = raw.rsplit(['/', '\\']).next().unwrap_or(raw);
    let cleaned: String = base
        .trim_matches(|c: char| c == '\0' || c.is_whitespace())
        .chars()
        .map(|c| match c {
            c if c.is_control() => '_',
            ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c => c,
        })
        .collect();

    if cleaned.is_empty() || cleaned == "." || cleaned == ".." {
        None
    } else {
        Some(cleaned)
    }
}
