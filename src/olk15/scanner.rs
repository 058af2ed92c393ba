//! Byte-level primitives: pattern search and length-prefixed frame reads.
//!
//! Nothing in here knows about mail. Offsets are always absolute positions
//! in the container buffer.

use byteorder::{ByteOrder, LittleEndian};
use memchr::memmem;

use crate::error::FrameError;

/// One length-prefixed unit read from a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame<'a> {
    /// Payload length in bytes, as declared by the frame header.
    pub declared_length: usize,
    /// The `declared_length` bytes following the length field.
    pub payload: &'a [u8],
    /// Offset immediately after the payload.
    pub next_offset: usize,
}

/// Encode text as 2-byte little-endian code units, the container's text form.
pub fn encode_utf16le(text: &str) -> Vec<u8> {
    text.encode_utf16().flat_map(u16::to_le_bytes).collect()
}

/// First occurrence of `pattern` at or after `from_offset`.
///
/// An empty pattern matches at `from_offset` as long as it lies inside the buffer.
pub fn find(buffer: &[u8], pattern: &[u8], from_offset: usize) -> Option<usize> {
    let haystack = buffer.get(from_offset..)?;
    memmem::find(haystack, pattern).map(|pos| pos + from_offset)
}

/// Search for `text` encoded as UTF-16LE.
pub fn find_text(buffer: &[u8], text: &str, from_offset: usize) -> Option<usize> {
    find(buffer, &encode_utf16le(text), from_offset)
}

/// Every (possibly overlapping) occurrence of a non-empty `pattern`, in order.
pub fn find_all(buffer: &[u8], pattern: &[u8]) -> Vec<usize> {
    if pattern.is_empty() {
        return Vec::new();
    }
    let finder = memmem::Finder::new(pattern);
    let mut hits = Vec::new();
    let mut from = 0;
    while let Some(pos) = buffer.get(from..).and_then(|h| finder.find(h)) {
        hits.push(from + pos);
        from += pos + 1;
    }
    hits
}

/// Read a `width`-byte little-endian length at `offset` and the payload it declares.
///
/// A declared length larger than the whole buffer can only come from a
/// misaligned read and is reported as [`FrameError::UnreasonableLength`];
/// a plausible length that overruns the remaining bytes is
/// [`FrameError::Truncated`].
pub fn read_length_prefixed(
    buffer: &[u8],
    offset: usize,
    width: usize,
) -> Result<Frame<'_>, FrameError> {
    read_scaled(buffer, offset, width, 1)
}

/// Like [`read_length_prefixed`], with the length field counting `scale`-byte units.
///
/// [`Frame::declared_length`] is always reported in bytes. The two length
/// errors split at the buffer size: a byte length up to `buffer.len()` that
/// overruns the bytes after the field is [`FrameError::Truncated`], anything
/// above `buffer.len()` is [`FrameError::UnreasonableLength`]. A `width`
/// outside `1..=8` or a zero `scale` is [`FrameError::InvalidLayout`].
pub fn read_scaled(
    buffer: &[u8],
    offset: usize,
    width: usize,
    scale: usize,
) -> Result<Frame<'_>, FrameError> {
    if !(1..=8).contains(&width) {
        return Err(FrameError::InvalidLayout {
            offset,
            reason: format!("length field width {width} is outside 1..=8"),
        });
    }
    if scale == 0 {
        return Err(FrameError::InvalidLayout {
            offset,
            reason: "length unit of zero bytes".into(),
        });
    }
    let available = buffer.len().saturating_sub(offset);
    if available < width {
        return Err(FrameError::Truncated {
            offset,
            needed: width,
            available,
        });
    }

    let raw = LittleEndian::read_uint(&buffer[offset..offset + width], width);
    let ceiling = buffer.len();
    let declared_length = match usize::try_from(raw).ok().and_then(|n| n.checked_mul(scale)) {
        Some(len) if len <= ceiling => len,
        _ => {
            return Err(FrameError::UnreasonableLength {
                offset,
                length: raw,
                ceiling,
            })
        }
    };

    let start = offset + width;
    let remaining = available - width;
    if declared_length > remaining {
        return Err(FrameError::Truncated {
            offset,
            needed: width + declared_length,
            available,
        });
    }

    let next_offset = start + declared_length;
    Ok(Frame {
        declared_length,
        payload: &buffer[start..next_offset],
        next_offset,
    })
}
