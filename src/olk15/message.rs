//! Message payload extraction.
//!
//! Starting at the subject anchor, frames are read one after another and
//! their payloads concatenated until a zero-length sentinel frame or the end
//! of the buffer. The extractor keeps what it accumulated when a structural
//! error stops it, so callers can still archive a partial body.

use tracing::trace;

use crate::error::FrameError;
use crate::olk15::anchor::Anchor;
use crate::olk15::format::FormatProfile;
use crate::olk15::scanner;

/// Extraction progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// Positioned on the anchor; the skip to the first frame is still pending.
    Seeking,
    /// Reading frames; `offset` is the next length field.
    Accumulating { offset: usize, frames: usize },
    /// No further frames will be read.
    Done,
}

/// Frame-walking state machine over one container buffer.
pub struct MessageExtractor<'a> {
    buffer: &'a [u8],
    profile: &'a FormatProfile,
    anchor: Anchor,
    state: State,
    frames: usize,
    payload: Vec<u8>,
}

impl<'a> MessageExtractor<'a> {
    /// Prepare an extractor positioned on `anchor`.
    pub fn new(buffer: &'a [u8], anchor: Anchor, profile: &'a FormatProfile) -> Self {
        Self {
            buffer,
            profile,
            anchor,
            state: State::Seeking,
            frames: 0,
            payload: Vec::new(),
        }
    }

    /// Current state.
    pub fn state(&self) -> State {
        self.state
    }

    /// Number of non-empty frames accumulated so far.
    pub fn frames(&self) -> usize {
        self.frames
    }

    /// Bytes accumulated so far (UTF-16LE).
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Consume the extractor, returning the accumulated bytes.
    pub fn into_payload(self) -> Vec<u8> {
        self.payload
    }

    /// Advance by one transition.
    ///
    /// On error the state becomes [`State::Done`] and the payload keeps the
    /// frames read before the failure.
    pub fn step(&mut self) -> Result<State, FrameError> {
        let next = match self.state {
            State::Seeking => self.seek(),
            State::Accumulating { offset, frames } => self.accumulate(offset, frames),
            State::Done => Ok(State::Done),
        };
        self.state = match &next {
            Ok(state) => *state,
            Err(_) => State::Done,
        };
        next
    }

    /// Run until [`State::Done`].
    pub fn run(&mut self) -> Result<(), FrameError> {
        while self.step()? != State::Done {}
        Ok(())
    }

    fn seek(&self) -> Result<State, FrameError> {
        let start = self.anchor.end() + self.profile.anchor_skip;
        let len = self.buffer.len();
        if start > len {
            return Err(FrameError::Truncated {
                offset: self.anchor.end(),
                needed: self.profile.anchor_skip,
                available: len.saturating_sub(self.anchor.end()),
            });
        }
        if start == len {
            return Ok(State::Done);
        }
        Ok(State::Accumulating {
            offset: start,
            frames: 0,
        })
    }

    fn accumulate(&mut self, offset: usize, frames: usize) -> Result<State, FrameError> {
        let frame = scanner::read_scaled(
            self.buffer,
            offset,
            self.profile.length_width,
            self.profile.text_length_unit.scale(),
        )?;
        if frame.declared_length == 0 {
            trace!(offset, frames, "Sentinel frame");
            return Ok(State::Done);
        }
        if frames >= self.profile.max_frames {
            return Err(FrameError::RunawayExtraction {
                frames: self.profile.max_frames,
                offset,
            });
        }

        self.payload.extend_from_slice(frame.payload);
        self.frames = frames + 1;
        trace!(offset, length = frame.declared_length, "Frame accumulated");

        if frame.next_offset >= self.buffer.len() {
            return Ok(State::Done);
        }
        Ok(State::Accumulating {
            offset: frame.next_offset,
            frames: self.frames,
        })
    }
}

/// Extract the message payload that follows `anchor`.
pub fn extract(buffer: &[u8], anchor: Anchor, profile: &FormatProfile) -> Result<Vec<u8>, FrameError> {
    let mut extractor = MessageExtractor::new(buffer, anchor, profile);
    extractor.run()?;
    Ok(extractor.into_payload())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::olk15::format::LengthUnit;
    use crate::olk15::scanner::encode_utf16le;

    fn frame(payload: &[u8]) -> Vec<u8> {
        let mut out = (payload.len() as u32).to_le_bytes().to_vec();
        out.extend_from_slice(payload);
        out
    }

    /// Frames below count bytes so odd-sized payloads can be exercised.
    fn byte_profile() -> FormatProfile {
        FormatProfile {
            text_length_unit: LengthUnit::Bytes,
            ..FormatProfile::default()
        }
    }

    fn anchor_at(offset: usize) -> Anchor {
        Anchor { offset, len: 0 }
    }

    #[test]
    fn test_state_transitions() {
        let profile = byte_profile();
        let mut buf = frame(b"ab");
        buf.extend_from_slice(&frame(b""));
        let mut ex = MessageExtractor::new(&buf, anchor_at(0), &profile);

        assert_eq!(ex.state(), State::Seeking);
        assert_eq!(
            ex.step().unwrap(),
            State::Accumulating {
                offset: 0,
                frames: 0
            }
        );
        assert_eq!(
            ex.step().unwrap(),
            State::Accumulating {
                offset: 6,
                frames: 1
            }
        );
        assert_eq!(ex.step().unwrap(), State::Done);
        assert_eq!(ex.payload(), b"ab");
    }

    #[test]
    fn test_concatenates_frames() {
        let profile = byte_profile();
        let mut buf = Vec::new();
        buf.extend_from_slice(&frame(&encode_utf16le("te")));
        buf.extend_from_slice(&frame(&encode_utf16le("st")));
        buf.extend_from_slice(&frame(b""));
        assert_eq!(
            extract(&buf, anchor_at(0), &profile).unwrap(),
            encode_utf16le("test")
        );
    }

    #[test]
    fn test_end_of_buffer_without_sentinel() {
        let profile = byte_profile();
        let buf = frame(b"xy");
        assert_eq!(extract(&buf, anchor_at(0), &profile).unwrap(), b"xy");
    }

    #[test]
    fn test_anchor_skip_is_applied() {
        let profile = FormatProfile {
            anchor_skip: 3,
            ..byte_profile()
        };
        let mut buf = vec![9, 9, 9];
        buf.extend_from_slice(&frame(b"ok"));
        assert_eq!(extract(&buf, anchor_at(0), &profile).unwrap(), b"ok");
    }

    #[test]
    fn test_skip_past_end_is_truncated() {
        let profile = FormatProfile {
            anchor_skip: 10,
            ..byte_profile()
        };
        assert!(matches!(
            extract(&[0u8; 4], anchor_at(0), &profile),
            Err(FrameError::Truncated { .. })
        ));
    }

    #[test]
    fn test_truncated_keeps_partial_payload() {
        let profile = byte_profile();
        let mut buf = frame(b"ok");
        buf.extend_from_slice(&[5, 0, 0, 0, 1]);
        let mut ex = MessageExtractor::new(&buf, anchor_at(0), &profile);
        assert!(matches!(
            ex.run(),
            Err(FrameError::Truncated { offset: 6, .. })
        ));
        assert_eq!(ex.state(), State::Done);
        assert_eq!(ex.payload(), b"ok");
    }

    #[test]
    fn test_runaway_guard() {
        let profile = FormatProfile {
            max_frames: 3,
            ..byte_profile()
        };
        let mut buf = Vec::new();
        for _ in 0..5 {
            buf.extend_from_slice(&frame(b"z"));
        }
        assert_eq!(
            extract(&buf, anchor_at(0), &profile),
            Err(FrameError::RunawayExtraction {
                frames: 3,
                offset: 15
            })
        );
    }

    #[test]
    fn test_sentinel_after_ceiling_is_not_runaway() {
        let profile = FormatProfile {
            max_frames: 2,
            ..byte_profile()
        };
        let mut buf = frame(b"a");
        buf.extend_from_slice(&frame(b"b"));
        buf.extend_from_slice(&frame(b""));
        assert_eq!(extract(&buf, anchor_at(0), &profile).unwrap(), b"ab");
    }

    #[test]
    fn test_default_lengths_count_code_units() {
        let profile = FormatProfile::default();
        let mut buf = 4u32.to_le_bytes().to_vec();
        buf.extend_from_slice(&encode_utf16le("test"));
        buf.extend_from_slice(&0u32.to_le_bytes());
        let mut ex = MessageExtractor::new(&buf, anchor_at(0), &profile);
        ex.run().unwrap();
        assert_eq!(ex.frames(), 1);
        assert_eq!(ex.payload(), encode_utf16le("test").as_slice());
    }
}
