//! Version-specific layout constants of OLK15 containers.
//!
//! ```text
//! Message container
//! ┌──────────────────────────────────────┐
//! │ HEADER (header_size bytes)           │  metadata, may echo the subject
//! ├──────────────────────────────────────┤
//! │ ... subject in UTF-16LE ...          │  <- anchor
//! │ (anchor_skip bytes)                  │
//! │ len: uN LE | payload[len * 2]        │  frame 1 (len in UTF-16 units)
//! │ len: uN LE | payload[len * 2]        │  frame 2 ...
//! │ len = 0                              │  sentinel
//! └──────────────────────────────────────┘
//!
//! Attachment container
//! ┌──────────────────────────────────────┐
//! │ NAME FIELD (name_width bytes)        │  NUL-padded or length-prefixed
//! │ len: uN LE | payload[len]            │  frame 1 ...
//! └──────────────────────────────────────┘
//! ```
//!
//! None of these values come from a published format description. They were
//! fixed by observing containers written by the supported client version and
//! are collected here so that a new version is a configuration change.

use serde::{Deserialize, Serialize};

/// Bytes of fixed metadata before any real message content.
pub const HEADER_SIZE: usize = 32;

/// Distance from the end of the subject anchor to the first length field.
pub const ANCHOR_SKIP: usize = 0;

/// Width in bytes of every frame length field (little-endian).
pub const LENGTH_WIDTH: usize = 4;

/// Ceiling on frames per container before extraction is declared runaway.
pub const MAX_FRAMES: usize = 65_536;

/// Width of the fixed filename region at the start of attachment containers.
pub const NAME_FIELD_WIDTH: usize = 256;

/// How the filename is stored in the leading region of an attachment container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NameLayout {
    /// Name bytes terminated by NUL and padded to the field width.
    NullTerminated,
    /// A little-endian `u16` byte count, followed by the name, padded to the field width.
    LengthPrefixed,
}

/// Unit in which message frame lengths are counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LengthUnit {
    /// The length field counts payload bytes.
    Bytes,
    /// The length field counts UTF-16 code units (two bytes each).
    CodeUnits,
}

impl LengthUnit {
    /// Bytes per counted unit.
    pub fn scale(self) -> usize {
        match self {
            LengthUnit::Bytes => 1,
            LengthUnit::CodeUnits => 2,
        }
    }
}

/// Complete set of layout constants for one source-client version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormatProfile {
    /// Minimum structural offset for a trusted subject anchor.
    pub header_size: usize,
    /// Bytes between the end of the subject and the first frame.
    pub anchor_skip: usize,
    /// Width of frame length fields (1..=8).
    pub length_width: usize,
    /// What message frame lengths count, UTF-16 code units by default.
    /// Attachment frames always count bytes.
    pub text_length_unit: LengthUnit,
    /// Maximum frames read from a single container.
    pub max_frames: usize,
    /// Width of the attachment filename region.
    pub name_width: usize,
    /// Encoding of the attachment filename region.
    pub name_layout: NameLayout,
}

impl Default for FormatProfile {
    fn default() -> Self {
        Self {
            header_size: HEADER_SIZE,
            anchor_skip: ANCHOR_SKIP,
            length_width: LENGTH_WIDTH,
            text_length_unit: LengthUnit::CodeUnits,
            max_frames: MAX_FRAMES,
            name_width: NAME_FIELD_WIDTH,
            name_layout: NameLayout::NullTerminated,
        }
    }
}

impl FormatProfile {
    /// Check that the profile describes a readable layout.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if !(1..=8).contains(&self.length_width) {
            return Err(format!(
                "length_width must be between 1 and 8, found {}",
                self.length_width
            ));
        }
        if self.max_frames == 0 {
            return Err("max_frames must be at least 1".into());
        }
        if self.name_layout == NameLayout::LengthPrefixed && self.name_width < 2 {
            return Err("a length-prefixed name field needs at least 2 bytes".into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_profile_is_valid() {
        assert!(FormatProfile::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_wide_length_field() {
        let profile = FormatProfile {
            length_width: 9,
            ..FormatProfile::default()
        };
        assert!(profile.validate().is_err());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let profile: FormatProfile = toml::from_str("header_size = 64\nname_layout = \"length-prefixed\"")
            .expect("parse profile");
        assert_eq!(profile.header_size, 64);
        assert_eq!(profile.name_layout, NameLayout::LengthPrefixed);
        assert_eq!(profile.length_width, LENGTH_WIDTH);
        assert_eq!(profile.text_length_unit, LengthUnit::CodeUnits);

        let profile: FormatProfile =
            toml::from_str("text_length_unit = \"bytes\"").expect("parse unit");
        assert_eq!(profile.text_length_unit.scale(), 1);
    }
}
