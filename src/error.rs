//! Centralized error types for olkarchive.

use std::path::PathBuf;
use thiserror::Error;

/// Structural failures while walking the frames of an OLK15 container.
///
/// Every variant carries the byte offset at which the problem was detected
/// so that unsupported container variants can be diagnosed from the log.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    /// A length field or the payload it declares runs past the end of the buffer.
    #[error("Truncated frame at offset {offset}: need {needed} bytes, {available} available")]
    Truncated {
        offset: usize,
        needed: usize,
        available: usize,
    },

    /// A length field declares more bytes than could possibly be present.
    #[error("Unreasonable frame length {length} at offset {offset} (ceiling {ceiling})")]
    UnreasonableLength {
        offset: usize,
        length: u64,
        ceiling: usize,
    },

    /// More frames than the configured ceiling were read without reaching the end.
    #[error("Runaway extraction: more than {frames} frames, stopped at offset {offset}")]
    RunawayExtraction { frames: usize, offset: usize },

    /// The format profile describes a layout no container can have.
    #[error("Invalid container layout at offset {offset}: {reason}")]
    InvalidLayout { offset: usize, reason: String },
}

impl FrameError {
    /// Offset inside the container at which the error was detected.
    pub fn offset(&self) -> usize {
        match self {
            Self::Truncated { offset, .. }
            | Self::UnreasonableLength { offset, .. }
            | Self::RunawayExtraction { offset, .. }
            | Self::InvalidLayout { offset, .. } => *offset,
        }
    }
}

/// All errors produced by the olkarchive library.
#[derive(Error, Debug)]
pub enum ArchiveError {
    /// I/O error with the associated file path.
    #[error("I/O error reading '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The specified container or manifest does not exist.
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// The subject anchor is absent from a message container.
    #[error("Subject {subject:?} not found in container")]
    NotFound { subject: String },

    /// The container framing is corrupt or of an unsupported variant.
    #[error(transparent)]
    Frame(#[from] FrameError),

    /// The backup manifest could not be parsed.
    #[error("Invalid backup manifest '{path}': {reason}")]
    Manifest { path: PathBuf, reason: String },
}

/// Convenience alias for `Result<T, ArchiveError>`.
pub type Result<T> = std::result::Result<T, ArchiveError>;

impl ArchiveError {
    /// Create an `Io` variant from a path and an `io::Error`.
    ///
    /// A missing file is reported as [`ArchiveError::FileNotFound`].
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            return Self::FileNotFound(path);
        }
        Self::Io { path, source }
    }

    /// `true` for per-item conditions that yield empty or partial content
    /// instead of failing the item outright.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::Frame(_))
    }
}

/// Allow `?` on `std::io::Error` when no path context is available
/// (rare; prefer `ArchiveError::io`).
impl From<std::io::Error> for ArchiveError {
    fn from(source: std::io::Error) -> Self {
        Self::Io {
            path: PathBuf::from("<unknown>"),
            source,
        }
    }
}
