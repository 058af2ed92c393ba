//! Mail store facade: decodes message and attachment containers from disk.
//!
//! Each call reads one container into memory, decodes it and drops the
//! buffer. Nothing is cached and no state is shared between calls, so a
//! single [`MailStore`] can be used from many threads at once.

use std::path::Path;

use tracing::{debug, info, warn};

use crate::error::{ArchiveError, Result};
use crate::model::attachment::AttachmentFile;
use crate::model::mail::MessageBody;
use crate::olk15::anchor;
use crate::olk15::attachment::{self, sanitize_filename};
use crate::olk15::format::FormatProfile;
use crate::olk15::message::MessageExtractor;

/// Name used when neither the container nor its path yields a filename.
const FALLBACK_ATTACHMENT_NAME: &str = "attachment";

/// Decodes OLK15 containers with a fixed [`FormatProfile`].
#[derive(Debug, Clone, Default)]
pub struct MailStore {
    profile: FormatProfile,
}

impl MailStore {
    pub fn new(profile: FormatProfile) -> Self {
        Self { profile }
    }

    pub fn profile(&self) -> &FormatProfile {
        &self.profile
    }

    /// Read a message container and return its body.
    ///
    /// Only I/O failures are errors. A missing subject gives an empty body;
    /// corrupt framing gives whatever was accumulated before the fault.
    pub fn get_mail_content(&self, path: impl AsRef<Path>, subject: &str) -> Result<MessageBody> {
        let path = path.as_ref();
        let buffer = read_container(path)?;
        Ok(self.extract_mail(path, &buffer, subject))
    }

    /// Best-effort body extraction from an in-memory container.
    pub fn extract_mail(&self, path: &Path, buffer: &[u8], subject: &str) -> MessageBody {
        let anchor = match anchor::locate(buffer, subject, &self.profile) {
            Ok(anchor) => anchor,
            Err(e) => {
                info!(path = %path.display(), error = %e, "No subject anchor, archiving empty body");
                return MessageBody::empty();
            }
        };

        let mut extractor = MessageExtractor::new(buffer, anchor, &self.profile);
        if let Err(e) = extractor.run() {
            warn!(
                path = %path.display(),
                offset = e.offset(),
                frames = extractor.frames(),
                error = %e,
                "Container framing error, keeping partial body"
            );
        }
        debug!(
            path = %path.display(),
            anchor = anchor.offset,
            frames = extractor.frames(),
            "Message extracted"
        );
        MessageBody::from(extractor.into_payload())
    }

    /// Read an attachment container and return its payload and filename.
    ///
    /// Only I/O failures are errors. Structural faults are logged and yield
    /// an empty payload, which archivers skip.
    pub fn get_file_content(&self, path: impl AsRef<Path>) -> Result<AttachmentFile> {
        let path = path.as_ref();
        let buffer = read_container(path)?;
        Ok(self.extract_file(path, &buffer))
    }

    /// Best-effort attachment extraction from an in-memory container.
    pub fn extract_file(&self, path: &Path, buffer: &[u8]) -> AttachmentFile {
        match attachment::extract(buffer, &self.profile) {
            Ok(raw) => {
                let name = raw.name.unwrap_or_else(|| fallback_name(path));
                debug!(path = %path.display(), name = %name, size = raw.data.len(), "Attachment extracted");
                AttachmentFile {
                    name,
                    data: raw.data,
                }
            }
            Err(e) => {
                warn!(
                    path = %path.display(),
                    offset = e.offset(),
                    error = %e,
                    "Skipping malformed attachment container"
                );
                let name = attachment::read_name_field(buffer, &self.profile)
                    .ok()
                    .flatten()
                    .unwrap_or_else(|| fallback_name(path));
                AttachmentFile {
                    name,
                    data: Vec::new(),
                }
            }
        }
    }
}

/// Load a whole container file.
fn read_container(path: &Path) -> Result<Vec<u8>> {
    debug!(path = %path.display(), "Reading container");
    std::fs::read(path).map_err(|e| ArchiveError::io(path, e))
}

/// Derive a filename from the container's own file stem.
fn fallback_name(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| sanitize_filename(&s.to_string_lossy()))
        .unwrap_or_else(|| FALLBACK_ATTACHMENT_NAME.to_string())
}
